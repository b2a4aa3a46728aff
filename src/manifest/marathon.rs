// ABOUTME: Marathon app definitions and the remote commands that deploy them.
// ABOUTME: Extracts the app id and exposed service ports from app JSON.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{ManifestError, Result};
use crate::ssh::shell_quote;
use crate::types::{Protocol, ServicePort, WorkloadName};

/// SSH port of the DC/OS master load balancer.
pub const MARATHON_SSH_PORT: u16 = 2200;

const MARATHON_APPS_URL: &str = "http://localhost/marathon/v2/apps";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarathonApp {
    pub id: WorkloadName,
    pub ports: Vec<ServicePort>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppDto {
    id: Option<String>,
    #[serde(default)]
    port_definitions: Vec<PortDefinitionDto>,
    #[serde(default)]
    container: Option<ContainerDto>,
}

#[derive(Debug, Deserialize)]
struct PortDefinitionDto {
    #[serde(default)]
    port: u16,
    #[serde(default)]
    protocol: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContainerDto {
    #[serde(default)]
    docker: Option<DockerDto>,
    #[serde(default)]
    port_mappings: Vec<PortMappingDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DockerDto {
    #[serde(default)]
    port_mappings: Vec<PortMappingDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PortMappingDto {
    #[serde(default)]
    container_port: u16,
    #[serde(default)]
    host_port: u16,
    #[serde(default)]
    service_port: u16,
    #[serde(default)]
    protocol: Option<String>,
}

/// `"tcp"`, `"udp"` or `"udp,tcp"`; absent means TCP. Unknown names are ignored.
fn protocols(spec: Option<&str>) -> Vec<Protocol> {
    let Some(spec) = spec else {
        return vec![Protocol::Tcp];
    };
    let parsed: Vec<Protocol> = spec
        .split(',')
        .filter_map(|p| p.trim().parse().ok())
        .collect();
    if parsed.is_empty() {
        vec![Protocol::Tcp]
    } else {
        parsed
    }
}

/// Parse a Marathon app definition.
///
/// Exposed ports come from `portDefinitions[].port` and from the service port
/// (or, failing that, the host port) of each container port mapping. Zero
/// ports mean "assigned by Marathon" and are skipped.
pub fn parse_app(content: &str) -> Result<MarathonApp> {
    let dto: AppDto = serde_json::from_str(content)?;
    let id = dto.id.ok_or(ManifestError::MissingId)?;
    let id = WorkloadName::new(&id)?;

    let mut ports = Vec::new();
    for def in &dto.port_definitions {
        if def.port == 0 {
            continue;
        }
        for protocol in protocols(def.protocol.as_deref()) {
            ports.push(ServicePort::new(def.port, def.port, protocol));
        }
    }

    let mappings = dto.container.iter().flat_map(|c| {
        c.docker
            .iter()
            .flat_map(|d| d.port_mappings.iter())
            .chain(c.port_mappings.iter())
    });
    for mapping in mappings {
        let external = if mapping.service_port != 0 {
            mapping.service_port
        } else {
            mapping.host_port
        };
        if external == 0 {
            continue;
        }
        let internal = if mapping.container_port != 0 {
            mapping.container_port
        } else {
            external
        };
        for protocol in protocols(mapping.protocol.as_deref()) {
            ports.push(ServicePort::new(external, internal, protocol));
        }
    }

    ports.dedup();
    Ok(MarathonApp { id, ports })
}

/// Name of the remote copy of an app definition.
pub fn deployment_file_name(now: DateTime<Utc>) -> String {
    format!("acsDep{}.json", now.timestamp_millis())
}

/// Delete the app; the response is ignored so a missing app is fine.
pub fn delete_app_command(id: &WorkloadName) -> String {
    format!("curl -i -X DELETE {}/{}", MARATHON_APPS_URL, id.as_str())
}

/// Post the uploaded definition. `force` overrides locks left by the delete.
pub fn deploy_app_command(file_name: &str) -> String {
    format!(
        "curl -i -H 'Content-Type: application/json' -d@{} {}?force=true",
        shell_quote(file_name),
        MARATHON_APPS_URL
    )
}

pub fn remove_file_command(file_name: &str) -> String {
    format!("rm -f {}", shell_quote(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_id_and_port_definitions() {
        let app = parse_app(
            r#"{"id": "/web", "portDefinitions": [{"port": 8080}, {"port": 0}, {"port": 53, "protocol": "udp"}]}"#,
        )
        .unwrap();

        assert_eq!(app.id.as_str(), "web");
        assert_eq!(
            app.ports,
            vec![
                ServicePort::new(8080, 8080, Protocol::Tcp),
                ServicePort::new(53, 53, Protocol::Udp),
            ]
        );
    }

    #[test]
    fn docker_port_mappings_prefer_service_port() {
        let app = parse_app(
            r#"{
                "id": "shop/api",
                "container": {"docker": {"portMappings": [
                    {"containerPort": 80, "hostPort": 0, "servicePort": 10000},
                    {"containerPort": 443, "hostPort": 8443},
                    {"containerPort": 9000}
                ]}}
            }"#,
        )
        .unwrap();

        assert_eq!(app.id.as_str(), "shop/api");
        assert_eq!(
            app.ports,
            vec![
                ServicePort::new(10000, 80, Protocol::Tcp),
                ServicePort::new(8443, 443, Protocol::Tcp),
            ]
        );
    }

    #[test]
    fn dual_protocol_mapping_yields_both() {
        let app = parse_app(
            r#"{"id": "dns", "container": {"portMappings": [{"containerPort": 53, "hostPort": 53, "protocol": "udp,tcp"}]}}"#,
        )
        .unwrap();

        assert_eq!(
            app.ports,
            vec![
                ServicePort::new(53, 53, Protocol::Udp),
                ServicePort::new(53, 53, Protocol::Tcp),
            ]
        );
    }

    #[test]
    fn missing_id_is_rejected() {
        assert!(matches!(parse_app(r#"{"cmd": "sleep"}"#), Err(ManifestError::MissingId)));
    }

    #[test]
    fn remote_commands() {
        let id = WorkloadName::new("/web").unwrap();
        assert_eq!(
            delete_app_command(&id),
            "curl -i -X DELETE http://localhost/marathon/v2/apps/web"
        );
        assert_eq!(
            deploy_app_command("acsDep1.json"),
            "curl -i -H 'Content-Type: application/json' -d@acsDep1.json http://localhost/marathon/v2/apps?force=true"
        );
        assert_eq!(remove_file_command("acsDep1.json"), "rm -f acsDep1.json");
    }

    #[test]
    fn deployment_file_name_uses_epoch_millis() {
        let now = Utc.timestamp_millis_opt(1_500_000_000_123).unwrap();
        assert_eq!(deployment_file_name(now), "acsDep1500000000123.json");
    }
}

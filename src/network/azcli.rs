// ABOUTME: Cloud provider backed by the Azure CLI.
// ABOUTME: Runs `az network ...` with JSON output and maps responses onto reconciler types.

use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::process::Command;

use super::error::CloudError;
use super::firewall::{
    Access, Direction, FirewallApi, SecurityGroup, SecurityGroupUpdate, SecurityRule,
    SecurityRuleDefinition,
};
use super::load_balancer::{
    Backend, Frontend, LoadBalancer, LoadBalancerApi, LoadBalancerUpdate, LoadBalancingRule,
};
use super::public_ip::{PublicIp, PublicIpApi};
use crate::types::Protocol;

/// Talks to Azure through an installed, already logged-in `az` binary.
///
/// The CLI has no multi-resource transaction, so a load balancer update is
/// committed as a sequence of probe and rule creations issued back to back.
#[derive(Debug, Clone, Default)]
pub struct AzCli {
    subscription: Option<String>,
}

impl AzCli {
    pub fn new() -> Self {
        Self::default()
    }

    /// Target `subscription` instead of the CLI's active one.
    pub fn with_subscription(mut self, subscription: Option<String>) -> Self {
        self.subscription = subscription;
        self
    }

    fn command(&self, args: &[String]) -> Command {
        let mut command = Command::new("az");
        command.args(args).args(["--output", "json"]);
        if let Some(subscription) = &self.subscription {
            command.arg("--subscription").arg(subscription);
        }
        command
    }

    async fn run(&self, args: &[String]) -> Result<String, CloudError> {
        let command_line = format!("az {}", args.join(" "));
        tracing::debug!(command = %command_line, "running");

        let output = self
            .command(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            return Err(CloudError::CommandFailed {
                command: command_line,
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn list<T: DeserializeOwned>(&self, args: &[&str]) -> Result<Vec<T>, CloudError> {
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        let stdout = self.run(&args).await?;
        Ok(serde_json::from_str(&stdout)?)
    }
}

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|p| p.to_string()).collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NsgDto {
    name: String,
    #[serde(default)]
    security_rules: Vec<NsgRuleDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NsgRuleDto {
    name: String,
    priority: i32,
    #[serde(default)]
    destination_port_range: Option<String>,
    #[serde(default)]
    destination_port_ranges: Vec<String>,
}

impl NsgDto {
    /// A rule listing several destination ranges becomes one entry per range.
    fn into_security_group(self) -> SecurityGroup {
        let mut rules = std::collections::HashMap::new();
        for rule in self.security_rules {
            let ranges = match rule.destination_port_range {
                Some(range) => vec![range],
                None if rule.destination_port_ranges.is_empty() => vec![String::new()],
                None => rule.destination_port_ranges,
            };
            let multiple = ranges.len() > 1;
            for (i, range) in ranges.into_iter().enumerate() {
                let key = if multiple {
                    format!("{}#{}", rule.name, i)
                } else {
                    rule.name.clone()
                };
                rules.insert(
                    key,
                    SecurityRule {
                        name: rule.name.clone(),
                        priority: rule.priority,
                        destination_port_range: range,
                    },
                );
            }
        }
        SecurityGroup {
            name: self.name,
            rules,
        }
    }
}

#[derive(Debug, Deserialize)]
struct NamedDto {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LbDto {
    name: String,
    #[serde(default)]
    backend_address_pools: Vec<NamedDto>,
    #[serde(default)]
    frontend_ip_configurations: Vec<NamedDto>,
    #[serde(default)]
    load_balancing_rules: Vec<LbRuleDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LbRuleDto {
    name: String,
    frontend_port: u16,
    backend_port: u16,
    protocol: String,
}

/// `All` rules carry TCP traffic, so they count as TCP.
fn rule_protocol(protocol: &str) -> Protocol {
    if protocol.eq_ignore_ascii_case("udp") {
        Protocol::Udp
    } else {
        Protocol::Tcp
    }
}

impl From<LbDto> for LoadBalancer {
    fn from(dto: LbDto) -> Self {
        LoadBalancer {
            name: dto.name,
            backends: dto
                .backend_address_pools
                .into_iter()
                .map(|b| (b.name.clone(), Backend { name: b.name }))
                .collect(),
            frontends: dto
                .frontend_ip_configurations
                .into_iter()
                .map(|f| (f.name.clone(), Frontend { name: f.name }))
                .collect(),
            rules: dto
                .load_balancing_rules
                .into_iter()
                .map(|r| {
                    (
                        r.name.clone(),
                        LoadBalancingRule {
                            protocol: rule_protocol(&r.protocol),
                            name: r.name,
                            frontend_port: r.frontend_port,
                            backend_port: r.backend_port,
                        },
                    )
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublicIpDto {
    name: String,
    #[serde(default)]
    dns_settings: Option<DnsSettingsDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DnsSettingsDto {
    #[serde(default)]
    domain_name_label: Option<String>,
    #[serde(default)]
    fqdn: Option<String>,
}

impl From<PublicIpDto> for PublicIp {
    fn from(dto: PublicIpDto) -> Self {
        let (dns_label, fqdn) = match dto.dns_settings {
            Some(dns) => (dns.domain_name_label, dns.fqdn),
            None => (None, None),
        };
        PublicIp {
            name: dto.name,
            dns_label,
            fqdn,
        }
    }
}

fn security_rule_args(resource_group: &str, group: &str, rule: &SecurityRuleDefinition) -> Vec<String> {
    let direction = match rule.direction {
        Direction::Inbound => "Inbound",
        Direction::Outbound => "Outbound",
    };
    let access = match rule.access {
        Access::Allow => "Allow",
        Access::Deny => "Deny",
    };
    let protocol = rule.protocol.map(|p| p.as_str()).unwrap_or("*");
    let source = rule.source.as_deref().unwrap_or("*");
    let port = rule.destination_port.to_string();
    let priority = rule.priority.to_string();

    args(&[
        "network",
        "nsg",
        "rule",
        "create",
        "--resource-group",
        resource_group,
        "--nsg-name",
        group,
        "--name",
        &rule.name,
        "--priority",
        &priority,
        "--direction",
        direction,
        "--access",
        access,
        "--protocol",
        protocol,
        "--source-address-prefixes",
        source,
        "--source-port-ranges",
        "*",
        "--destination-address-prefixes",
        "*",
        "--destination-port-ranges",
        &port,
        "--description",
        &rule.description,
    ])
}

#[async_trait]
impl FirewallApi for AzCli {
    async fn list_security_groups(
        &self,
        resource_group: &str,
    ) -> Result<Vec<SecurityGroup>, CloudError> {
        let groups: Vec<NsgDto> = self
            .list(&["network", "nsg", "list", "--resource-group", resource_group])
            .await?;
        Ok(groups.into_iter().map(NsgDto::into_security_group).collect())
    }

    async fn apply(
        &self,
        resource_group: &str,
        group: &str,
        update: SecurityGroupUpdate,
    ) -> Result<(), CloudError> {
        for rule in update.rules() {
            self.run(&security_rule_args(resource_group, group, rule))
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl LoadBalancerApi for AzCli {
    async fn list_load_balancers(
        &self,
        resource_group: &str,
    ) -> Result<Vec<LoadBalancer>, CloudError> {
        let lbs: Vec<LbDto> = self
            .list(&["network", "lb", "list", "--resource-group", resource_group])
            .await?;
        Ok(lbs.into_iter().map(LoadBalancer::from).collect())
    }

    async fn apply(
        &self,
        resource_group: &str,
        load_balancer: &str,
        update: LoadBalancerUpdate,
    ) -> Result<(), CloudError> {
        for probe in update.probes() {
            let port = probe.port.to_string();
            self.run(&args(&[
                "network",
                "lb",
                "probe",
                "create",
                "--resource-group",
                resource_group,
                "--lb-name",
                load_balancer,
                "--name",
                probe.name.as_str(),
                "--protocol",
                "Tcp",
                "--port",
                &port,
            ]))
            .await?;
        }

        for rule in update.rules() {
            let frontend_port = rule.frontend_port.to_string();
            let backend_port = rule.backend_port.to_string();
            let idle_timeout = rule.idle_timeout_in_minutes.to_string();
            let protocol = match rule.protocol {
                Protocol::Tcp => "Tcp",
                Protocol::Udp => "Udp",
            };
            self.run(&args(&[
                "network",
                "lb",
                "rule",
                "create",
                "--resource-group",
                resource_group,
                "--lb-name",
                load_balancer,
                "--name",
                &rule.name,
                "--protocol",
                protocol,
                "--frontend-ip-name",
                rule.frontend.as_str(),
                "--frontend-port",
                &frontend_port,
                "--backend-pool-name",
                rule.backend.as_str(),
                "--backend-port",
                &backend_port,
                "--probe-name",
                rule.probe.as_str(),
                "--idle-timeout",
                &idle_timeout,
                "--load-distribution",
                rule.load_distribution.as_str(),
            ]))
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl PublicIpApi for AzCli {
    async fn list_public_ips(&self, resource_group: &str) -> Result<Vec<PublicIp>, CloudError> {
        let ips: Vec<PublicIpDto> = self
            .list(&["network", "public-ip", "list", "--resource-group", resource_group])
            .await?;
        Ok(ips.into_iter().map(PublicIp::from).collect())
    }
}

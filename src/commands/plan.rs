// ABOUTME: Plan command implementation.
// ABOUTME: Prints the security and load balancer rules a deploy would add, applying nothing.

use berth::config::{Config, Orchestrator};
use berth::error::{Error, Result};
use berth::manifest::{self, parse_app};
use berth::network::{AzCli, firewall, load_balancer};
use berth::output::Output;
use berth::pipeline::steps::desired_ports;
use std::path::Path;

pub async fn plan(config: Config, workspace: &Path, output: Output) -> Result<()> {
    if config.orchestrator == Orchestrator::Kubernetes {
        output.success("Kubernetes services expose their own ports; no network rules to add");
        return Ok(());
    }

    let variables = config.substitution_variables()?;
    let resolved = manifest::resolve_paths(workspace, &config.manifests);
    for path in &resolved.missing {
        output.warning(&format!("Manifest not found: {}", path.display()));
    }
    if resolved.found.is_empty() {
        return Err(Error::InvalidConfig("no manifest found to deploy".to_string()));
    }

    let mut apps = Vec::with_capacity(resolved.found.len());
    for path in &resolved.found {
        let raw = manifest::read(path)?;
        let content = match &variables {
            Some(vars) => manifest::substitute(&raw, vars),
            None => raw,
        };
        apps.push(parse_app(&content)?);
    }

    let ports = desired_ports(&config.ports, &apps);
    if ports.is_empty() {
        output.success("No ports to enable");
        return Ok(());
    }

    let az = AzCli::new().with_subscription(config.subscription.clone());
    let security_plans =
        firewall::plan_for_resource_group(&az, &config.resource_group, &config.cluster, &ports)
            .await?;
    for (group, rules) in &security_plans {
        if rules.is_empty() {
            output.planned(group, "all ports already open");
        }
        for rule in rules {
            output.planned(
                group,
                &format!(
                    "+ security rule {} port {} priority {}",
                    rule.name, rule.destination_port, rule.priority
                ),
            );
        }
    }

    let (tcp, skipped) = load_balancer::partition_tcp(&ports);
    for port in skipped {
        output.warning(&format!("{port} is not load balanced: only TCP ports are"));
    }
    let lb_plans =
        load_balancer::plan_for_resource_group(&az, &config.resource_group, &config.cluster, &tcp)
            .await?;
    for (name, update) in &lb_plans {
        if update.is_empty() {
            output.planned(name, "every port already served");
        }
        for probe in update.probes() {
            output.planned(name, &format!("+ tcp probe {} port {}", probe.name, probe.port));
        }
        for rule in update.rules() {
            output.planned(
                name,
                &format!(
                    "+ rule {} {} {} -> {} probe {}",
                    rule.name, rule.protocol, rule.frontend_port, rule.backend_port, rule.probe
                ),
            );
        }
    }

    output.success("Plan complete, nothing was applied");
    Ok(())
}

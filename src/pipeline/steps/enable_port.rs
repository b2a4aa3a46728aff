// ABOUTME: Opens the workload's ports in the agent firewalls and load balancers.
// ABOUTME: Ports come from configuration plus the Marathon app definitions.

use std::sync::Arc;

use async_trait::async_trait;

use super::{ClusterAccess, MissingManifests, load_manifests};
use crate::manifest::{MarathonApp, parse_app};
use crate::network::{
    FirewallApi, LoadBalancerApi, ReconcileError, ReconcileErrorKind, create_load_balancer_rules,
    create_security_rules,
};
use crate::pipeline::{Command, DeploymentState, PipelineError};
use crate::types::ServicePort;

pub trait EnablePortData: ClusterAccess {
    fn firewall(&self) -> Arc<dyn FirewallApi>;

    fn load_balancers(&self) -> Arc<dyn LoadBalancerApi>;

    /// Ports listed in configuration, in addition to those in the manifests.
    fn configured_ports(&self) -> &[ServicePort];
}

/// Every distinct port in `configured` and `apps`, sorted.
pub fn desired_ports(configured: &[ServicePort], apps: &[MarathonApp]) -> Vec<ServicePort> {
    let mut ports: Vec<ServicePort> = configured
        .iter()
        .chain(apps.iter().flat_map(|app| app.ports.iter()))
        .copied()
        .collect();
    ports.sort();
    ports.dedup();
    ports
}

pub struct EnablePortCommand;

fn report<C: EnablePortData>(ctx: &mut C, error: ReconcileError) {
    match error.kind() {
        ReconcileErrorKind::InvalidConfig => {
            ctx.log_error(format!("Invalid network configuration: {error}"));
        }
        ReconcileErrorKind::Cloud => {
            ctx.fail(format!("Error enabling ports: {error}"));
        }
    }
}

#[async_trait]
impl<C: EnablePortData> Command<C> for EnablePortCommand {
    fn name(&self) -> &'static str {
        "EnablePort"
    }

    async fn execute(&self, ctx: &mut C) -> Result<(), PipelineError> {
        let Some(loaded) = load_manifests(ctx, MissingManifests::Skip) else {
            return Ok(());
        };

        let mut apps = Vec::with_capacity(loaded.len());
        for (path, content) in loaded {
            match parse_app(&content) {
                Ok(app) => apps.push(app),
                Err(e) => {
                    ctx.log_error(format!("{}: {e}", path.display()));
                    return Ok(());
                }
            }
        }

        let ports = desired_ports(ctx.configured_ports(), &apps);
        if ports.is_empty() {
            ctx.log_status("No ports to enable");
            ctx.set_deployment_state(DeploymentState::Success);
            return Ok(());
        }

        let listed: Vec<String> = ports.iter().map(ServicePort::to_string).collect();
        ctx.log_status(format!("Enabling ports: {}", listed.join(", ")));

        let firewall = ctx.firewall();
        let lbs = ctx.load_balancers();
        let resource_group = ctx.resource_group().to_string();
        let cluster = ctx.cluster().to_string();

        if let Err(e) = create_security_rules(
            ctx.log(),
            firewall.as_ref(),
            &resource_group,
            &cluster,
            &ports,
        )
        .await
        {
            report(ctx, e);
            return Ok(());
        }

        if let Err(e) =
            create_load_balancer_rules(ctx.log(), lbs.as_ref(), &resource_group, &cluster, &ports)
                .await
        {
            report(ctx, e);
            return Ok(());
        }

        ctx.set_deployment_state(DeploymentState::Success);
        Ok(())
    }
}

// ABOUTME: Load balancer side of port exposure.
// ABOUTME: Stages a TCP probe and a load balancing rule per new port and applies them once.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;

use super::agent_load_balancer_prefix;
use super::error::{CloudError, InvalidConfigError, ReconcileError};
use crate::diagnostics::Warning;
use crate::pipeline::RunLog;
use crate::types::{BackendName, FrontendName, ProbeName, Protocol, ServicePort};

pub const LOAD_BALANCER_IDLE_TIMEOUT_IN_MINUTES: u32 = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadDistribution {
    #[default]
    Default,
    SourceIp,
    SourceIpProtocol,
}

impl LoadDistribution {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadDistribution::Default => "Default",
            LoadDistribution::SourceIp => "SourceIP",
            LoadDistribution::SourceIpProtocol => "SourceIPProtocol",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backend {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frontend {
    pub name: String,
}

/// An existing rule of a load balancer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadBalancingRule {
    pub name: String,
    pub frontend_port: u16,
    pub backend_port: u16,
    pub protocol: Protocol,
}

#[derive(Debug, Clone, Default)]
pub struct LoadBalancer {
    pub name: String,
    pub backends: HashMap<String, Backend>,
    pub frontends: HashMap<String, Frontend>,
    pub rules: HashMap<String, LoadBalancingRule>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpProbeDefinition {
    pub name: ProbeName,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadBalancingRuleDefinition {
    pub name: String,
    pub protocol: Protocol,
    pub frontend: FrontendName,
    pub frontend_port: u16,
    pub probe: ProbeName,
    pub backend: BackendName,
    pub backend_port: u16,
    pub idle_timeout_in_minutes: u32,
    pub load_distribution: LoadDistribution,
}

/// Pending additions to one load balancer.
///
/// Nothing staged here is visible to the provider until the whole update is
/// handed to [`LoadBalancerApi::apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadBalancerUpdate {
    probes: Vec<TcpProbeDefinition>,
    rules: Vec<LoadBalancingRuleDefinition>,
}

impl LoadBalancerUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a TCP health probe and return its name for rules to reference.
    pub fn define_tcp_probe(&mut self, name: impl Into<String>, port: u16) -> ProbeName {
        let name = ProbeName::new(name);
        self.probes.push(TcpProbeDefinition {
            name: name.clone(),
            port,
        });
        name
    }

    pub fn define_load_balancing_rule(&mut self, rule: LoadBalancingRuleDefinition) -> &mut Self {
        self.rules.push(rule);
        self
    }

    pub fn probes(&self) -> &[TcpProbeDefinition] {
        &self.probes
    }

    pub fn rules(&self) -> &[LoadBalancingRuleDefinition] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty() && self.rules.is_empty()
    }
}

/// Read and write access to the load balancers of a resource group.
#[async_trait]
pub trait LoadBalancerApi: Send + Sync {
    async fn list_load_balancers(
        &self,
        resource_group: &str,
    ) -> Result<Vec<LoadBalancer>, CloudError>;

    /// Commit every staged probe and rule of `update`.
    async fn apply(
        &self,
        resource_group: &str,
        load_balancer: &str,
        update: LoadBalancerUpdate,
    ) -> Result<(), CloudError>;
}

pub fn probe_name(port: u16) -> String {
    format!("tcpPort{port}Probe")
}

pub fn load_balancing_rule_name(protocol: Protocol, port: u16) -> String {
    format!("JLBRule{protocol}{port}")
}

/// The single frontend and single backend every new rule attaches to.
pub fn single_frontend_and_backend(
    lb: &LoadBalancer,
) -> Result<(FrontendName, BackendName), InvalidConfigError> {
    if lb.backends.len() != 1 || lb.frontends.len() != 1 {
        return Err(InvalidConfigError::new(format!(
            "load balancer '{}' must have exactly one backend and one frontend (found {} backends, {} frontends)",
            lb.name,
            lb.backends.len(),
            lb.frontends.len()
        )));
    }

    match (lb.frontends.values().next(), lb.backends.values().next()) {
        (Some(frontend), Some(backend)) => Ok((
            FrontendName::new(&frontend.name),
            BackendName::new(&backend.name),
        )),
        _ => Err(InvalidConfigError::new(format!(
            "load balancer '{}' has no usable frontend or backend",
            lb.name
        ))),
    }
}

/// Remove ports already served by an existing TCP rule on the same frontend port.
pub fn filter_load_balanced_ports<'a, I>(rules: I, ports: &mut BTreeSet<u16>)
where
    I: IntoIterator<Item = &'a LoadBalancingRule>,
{
    for rule in rules {
        if rule.protocol == Protocol::Tcp {
            ports.remove(&rule.frontend_port);
        }
    }
}

/// Stage a probe and rule for every port in `ports` that `lb` does not serve yet.
///
/// Fails before staging anything if `lb` does not have exactly one frontend
/// and one backend.
pub fn stage_load_balancer_rules(
    lb: &LoadBalancer,
    ports: &BTreeSet<u16>,
) -> Result<LoadBalancerUpdate, InvalidConfigError> {
    let (frontend, backend) = single_frontend_and_backend(lb)?;

    let mut remaining = ports.clone();
    filter_load_balanced_ports(lb.rules.values(), &mut remaining);

    let mut update = LoadBalancerUpdate::new();
    for port in remaining {
        let probe = update.define_tcp_probe(probe_name(port), port);
        update.define_load_balancing_rule(LoadBalancingRuleDefinition {
            name: load_balancing_rule_name(Protocol::Tcp, port),
            protocol: Protocol::Tcp,
            frontend: frontend.clone(),
            frontend_port: port,
            probe,
            backend: backend.clone(),
            backend_port: port,
            idle_timeout_in_minutes: LOAD_BALANCER_IDLE_TIMEOUT_IN_MINUTES,
            load_distribution: LoadDistribution::Default,
        });
    }
    Ok(update)
}

/// Split `ports` into TCP external port numbers and the UDP ports left out.
pub fn partition_tcp(ports: &[ServicePort]) -> (BTreeSet<u16>, Vec<ServicePort>) {
    let (tcp, udp): (Vec<ServicePort>, Vec<ServicePort>) = ports
        .iter()
        .copied()
        .partition(|p| p.protocol() == Protocol::Tcp);
    (tcp.iter().map(ServicePort::external).collect(), udp)
}

/// Stage the updates every agent load balancer needs, without applying them.
///
/// All load balancers are validated before any is staged, so one bad
/// topology fails the whole plan.
pub async fn plan_for_resource_group(
    lbs: &dyn LoadBalancerApi,
    resource_group: &str,
    cluster: &str,
    ports: &BTreeSet<u16>,
) -> Result<Vec<(String, LoadBalancerUpdate)>, ReconcileError> {
    let prefix = agent_load_balancer_prefix(cluster);
    let matched: Vec<_> = lbs
        .list_load_balancers(resource_group)
        .await?
        .into_iter()
        .filter(|lb| lb.name.starts_with(&prefix))
        .collect();

    if matched.is_empty() {
        return Err(InvalidConfigError::new(format!(
            "no load balancer named '{prefix}*' in resource group '{resource_group}'"
        ))
        .into());
    }

    for lb in &matched {
        single_frontend_and_backend(lb)?;
    }

    let mut plans = Vec::with_capacity(matched.len());
    for lb in matched {
        let update = stage_load_balancer_rules(&lb, ports)?;
        plans.push((lb.name, update));
    }
    Ok(plans)
}

/// Expose the TCP ports of `ports` on every agent load balancer.
///
/// Each load balancer receives at most one `apply`, and none when it already
/// serves every port. Returns the applied updates keyed by load balancer.
pub async fn create_load_balancer_rules(
    log: &mut RunLog,
    lbs: &dyn LoadBalancerApi,
    resource_group: &str,
    cluster: &str,
    ports: &[ServicePort],
) -> Result<Vec<(String, LoadBalancerUpdate)>, ReconcileError> {
    let (desired, skipped) = partition_tcp(ports);
    for port in skipped {
        log.warn(Warning::port_skipped(format!(
            "Skipping load balancer rule for {port}: only TCP ports are load balanced"
        )));
    }

    let plans = plan_for_resource_group(lbs, resource_group, cluster, &desired).await?;

    let mut applied = Vec::new();
    for (name, update) in plans {
        if update.is_empty() {
            log.status(format!("Load balancer {name} already serves every port"));
            continue;
        }

        for rule in update.rules() {
            log.status(format!(
                "Staging load balancer rule {} ({} {} -> {}) with probe {} on {}",
                rule.name, rule.protocol, rule.frontend_port, rule.backend_port, rule.probe, name
            ));
        }
        log.status(format!("Applying load balancer update to {name}"));
        lbs.apply(resource_group, &name, update.clone()).await?;
        applied.push((name, update));
    }

    Ok(applied)
}

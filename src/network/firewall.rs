// ABOUTME: Firewall (network security group) side of port exposure.
// ABOUTME: Filters already-open ports and creates prioritized inbound-allow rules.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;

use super::agent_public_security_group_prefix;
use super::error::{CloudError, InvalidConfigError, ReconcileError};
use crate::pipeline::RunLog;
use crate::types::{PortSpec, Protocol, ServicePort};

/// Gap between the priorities of consecutively created rules.
pub const PRIORITY_STEP: i32 = 10;

/// An existing rule of a security group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityRule {
    pub name: String,
    /// Lower values take precedence.
    pub priority: i32,
    /// `*`, `8080`, or `8000-9000`.
    pub destination_port_range: String,
}

#[derive(Debug, Clone, Default)]
pub struct SecurityGroup {
    pub name: String,
    pub rules: HashMap<String, SecurityRule>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Deny,
}

/// A rule to be created in a security group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityRuleDefinition {
    pub name: String,
    pub direction: Direction,
    pub access: Access,
    /// `None` means any source address and any source port.
    pub source: Option<String>,
    pub destination_port: u16,
    /// `None` means any protocol.
    pub protocol: Option<Protocol>,
    pub description: String,
    pub priority: i32,
}

impl SecurityRuleDefinition {
    /// Allow traffic from anywhere to `port` on any address, over any protocol.
    pub fn allow_inbound(name: impl Into<String>, port: u16, priority: i32) -> Self {
        Self {
            name: name.into(),
            direction: Direction::Inbound,
            access: Access::Allow,
            source: None,
            destination_port: port,
            protocol: None,
            description: String::new(),
            priority,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Pending additions to one security group, committed by [`FirewallApi::apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityGroupUpdate {
    rules: Vec<SecurityRuleDefinition>,
}

impl SecurityGroupUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, rule: SecurityRuleDefinition) -> &mut Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[SecurityRuleDefinition] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Read and write access to the security groups of a resource group.
#[async_trait]
pub trait FirewallApi: Send + Sync {
    async fn list_security_groups(
        &self,
        resource_group: &str,
    ) -> Result<Vec<SecurityGroup>, CloudError>;

    async fn apply(
        &self,
        resource_group: &str,
        group: &str,
        update: SecurityGroupUpdate,
    ) -> Result<(), CloudError>;
}

/// Remove every port in `ports` already covered by one of `rules`.
///
/// Returns the highest priority among all rules (0 for none), whether or not
/// the rule covered anything. Fails on the first unparsable port range; ports
/// removed by earlier rules stay removed.
pub fn filter_ports_to_open<'a, I>(
    rules: I,
    ports: &mut BTreeSet<u16>,
) -> Result<i32, InvalidConfigError>
where
    I: IntoIterator<Item = &'a SecurityRule>,
{
    let mut max_priority = 0;

    for rule in rules {
        max_priority = max_priority.max(rule.priority);

        let spec = PortSpec::parse(&rule.destination_port_range).map_err(|e| {
            InvalidConfigError::new(format!("security rule '{}': {}", rule.name, e))
        })?;

        match spec {
            PortSpec::Any => ports.clear(),
            spec => ports.retain(|p| !spec.covers(*p)),
        }
    }

    Ok(max_priority)
}

/// Name of the rule that opens `port`.
pub fn security_rule_name(port: u16) -> String {
    format!("Allow_{port}")
}

/// Rules for `ports` in ascending order, prioritized above `max_priority`.
///
/// Fails when a priority would not fit in an `i32`.
pub fn plan_security_rules(
    max_priority: i32,
    ports: &BTreeSet<u16>,
) -> Result<Vec<SecurityRuleDefinition>, InvalidConfigError> {
    ports
        .iter()
        .zip(1..)
        .map(|(&port, k)| {
            PRIORITY_STEP
                .checked_mul(k)
                .and_then(|offset| max_priority.checked_add(offset))
                .map(|priority| {
                    SecurityRuleDefinition::allow_inbound(security_rule_name(port), port, priority)
                        .with_description(format!("Allow inbound traffic to port {port}"))
                })
                .ok_or_else(|| {
                    InvalidConfigError::new(format!(
                        "no rule priority left above {max_priority} for port {port}"
                    ))
                })
        })
        .collect()
}

/// Plan the rules every agent-public security group still needs.
///
/// Returns `(group name, rules)` pairs; groups that need nothing are included
/// with an empty list.
pub async fn plan_for_resource_group(
    firewall: &dyn FirewallApi,
    resource_group: &str,
    cluster: &str,
    ports: &[ServicePort],
) -> Result<Vec<(String, Vec<SecurityRuleDefinition>)>, ReconcileError> {
    let prefix = agent_public_security_group_prefix(cluster);
    let groups: Vec<_> = firewall
        .list_security_groups(resource_group)
        .await?
        .into_iter()
        .filter(|g| g.name.starts_with(&prefix))
        .collect();

    if groups.is_empty() {
        return Err(InvalidConfigError::new(format!(
            "no security group named '{prefix}*' in resource group '{resource_group}'"
        ))
        .into());
    }

    let mut plans = Vec::with_capacity(groups.len());
    for group in groups {
        let mut desired: BTreeSet<u16> = ports.iter().map(ServicePort::external).collect();
        let max_priority = filter_ports_to_open(group.rules.values(), &mut desired)?;
        plans.push((group.name, plan_security_rules(max_priority, &desired)?));
    }
    Ok(plans)
}

/// Open `ports` in every agent-public security group of the resource group.
///
/// Each rule is applied on its own, so rules created before a failure remain.
/// Returns the rules that were created.
pub async fn create_security_rules(
    log: &mut RunLog,
    firewall: &dyn FirewallApi,
    resource_group: &str,
    cluster: &str,
    ports: &[ServicePort],
) -> Result<Vec<SecurityRuleDefinition>, ReconcileError> {
    let plans = plan_for_resource_group(firewall, resource_group, cluster, ports).await?;

    let mut created = Vec::new();
    for (group, rules) in plans {
        if rules.is_empty() {
            log.status(format!("All ports are already open in security group {group}"));
            continue;
        }

        for rule in rules {
            log.status(format!(
                "Creating security rule {} for port {} with priority {} in {}",
                rule.name, rule.destination_port, rule.priority, group
            ));
            let mut update = SecurityGroupUpdate::new();
            update.attach(rule.clone());
            firewall.apply(resource_group, &group, update).await?;
            created.push(rule);
        }
    }

    Ok(created)
}

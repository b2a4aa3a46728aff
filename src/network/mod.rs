// ABOUTME: Port exposure reconciliation against the cloud network fabric.
// ABOUTME: Opens desired ports in agent firewalls and load balancers without touching existing rules.

mod azcli;
mod error;
pub mod firewall;
pub mod load_balancer;
mod public_ip;

pub use azcli::AzCli;
pub use error::{CloudError, InvalidConfigError, ReconcileError, ReconcileErrorKind};
pub use firewall::{
    FirewallApi, SecurityGroup, SecurityGroupUpdate, SecurityRule, SecurityRuleDefinition,
    create_security_rules, filter_ports_to_open,
};
pub use load_balancer::{
    LOAD_BALANCER_IDLE_TIMEOUT_IN_MINUTES, LoadBalancer, LoadBalancerApi, LoadBalancerUpdate,
    LoadBalancingRule, LoadDistribution, create_load_balancer_rules,
};
pub use public_ip::{PublicIp, PublicIpApi, management_dns_label, management_fqdn};

/// Name prefix of the security groups guarding a cluster's public agents.
pub fn agent_public_security_group_prefix(cluster: &str) -> String {
    format!("{cluster}-agent-public-nsg-")
}

/// Name prefix of the load balancers in front of a cluster's public agents.
pub fn agent_load_balancer_prefix(cluster: &str) -> String {
    format!("{cluster}-agent-lb-")
}

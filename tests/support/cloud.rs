// ABOUTME: In-memory cloud provider recording every apply.
// ABOUTME: Applied rules become visible to later listings, like the real fabric.

use async_trait::async_trait;
use berth::network::{
    CloudError, FirewallApi, LoadBalancer, LoadBalancerApi, LoadBalancerUpdate,
    LoadBalancingRule, PublicIp, PublicIpApi, SecurityGroup, SecurityGroupUpdate, SecurityRule,
};
use berth::network::load_balancer::{Backend, Frontend};
use berth::types::Protocol;
use parking_lot::Mutex;

#[derive(Default)]
pub struct MockCloud {
    pub groups: Mutex<Vec<SecurityGroup>>,
    pub load_balancers: Mutex<Vec<LoadBalancer>>,
    pub public_ips: Mutex<Vec<PublicIp>>,
    pub security_applies: Mutex<Vec<(String, SecurityGroupUpdate)>>,
    pub lb_applies: Mutex<Vec<(String, LoadBalancerUpdate)>>,
    /// Fail every load balancer apply with this stderr.
    pub lb_apply_error: Mutex<Option<String>>,
}

impl MockCloud {
    pub fn with_group(self, group: SecurityGroup) -> Self {
        self.groups.lock().push(group);
        self
    }

    pub fn with_load_balancer(self, lb: LoadBalancer) -> Self {
        self.load_balancers.lock().push(lb);
        self
    }

    pub fn with_public_ip(self, ip: PublicIp) -> Self {
        self.public_ips.lock().push(ip);
        self
    }

    pub fn security_apply_count(&self) -> usize {
        self.security_applies.lock().len()
    }

    pub fn lb_apply_count(&self) -> usize {
        self.lb_applies.lock().len()
    }
}

/// A security group holding `rules` as `(name, priority, range)`.
pub fn security_group(name: &str, rules: &[(&str, i32, &str)]) -> SecurityGroup {
    SecurityGroup {
        name: name.to_string(),
        rules: rules
            .iter()
            .map(|(rule, priority, range)| {
                (
                    rule.to_string(),
                    SecurityRule {
                        name: rule.to_string(),
                        priority: *priority,
                        destination_port_range: range.to_string(),
                    },
                )
            })
            .collect(),
    }
}

/// A load balancer with one frontend and one backend serving `rules`.
pub fn load_balancer(name: &str, rules: &[(u16, Protocol)]) -> LoadBalancer {
    let mut lb = LoadBalancer {
        name: name.to_string(),
        ..LoadBalancer::default()
    };
    lb.frontends.insert(
        "frontend".to_string(),
        Frontend {
            name: format!("{name}-frontend"),
        },
    );
    lb.backends.insert(
        "backend".to_string(),
        Backend {
            name: format!("{name}-backend"),
        },
    );
    for (port, protocol) in rules {
        let rule_name = format!("existing-{protocol}-{port}");
        lb.rules.insert(
            rule_name.clone(),
            LoadBalancingRule {
                name: rule_name,
                frontend_port: *port,
                backend_port: *port,
                protocol: *protocol,
            },
        );
    }
    lb
}

pub fn mgmt_ip(dns_prefix: &str) -> PublicIp {
    PublicIp {
        name: "dcos-master-ip".to_string(),
        dns_label: Some(format!("{dns_prefix}mgmt")),
        fqdn: Some(format!("{dns_prefix}mgmt.westus.cloudapp.azure.com")),
    }
}

#[async_trait]
impl FirewallApi for MockCloud {
    async fn list_security_groups(
        &self,
        _resource_group: &str,
    ) -> Result<Vec<SecurityGroup>, CloudError> {
        Ok(self.groups.lock().clone())
    }

    async fn apply(
        &self,
        _resource_group: &str,
        group: &str,
        update: SecurityGroupUpdate,
    ) -> Result<(), CloudError> {
        let mut groups = self.groups.lock();
        if let Some(existing) = groups.iter_mut().find(|g| g.name == group) {
            for rule in update.rules() {
                existing.rules.insert(
                    rule.name.clone(),
                    SecurityRule {
                        name: rule.name.clone(),
                        priority: rule.priority,
                        destination_port_range: rule.destination_port.to_string(),
                    },
                );
            }
        }
        self.security_applies.lock().push((group.to_string(), update));
        Ok(())
    }
}

#[async_trait]
impl LoadBalancerApi for MockCloud {
    async fn list_load_balancers(
        &self,
        _resource_group: &str,
    ) -> Result<Vec<LoadBalancer>, CloudError> {
        Ok(self.load_balancers.lock().clone())
    }

    async fn apply(
        &self,
        _resource_group: &str,
        load_balancer: &str,
        update: LoadBalancerUpdate,
    ) -> Result<(), CloudError> {
        if let Some(stderr) = self.lb_apply_error.lock().clone() {
            return Err(CloudError::CommandFailed {
                command: format!("network lb update {load_balancer}"),
                status: 1,
                stderr,
            });
        }

        let mut lbs = self.load_balancers.lock();
        if let Some(existing) = lbs.iter_mut().find(|lb| lb.name == load_balancer) {
            for rule in update.rules() {
                existing.rules.insert(
                    rule.name.clone(),
                    LoadBalancingRule {
                        name: rule.name.clone(),
                        frontend_port: rule.frontend_port,
                        backend_port: rule.backend_port,
                        protocol: rule.protocol,
                    },
                );
            }
        }
        self.lb_applies.lock().push((load_balancer.to_string(), update));
        Ok(())
    }
}

#[async_trait]
impl PublicIpApi for MockCloud {
    async fn list_public_ips(&self, _resource_group: &str) -> Result<Vec<PublicIp>, CloudError> {
        Ok(self.public_ips.lock().clone())
    }
}

// ABOUTME: Public IP lookup for the cluster's management endpoint.
// ABOUTME: Finds the master FQDN by its DNS label within the resource group.

use async_trait::async_trait;

use super::error::{CloudError, InvalidConfigError, ReconcileError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicIp {
    pub name: String,
    pub dns_label: Option<String>,
    pub fqdn: Option<String>,
}

#[async_trait]
pub trait PublicIpApi: Send + Sync {
    async fn list_public_ips(&self, resource_group: &str) -> Result<Vec<PublicIp>, CloudError>;
}

/// DNS label of the management (master) public IP for a cluster DNS prefix.
pub fn management_dns_label(dns_prefix: &str) -> String {
    format!("{dns_prefix}mgmt")
}

/// Resolve the management endpoint FQDN of the cluster.
pub async fn management_fqdn(
    api: &dyn PublicIpApi,
    resource_group: &str,
    dns_prefix: &str,
) -> Result<String, ReconcileError> {
    let label = management_dns_label(dns_prefix);
    let ips = api.list_public_ips(resource_group).await?;

    ips.into_iter()
        .filter(|ip| ip.dns_label.as_deref() == Some(label.as_str()))
        .find_map(|ip| ip.fqdn)
        .ok_or_else(|| {
            InvalidConfigError::new(format!(
                "no public IP with DNS label '{label}' in resource group '{resource_group}'"
            ))
            .into()
        })
}

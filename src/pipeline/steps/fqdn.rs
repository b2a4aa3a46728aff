// ABOUTME: Resolves the FQDN of the cluster's management endpoint.
// ABOUTME: Later steps reach the master through the recorded name.

use std::sync::Arc;

use async_trait::async_trait;

use super::ClusterAccess;
use crate::network::{PublicIpApi, management_fqdn};
use crate::pipeline::{Command, DeploymentState, PipelineError};

pub trait GetPublicFqdnData: ClusterAccess {
    fn public_ips(&self) -> Arc<dyn PublicIpApi>;

    fn set_mgmt_fqdn(&mut self, fqdn: String);
}

pub struct GetPublicFqdnCommand;

#[async_trait]
impl<C: GetPublicFqdnData> Command<C> for GetPublicFqdnCommand {
    fn name(&self) -> &'static str {
        "GetPublicFqdn"
    }

    async fn execute(&self, ctx: &mut C) -> Result<(), PipelineError> {
        ctx.log_status("Getting management public FQDN");

        let api = ctx.public_ips();
        let resource_group = ctx.resource_group().to_string();
        let dns_prefix = ctx.dns_prefix().to_string();

        match management_fqdn(api.as_ref(), &resource_group, &dns_prefix).await {
            Ok(fqdn) => {
                ctx.log_status(format!("Management public FQDN: {fqdn}"));
                ctx.set_mgmt_fqdn(fqdn);
                ctx.set_deployment_state(DeploymentState::Success);
            }
            Err(e) => ctx.log_error(format!("Error getting management public FQDN: {e}")),
        }
        Ok(())
    }
}

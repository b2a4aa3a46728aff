// ABOUTME: Applies Kubernetes manifests on the cluster master with kubectl.
// ABOUTME: Deployments and Services are created or replaced, other kinds skipped.

use std::path::PathBuf;

use async_trait::async_trait;

use super::{ClusterAccess, MissingManifests, load_manifests};
use crate::diagnostics::Warning;
use crate::manifest::{self, RemoteKubectl, Resource, apply_resources, load_resources};
use crate::pipeline::{Command, DeploymentState, PipelineError};
use crate::ssh::RemoteShell;

pub const KUBERNETES_SSH_PORT: u16 = 22;

pub trait KubernetesDeploymentData: ClusterAccess {
    fn namespace(&self) -> &str;
}

pub struct KubernetesDeploymentCommand;

async fn apply_all<C: KubernetesDeploymentData>(
    ctx: &mut C,
    shell: &dyn RemoteShell,
    files: &[(PathBuf, Vec<Resource>)],
) -> manifest::Result<()> {
    let namespace = ctx.namespace().to_string();
    let applier = RemoteKubectl::new(shell);
    for (path, resources) in files {
        ctx.log_status(format!("Applying {}", path.display()));
        apply_resources(ctx.log(), &applier, resources, &namespace).await?;
    }
    Ok(())
}

#[async_trait]
impl<C: KubernetesDeploymentData> Command<C> for KubernetesDeploymentCommand {
    fn name(&self) -> &'static str {
        "KubernetesDeployment"
    }

    async fn execute(&self, ctx: &mut C) -> Result<(), PipelineError> {
        let Some(host) = ctx.mgmt_fqdn().map(str::to_string) else {
            ctx.log_error("Management FQDN is not known");
            return Ok(());
        };

        let Some(loaded) = load_manifests(ctx, MissingManifests::Warn) else {
            return Ok(());
        };

        let mut files = Vec::with_capacity(loaded.len());
        for (path, content) in loaded {
            match load_resources(&content) {
                Ok(resources) if resources.is_empty() => {
                    ctx.log_status(format!("No resource loaded from {}", path.display()));
                }
                Ok(resources) => files.push((path, resources)),
                Err(e) => {
                    ctx.log_error(format!("{}: {e}", path.display()));
                    return Ok(());
                }
            }
        }

        let target = ctx.ssh_target(&host, KUBERNETES_SSH_PORT);
        let connector = ctx.connector();
        ctx.log_status(format!("Connecting to {}:{}", target.host, target.port));

        let shell = match connector.connect(&target).await {
            Ok(shell) => shell,
            Err(e) => {
                ctx.fail(format!("Error deploying to Kubernetes: {e}"));
                return Ok(());
            }
        };

        let result = apply_all(ctx, shell.as_ref(), &files).await;

        if let Err(e) = shell.close().await {
            ctx.log()
                .warn(Warning::ssh_disconnect(format!("Failed to close SSH session: {e}")));
        }

        match result {
            Ok(()) => ctx.set_deployment_state(DeploymentState::Success),
            Err(e) => ctx.fail(format!("Error deploying to Kubernetes: {e}")),
        }
        Ok(())
    }
}

// ABOUTME: The deployment commands and the capability traits their context implements.
// ABOUTME: Wires the Marathon and Kubernetes pipelines from these commands.

mod enable_port;
mod fqdn;
mod kubernetes;
mod marathon;

use std::path::PathBuf;
use std::sync::Arc;

pub use enable_port::{EnablePortCommand, EnablePortData, desired_ports};
pub use fqdn::{GetPublicFqdnCommand, GetPublicFqdnData};
pub use kubernetes::{KUBERNETES_SSH_PORT, KubernetesDeploymentCommand, KubernetesDeploymentData};
pub use marathon::{MarathonDeploymentCommand, MarathonDeploymentData};

use super::command::BaseCommandData;
use super::transition::{TransitionInfo, TransitionTable};
use crate::diagnostics::Warning;
use crate::manifest::{self, ResolvedManifests};
use crate::ssh::{RemoteConnector, SshTarget};

/// Labels of the steps in a deployment pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    GetPublicFqdn,
    MarathonDeployment,
    KubernetesDeployment,
    EnablePort,
}

/// Cluster coordinates and remote access shared by the deployment commands.
pub trait ClusterAccess: BaseCommandData {
    fn resource_group(&self) -> &str;

    /// Name prefix of the cluster's network resources.
    fn cluster(&self) -> &str;

    fn dns_prefix(&self) -> &str;

    /// Set once [`GetPublicFqdnCommand`] has run.
    fn mgmt_fqdn(&self) -> Option<&str>;

    /// SSH coordinates for `host`, using `default_port` unless configured otherwise.
    fn ssh_target(&self, host: &str, default_port: u16) -> SshTarget;

    fn connector(&self) -> Arc<dyn RemoteConnector>;

    fn manifests(&self) -> ResolvedManifests;

    /// Manifest content after variable substitution, when enabled.
    fn render_manifest(&self, content: &str) -> String;
}

/// Whether [`load_manifests`] warns about configured paths with no file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MissingManifests {
    Warn,
    /// An earlier step of the run already warned.
    Skip,
}

/// Read and render every manifest that exists.
///
/// Logs an error and returns `None` when there is nothing to deploy or a file
/// cannot be read.
pub(crate) fn load_manifests<C: ClusterAccess>(
    ctx: &mut C,
    missing: MissingManifests,
) -> Option<Vec<(PathBuf, String)>> {
    let resolved = ctx.manifests();
    if missing == MissingManifests::Warn {
        for path in &resolved.missing {
            ctx.log()
                .warn(Warning::manifest_missing(format!("Manifest not found: {}", path.display())));
        }
    }
    if resolved.found.is_empty() {
        ctx.log_error("No manifest found to deploy");
        return None;
    }

    let mut loaded = Vec::with_capacity(resolved.found.len());
    for path in resolved.found {
        match manifest::read(&path) {
            Ok(raw) => {
                let rendered = ctx.render_manifest(&raw);
                loaded.push((path, rendered));
            }
            Err(e) => {
                ctx.log_error(e.to_string());
                return None;
            }
        }
    }
    Some(loaded)
}

/// GetPublicFqdn, then MarathonDeployment, then EnablePort.
pub fn marathon_pipeline<C>() -> TransitionTable<Step, C>
where
    C: GetPublicFqdnData + MarathonDeploymentData + EnablePortData + 'static,
{
    TransitionTable::new(Step::GetPublicFqdn)
        .with(
            Step::GetPublicFqdn,
            TransitionInfo::new(GetPublicFqdnCommand).on_success(Step::MarathonDeployment),
        )
        .with(
            Step::MarathonDeployment,
            TransitionInfo::new(MarathonDeploymentCommand).on_success(Step::EnablePort),
        )
        .with(Step::EnablePort, TransitionInfo::new(EnablePortCommand))
}

/// GetPublicFqdn, then KubernetesDeployment.
pub fn kubernetes_pipeline<C>() -> TransitionTable<Step, C>
where
    C: GetPublicFqdnData + KubernetesDeploymentData + 'static,
{
    TransitionTable::new(Step::GetPublicFqdn)
        .with(
            Step::GetPublicFqdn,
            TransitionInfo::new(GetPublicFqdnCommand).on_success(Step::KubernetesDeployment),
        )
        .with(
            Step::KubernetesDeployment,
            TransitionInfo::new(KubernetesDeploymentCommand),
        )
}

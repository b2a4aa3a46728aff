// ABOUTME: The execution context shared by every command of a deployment run.
// ABOUTME: Answers each command's capability trait from config and injected providers.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{Config, Orchestrator, SshConfig};
use crate::error::Result;
use crate::manifest::{self, ResolvedManifests};
use crate::network::{AzCli, FirewallApi, LoadBalancerApi, PublicIpApi};
use crate::pipeline::steps::{
    ClusterAccess, EnablePortData, GetPublicFqdnData, KubernetesDeploymentData,
    MarathonDeploymentData, kubernetes_pipeline, marathon_pipeline,
};
use crate::pipeline::{BaseCommandData, DeploymentState, RunLog, Step, TransitionTable};
use crate::ssh::{RemoteConnector, SshConnector, SshTarget};
use crate::types::ServicePort;

/// Cloud and remote-access clients a run talks through.
#[derive(Clone)]
pub struct Providers {
    pub firewall: Arc<dyn FirewallApi>,
    pub load_balancers: Arc<dyn LoadBalancerApi>,
    pub public_ips: Arc<dyn PublicIpApi>,
    pub connector: Arc<dyn RemoteConnector>,
}

impl Providers {
    /// The `az` CLI for cloud calls and russh for remote commands.
    pub fn azure(az: AzCli) -> Self {
        let az = Arc::new(az);
        Self {
            firewall: az.clone(),
            load_balancers: az.clone(),
            public_ips: az,
            connector: Arc::new(SshConnector),
        }
    }
}

pub struct DeploymentContext {
    state: DeploymentState,
    log: RunLog,
    workspace: PathBuf,
    orchestrator: Orchestrator,
    resource_group: String,
    cluster: String,
    dns_prefix: String,
    ssh: SshConfig,
    manifests: Vec<PathBuf>,
    namespace: String,
    variables: Option<BTreeMap<String, String>>,
    ports: Vec<ServicePort>,
    mgmt_fqdn: Option<String>,
    providers: Providers,
}

impl DeploymentContext {
    /// Build a context for `config`, resolving manifests against `workspace`.
    ///
    /// Fails when a substitution variable refers to an unset environment
    /// variable without a default.
    pub fn new(
        config: &Config,
        workspace: impl Into<PathBuf>,
        providers: Providers,
        log: RunLog,
    ) -> Result<Self> {
        Ok(Self {
            state: DeploymentState::Unknown,
            log,
            workspace: workspace.into(),
            orchestrator: config.orchestrator,
            resource_group: config.resource_group.clone(),
            cluster: config.cluster.clone(),
            dns_prefix: config.dns_prefix.clone(),
            ssh: config.ssh.clone(),
            manifests: config.manifests.iter().cloned().collect(),
            namespace: config.namespace.clone(),
            variables: config.substitution_variables()?,
            ports: config.ports.clone(),
            mgmt_fqdn: None,
            providers,
        })
    }

    /// The pipeline for the configured orchestrator.
    pub fn pipeline(&self) -> TransitionTable<Step, Self> {
        match self.orchestrator {
            Orchestrator::Marathon => marathon_pipeline(),
            Orchestrator::Kubernetes => kubernetes_pipeline(),
        }
    }

    pub fn run_log(&self) -> &RunLog {
        &self.log
    }

    pub fn into_log(self) -> RunLog {
        self.log
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), std::env::var_os("HOME")) {
        (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => path.to_path_buf(),
    }
}

impl BaseCommandData for DeploymentContext {
    fn deployment_state(&self) -> DeploymentState {
        self.state
    }

    fn set_deployment_state(&mut self, state: DeploymentState) {
        self.state = self.state.advance(state);
    }

    fn log(&mut self) -> &mut RunLog {
        &mut self.log
    }
}

impl ClusterAccess for DeploymentContext {
    fn resource_group(&self) -> &str {
        &self.resource_group
    }

    fn cluster(&self) -> &str {
        &self.cluster
    }

    fn dns_prefix(&self) -> &str {
        &self.dns_prefix
    }

    fn mgmt_fqdn(&self) -> Option<&str> {
        self.mgmt_fqdn.as_deref()
    }

    fn ssh_target(&self, host: &str, default_port: u16) -> SshTarget {
        let mut target = SshTarget::new(host, &self.ssh.user)
            .port(self.ssh.port.unwrap_or(default_port))
            .trust_on_first_use(self.ssh.trust_first_connection)
            .command_timeout(self.ssh.command_timeout);
        if let Some(key) = &self.ssh.key {
            target = target.key_path(expand_home(key));
        }
        if let Some(known_hosts) = &self.ssh.known_hosts {
            target = target.known_hosts_path(expand_home(known_hosts));
        }
        target
    }

    fn connector(&self) -> Arc<dyn RemoteConnector> {
        self.providers.connector.clone()
    }

    fn manifests(&self) -> ResolvedManifests {
        manifest::resolve_paths(&self.workspace, &self.manifests)
    }

    fn render_manifest(&self, content: &str) -> String {
        match &self.variables {
            Some(vars) => manifest::substitute(content, vars),
            None => content.to_string(),
        }
    }
}

impl GetPublicFqdnData for DeploymentContext {
    fn public_ips(&self) -> Arc<dyn PublicIpApi> {
        self.providers.public_ips.clone()
    }

    fn set_mgmt_fqdn(&mut self, fqdn: String) {
        self.mgmt_fqdn = Some(fqdn);
    }
}

impl MarathonDeploymentData for DeploymentContext {}

impl KubernetesDeploymentData for DeploymentContext {
    fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl EnablePortData for DeploymentContext {
    fn firewall(&self) -> Arc<dyn FirewallApi> {
        self.providers.firewall.clone()
    }

    fn load_balancers(&self) -> Arc<dyn LoadBalancerApi> {
        self.providers.load_balancers.clone()
    }

    fn configured_ports(&self) -> &[ServicePort] {
        &self.ports
    }
}

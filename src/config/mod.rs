// ABOUTME: Configuration types and parsing for berth.yml.
// ABOUTME: Handles YAML parsing, variable resolution, and destination merging.

mod deserialize;
mod env_value;
mod init;
mod orchestrator;
mod ssh;

pub use env_value::{EnvValue, resolve_env_map};
pub use init::init_config;
pub use orchestrator::Orchestrator;
pub use ssh::SshConfig;

use crate::error::{Error, Result};
use crate::types::{ServicePort, WorkloadName};
use deserialize::{
    deserialize_manifests, deserialize_manifests_option, deserialize_ports,
    deserialize_ports_option, deserialize_ssh, deserialize_ssh_option, deserialize_workload_name,
};
use nonempty::NonEmpty;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "berth.yml";
pub const CONFIG_FILENAME_ALT: &str = "berth.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".berth/config.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(deserialize_with = "deserialize_workload_name")]
    pub workload: WorkloadName,

    #[serde(default)]
    pub orchestrator: Orchestrator,

    pub resource_group: String,

    /// Azure subscription to target; the CLI's active one when unset.
    #[serde(default)]
    pub subscription: Option<String>,

    /// Name prefix of the cluster's agent security groups and load balancers.
    #[serde(default = "default_cluster")]
    pub cluster: String,

    /// DNS prefix of the cluster; the master is `<dns_prefix>mgmt`.
    pub dns_prefix: String,

    #[serde(deserialize_with = "deserialize_ssh")]
    pub ssh: SshConfig,

    #[serde(deserialize_with = "deserialize_manifests")]
    pub manifests: NonEmpty<PathBuf>,

    #[serde(default = "default_namespace")]
    pub namespace: String,

    #[serde(default = "default_substitute_variables")]
    pub substitute_variables: bool,

    #[serde(default)]
    pub variables: BTreeMap<String, EnvValue>,

    #[serde(default, deserialize_with = "deserialize_ports")]
    pub ports: Vec<ServicePort>,

    #[serde(default)]
    pub destinations: HashMap<String, Destination>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Destination {
    #[serde(default)]
    pub resource_group: Option<String>,

    #[serde(default)]
    pub subscription: Option<String>,

    #[serde(default)]
    pub cluster: Option<String>,

    #[serde(default)]
    pub dns_prefix: Option<String>,

    #[serde(default, deserialize_with = "deserialize_ssh_option")]
    pub ssh: Option<SshConfig>,

    #[serde(default, deserialize_with = "deserialize_manifests_option")]
    pub manifests: Option<NonEmpty<PathBuf>>,

    #[serde(default)]
    pub namespace: Option<String>,

    #[serde(default, deserialize_with = "deserialize_ports_option")]
    pub ports: Option<Vec<ServicePort>>,

    #[serde(default)]
    pub variables: BTreeMap<String, EnvValue>,
}

fn default_cluster() -> String {
    "dcos".to_string()
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_substitute_variables() -> bool {
    true
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    pub fn for_destination(&self, name: &str) -> Result<Config> {
        let dest = self
            .destinations
            .get(name)
            .ok_or_else(|| Error::UnknownDestination(name.to_string()))?;

        let mut merged = self.clone();

        if let Some(ref resource_group) = dest.resource_group {
            merged.resource_group = resource_group.clone();
        }
        if let Some(ref subscription) = dest.subscription {
            merged.subscription = Some(subscription.clone());
        }
        if let Some(ref cluster) = dest.cluster {
            merged.cluster = cluster.clone();
        }
        if let Some(ref dns_prefix) = dest.dns_prefix {
            merged.dns_prefix = dns_prefix.clone();
        }
        if let Some(ref ssh) = dest.ssh {
            merged.ssh = ssh.clone();
        }
        if let Some(ref manifests) = dest.manifests {
            merged.manifests = manifests.clone();
        }
        if let Some(ref namespace) = dest.namespace {
            merged.namespace = namespace.clone();
        }
        if let Some(ref ports) = dest.ports {
            merged.ports = ports.clone();
        }

        // Deep merge variables
        for (k, v) in &dest.variables {
            merged.variables.insert(k.clone(), v.clone());
        }

        Ok(merged)
    }

    /// Resolve substitution variables, or `None` when substitution is off.
    pub fn substitution_variables(&self) -> Result<Option<BTreeMap<String, String>>> {
        if !self.substitute_variables {
            return Ok(None);
        }
        resolve_env_map(&self.variables).map(Some)
    }
}

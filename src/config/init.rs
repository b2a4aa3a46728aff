// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Creates berth.yml template files.

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::WorkloadName;

use super::{CONFIG_FILENAME, Orchestrator};

pub fn init_config(
    dir: &Path,
    workload: Option<&str>,
    orchestrator: Option<&str>,
    force: bool,
) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    let workload = match workload {
        Some(w) => WorkloadName::new(w).map_err(|e| Error::InvalidConfig(e.to_string()))?,
        None => WorkloadName::new("my-app").map_err(|e| Error::InvalidConfig(e.to_string()))?,
    };

    let orchestrator = match orchestrator {
        Some(o) => o.parse::<Orchestrator>().map_err(Error::InvalidConfig)?,
        None => Orchestrator::default(),
    };

    std::fs::write(&config_path, generate_template_yaml(&workload, orchestrator))?;

    Ok(())
}

fn generate_template_yaml(workload: &WorkloadName, orchestrator: Orchestrator) -> String {
    let manifest = match orchestrator {
        Orchestrator::Marathon => format!("{}.json", workload.leaf()),
        Orchestrator::Kubernetes => format!("{}.yaml", workload.leaf()),
    };
    format!(
        r#"workload: {workload}
orchestrator: {orchestrator}
resource_group: my-resource-group
# subscription: 00000000-0000-0000-0000-000000000000
dns_prefix: my-cluster
# cluster: dcos
ssh:
  user: azureuser
  # key: ~/.ssh/id_rsa
  # SSH host key verification (default: false for security)
  # Set to true to enable Trust-On-First-Use, or pre-populate ~/.ssh/known_hosts
  # trust_first_connection: true
manifests:
  - {manifest}
# ports:
#   - "8080"
#   - "8443:443"
# variables:
#   TAG:
#     env: IMAGE_TAG
#     default: latest
"#
    )
}

// ABOUTME: Kubernetes manifest loading and kind-dispatched create-or-replace.
// ABOUTME: Deployments and Services are applied; every other kind is skipped.

use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use serde_yaml::Value;

use super::{ManifestError, Result};
use crate::pipeline::RunLog;
use crate::ssh::{RemoteShell, shell_quote};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceKind {
    Deployment,
    Service,
    Other(String),
}

impl ResourceKind {
    fn from_kind(kind: &str) -> Self {
        match kind {
            "Deployment" => Self::Deployment,
            "Service" => Self::Service,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Deployment => "Deployment",
            Self::Service => "Service",
            Self::Other(kind) => kind,
        }
    }
}

/// One document of a manifest file.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub kind: ResourceKind,
    pub name: Option<String>,
    pub document: Value,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}/{}", self.kind.as_str(), name),
            None => write!(f, "{}", self.kind.as_str()),
        }
    }
}

/// Split `content` into resources. Empty documents are dropped.
pub fn load_resources(content: &str) -> Result<Vec<Resource>> {
    let mut resources = Vec::new();
    for (index, document) in serde_yaml::Deserializer::from_str(content).enumerate() {
        let value = Value::deserialize(document)?;
        if value.is_null() {
            continue;
        }

        let kind = value
            .get("kind")
            .and_then(Value::as_str)
            .ok_or(ManifestError::MissingKind { index })?;
        let name = value
            .get("metadata")
            .and_then(|m| m.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string);

        resources.push(Resource {
            kind: ResourceKind::from_kind(kind),
            name,
            document: value,
        });
    }
    Ok(resources)
}

/// Creates a resource, or replaces it when it already exists.
#[async_trait]
pub trait ResourceApplier: Send + Sync {
    async fn create_or_replace(&self, resource: &Resource, namespace: &str) -> Result<()>;
}

/// Applies resources with `kubectl` on the cluster master.
pub struct RemoteKubectl<'a> {
    shell: &'a dyn RemoteShell,
}

impl<'a> RemoteKubectl<'a> {
    pub fn new(shell: &'a dyn RemoteShell) -> Self {
        Self { shell }
    }
}

fn remote_file_name(resource: &Resource) -> String {
    let name = resource.name.as_deref().unwrap_or("unnamed");
    format!(
        "berth-{}-{}.yaml",
        resource.kind.as_str().to_ascii_lowercase(),
        name
    )
}

/// Shell command that creates `file` in `namespace`, falling back to replace.
pub fn create_or_replace_command(file: &str, namespace: &str) -> String {
    let file = shell_quote(file);
    let namespace = shell_quote(namespace);
    format!(
        "kubectl create --namespace {namespace} -f {file} 2>/dev/null || kubectl replace --namespace {namespace} -f {file}"
    )
}

#[async_trait]
impl ResourceApplier for RemoteKubectl<'_> {
    async fn create_or_replace(&self, resource: &Resource, namespace: &str) -> Result<()> {
        let file = remote_file_name(resource);
        let yaml = serde_yaml::to_string(&resource.document)?;

        self.shell.copy_to(yaml.as_bytes(), &file).await?;
        let output = self
            .shell
            .exec(&create_or_replace_command(&file, namespace))
            .await?;
        if let Err(e) = self.shell.exec(&format!("rm -f {}", shell_quote(&file))).await {
            tracing::warn!("failed to remove {}: {}", file, e);
        }

        if !output.success() {
            return Err(ManifestError::Apply {
                resource: resource.to_string(),
                message: output.stderr.trim().to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ApplySummary {
    pub applied: usize,
    pub skipped: usize,
}

/// Apply each Deployment and Service in `resources`, logging skipped kinds.
///
/// Stops at the first failure.
pub async fn apply_resources(
    log: &mut RunLog,
    applier: &dyn ResourceApplier,
    resources: &[Resource],
    namespace: &str,
) -> Result<ApplySummary> {
    let mut summary = ApplySummary::default();
    for resource in resources {
        match resource.kind {
            ResourceKind::Deployment | ResourceKind::Service => {
                applier.create_or_replace(resource, namespace).await?;
                log.status(format!("Applied {resource} in namespace {namespace}"));
                summary.applied += 1;
            }
            ResourceKind::Other(_) => {
                log.status(format!("Skipped unsupported resource {resource}"));
                summary.skipped += 1;
            }
        }
    }
    Ok(summary)
}

// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Handles workload names, service ports, manifest lists, and SSH settings.

use nonempty::NonEmpty;
use serde::Deserialize;
use std::path::PathBuf;

use super::SshConfig;
use crate::types::{ServicePort, WorkloadName};

pub fn deserialize_workload_name<'de, D>(deserializer: D) -> Result<WorkloadName, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    WorkloadName::new(&s).map_err(serde::de::Error::custom)
}

fn parse_ports<E: serde::de::Error>(values: Vec<PortEntry>) -> Result<Vec<ServicePort>, E> {
    values
        .into_iter()
        .map(|entry| match entry {
            PortEntry::Number(port) => ServicePort::parse(&port.to_string()),
            PortEntry::Spec(s) => ServicePort::parse(&s),
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(E::custom)
}

pub fn deserialize_ports<'de, D>(deserializer: D) -> Result<Vec<ServicePort>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values: Vec<PortEntry> = Vec::deserialize(deserializer)?;
    parse_ports(values)
}

pub fn deserialize_ports_option<'de, D>(
    deserializer: D,
) -> Result<Option<Vec<ServicePort>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<Vec<PortEntry>> = Option::deserialize(deserializer)?;
    opt.map(parse_ports).transpose()
}

pub fn deserialize_manifests<'de, D>(deserializer: D) -> Result<NonEmpty<PathBuf>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values: Vec<PathBuf> = Vec::deserialize(deserializer)?;
    NonEmpty::from_vec(values)
        .ok_or_else(|| serde::de::Error::custom("at least one manifest is required"))
}

pub fn deserialize_manifests_option<'de, D>(
    deserializer: D,
) -> Result<Option<NonEmpty<PathBuf>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<Vec<PathBuf>> = Option::deserialize(deserializer)?;
    match opt {
        None => Ok(None),
        Some(values) => {
            let nonempty = NonEmpty::from_vec(values).ok_or_else(|| {
                serde::de::Error::custom("destination manifests list cannot be empty")
            })?;
            Ok(Some(nonempty))
        }
    }
}

pub fn deserialize_ssh<'de, D>(deserializer: D) -> Result<SshConfig, D::Error>
where
    D: serde::Deserializer<'de>,
{
    SshEntry::deserialize(deserializer)?
        .into_ssh_config()
        .map_err(serde::de::Error::custom)
}

pub fn deserialize_ssh_option<'de, D>(deserializer: D) -> Result<Option<SshConfig>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<SshEntry> = Option::deserialize(deserializer)?;
    opt.map(SshEntry::into_ssh_config)
        .transpose()
        .map_err(serde::de::Error::custom)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PortEntry {
    Number(u16),
    Spec(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SshEntry {
    Simple(String),
    Detailed(SshConfig),
}

impl SshEntry {
    fn into_ssh_config(self) -> Result<SshConfig, String> {
        match self {
            SshEntry::Simple(s) => SshConfig::parse(&s),
            SshEntry::Detailed(c) => Ok(c),
        }
    }
}

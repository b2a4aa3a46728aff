// ABOUTME: Substitution variable values with environment lookup.
// ABOUTME: A value is either a literal or a reference to an environment variable.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    Literal(String),
    FromEnv {
        #[serde(rename = "env")]
        var: String,
        #[serde(default)]
        default: Option<String>,
    },
}

impl EnvValue {
    pub fn resolve(&self) -> Result<String> {
        self.resolve_with(|name| std::env::var(name).ok())
            .ok_or_else(|| Error::MissingEnvVar(self.env_name().unwrap_or_default().to_string()))
    }

    /// Resolve against `lookup` instead of the process environment.
    ///
    /// `None` only for an unset variable without a default.
    pub fn resolve_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        match self {
            EnvValue::Literal(s) => Some(s.clone()),
            EnvValue::FromEnv { var, default } => lookup(var).or_else(|| default.clone()),
        }
    }

    fn env_name(&self) -> Option<&str> {
        match self {
            EnvValue::Literal(_) => None,
            EnvValue::FromEnv { var, .. } => Some(var),
        }
    }
}

/// Resolve every value, reporting all unset variables at once.
pub fn resolve_env_map(map: &BTreeMap<String, EnvValue>) -> Result<BTreeMap<String, String>> {
    let mut resolved = BTreeMap::new();
    let mut missing = Vec::new();

    for (name, value) in map {
        match value.resolve_with(|var| std::env::var(var).ok()) {
            Some(v) => {
                resolved.insert(name.clone(), v);
            }
            None => missing.extend(value.env_name().map(str::to_string)),
        }
    }

    if !missing.is_empty() {
        return Err(Error::MissingEnvVar(missing.join(", ")));
    }
    Ok(resolved)
}

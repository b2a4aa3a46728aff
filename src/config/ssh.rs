// ABOUTME: SSH settings for reaching the cluster master.
// ABOUTME: Accepts a bare user name or a detailed mapping.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SshConfig {
    pub user: String,
    /// Private key; the SSH agent and default keys are tried when unset.
    #[serde(default)]
    pub key: Option<PathBuf>,
    /// Overrides the orchestrator's default SSH port.
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub trust_first_connection: bool,
    #[serde(default)]
    pub known_hosts: Option<PathBuf>,
    #[serde(default = "default_command_timeout", with = "humantime_serde")]
    pub command_timeout: Duration,
}

fn default_command_timeout() -> Duration {
    Duration::from_secs(300)
}

impl SshConfig {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            key: None,
            port: None,
            trust_first_connection: false,
            known_hosts: None,
            command_timeout: default_command_timeout(),
        }
    }

    /// Parse the short form: `user`.
    pub fn parse(s: &str) -> Result<Self, String> {
        let user = s.trim();
        if user.is_empty() {
            return Err("ssh user cannot be empty".to_string());
        }
        if user.contains(char::is_whitespace) || user.contains('@') {
            return Err(format!("invalid ssh user: {}", user));
        }
        Ok(Self::new(user))
    }
}

// ABOUTME: Error types for port exposure reconciliation.
// ABOUTME: Separates configuration errors from cloud transport and API errors.

use snafu::Snafu;

use crate::types::ParsePortSpecError;

/// The cloud resources are not in a shape the reconciler can work with.
///
/// Raised for malformed destination port specifications and for load balancers
/// that do not have exactly one frontend and one backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid configuration: {message}")]
pub struct InvalidConfigError {
    message: String,
}

impl InvalidConfigError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<ParsePortSpecError> for InvalidConfigError {
    fn from(err: ParsePortSpecError) -> Self {
        InvalidConfigError::new(err.to_string())
    }
}

/// Failures talking to the cloud provider.
#[derive(Debug, thiserror::Error)]
pub enum CloudError {
    #[error("`{command}` exited with status {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: i32,
        stderr: String,
    },

    #[error("failed to parse provider response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("provider request failed: {0}")]
    Request(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Unified reconciliation error.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ReconcileError {
    #[snafu(display("{source}"))]
    InvalidConfig { source: InvalidConfigError },

    #[snafu(display("cloud request failed: {source}"))]
    Cloud { source: CloudError },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileErrorKind {
    /// Malformed or unsupported resource configuration.
    InvalidConfig,
    /// Transport or API failure.
    Cloud,
}

impl ReconcileError {
    pub fn kind(&self) -> ReconcileErrorKind {
        match self {
            ReconcileError::InvalidConfig { .. } => ReconcileErrorKind::InvalidConfig,
            ReconcileError::Cloud { .. } => ReconcileErrorKind::Cloud,
        }
    }
}

impl From<InvalidConfigError> for ReconcileError {
    fn from(source: InvalidConfigError) -> Self {
        ReconcileError::InvalidConfig { source }
    }
}

impl From<CloudError> for ReconcileError {
    fn from(source: CloudError) -> Self {
        ReconcileError::Cloud { source }
    }
}

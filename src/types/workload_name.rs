// ABOUTME: Workload name validation.
// ABOUTME: Accepts Marathon-style paths ("/group/app") whose segments are DNS labels.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkloadNameError {
    #[error("workload name cannot be empty")]
    Empty,

    #[error("workload name contains an empty path segment")]
    EmptySegment,

    #[error("segment '{0}' exceeds maximum length of 63 characters")]
    SegmentTooLong(String),

    #[error("segment '{0}' cannot start or end with a hyphen")]
    HyphenAtEdge(String),

    #[error("invalid character in workload name: '{0}'")]
    InvalidChar(char),
}

/// Name of the workload being deployed.
///
/// A leading slash is optional and not stored, so `/shop/web` and `shop/web`
/// name the same workload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkloadName(String);

impl WorkloadName {
    pub fn new(value: &str) -> Result<Self, WorkloadNameError> {
        let path = value.strip_prefix('/').unwrap_or(value);
        if path.is_empty() {
            return Err(WorkloadNameError::Empty);
        }

        for segment in path.split('/') {
            validate_segment(segment)?;
        }

        Ok(Self(path.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The last path segment, usable as a Kubernetes object name.
    pub fn leaf(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

fn validate_segment(segment: &str) -> Result<(), WorkloadNameError> {
    if segment.is_empty() {
        return Err(WorkloadNameError::EmptySegment);
    }
    if segment.len() > 63 {
        return Err(WorkloadNameError::SegmentTooLong(segment.to_string()));
    }
    if segment.starts_with('-') || segment.ends_with('-') {
        return Err(WorkloadNameError::HyphenAtEdge(segment.to_string()));
    }
    match segment
        .chars()
        .find(|c| !c.is_ascii_lowercase() && !c.is_ascii_digit() && *c != '-')
    {
        Some(c) => Err(WorkloadNameError::InvalidChar(c)),
        None => Ok(()),
    }
}

impl fmt::Display for WorkloadName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.0)
    }
}

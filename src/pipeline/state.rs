// ABOUTME: Deployment state of a pipeline run.
// ABOUTME: HasError and Done are terminal; HasError is sticky once reached.

use std::fmt;

/// Where a pipeline run currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeploymentState {
    #[default]
    Unknown,
    Running,
    Success,
    UnSuccessful,
    HasError,
    Done,
}

impl DeploymentState {
    /// True only for `HasError` and `Done`.
    pub fn is_finished(self) -> bool {
        matches!(self, Self::HasError | Self::Done)
    }

    pub fn has_error(self) -> bool {
        self == Self::HasError
    }

    /// The state after asking to move to `next`.
    ///
    /// Nothing leaves `HasError`.
    pub fn advance(self, next: DeploymentState) -> DeploymentState {
        if self.has_error() { self } else { next }
    }
}

impl fmt::Display for DeploymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unknown => "Unknown",
            Self::Running => "Running",
            Self::Success => "Success",
            Self::UnSuccessful => "UnSuccessful",
            Self::HasError => "HasError",
            Self::Done => "Done",
        };
        f.write_str(s)
    }
}

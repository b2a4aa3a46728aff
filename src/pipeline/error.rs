// ABOUTME: Error types for pipeline execution.
// ABOUTME: Only conditions a command could not turn into a deployment state end up here.

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The table has no entry for a key the driver reached.
    #[error("no command registered for step {0}")]
    UnknownCommand(String),

    /// A command gave up in a way it could not report through the state.
    #[error("{command} aborted: {message}")]
    Aborted {
        command: &'static str,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, PipelineError>;

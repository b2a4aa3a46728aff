// ABOUTME: The Command trait and the base capability every execution context provides.
// ABOUTME: Commands report expected outcomes through the context state, not Err.

use async_trait::async_trait;

use super::error::PipelineError;
use super::log::RunLog;
use super::state::DeploymentState;

/// State and logging access shared by every command's capability trait.
pub trait BaseCommandData: Send {
    fn deployment_state(&self) -> DeploymentState;

    /// Record a new state. Implementations must keep `HasError` sticky.
    fn set_deployment_state(&mut self, state: DeploymentState);

    fn log(&mut self) -> &mut RunLog;

    fn log_status(&mut self, message: impl Into<String>) {
        self.log().status(message);
    }

    /// Log `message` as an error and mark the run as failed.
    fn log_error(&mut self, message: impl Into<String>) {
        self.log().error(message);
        self.set_deployment_state(DeploymentState::HasError);
    }

    /// Log an error and report the step itself as unsuccessful.
    fn fail(&mut self, message: impl Into<String>) {
        self.log_error(message);
        self.set_deployment_state(DeploymentState::UnSuccessful);
    }
}

/// One reusable, stateless deployment step over a context of type `C`.
///
/// `Err` is for conditions the step cannot classify. Unreachable hosts, bad
/// configuration and the like are logged and turned into a state instead.
#[async_trait]
pub trait Command<C>: Send + Sync {
    fn name(&self) -> &'static str;

    async fn execute(&self, ctx: &mut C) -> Result<(), PipelineError>;
}

// ABOUTME: Command transition pipeline: commands, transition table, and driver.
// ABOUTME: Runs deployment steps in sequence, routing on the context's deployment state.

mod command;
mod driver;
mod error;
mod log;
mod state;
pub mod steps;
mod transition;

pub use command::{BaseCommandData, Command};
pub use driver::PipelineDriver;
pub use error::{PipelineError, Result};
pub use log::{LogEntry, LogLevel, RunLog};
pub use state::DeploymentState;
pub use steps::Step;
pub use transition::{TransitionInfo, TransitionTable};

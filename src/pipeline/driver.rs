// ABOUTME: Walks a transition table, running one command at a time.
// ABOUTME: Picks the next step from the context state after every command.

use std::fmt::Debug;
use std::hash::Hash;

use super::command::BaseCommandData;
use super::error::PipelineError;
use super::state::DeploymentState;
use super::transition::TransitionTable;

/// Sequential executor for a [`TransitionTable`].
pub struct PipelineDriver;

impl PipelineDriver {
    /// Run `table` from its start key against `ctx`.
    ///
    /// After each command: `HasError` stops the run; `UnSuccessful` follows
    /// the fail edge, or stops with `HasError` when there is none; any other
    /// state follows the success edge, or finishes with `Done` at the end of
    /// the graph. A missing table entry marks the context failed and returns
    /// [`PipelineError::UnknownCommand`]; an `Err` from a command is logged
    /// and returned as is.
    pub async fn run<K, C>(
        table: &TransitionTable<K, C>,
        ctx: &mut C,
    ) -> Result<DeploymentState, PipelineError>
    where
        K: Copy + Eq + Hash + Debug,
        C: BaseCommandData,
    {
        ctx.set_deployment_state(DeploymentState::Running);
        if ctx.deployment_state().has_error() {
            return Ok(DeploymentState::HasError);
        }

        let mut current = table.start();
        loop {
            let Some(info) = table.get(&current) else {
                ctx.log_error(format!("No command is registered for step {current:?}"));
                return Err(PipelineError::UnknownCommand(format!("{current:?}")));
            };

            let name = info.command.name();
            tracing::debug!(step = ?current, command = name, "executing");
            ctx.log_status(format!("Starting {name}"));

            if let Err(e) = info.command.execute(ctx).await {
                ctx.log_error(format!("{name} aborted: {e}"));
                return Err(e);
            }

            let state = ctx.deployment_state();
            let next = match state {
                DeploymentState::HasError => {
                    ctx.log_status(format!("{name} failed, stopping"));
                    return Ok(DeploymentState::HasError);
                }
                DeploymentState::UnSuccessful => match info.on_fail {
                    Some(next) => next,
                    None => {
                        ctx.log_error(format!("{name} was unsuccessful"));
                        return Ok(ctx.deployment_state());
                    }
                },
                _ => match info.on_success {
                    Some(next) => next,
                    None => {
                        ctx.set_deployment_state(DeploymentState::Done);
                        ctx.log_status(format!("{name} completed, deployment done"));
                        return Ok(ctx.deployment_state());
                    }
                },
            };

            tracing::debug!(from = ?current, to = ?next, %state, "transition");
            ctx.log_status(format!("{name} finished in state {state}, next step {next:?}"));
            current = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Command, RunLog, TransitionInfo};
    use async_trait::async_trait;

    #[derive(Default)]
    struct Ctx {
        state: DeploymentState,
        log: RunLog,
        ran: Vec<&'static str>,
    }

    impl BaseCommandData for Ctx {
        fn deployment_state(&self) -> DeploymentState {
            self.state
        }

        fn set_deployment_state(&mut self, state: DeploymentState) {
            self.state = self.state.advance(state);
        }

        fn log(&mut self) -> &mut RunLog {
            &mut self.log
        }
    }

    struct Step {
        name: &'static str,
        outcome: DeploymentState,
    }

    #[async_trait]
    impl Command<Ctx> for Step {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn execute(&self, ctx: &mut Ctx) -> Result<(), PipelineError> {
            ctx.ran.push(self.name);
            ctx.set_deployment_state(self.outcome);
            Ok(())
        }
    }

    fn step(name: &'static str, outcome: DeploymentState) -> TransitionInfo<u8, Ctx> {
        TransitionInfo::new(Step { name, outcome })
    }

    #[tokio::test]
    async fn unsuccessful_without_fail_edge_ends_in_error() {
        let table = TransitionTable::new(1).with(1, step("a", DeploymentState::UnSuccessful));
        let mut ctx = Ctx::default();

        let state = PipelineDriver::run(&table, &mut ctx).await.unwrap();

        assert_eq!(state, DeploymentState::HasError);
        assert!(ctx.state.has_error());
    }

    #[tokio::test]
    async fn fail_edge_is_followed() {
        let table = TransitionTable::new(1)
            .with(
                1,
                step("a", DeploymentState::UnSuccessful)
                    .on_success(2)
                    .on_fail(3),
            )
            .with(2, step("b", DeploymentState::Success))
            .with(3, step("recover", DeploymentState::Success));
        let mut ctx = Ctx::default();

        let state = PipelineDriver::run(&table, &mut ctx).await.unwrap();

        assert_eq!(state, DeploymentState::Done);
        assert_eq!(ctx.ran, vec!["a", "recover"]);
    }

    #[tokio::test]
    async fn missing_entry_is_unknown_command() {
        let table = TransitionTable::new(1).with(1, step("a", DeploymentState::Success).on_success(9));
        let mut ctx = Ctx::default();

        let err = PipelineDriver::run(&table, &mut ctx).await.unwrap_err();

        assert!(matches!(err, PipelineError::UnknownCommand(ref k) if k == "9"));
        assert!(ctx.state.has_error());
    }
}

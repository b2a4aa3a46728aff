// ABOUTME: Integration tests for the command transition pipeline.
// ABOUTME: Runs small tables of scripted commands through the driver.

use async_trait::async_trait;
use berth::pipeline::{
    BaseCommandData, Command, DeploymentState, PipelineDriver, PipelineError, RunLog,
    TransitionInfo, TransitionTable,
};

#[derive(Default)]
struct TestContext {
    state: DeploymentState,
    log: RunLog,
    ran: Vec<&'static str>,
}

impl BaseCommandData for TestContext {
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

#[derive(Clone, Copy)]
enum Outcome {
    Succeed,
    Error,
    Unsuccessful,
    Leave,
    Raise,
}

struct Scripted {
    name: &'static str,
    outcome: Outcome,
}

fn step(name: &'static str, outcome: Outcome) -> Scripted {
    Scripted { name, outcome }
}

#[async_trait]
impl Command<TestContext> for Scripted {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn execute(&self, ctx: &mut TestContext) -> Result<(), PipelineError> {
        ctx.ran.push(self.name);
        match self.outcome {
            Outcome::Succeed => {
                ctx.log_status(format!("{} done", self.name));
                ctx.set_deployment_state(DeploymentState::Success);
            }
            Outcome::Error => ctx.log_error(format!("{} broke", self.name)),
            Outcome::Unsuccessful => ctx.set_deployment_state(DeploymentState::UnSuccessful),
            Outcome::Leave => {}
            Outcome::Raise => {
                return Err(PipelineError::Aborted {
                    command: self.name,
                    message: "unexpected".to_string(),
                });
            }
        }
        Ok(())
    }
}

fn linear(steps: [Scripted; 3]) -> TransitionTable<&'static str, TestContext> {
    let names: Vec<&'static str> = steps.iter().map(|s| s.name).collect();
    let boxed: Vec<(&'static str, Box<dyn Command<TestContext>>)> = steps
        .into_iter()
        .map(|s| (s.name, Box::new(s) as Box<dyn Command<TestContext>>))
        .collect();
    let table = TransitionTable::chain(boxed).unwrap();
    assert_eq!(table.len(), names.len());
    table
}

mod sequencing {
    use super::*;

    #[tokio::test]
    async fn runs_every_step_in_order_then_finishes() {
        let table = linear([
            step("a", Outcome::Succeed),
            step("b", Outcome::Succeed),
            step("c", Outcome::Succeed),
        ]);
        let mut ctx = TestContext::default();

        let state = PipelineDriver::run(&table, &mut ctx).await.unwrap();

        assert_eq!(ctx.ran, vec!["a", "b", "c"]);
        assert_eq!(state, DeploymentState::Done);
        assert!(state.is_finished());
    }

    #[tokio::test]
    async fn error_in_the_middle_stops_the_run() {
        let table = linear([
            step("a", Outcome::Succeed),
            step("b", Outcome::Error),
            step("c", Outcome::Succeed),
        ]);
        let mut ctx = TestContext::default();

        let state = PipelineDriver::run(&table, &mut ctx).await.unwrap();

        assert_eq!(ctx.ran, vec!["a", "b"]);
        assert!(state.has_error());
        assert_eq!(ctx.log.errors().collect::<Vec<_>>(), vec!["b broke"]);
    }

    #[tokio::test]
    async fn step_that_leaves_state_alone_continues() {
        let table = linear([
            step("a", Outcome::Leave),
            step("b", Outcome::Succeed),
            step("c", Outcome::Leave),
        ]);
        let mut ctx = TestContext::default();

        let state = PipelineDriver::run(&table, &mut ctx).await.unwrap();

        assert_eq!(ctx.ran, vec!["a", "b", "c"]);
        assert_eq!(state, DeploymentState::Done);
    }

    #[tokio::test]
    async fn raised_error_propagates_and_stops() {
        let table = linear([
            step("a", Outcome::Succeed),
            step("b", Outcome::Raise),
            step("c", Outcome::Succeed),
        ]);
        let mut ctx = TestContext::default();

        let err = PipelineDriver::run(&table, &mut ctx).await.unwrap_err();

        assert!(matches!(err, PipelineError::Aborted { command, .. } if command == "b"));
        assert_eq!(ctx.ran, vec!["a", "b"]);
    }
}

mod failure_edges {
    use super::*;

    #[tokio::test]
    async fn unsuccessful_step_takes_its_fail_edge() {
        let table = TransitionTable::new("deploy")
            .with(
                "deploy",
                TransitionInfo::new(step("deploy", Outcome::Unsuccessful))
                    .on_success("expose")
                    .on_fail("cleanup"),
            )
            .with("expose", TransitionInfo::new(step("expose", Outcome::Succeed)))
            .with("cleanup", TransitionInfo::new(step("cleanup", Outcome::Succeed)));
        let mut ctx = TestContext::default();

        let state = PipelineDriver::run(&table, &mut ctx).await.unwrap();

        assert_eq!(ctx.ran, vec!["deploy", "cleanup"]);
        assert_eq!(state, DeploymentState::Done);
    }

    #[tokio::test]
    async fn unsuccessful_without_fail_edge_is_an_error() {
        let table = TransitionTable::new("deploy")
            .with(
                "deploy",
                TransitionInfo::new(step("deploy", Outcome::Unsuccessful)).on_success("expose"),
            )
            .with("expose", TransitionInfo::new(step("expose", Outcome::Succeed)));
        let mut ctx = TestContext::default();

        let state = PipelineDriver::run(&table, &mut ctx).await.unwrap();

        assert_eq!(ctx.ran, vec!["deploy"]);
        assert!(state.has_error());
    }

    #[tokio::test]
    async fn edge_to_a_missing_step_is_unknown_command() {
        let table = TransitionTable::new("deploy").with(
            "deploy",
            TransitionInfo::new(step("deploy", Outcome::Succeed)).on_success("nowhere"),
        );
        let mut ctx = TestContext::default();

        let err = PipelineDriver::run(&table, &mut ctx).await.unwrap_err();

        assert!(matches!(err, PipelineError::UnknownCommand(_)));
        assert!(ctx.state.has_error());
    }
}

#[tokio::test]
async fn context_already_in_error_runs_nothing() {
    let table = linear([
        step("a", Outcome::Succeed),
        step("b", Outcome::Succeed),
        step("c", Outcome::Succeed),
    ]);
    let mut ctx = TestContext::default();
    ctx.log_error("bad config");

    let state = PipelineDriver::run(&table, &mut ctx).await.unwrap();

    assert!(ctx.ran.is_empty());
    assert!(state.has_error());
}

// ABOUTME: Deploy command implementation.
// ABOUTME: Runs the orchestrator's pipeline against the live cluster and reports the outcome.

use berth::config::Config;
use berth::context::{DeploymentContext, Providers};
use berth::error::{Error, Result};
use berth::network::AzCli;
use berth::output::Output;
use berth::pipeline::{DeploymentState, PipelineDriver, RunLog};
use std::path::Path;

/// Deploy the configured workload through the `az` CLI and SSH.
pub async fn deploy(config: Config, workspace: &Path, mut output: Output) -> Result<()> {
    output.start_timer();
    output.progress(&format!(
        "Deploying {} to {} cluster {} in resource group {}",
        config.workload, config.orchestrator, config.dns_prefix, config.resource_group
    ));

    let providers = Providers::azure(AzCli::new().with_subscription(config.subscription.clone()));
    let mut ctx = DeploymentContext::new(&config, workspace, providers, RunLog::with_output(output))?;
    let table = ctx.pipeline();

    let state = PipelineDriver::run(&table, &mut ctx).await?;
    tracing::debug!(%state, "pipeline finished");

    let log = ctx.into_log();
    let Some(output) = log.output() else {
        return finish(state);
    };

    for warning in log.diagnostics().warnings() {
        output.warning(&warning.message);
    }

    finish(state)?;
    output.success("Deployment complete!");
    Ok(())
}

fn finish(state: DeploymentState) -> Result<()> {
    if state.has_error() {
        return Err(Error::DeploymentFailed(state));
    }
    Ok(())
}

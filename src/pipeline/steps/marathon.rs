// ABOUTME: Deploys Marathon app definitions through the DC/OS master.
// ABOUTME: Uploads each definition, deletes the old app, then posts the new one.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;

use super::{ClusterAccess, MissingManifests, load_manifests};
use crate::diagnostics::Warning;
use crate::manifest::marathon::{
    self, MARATHON_SSH_PORT, delete_app_command, deploy_app_command, remove_file_command,
};
use crate::manifest::{MarathonApp, parse_app};
use crate::pipeline::{Command, DeploymentState, PipelineError};
use crate::ssh::{self, RemoteShell};

pub trait MarathonDeploymentData: ClusterAccess {
    /// Remote name for the next uploaded definition.
    fn deployment_file_name(&self) -> String {
        marathon::deployment_file_name(Utc::now())
    }
}

pub struct MarathonDeploymentCommand;

struct PendingApp {
    path: PathBuf,
    content: String,
    app: MarathonApp,
}

/// Status code of the last HTTP response in `curl -i` output.
fn http_status(output: &str) -> Option<u16> {
    output
        .lines()
        .filter(|line| line.starts_with("HTTP/"))
        .last()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|code| code.parse().ok())
}

async fn deploy_apps<C: MarathonDeploymentData>(
    ctx: &mut C,
    shell: &dyn RemoteShell,
    apps: &[PendingApp],
) -> ssh::Result<()> {
    for pending in apps {
        let file = ctx.deployment_file_name();
        ctx.log_status(format!(
            "Copying Marathon app definition {} to remote file {}",
            pending.path.display(),
            file
        ));
        shell.copy_to(pending.content.as_bytes(), &file).await?;

        ctx.log_status(format!(
            "Deleting application {} if it exists",
            pending.app.id
        ));
        shell.exec(&delete_app_command(&pending.app.id)).await?;

        ctx.log_status(format!(
            "Deploying {} with app id {} to Marathon",
            file, pending.app.id
        ));
        let output = shell.exec(&deploy_app_command(&file)).await?;

        ctx.log_status(format!("Removing temporary remote file {file}"));
        if let Err(e) = shell.exec(&remove_file_command(&file)).await {
            ctx.log()
                .warn(Warning::temp_file_cleanup(format!("Failed to remove {file}: {e}")));
        }

        if !output.success() {
            return Err(ssh::Error::CommandFailed(format!(
                "posting {} exited with {}: {}",
                file,
                output.exit_code,
                output.stderr.trim()
            )));
        }
        if let Some(status) = http_status(&output.stdout).filter(|s| *s >= 400) {
            return Err(ssh::Error::CommandFailed(format!(
                "Marathon rejected {} with HTTP {}",
                pending.app.id, status
            )));
        }
    }
    Ok(())
}

#[async_trait]
impl<C: MarathonDeploymentData> Command<C> for MarathonDeploymentCommand {
    fn name(&self) -> &'static str {
        "MarathonDeployment"
    }

    async fn execute(&self, ctx: &mut C) -> Result<(), PipelineError> {
        let Some(host) = ctx.mgmt_fqdn().map(str::to_string) else {
            ctx.log_error("Management FQDN is not known");
            return Ok(());
        };

        let Some(loaded) = load_manifests(ctx, MissingManifests::Warn) else {
            return Ok(());
        };

        let mut apps = Vec::with_capacity(loaded.len());
        for (path, content) in loaded {
            match parse_app(&content) {
                Ok(app) => apps.push(PendingApp { path, content, app }),
                Err(e) => {
                    ctx.log_error(format!("{}: {e}", path.display()));
                    return Ok(());
                }
            }
        }

        let target = ctx.ssh_target(&host, MARATHON_SSH_PORT);
        let connector = ctx.connector();
        ctx.log_status(format!("Connecting to {}:{}", target.host, target.port));

        let shell = match connector.connect(&target).await {
            Ok(shell) => shell,
            Err(e) => {
                ctx.fail(format!("Error deploying application to Marathon: {e}"));
                return Ok(());
            }
        };

        let result = deploy_apps(ctx, shell.as_ref(), &apps).await;

        if let Err(e) = shell.close().await {
            ctx.log()
                .warn(Warning::ssh_disconnect(format!("Failed to close SSH session: {e}")));
        }

        match result {
            Ok(()) => ctx.set_deployment_state(DeploymentState::Success),
            Err(e) => ctx.fail(format!("Error deploying application to Marathon: {e}")),
        }
        Ok(())
    }
}

// ABOUTME: Remote shell seam used by deployment commands.
// ABOUTME: Abstracts connect/copy/exec/close so commands can run against mocks.

use async_trait::async_trait;

use super::client::{CommandOutput, Session, SshTarget};
use super::error::Result;

/// An open connection to a remote host.
#[async_trait]
pub trait RemoteShell: Send + Sync {
    /// Upload `content` to `remote_name`.
    async fn copy_to(&self, content: &[u8], remote_name: &str) -> Result<()>;

    async fn exec(&self, command: &str) -> Result<CommandOutput>;

    async fn close(&self) -> Result<()>;
}

/// Opens [`RemoteShell`]s.
#[async_trait]
pub trait RemoteConnector: Send + Sync {
    async fn connect(&self, target: &SshTarget) -> Result<Box<dyn RemoteShell>>;
}

/// Connects over SSH with russh.
#[derive(Debug, Clone, Copy, Default)]
pub struct SshConnector;

#[async_trait]
impl RemoteConnector for SshConnector {
    async fn connect(&self, target: &SshTarget) -> Result<Box<dyn RemoteShell>> {
        let session = Session::connect(target.clone()).await?;
        Ok(Box::new(session))
    }
}

#[async_trait]
impl RemoteShell for Session {
    async fn copy_to(&self, content: &[u8], remote_name: &str) -> Result<()> {
        Session::copy_to(self, content, remote_name).await
    }

    async fn exec(&self, command: &str) -> Result<CommandOutput> {
        Session::exec(self, command).await
    }

    async fn close(&self) -> Result<()> {
        self.disconnect().await
    }
}

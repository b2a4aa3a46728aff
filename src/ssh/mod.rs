// ABOUTME: SSH access to cluster masters.
// ABOUTME: Supports SSH agent and key-based authentication with known_hosts verification.

mod client;
mod error;
mod remote;

pub use client::{CommandOutput, Session, SshTarget, shell_quote};
pub use error::{Error, Result};
pub use remote::{RemoteConnector, RemoteShell, SshConnector};

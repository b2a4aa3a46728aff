// ABOUTME: Scripted remote shell and connector recording every call.
// ABOUTME: Commands get queued outputs in order, then a default success.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use berth::ssh::{CommandOutput, Error, RemoteConnector, RemoteShell, Result, SshTarget};
use parking_lot::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Copy { name: String, content: String },
    Exec(String),
    Close,
}

#[derive(Default)]
pub struct ShellState {
    pub calls: Mutex<Vec<Call>>,
    pub outputs: Mutex<VecDeque<CommandOutput>>,
    /// Commands containing this text fail at the transport level.
    pub fail_matching: Mutex<Option<String>>,
    pub fail_close: Mutex<bool>,
}

impl ShellState {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn execs(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Exec(cmd) => Some(cmd),
                _ => None,
            })
            .collect()
    }

    pub fn copies(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Copy { name, content } => Some((name, content)),
                _ => None,
            })
            .collect()
    }

    pub fn closed(&self) -> bool {
        self.calls().contains(&Call::Close)
    }

    pub fn queue(&self, output: CommandOutput) {
        self.outputs.lock().push_back(output);
    }
}

pub fn http_output(status: u16) -> CommandOutput {
    CommandOutput {
        exit_code: 0,
        stdout: format!("HTTP/1.1 {status} Status\r\n\r\n{{}}"),
        stderr: String::new(),
    }
}

pub struct MockShell {
    state: Arc<ShellState>,
}

#[async_trait]
impl RemoteShell for MockShell {
    async fn copy_to(&self, content: &[u8], remote_name: &str) -> Result<()> {
        self.state.calls.lock().push(Call::Copy {
            name: remote_name.to_string(),
            content: String::from_utf8_lossy(content).into_owned(),
        });
        Ok(())
    }

    async fn exec(&self, command: &str) -> Result<CommandOutput> {
        self.state.calls.lock().push(Call::Exec(command.to_string()));
        if let Some(needle) = self.state.fail_matching.lock().as_deref()
            && command.contains(needle)
        {
            return Err(Error::CommandFailed(format!("{command}: broken pipe")));
        }
        Ok(self
            .state
            .outputs
            .lock()
            .pop_front()
            .unwrap_or_else(|| http_output(200)))
    }

    async fn close(&self) -> Result<()> {
        self.state.calls.lock().push(Call::Close);
        if *self.state.fail_close.lock() {
            return Err(Error::Connection("reset by peer".to_string()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MockConnector {
    pub state: Arc<ShellState>,
    pub targets: Mutex<Vec<SshTarget>>,
    pub refuse: Mutex<bool>,
}

#[async_trait]
impl RemoteConnector for MockConnector {
    async fn connect(&self, target: &SshTarget) -> Result<Box<dyn RemoteShell>> {
        self.targets.lock().push(target.clone());
        if *self.refuse.lock() {
            return Err(Error::Connection(format!("{}:{} refused", target.host, target.port)));
        }
        Ok(Box::new(MockShell {
            state: self.state.clone(),
        }))
    }
}

//! Runs Dokku commands on the host through the system `ssh` client.
//!
//! Tenant commands go to the restricted `dokku` account, whose login shell
//! is the Dokku CLI itself. Root commands log in as `root` and call the
//! `dokku` binary explicitly.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use dokku_core::{CommandExecutor, CommandOutput, Role, SshSettings};

/// Output beyond this size is cut before it reaches the parsers.
const MAX_OUTPUT_SIZE: usize = 4 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct SshExecutor {
    settings: SshSettings,
    program: String,
}

impl SshExecutor {
    pub fn new(settings: SshSettings) -> Self {
        Self {
            settings,
            program: "ssh".to_string(),
        }
    }

    /// Use a different client binary.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Arguments passed to the ssh client for one command.
    pub fn args(&self, command: &str, role: Role) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "StrictHostKeyChecking=no".to_string(),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.settings.timeout.as_secs().max(1)),
            "-p".to_string(),
            self.settings.port.to_string(),
        ];

        if let Some(key) = &self.settings.key_path {
            args.push("-i".to_string());
            args.push(key.clone());
        }

        args.push(format!("{}@{}", role.ssh_user(), self.settings.hostname));
        args.push(match role {
            Role::Tenant => command.to_string(),
            Role::Root => format!("dokku {command}"),
        });

        args
    }
}

fn lossy(mut bytes: Vec<u8>, stream: &str) -> String {
    if bytes.len() > MAX_OUTPUT_SIZE {
        bytes.truncate(MAX_OUTPUT_SIZE);
        warn!("ssh {} truncated to {} bytes", stream, MAX_OUTPUT_SIZE);
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

#[async_trait]
impl CommandExecutor for SshExecutor {
    async fn execute(&self, command: &str, role: Role) -> CommandOutput {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.args(command, role))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(%role, host = %self.settings.hostname, command, "running remote command");

        let output = match timeout(self.settings.timeout, cmd.output()).await {
            Err(_) => {
                warn!(%role, command, timeout = ?self.settings.timeout, "remote command timed out");
                return CommandOutput::failed(format!(
                    "Command timed out after {} seconds",
                    self.settings.timeout.as_secs()
                ));
            }
            Ok(Err(e)) => {
                warn!(%role, command, error = %e, "failed to start ssh client");
                return CommandOutput::failed(format!("Failed to run ssh: {e}"));
            }
            Ok(Ok(output)) => output,
        };

        let stdout = lossy(output.stdout, "stdout");
        let stderr = lossy(output.stderr, "stderr");

        if output.status.success() {
            return CommandOutput::ok(stdout);
        }

        debug!(%role, command, status = ?output.status.code(), "remote command failed");
        if stderr.trim().is_empty() {
            CommandOutput::failed(stdout)
        } else {
            CommandOutput::failed(stderr)
        }
    }
}

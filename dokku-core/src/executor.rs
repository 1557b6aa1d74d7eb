//! The remote command channel contract.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Which account a command runs as on the Dokku host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The restricted `dokku` user; commands are Dokku subcommands.
    Tenant,
    /// `root`; the command is prefixed with `dokku `.
    Root,
}

impl Role {
    pub fn ssh_user(&self) -> &'static str {
        match self {
            Role::Tenant => "dokku",
            Role::Root => "root",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ssh_user())
    }
}

/// Outcome of one remote command. On failure `output` holds the error text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    pub success: bool,
    pub output: String,
}

impl CommandOutput {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    pub fn failed(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
        }
    }
}

/// Runs a command on the Dokku host.
///
/// Implementations bound every call with a timeout. Timeouts and connection
/// failures are reported as `success: false`, never as panics or errors.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, command: &str, role: Role) -> CommandOutput;
}

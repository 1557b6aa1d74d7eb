#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use dokku_commands::Commands;
use dokku_core::{CommandExecutor, CommandOutput, QuotaUpdate, ResourceStore, Role, Tenant};
use dokku_store::MemoryStore;

/// Answers commands by prefix and records every call.
#[derive(Default)]
pub struct ScriptedExecutor {
    responses: Mutex<Vec<(String, CommandOutput)>>,
    calls: Mutex<Vec<(String, Role)>>,
}

impl ScriptedExecutor {
    /// The most recent matching prefix wins; unmatched commands succeed
    /// with empty output.
    pub fn respond(&self, prefix: &str, output: CommandOutput) {
        self.responses.lock().push((prefix.to_string(), output));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(c, _)| c.clone()).collect()
    }

    pub fn calls_as(&self, role: Role) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter(|(_, r)| *r == role)
            .map(|(c, _)| c.clone())
            .collect()
    }
}

#[async_trait]
impl CommandExecutor for ScriptedExecutor {
    async fn execute(&self, command: &str, role: Role) -> CommandOutput {
        self.calls.lock().push((command.to_string(), role));
        self.responses
            .lock()
            .iter()
            .rev()
            .find(|(prefix, _)| command.starts_with(prefix.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or_else(|| CommandOutput::ok(""))
    }
}

pub struct Harness {
    pub cmds: Commands,
    pub executor: Arc<ScriptedExecutor>,
    pub store: Arc<MemoryStore>,
    pub tenant: Tenant,
}

pub async fn harness(quota: u32) -> Harness {
    let executor = Arc::new(ScriptedExecutor::default());
    let store = Arc::new(MemoryStore::new());

    store.create_tenant("dev@example.com", "token").await.unwrap();
    let tenant = store
        .update_quota(
            "dev@example.com",
            QuotaUpdate {
                apps_quota: Some(quota),
                services_quota: Some(quota),
                networks_quota: Some(quota),
                storage_quota: Some(quota),
            },
        )
        .await
        .unwrap();

    let cmds = Commands::new(executor.clone(), store.clone()).with_volume_dir("/data/volumes");

    Harness {
        cmds,
        executor,
        store,
        tenant,
    }
}

pub async fn second_tenant(h: &Harness, email: &str) -> Tenant {
    h.store.create_tenant(email, &format!("{email}-token")).await.unwrap();
    h.store
        .update_quota(
            email,
            QuotaUpdate {
                apps_quota: Some(5),
                ..Default::default()
            },
        )
        .await
        .unwrap()
}

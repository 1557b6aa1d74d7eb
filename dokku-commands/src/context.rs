use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use dokku_core::{
    CommandExecutor, CommandOutput, DokkuError, Namespacing, ResourceKind, ResourceNamer,
    ResourceStore, Role, Tenant,
};

/// Response envelope shared by every command service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    pub success: bool,
    pub result: Value,
}

impl CommandResult {
    pub fn ok(result: impl Into<Value>) -> Self {
        Self {
            success: true,
            result: result.into(),
        }
    }

    pub fn failed(result: impl Into<Value>) -> Self {
        Self {
            success: false,
            result: result.into(),
        }
    }

    /// Raw command output as the result, success or not.
    pub fn raw(output: CommandOutput) -> Self {
        Self {
            success: output.success,
            result: Value::String(output.output),
        }
    }

    /// Parse successful output with `parse`; failures keep the raw text.
    pub fn parsed<T, F>(output: CommandOutput, parse: F) -> Result<Self>
    where
        T: Serialize,
        F: FnOnce(&str) -> T,
    {
        if !output.success {
            return Ok(Self::failed(output.output));
        }
        Ok(Self::ok(serde_json::to_value(parse(&output.output))?))
    }
}

/// Everything a command service needs besides the caller.
#[derive(Clone)]
pub struct Commands {
    executor: Arc<dyn CommandExecutor>,
    store: Arc<dyn ResourceStore>,
    namespacing: Namespacing,
    volume_dir: String,
}

impl Commands {
    pub fn new(executor: Arc<dyn CommandExecutor>, store: Arc<dyn ResourceStore>) -> Self {
        Self {
            executor,
            store,
            namespacing: Namespacing::default(),
            volume_dir: "/var/lib/dokku/data/storage".to_string(),
        }
    }

    pub fn with_namespacing(mut self, namespacing: Namespacing) -> Self {
        self.namespacing = namespacing;
        self
    }

    pub fn with_volume_dir(mut self, volume_dir: impl Into<String>) -> Self {
        self.volume_dir = volume_dir.into();
        self
    }

    pub fn store(&self) -> &dyn ResourceStore {
        self.store.as_ref()
    }

    pub fn namespacing(&self) -> Namespacing {
        self.namespacing
    }

    pub fn volume_dir(&self) -> &str {
        &self.volume_dir
    }

    pub fn namer(&self, tenant: &Tenant) -> ResourceNamer {
        ResourceNamer::for_tenant(tenant, self.namespacing)
    }

    pub async fn run(&self, command: &str) -> CommandOutput {
        self.executor.execute(command, Role::Tenant).await
    }

    pub async fn run_as_root(&self, command: &str) -> CommandOutput {
        self.executor.execute(command, Role::Root).await
    }

    /// 404 unless `tenant` owns `name` (a store name) of `kind`.
    pub async fn require_owned(&self, tenant: &Tenant, name: &str, kind: ResourceKind) -> Result<()> {
        let owned = self
            .store
            .owns(&tenant.email, name, kind)
            .await
            .map_err(|e| e.into_anyhow())?;
        if !owned {
            return Err(DokkuError::not_found(not_found_message(kind)).into_anyhow());
        }
        Ok(())
    }

    /// Reserve `name`, run `command`, and release the reservation again if
    /// the remote side did not create anything.
    pub async fn create_reserved(
        &self,
        tenant: &Tenant,
        name: &str,
        kind: ResourceKind,
        command: &str,
    ) -> Result<CommandResult> {
        self.store
            .reserve(&tenant.email, name, kind)
            .await
            .map_err(|e| e.into_anyhow())?;

        let output = self.run(command).await;
        if !output.success {
            warn!(email = %tenant.email, %kind, name, "remote create failed, releasing reservation");
            self.store
                .release(&tenant.email, name, kind)
                .await
                .map_err(|e| e.into_anyhow())?;
        }

        Ok(CommandResult::raw(output))
    }

    /// Release `name` and run the remote destroy command.
    pub async fn destroy_reserved(
        &self,
        tenant: &Tenant,
        name: &str,
        kind: ResourceKind,
        command: &str,
    ) -> Result<CommandResult> {
        self.require_owned(tenant, name, kind).await?;
        self.store
            .release(&tenant.email, name, kind)
            .await
            .map_err(|e| e.into_anyhow())?;

        Ok(CommandResult::raw(self.run(command).await))
    }
}

pub(crate) fn not_found_message(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::App => "App does not exist",
        ResourceKind::Service => "Database does not exist",
        ResourceKind::Network => "Network does not exist",
        ResourceKind::Storage => "Storage does not exist",
    }
}

//! Application environment variables.

use anyhow::Result;

use dokku_core::parsers::parse_env_vars;
use dokku_core::Tenant;

use crate::apps::owned_app;
use crate::context::{CommandResult, Commands};

pub async fn list(cmds: &Commands, tenant: &Tenant, app: &str) -> Result<CommandResult> {
    let system = owned_app(cmds, tenant, app).await?;
    let output = cmds.run(&format!("config:show {system}")).await;
    CommandResult::parsed(output, parse_env_vars)
}

/// Changes only take effect after [`apply`].
pub async fn set(cmds: &Commands, tenant: &Tenant, app: &str, key: &str, value: &str) -> Result<CommandResult> {
    let system = owned_app(cmds, tenant, app).await?;
    let output = cmds
        .run(&format!("config:set --no-restart {system} {key}={value}"))
        .await;
    Ok(CommandResult::raw(output))
}

pub async fn unset(cmds: &Commands, tenant: &Tenant, app: &str, key: &str) -> Result<CommandResult> {
    let system = owned_app(cmds, tenant, app).await?;
    let output = cmds
        .run(&format!("config:unset --no-restart {system} {key}"))
        .await;
    Ok(CommandResult::raw(output))
}

pub async fn apply(cmds: &Commands, tenant: &Tenant, app: &str) -> Result<CommandResult> {
    let system = owned_app(cmds, tenant, app).await?;
    Ok(CommandResult::raw(cmds.run(&format!("ps:rebuild {system}")).await))
}

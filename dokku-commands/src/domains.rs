use anyhow::Result;

use dokku_core::Tenant;

use crate::apps::owned_app;
use crate::context::{CommandResult, Commands};

pub async fn set(cmds: &Commands, tenant: &Tenant, app: &str, domain: &str) -> Result<CommandResult> {
    let system = owned_app(cmds, tenant, app).await?;
    Ok(CommandResult::raw(
        cmds.run(&format!("domains:set {system} {domain}")).await,
    ))
}

pub async fn remove(cmds: &Commands, tenant: &Tenant, app: &str, domain: &str) -> Result<CommandResult> {
    let system = owned_app(cmds, tenant, app).await?;
    Ok(CommandResult::raw(
        cmds.run(&format!("domains:remove {system} {domain}")).await,
    ))
}

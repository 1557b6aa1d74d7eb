//! Let's Encrypt certificates. `set_email` and `enable_auto_renewal` are
//! host-wide and reserved for admins.

use anyhow::Result;

use dokku_core::{CommandOutput, Tenant};

use crate::apps::owned_app;
use crate::context::{CommandResult, Commands};

pub async fn set_email(cmds: &Commands, email: &str) -> Result<CommandResult> {
    Ok(CommandResult::raw(
        cmds.run(&format!("config:set --global DOKKU_LETSENCRYPT_EMAIL={email}"))
            .await,
    ))
}

/// The plugin exits zero even when the ACME challenge fails.
pub async fn enable(cmds: &Commands, tenant: &Tenant, app: &str) -> Result<CommandResult> {
    let system = owned_app(cmds, tenant, app).await?;
    let output = cmds.run(&format!("letsencrypt:enable {system}")).await;

    if output.output.contains("retrieval failed") {
        return Ok(CommandResult::raw(CommandOutput::failed(output.output)));
    }
    Ok(CommandResult::raw(output))
}

pub async fn disable(cmds: &Commands, tenant: &Tenant, app: &str) -> Result<CommandResult> {
    let system = owned_app(cmds, tenant, app).await?;
    Ok(CommandResult::raw(
        cmds.run(&format!("letsencrypt:disable {system}")).await,
    ))
}

pub async fn enable_auto_renewal(cmds: &Commands) -> Result<CommandResult> {
    Ok(CommandResult::raw(cmds.run("letsencrypt:cron-job --add").await))
}

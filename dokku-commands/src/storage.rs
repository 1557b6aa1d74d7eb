//! Persistent storage mounted at `/app`, one directory per app under the
//! configured volume root. Each mount takes one storage slot.

use anyhow::Result;
use tracing::warn;

use dokku_core::{ResourceKind, Tenant};

use crate::apps::owned_app;
use crate::context::{CommandResult, Commands};

fn mount_spec(cmds: &Commands, app_system: &str) -> String {
    format!("{}/{app_system}:/app", cmds.volume_dir().trim_end_matches('/'))
}

pub async fn mount(cmds: &Commands, tenant: &Tenant, app: &str) -> Result<CommandResult> {
    let system = owned_app(cmds, tenant, app).await?;
    cmds.create_reserved(
        tenant,
        &system,
        ResourceKind::Storage,
        &format!("storage:mount {system} {}", mount_spec(cmds, &system)),
    )
    .await
}

pub async fn unmount(cmds: &Commands, tenant: &Tenant, app: &str) -> Result<CommandResult> {
    let system = owned_app(cmds, tenant, app).await?;
    cmds.destroy_reserved(
        tenant,
        &system,
        ResourceKind::Storage,
        &format!("storage:unmount {system} {}", mount_spec(cmds, &system)),
    )
    .await
}

/// Release the storage slot held for `app_system`, if any, and unmount it
/// on the host. A failed unmount is logged and otherwise ignored.
pub(crate) async fn release_mount(cmds: &Commands, tenant: &Tenant, app_system: &str) -> Result<()> {
    let store = cmds.store();
    let mounted = store
        .owns(&tenant.email, app_system, ResourceKind::Storage)
        .await
        .map_err(|e| e.into_anyhow())?;
    if !mounted {
        return Ok(());
    }

    store
        .release(&tenant.email, app_system, ResourceKind::Storage)
        .await
        .map_err(|e| e.into_anyhow())?;

    let output = cmds
        .run(&format!("storage:unmount {app_system} {}", mount_spec(cmds, app_system)))
        .await;
    if !output.success {
        warn!(email = %tenant.email, app = app_system, output = %output.output, "storage unmount failed");
    }
    Ok(())
}

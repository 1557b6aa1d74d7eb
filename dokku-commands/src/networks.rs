use anyhow::Result;
use futures::future::join_all;

use dokku_core::parsers::parse_network_info;
use dokku_core::{ResourceKind, Tenant};

use crate::apps::owned_app;
use crate::context::{CommandResult, Commands};

async fn owned_network(cmds: &Commands, tenant: &Tenant, name: &str) -> Result<String> {
    let system = cmds.namer(tenant).system(name, ResourceKind::Network);
    cmds.require_owned(tenant, &system, ResourceKind::Network).await?;
    Ok(system)
}

pub async fn list(cmds: &Commands, tenant: &Tenant) -> Result<CommandResult> {
    let namer = cmds.namer(tenant);
    let networks: Vec<String> = cmds
        .store()
        .owned_resources(&tenant.email, ResourceKind::Network)
        .await
        .map_err(|e| e.into_anyhow())?
        .iter()
        .map(|n| namer.display(&n.name, ResourceKind::Network))
        .collect();

    Ok(CommandResult::ok(networks))
}

pub async fn create(cmds: &Commands, tenant: &Tenant, name: &str) -> Result<CommandResult> {
    let system = cmds.namer(tenant).system(name, ResourceKind::Network);
    cmds.create_reserved(
        tenant,
        &system,
        ResourceKind::Network,
        &format!("network:create {system}"),
    )
    .await
}

pub async fn delete(cmds: &Commands, tenant: &Tenant, name: &str) -> Result<CommandResult> {
    let system = cmds.namer(tenant).system(name, ResourceKind::Network);
    cmds.destroy_reserved(
        tenant,
        &system,
        ResourceKind::Network,
        &format!("--force network:destroy {system}"),
    )
    .await
}

/// The tenant's apps whose network report points at `name`.
pub async fn linked_apps(cmds: &Commands, tenant: &Tenant, name: &str) -> Result<CommandResult> {
    let system = owned_network(cmds, tenant, name).await?;
    let namer = cmds.namer(tenant);
    let network = namer.display(&system, ResourceKind::Network);

    let apps = cmds
        .store()
        .owned_resources(&tenant.email, ResourceKind::App)
        .await
        .map_err(|e| e.into_anyhow())?;

    let commands: Vec<String> = apps
        .iter()
        .map(|app| format!("network:report {}", app.name))
        .collect();
    let reports = join_all(commands.iter().map(|command| cmds.run(command))).await;

    let linked: Vec<String> = apps
        .iter()
        .zip(reports)
        .filter(|(_, report)| report.success)
        .filter(|(_, report)| {
            parse_network_info(&report.output, &namer).network.as_deref() == Some(network.as_str())
        })
        .map(|(app, _)| namer.display(&app.name, ResourceKind::App))
        .collect();

    Ok(CommandResult::ok(linked))
}

pub async fn attach(cmds: &Commands, tenant: &Tenant, name: &str, app: &str) -> Result<CommandResult> {
    let system = owned_network(cmds, tenant, name).await?;
    let app_system = owned_app(cmds, tenant, app).await?;
    Ok(CommandResult::raw(
        cmds.run(&format!("network:set {app_system} attach-post-create {system}"))
            .await,
    ))
}

//! Database services provided by Dokku datastore plugins.
//!
//! Services are stored as `"{plugin}:{system_name}"` so the same name can
//! exist once per plugin.

use std::collections::BTreeMap;

use anyhow::Result;
use serde_json::{json, Value};

use dokku_core::naming::{service_key, split_service_key};
use dokku_core::parsers::{parse_list, parse_plugins, parse_service_info};
use dokku_core::{DokkuError, ResourceKind, Tenant};

use crate::apps::owned_app;
use crate::context::{CommandResult, Commands};

/// Datastore plugins tenants may use.
pub const PLUGINS: [&str; 9] = [
    "postgres",
    "mysql",
    "mongodb",
    "redis",
    "mariadb",
    "couchdb",
    "cassandra",
    "elasticsearch",
    "influxdb",
];

fn check_plugin(plugin: &str) -> Result<()> {
    if PLUGINS.contains(&plugin) {
        Ok(())
    } else {
        Err(DokkuError::not_found("Plugin not found").into_anyhow())
    }
}

/// Resolve and authorize a database; returns its system name.
async fn owned_database(cmds: &Commands, tenant: &Tenant, plugin: &str, name: &str) -> Result<String> {
    check_plugin(plugin)?;
    let system = cmds.namer(tenant).system(name, ResourceKind::Service);
    cmds.require_owned(tenant, &service_key(plugin, &system), ResourceKind::Service)
        .await?;
    Ok(system)
}

pub async fn create(cmds: &Commands, tenant: &Tenant, plugin: &str, name: &str) -> Result<CommandResult> {
    check_plugin(plugin)?;
    let system = cmds.namer(tenant).system(name, ResourceKind::Service);
    cmds.create_reserved(
        tenant,
        &service_key(plugin, &system),
        ResourceKind::Service,
        &format!("{plugin}:create {system}"),
    )
    .await
}

pub async fn delete(cmds: &Commands, tenant: &Tenant, plugin: &str, name: &str) -> Result<CommandResult> {
    check_plugin(plugin)?;
    let system = cmds.namer(tenant).system(name, ResourceKind::Service);
    cmds.destroy_reserved(
        tenant,
        &service_key(plugin, &system),
        ResourceKind::Service,
        &format!("--force {plugin}:destroy {system}"),
    )
    .await
}

/// The tenant's databases grouped by plugin, optionally for one plugin.
pub async fn list(cmds: &Commands, tenant: &Tenant, plugin: Option<&str>) -> Result<CommandResult> {
    if let Some(plugin) = plugin {
        check_plugin(plugin)?;
    }

    let namer = cmds.namer(tenant);
    let services = cmds
        .store()
        .owned_resources(&tenant.email, ResourceKind::Service)
        .await
        .map_err(|e| e.into_anyhow())?;

    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for service in &services {
        let Some((owner_plugin, system)) = split_service_key(&service.name) else {
            continue;
        };
        if plugin.is_some_and(|p| p != owner_plugin) {
            continue;
        }
        grouped
            .entry(owner_plugin.to_string())
            .or_default()
            .push(namer.display(system, ResourceKind::Service));
    }

    Ok(CommandResult::ok(serde_json::to_value(grouped)?))
}

pub async fn exists(cmds: &Commands, tenant: &Tenant, plugin: &str, name: &str) -> Result<CommandResult> {
    check_plugin(plugin)?;
    let system = cmds.namer(tenant).system(name, ResourceKind::Service);
    let owned = cmds
        .store()
        .owns(&tenant.email, &service_key(plugin, &system), ResourceKind::Service)
        .await
        .map_err(|e| e.into_anyhow())?;
    Ok(CommandResult::ok(owned))
}

pub async fn info(cmds: &Commands, tenant: &Tenant, plugin: &str, name: &str) -> Result<CommandResult> {
    let system = owned_database(cmds, tenant, plugin, name).await?;
    let output = cmds.run(&format!("{plugin}:info {system}")).await;
    CommandResult::parsed(output, parse_service_info)
}

/// Display names of the apps linked to a database.
pub async fn linked_apps(cmds: &Commands, tenant: &Tenant, plugin: &str, name: &str) -> Result<CommandResult> {
    let system = owned_database(cmds, tenant, plugin, name).await?;
    let namer = cmds.namer(tenant);
    let output = cmds.run(&format!("{plugin}:links {system}")).await;
    CommandResult::parsed(output, |text| {
        parse_list(text)
            .iter()
            .map(|app| namer.display(app, ResourceKind::App))
            .collect::<Vec<_>>()
    })
}

pub async fn link(cmds: &Commands, tenant: &Tenant, plugin: &str, name: &str, app: &str) -> Result<CommandResult> {
    let system = owned_database(cmds, tenant, plugin, name).await?;
    let app_system = owned_app(cmds, tenant, app).await?;
    Ok(CommandResult::raw(
        cmds.run(&format!("--no-restart {plugin}:link {system} {app_system}"))
            .await,
    ))
}

pub async fn unlink(cmds: &Commands, tenant: &Tenant, plugin: &str, name: &str, app: &str) -> Result<CommandResult> {
    let system = owned_database(cmds, tenant, plugin, name).await?;
    let app_system = owned_app(cmds, tenant, app).await?;
    Ok(CommandResult::raw(
        cmds.run(&format!("--no-restart {plugin}:unlink {system} {app_system}"))
            .await,
    ))
}

/// Allow-listed datastore plugins that are installed on the host.
pub async fn available(cmds: &Commands) -> Result<CommandResult> {
    let output = cmds.run("plugin:list").await;
    if !output.success {
        return Ok(CommandResult::failed(output.output));
    }

    let installed = parse_plugins(&output.output);
    let plugins: Vec<Value> = PLUGINS
        .iter()
        .filter(|p| installed.contains_key(**p))
        .map(|p| json!(p))
        .collect();

    Ok(CommandResult::ok(plugins))
}

//! Application lifecycle, process control, builders, ports and views.

use anyhow::Result;
use futures::future::join_all;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use dokku_core::naming::split_service_key;
use dokku_core::parsers::{
    parse_list, parse_network_info, parse_port_mappings, parse_ps_report, parse_report,
};
use dokku_core::{bail_dokku, ResourceKind, Tenant};

use crate::context::{CommandResult, Commands};
use crate::storage::release_mount;

pub const BUILDERS: [&str; 4] = ["herokuish", "dockerfile", "lambda", "pack"];

/// Resolve and authorize an app; returns its system name.
pub(crate) async fn owned_app(cmds: &Commands, tenant: &Tenant, app: &str) -> Result<String> {
    let system = cmds.namer(tenant).system(app, ResourceKind::App);
    cmds.require_owned(tenant, &system, ResourceKind::App).await?;
    Ok(system)
}

async fn run_on_app(cmds: &Commands, tenant: &Tenant, app: &str, verb: &str) -> Result<CommandResult> {
    let system = owned_app(cmds, tenant, app).await?;
    Ok(CommandResult::raw(cmds.run(&format!("{verb} {system}")).await))
}

pub async fn create(cmds: &Commands, tenant: &Tenant, app: &str) -> Result<CommandResult> {
    let system = cmds.namer(tenant).system(app, ResourceKind::App);
    cmds.create_reserved(
        tenant,
        &system,
        ResourceKind::App,
        &format!("apps:create {system}"),
    )
    .await
}

/// Destroy an app. A storage slot mounted for it is released with it.
pub async fn delete(cmds: &Commands, tenant: &Tenant, app: &str) -> Result<CommandResult> {
    let system = owned_app(cmds, tenant, app).await?;
    release_mount(cmds, tenant, &system).await?;
    cmds.destroy_reserved(
        tenant,
        &system,
        ResourceKind::App,
        &format!("--force apps:destroy {system}"),
    )
    .await
}

/// Whether the tenant owns `app`, answered from the store.
pub async fn exists(cmds: &Commands, tenant: &Tenant, app: &str) -> Result<CommandResult> {
    let system = cmds.namer(tenant).system(app, ResourceKind::App);
    let owned = cmds
        .store()
        .owns(&tenant.email, &system, ResourceKind::App)
        .await
        .map_err(|e| e.into_anyhow())?;
    Ok(CommandResult::ok(owned))
}

/// Create `app` as a copy of the owned app `existing`. Takes an app slot.
pub async fn clone(cmds: &Commands, tenant: &Tenant, app: &str, existing: &str) -> Result<CommandResult> {
    let existing_system = owned_app(cmds, tenant, existing).await?;
    let system = cmds.namer(tenant).system(app, ResourceKind::App);
    cmds.create_reserved(
        tenant,
        &system,
        ResourceKind::App,
        &format!("apps:clone {existing_system} {system}"),
    )
    .await
}

/// Move the app record to the new name, then rename on the host. The
/// record is moved back when the remote rename fails.
pub async fn rename(cmds: &Commands, tenant: &Tenant, app: &str, new_name: &str) -> Result<CommandResult> {
    let system = owned_app(cmds, tenant, app).await?;
    let new_system = cmds.namer(tenant).system(new_name, ResourceKind::App);

    // The storage slot and the volume directory are keyed by the old name.
    let mounted = cmds
        .store()
        .owns(&tenant.email, &system, ResourceKind::Storage)
        .await
        .map_err(|e| e.into_anyhow())?;
    if mounted {
        bail_dokku!(bad_request, "Unmount storage before renaming the app");
    }

    cmds.store()
        .rename(&tenant.email, &system, &new_system, ResourceKind::App)
        .await
        .map_err(|e| e.into_anyhow())?;

    let output = cmds.run(&format!("apps:rename {system} {new_system}")).await;
    if !output.success {
        warn!(email = %tenant.email, app = %system, new_name = %new_system, "remote rename failed, restoring record");
        cmds.store()
            .rename(&tenant.email, &new_system, &system, ResourceKind::App)
            .await
            .map_err(|e| e.into_anyhow())?;
    }

    Ok(CommandResult::raw(output))
}

/// Info for every app the tenant owns, keyed by display name. Apps whose
/// lookup fails map to `{}`.
pub async fn list(cmds: &Commands, tenant: &Tenant) -> Result<CommandResult> {
    let namer = cmds.namer(tenant);
    let apps = cmds
        .store()
        .owned_resources(&tenant.email, ResourceKind::App)
        .await
        .map_err(|e| e.into_anyhow())?;

    let names: Vec<String> = apps
        .iter()
        .map(|app| namer.display(&app.name, ResourceKind::App))
        .collect();
    let infos = join_all(names.iter().map(|name| info(cmds, tenant, name))).await;

    let mut result = Map::new();
    for (name, info) in names.into_iter().zip(infos) {
        let value = match info {
            Ok(info) => info.result,
            Err(e) => {
                debug!(app = %name, error = %e, "app info failed during listing");
                json!({})
            }
        };
        result.insert(name, value);
    }

    Ok(CommandResult::ok(Value::Object(result)))
}

/// `ps:inspect` when it answers with JSON, `ps:report` otherwise.
pub async fn info(cmds: &Commands, tenant: &Tenant, app: &str) -> Result<CommandResult> {
    let system = owned_app(cmds, tenant, app).await?;

    let inspect = cmds.run(&format!("ps:inspect {system}")).await;
    if inspect.success {
        if let Ok(data) = serde_json::from_str::<Value>(&inspect.output) {
            return Ok(CommandResult::ok(json!({
                "data": data,
                "info_origin": "inspect",
                "raw_name": system,
            })));
        }
    }

    let report = cmds.run(&format!("ps:report {system}")).await;
    let result = if report.success {
        json!({
            "data": parse_ps_report(&report.output),
            "info_origin": "report",
            "raw_name": system,
        })
    } else {
        json!({
            "data": null,
            "info_origin": null,
            "raw_name": system,
        })
    };

    Ok(CommandResult {
        success: report.success,
        result,
    })
}

pub async fn url(cmds: &Commands, tenant: &Tenant, app: &str) -> Result<CommandResult> {
    run_on_app(cmds, tenant, app, "url").await
}

pub async fn logs(cmds: &Commands, tenant: &Tenant, app: &str) -> Result<CommandResult> {
    run_on_app(cmds, tenant, app, "logs").await
}

pub async fn start(cmds: &Commands, tenant: &Tenant, app: &str) -> Result<CommandResult> {
    run_on_app(cmds, tenant, app, "ps:start").await
}

pub async fn stop(cmds: &Commands, tenant: &Tenant, app: &str) -> Result<CommandResult> {
    run_on_app(cmds, tenant, app, "ps:stop").await
}

pub async fn restart(cmds: &Commands, tenant: &Tenant, app: &str) -> Result<CommandResult> {
    run_on_app(cmds, tenant, app, "ps:restart").await
}

pub async fn rebuild(cmds: &Commands, tenant: &Tenant, app: &str) -> Result<CommandResult> {
    run_on_app(cmds, tenant, app, "ps:rebuild").await
}

pub async fn builder(cmds: &Commands, tenant: &Tenant, app: &str) -> Result<CommandResult> {
    let system = owned_app(cmds, tenant, app).await?;
    let output = cmds.run(&format!("builder:report {system}")).await;
    CommandResult::parsed(output, parse_report)
}

pub async fn set_builder(cmds: &Commands, tenant: &Tenant, app: &str, builder: &str) -> Result<CommandResult> {
    let system = owned_app(cmds, tenant, app).await?;

    if !BUILDERS.contains(&builder) {
        bail_dokku!(bad_request, "Invalid builder. Available builders: {}", BUILDERS.join(", "));
    }

    Ok(CommandResult::raw(
        cmds.run(&format!("builder:set {system} selected {builder}")).await,
    ))
}

pub async fn network(cmds: &Commands, tenant: &Tenant, app: &str) -> Result<CommandResult> {
    let system = owned_app(cmds, tenant, app).await?;
    let namer = cmds.namer(tenant);
    let output = cmds.run(&format!("network:report {system}")).await;
    CommandResult::parsed(output, |text| parse_network_info(text, &namer))
}

fn ports_verb(use_proxy: bool, verb: &str) -> String {
    match (use_proxy, verb) {
        (true, "list") => "proxy:ports".to_string(),
        (true, verb) => format!("proxy:ports-{verb}"),
        (false, verb) => format!("ports:{verb}"),
    }
}

pub async fn ports(cmds: &Commands, tenant: &Tenant, app: &str, use_proxy: bool) -> Result<CommandResult> {
    let system = owned_app(cmds, tenant, app).await?;
    let output = cmds.run(&format!("{} {system}", ports_verb(use_proxy, "list"))).await;

    // Dokku reports an app without mappings as an error.
    if output.output.to_lowercase().contains("no port mappings") {
        return Ok(CommandResult::ok(json!([])));
    }
    CommandResult::parsed(output, parse_port_mappings)
}

pub async fn add_port(
    cmds: &Commands,
    tenant: &Tenant,
    app: &str,
    protocol: &str,
    origin: u16,
    dest: u16,
    use_proxy: bool,
) -> Result<CommandResult> {
    let system = owned_app(cmds, tenant, app).await?;
    let command = format!("{} {system} {protocol}:{origin}:{dest}", ports_verb(use_proxy, "add"));
    Ok(CommandResult::raw(cmds.run(&command).await))
}

pub async fn remove_port(
    cmds: &Commands,
    tenant: &Tenant,
    app: &str,
    protocol: &str,
    origin: u16,
    dest: u16,
    use_proxy: bool,
) -> Result<CommandResult> {
    let system = owned_app(cmds, tenant, app).await?;
    let command = format!("{} {system} {protocol}:{origin}:{dest}", ports_verb(use_proxy, "remove"));
    Ok(CommandResult::raw(cmds.run(&command).await))
}

/// Owned databases linked to `app`, grouped by plugin.
pub async fn linked_databases(cmds: &Commands, tenant: &Tenant, app: &str) -> Result<CommandResult> {
    let system = owned_app(cmds, tenant, app).await?;
    let namer = cmds.namer(tenant);

    let services = cmds
        .store()
        .owned_resources(&tenant.email, ResourceKind::Service)
        .await
        .map_err(|e| e.into_anyhow())?;

    let mut result: Map<String, Value> = Map::new();
    for service in services {
        let Some((plugin, db_system)) = split_service_key(&service.name) else {
            continue;
        };

        let output = cmds.run(&format!("{plugin}:links {db_system}")).await;
        if !output.success {
            continue;
        }
        let linked = parse_list(&output.output)
            .iter()
            .any(|linked| linked == &system);

        if linked {
            let entry = result
                .entry(plugin.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(names) = entry {
                names.push(Value::String(namer.display(db_system, ResourceKind::Service)));
            }
        }
    }

    Ok(CommandResult::ok(Value::Object(result)))
}

pub async fn deployment_token(cmds: &Commands, tenant: &Tenant, app: &str) -> Result<CommandResult> {
    let system = owned_app(cmds, tenant, app).await?;
    let token = cmds
        .store()
        .deploy_token(&tenant.email, &system)
        .await
        .map_err(|e| e.into_anyhow())?;
    Ok(CommandResult::ok(token))
}

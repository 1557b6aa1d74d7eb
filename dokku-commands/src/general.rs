use anyhow::Result;
use serde_json::{json, Map, Value};

use dokku_core::{ResourceKind, Tenant};

use crate::context::{CommandResult, Commands};

/// Dokku version running on the host.
pub async fn version(cmds: &Commands) -> Result<CommandResult> {
    let output = cmds.run("version").await;
    CommandResult::parsed(output, |text| text.trim().to_string())
}

/// The tenant's quota per kind next to what is in use.
pub async fn quota(cmds: &Commands, tenant: &Tenant) -> Result<CommandResult> {
    let mut usage = Map::new();
    for kind in ResourceKind::ALL {
        let used = cmds
            .store()
            .owned_resources(&tenant.email, kind)
            .await
            .map_err(|e| e.into_anyhow())?
            .len();
        usage.insert(
            kind.as_str().to_string(),
            json!({ "quota": tenant.quotas.for_kind(kind), "used": used }),
        );
    }

    let mut result = serde_json::to_value(tenant.quotas)?;
    if let Value::Object(fields) = &mut result {
        fields.insert("usage".to_string(), Value::Object(usage));
    }
    Ok(CommandResult::ok(result))
}

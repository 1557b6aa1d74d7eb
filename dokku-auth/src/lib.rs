//! Request authentication for the Dokku gateway.
//!
//! Three checks guard the HTTP surface:
//! - `MASTER-KEY` header on admin routes ([`validate_master_key`])
//! - `api_key` query parameter on tenant routes ([`validate_api_key`]);
//!   the master key is accepted there too
//! - `{email, access_token}` body on tenant routes
//!   ([`validate_user_credentials`])
//!
//! A key that is not configured never matches.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

use dokku_core::{DokkuError, ResourceStore, StoreError, Tenant};

/// Header carrying the master key on admin routes.
pub const MASTER_KEY_HEADER: &str = "MASTER-KEY";

pub const INVALID_MASTER_KEY: &str = "Invalid or missing MASTER key";
pub const INVALID_API_KEY: &str = "Invalid or missing API key";
pub const INVALID_ACCESS_TOKEN: &str = "Invalid or missing access token";

/// Credentials every tenant request carries in its JSON body.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthPayload {
    pub email: String,
    pub access_token: String,
}

/// The configured keys.
#[derive(Clone, Debug, Default)]
pub struct Keys {
    pub api_key: Option<String>,
    pub master_key: Option<String>,
}

impl Keys {
    pub fn new(api_key: Option<String>, master_key: Option<String>) -> Self {
        Self {
            api_key,
            master_key,
        }
    }
}

fn key_matches(configured: Option<&str>, given: &str) -> bool {
    matches!(configured, Some(key) if !key.is_empty() && key == given)
}

pub fn validate_master_key(keys: &Keys, header: Option<&str>) -> Result<()> {
    let given = header.map(str::trim).unwrap_or_default();
    if key_matches(keys.master_key.as_deref(), given) {
        return Ok(());
    }

    warn!("rejected request with invalid master key");
    Err(DokkuError::forbidden(INVALID_MASTER_KEY).into_anyhow())
}

pub fn validate_api_key(keys: &Keys, api_key: Option<&str>) -> Result<()> {
    let given = api_key.unwrap_or_default();
    if key_matches(keys.api_key.as_deref(), given) || key_matches(keys.master_key.as_deref(), given) {
        return Ok(());
    }

    warn!("rejected request with invalid api key");
    Err(DokkuError::forbidden(INVALID_API_KEY).into_anyhow())
}

/// Resolve the tenant behind a credential payload.
///
/// Unknown emails and wrong tokens get the same answer.
pub async fn validate_user_credentials(
    store: &dyn ResourceStore,
    payload: &AuthPayload,
) -> Result<Tenant> {
    let rejected = || DokkuError::forbidden(INVALID_ACCESS_TOKEN).into_anyhow();

    if payload.access_token.is_empty() {
        return Err(rejected());
    }

    let tenant = match store.get_tenant(&payload.email).await {
        Ok(tenant) => tenant,
        Err(StoreError::TenantNotFound) => {
            warn!(email = %payload.email, "credentials for unknown tenant");
            return Err(rejected());
        }
        Err(e) => return Err(e.into_anyhow()),
    };

    if tenant.access_token != payload.access_token {
        warn!(email = %payload.email, "invalid access token");
        return Err(rejected());
    }

    Ok(tenant)
}

//! Tenants and the resources they own.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DokkuError;

/// The four quota-limited resource families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    App,
    Service,
    Network,
    Storage,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::App,
        ResourceKind::Service,
        ResourceKind::Network,
        ResourceKind::Storage,
    ];

    /// Dokku restricts app names to `[a-z0-9-]`, everything else uses `_`.
    pub fn separator(&self) -> char {
        match self {
            ResourceKind::App => '-',
            _ => '_',
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::App => "app",
            ResourceKind::Service => "service",
            ResourceKind::Network => "network",
            ResourceKind::Storage => "storage",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = DokkuError;

    /// Accepts singular and plural forms (`app`, `apps`, `services`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().trim_end_matches('s') {
            "app" => Ok(ResourceKind::App),
            "service" => Ok(ResourceKind::Service),
            "network" => Ok(ResourceKind::Network),
            "storage" => Ok(ResourceKind::Storage),
            other => Err(DokkuError::bad_request(format!("Unknown resource kind: {other}"))),
        }
    }
}

/// Per-kind integer ceilings. A new tenant starts at zero everywhere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quotas {
    pub apps_quota: u32,
    pub services_quota: u32,
    pub networks_quota: u32,
    pub storage_quota: u32,
}

impl Quotas {
    pub fn for_kind(&self, kind: ResourceKind) -> u32 {
        match kind {
            ResourceKind::App => self.apps_quota,
            ResourceKind::Service => self.services_quota,
            ResourceKind::Network => self.networks_quota,
            ResourceKind::Storage => self.storage_quota,
        }
    }

    /// Apply a partial update; `None` fields keep their current value.
    pub fn apply(&mut self, update: &QuotaUpdate) {
        if let Some(v) = update.apps_quota {
            self.apps_quota = v;
        }
        if let Some(v) = update.services_quota {
            self.services_quota = v;
        }
        if let Some(v) = update.networks_quota {
            self.networks_quota = v;
        }
        if let Some(v) = update.storage_quota {
            self.storage_quota = v;
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaUpdate {
    pub apps_quota: Option<u32>,
    pub services_quota: Option<u32>,
    pub networks_quota: Option<u32>,
    pub storage_quota: Option<u32>,
}

/// An authenticated user of the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: u64,
    pub email: String,
    #[serde(skip_serializing)]
    pub access_token: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub quotas: Quotas,
}

impl Tenant {
    /// The identity used to namespace system resource names.
    pub fn identity(&self) -> String {
        self.id.to_string()
    }
}

/// A quota-limited resource owned by a tenant.
///
/// For services, `name` is the store key `"{plugin}:{system_name}"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    pub kind: ResourceKind,
    pub owner: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deploy_token: Option<String>,
}

/// Pagination for admin resource listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
    pub ascending: bool,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 20,
            ascending: false,
        }
    }
}

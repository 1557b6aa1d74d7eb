//! Tenant-facing display names and Dokku-facing system names.
//!
//! A display name is lower-cased and every character outside `[a-z0-9]` is
//! replaced with the kind separator. With per-tenant namespacing the system
//! name is `"{identity}{sep}{normalized}"`; with a global namespace the
//! system name is the normalized name itself.
//!
//! The inverse direction removes the tenant prefix with an exact prefix cut,
//! so identities whose characters recur in the name are never over-stripped.

use std::fmt;

use crate::tenant::{ResourceKind, Tenant};

/// Whether system names are qualified with the tenant identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Namespacing {
    #[default]
    PerTenant,
    Global,
}

impl Namespacing {
    pub fn from_flag(per_tenant: bool) -> Self {
        if per_tenant {
            Namespacing::PerTenant
        } else {
            Namespacing::Global
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceName {
    identity: String,
    kind: ResourceKind,
    namespacing: Namespacing,
    name: String,
}

fn normalize(raw: &str, separator: char) -> String {
    raw.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else {
                separator
            }
        })
        .collect()
}

impl ResourceName {
    pub fn new(
        identity: impl Into<String>,
        name: &str,
        kind: ResourceKind,
        from_system: bool,
        namespacing: Namespacing,
    ) -> Self {
        let identity = identity.into();
        let separator = kind.separator();

        let name = if from_system && namespacing == Namespacing::PerTenant {
            let lowered = name.to_lowercase();
            let prefix = format!("{}{}", identity.to_lowercase(), separator);
            match lowered.strip_prefix(&prefix) {
                Some(rest) => normalize(rest, separator),
                None => normalize(&lowered, separator),
            }
        } else {
            normalize(name, separator)
        };

        Self {
            identity,
            kind,
            namespacing,
            name,
        }
    }

    /// Build from a tenant-supplied display name.
    pub fn from_display(
        identity: impl Into<String>,
        name: &str,
        kind: ResourceKind,
        namespacing: Namespacing,
    ) -> Self {
        Self::new(identity, name, kind, false, namespacing)
    }

    /// Build from a name as Dokku knows it.
    pub fn from_system(
        identity: impl Into<String>,
        name: &str,
        kind: ResourceKind,
        namespacing: Namespacing,
    ) -> Self {
        Self::new(identity, name, kind, true, namespacing)
    }

    /// The name used when talking to the Dokku CLI.
    pub fn for_system(&self) -> String {
        match self.namespacing {
            Namespacing::PerTenant => {
                format!("{}{}{}", self.identity, self.kind.separator(), self.name)
            }
            Namespacing::Global => self.name.clone(),
        }
    }

    /// The tenant-facing name.
    pub fn normalized(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Builds resource names for one tenant under one namespacing mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNamer {
    identity: String,
    namespacing: Namespacing,
}

impl ResourceNamer {
    pub fn new(identity: impl Into<String>, namespacing: Namespacing) -> Self {
        Self {
            identity: identity.into(),
            namespacing,
        }
    }

    pub fn for_tenant(tenant: &Tenant, namespacing: Namespacing) -> Self {
        Self::new(tenant.identity(), namespacing)
    }

    pub fn name(&self, display: &str, kind: ResourceKind) -> ResourceName {
        ResourceName::from_display(self.identity.clone(), display, kind, self.namespacing)
    }

    /// Display name → system name.
    pub fn system(&self, display: &str, kind: ResourceKind) -> String {
        self.name(display, kind).for_system()
    }

    /// System name → display name.
    pub fn display(&self, system: &str, kind: ResourceKind) -> String {
        ResourceName::from_system(self.identity.clone(), system, kind, self.namespacing)
            .normalized()
            .to_string()
    }
}

/// Store key for a database service: `"{plugin}:{system_name}"`.
pub fn service_key(plugin: &str, system_name: &str) -> String {
    format!("{plugin}:{system_name}")
}

/// Split a service store key into `(plugin, system_name)`.
pub fn split_service_key(key: &str) -> Option<(&str, &str)> {
    key.split_once(':')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(identity: &str, display: &str, kind: ResourceKind) -> String {
        let system =
            ResourceName::from_display(identity, display, kind, Namespacing::PerTenant).for_system();
        ResourceName::from_system(identity, &system, kind, Namespacing::PerTenant)
            .normalized()
            .to_string()
    }

    #[test]
    fn display_name_is_lowercased_and_sanitized() {
        let name = ResourceName::from_display("7", "My App.v2", ResourceKind::App, Namespacing::PerTenant);
        assert_eq!(name.normalized(), "my-app-v2");
        assert_eq!(name.for_system(), "7-my-app-v2");

        let db = ResourceName::from_display("7", "Orders DB", ResourceKind::Service, Namespacing::PerTenant);
        assert_eq!(db.for_system(), "7_orders_db");
    }

    #[test]
    fn round_trip_recovers_sanitized_display_name() {
        let cases = [
            ("1", "Test-App", ResourceKind::App, "test-app"),
            ("42", "hello_World!", ResourceKind::App, "hello-world-"),
            ("3", "Main.Network", ResourceKind::Network, "main_network"),
            ("12", "cache@redis#1", ResourceKind::Service, "cache_redis_1"),
            ("5", "uploads", ResourceKind::Storage, "uploads"),
        ];
        for (identity, display, kind, expected) in cases {
            assert_eq!(round_trip(identity, display, kind), expected, "{display}");
        }
    }

    #[test]
    fn prefix_cut_does_not_strip_recurring_identity_characters() {
        // Character-set trimming of "1-" would reduce this to "app".
        assert_eq!(round_trip("1", "11-app", ResourceKind::App), "11-app");
        assert_eq!(round_trip("12", "2_1_db", ResourceKind::Service), "2_1_db");
        assert_eq!(round_trip("1", "1", ResourceKind::App), "1");
    }

    #[test]
    fn different_tenants_get_different_system_names() {
        let a = ResourceNamer::new("1", Namespacing::PerTenant).system("web", ResourceKind::App);
        let b = ResourceNamer::new("2", Namespacing::PerTenant).system("web", ResourceKind::App);
        assert_ne!(a, b);
    }

    #[test]
    fn global_namespace_returns_unqualified_names() {
        let namer = ResourceNamer::new("9", Namespacing::Global);
        assert_eq!(namer.system("Web App", ResourceKind::App), "web-app");
        assert_eq!(namer.display("web-app", ResourceKind::App), "web-app");
        // No prefix cut in the global namespace.
        assert_eq!(namer.display("9-web", ResourceKind::App), "9-web");
    }

    #[test]
    fn foreign_system_name_is_kept_when_prefix_is_absent() {
        let namer = ResourceNamer::new("4", Namespacing::PerTenant);
        assert_eq!(namer.display("other_net", ResourceKind::Network), "other_net");
    }

    #[test]
    fn service_key_round_trips() {
        let key = service_key("postgres", "1_orders");
        assert_eq!(split_service_key(&key), Some(("postgres", "1_orders")));
    }
}

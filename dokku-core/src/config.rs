//! # Gateway configuration
//!
//! A string key/value store (`app.set()` / `app.get()` style) plus a typed
//! [`Settings`] view with defaults. Keys are dotted and lower-case; the
//! environment loader maps `SSH_HOSTNAME` to `ssh.hostname`,
//! `API_USE_PER_USER_RESOURCE_NAMES` to `api.use.per.user.resource.names`
//! and so on.
//!
//! ```rust
//! use dokku_core::ApiConfig;
//!
//! let mut config = ApiConfig::new();
//! config.set("ssh.port", "2222");
//! assert_eq!(config.snapshot().get_u16("ssh.port"), Some(2222));
//! ```

use std::collections::HashMap;
use std::time::Duration;

use crate::naming::Namespacing;

#[derive(Debug, Default, Clone)]
pub struct ApiConfig {
    values: HashMap<String, String>,
}

impl ApiConfig {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Copy every variable from `vars` whose name is one of `known`.
    pub fn load_vars<I>(&mut self, vars: I, known: &[&str])
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if known.contains(&key.as_str()) {
                self.set(env_key(&key), value);
            }
        }
    }

    /// Load the recognised variables from the process environment.
    pub fn from_env() -> Self {
        let mut config = Self::new();
        config.load_vars(std::env::vars(), ENV_VARS);
        config
    }

    pub fn snapshot(&self) -> ApiConfigSnapshot {
        ApiConfigSnapshot::new(self.values.clone())
    }
}

/// Environment variables the gateway reads.
pub const ENV_VARS: &[&str] = &[
    "HOST",
    "PORT",
    "LOG_LEVEL",
    "API_NAME",
    "API_VERSION_NUMBER",
    "API_KEY",
    "MASTER_KEY",
    "API_USE_PER_USER_RESOURCE_NAMES",
    "SSH_HOSTNAME",
    "SSH_PORT",
    "SSH_KEY_PATH",
    "SSH_COMMAND_TIMEOUT",
    "VOLUME_DIR",
    "RATE_LIMIT_PER_MINUTE",
    "DATABASE_URL",
];

/// `SSH_KEY_PATH` → `ssh.key.path`
pub fn env_key(var: &str) -> String {
    var.to_lowercase().replace('_', ".")
}

#[derive(Debug, Clone, Default)]
pub struct ApiConfigSnapshot {
    map: HashMap<String, String>,
}

impl ApiConfigSnapshot {
    pub(crate) fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    pub fn get_u16(&self, key: &str) -> Option<u16> {
        self.get(key).and_then(|v| v.trim().parse::<u16>().ok())
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
    }

    /// Accepts `true/false`, `1/0`, `yes/no`.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| match v.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        })
    }
}

#[derive(Debug, Clone)]
pub struct SshSettings {
    pub hostname: String,
    pub port: u16,
    pub key_path: Option<String>,
    pub timeout: Duration,
}

/// Typed settings with defaults applied.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub api_name: String,
    pub api_version: String,
    pub api_key: Option<String>,
    pub master_key: Option<String>,
    pub namespacing: Namespacing,
    pub ssh: SshSettings,
    pub volume_dir: String,
    pub rate_limit_per_minute: u32,
    /// SQLite store location; the in-memory store is used when unset.
    pub database_url: Option<String>,
}

impl Settings {
    pub fn from_snapshot(cfg: &ApiConfigSnapshot) -> Self {
        let non_empty = |key: &str| cfg.get_string(key).filter(|v| !v.trim().is_empty());

        Self {
            host: non_empty("host").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: cfg.get_u16("port").unwrap_or(5000),
            log_level: non_empty("log.level").unwrap_or_else(|| "info".to_string()).to_lowercase(),
            api_name: non_empty("api.name").unwrap_or_else(|| "Dokku API".to_string()),
            api_version: non_empty("api.version.number").unwrap_or_else(|| "0.1.0".to_string()),
            api_key: non_empty("api.key"),
            master_key: non_empty("master.key"),
            namespacing: Namespacing::from_flag(
                cfg.get_bool("api.use.per.user.resource.names").unwrap_or(true),
            ),
            ssh: SshSettings {
                hostname: non_empty("ssh.hostname").unwrap_or_else(|| "localhost".to_string()),
                port: cfg.get_u16("ssh.port").unwrap_or(22),
                key_path: non_empty("ssh.key.path"),
                timeout: Duration::from_secs(cfg.get_u64("ssh.command.timeout").unwrap_or(60)),
            },
            volume_dir: non_empty("volume.dir").unwrap_or_else(|| "/var/lib/dokku/data/storage".to_string()),
            rate_limit_per_minute: cfg
                .get_u64("rate.limit.per.minute")
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(120),
            database_url: non_empty("database.url"),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_snapshot(&ApiConfigSnapshot::default())
    }
}

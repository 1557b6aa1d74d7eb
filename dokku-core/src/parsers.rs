//! Parsers for Dokku CLI output.
//!
//! Dokku mixes banner lines (`=====> ...`) with either `key:   value` pairs
//! or whitespace-separated columns, and the format is not a stable contract.
//! Every parser here is total: malformed input yields omitted fields or
//! `None`, never an error.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::naming::ResourceNamer;
use crate::tenant::ResourceKind;

/// Marker that opens a banner line.
pub const BANNER: &str = "=====>";

/// Insertion-ordered string mapping.
pub type ReportMap = Map<String, Value>;

static PS_REPORT_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(.+?)\s{2,}(.+)$").expect("valid ps report pattern"));

static PLUGIN_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\S+)\s+(\S+)\s+(enabled|disabled)(?:\s+(.*?))?\s*$")
        .expect("valid plugin pattern")
});

/// Report keys whose first non-empty value names the attached network.
const NETWORK_KEYS: [&str; 5] = [
    "network_attach_post_create",
    "network_attach_post_deploy",
    "network_computed_attach_post_create",
    "network_computed_attach_post_deploy",
    "network_computed_initial_network",
];

fn is_banner(line: &str) -> bool {
    line.trim_start().starts_with(BANNER)
}

fn report_key(raw: &str) -> String {
    raw.trim().to_lowercase().replace(' ', "_")
}

/// `config:show` output. Keys are kept verbatim; the last duplicate wins.
pub fn parse_env_vars(text: &str) -> ReportMap {
    let mut vars = ReportMap::new();

    for line in text.lines() {
        if is_banner(line) {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        vars.insert(key.to_string(), Value::String(value.trim().to_string()));
    }

    vars
}

/// `ps:report` output. Lines that do not look like `label  value` are kept
/// as keys with an empty value.
pub fn parse_ps_report(text: &str) -> ReportMap {
    let mut report = ReportMap::new();

    for line in text.lines() {
        if is_banner(line) || line.trim().is_empty() {
            continue;
        }

        let (key, value) = match PS_REPORT_LINE.captures(line) {
            Some(caps) => (
                caps[1]
                    .trim()
                    .trim_end_matches(':')
                    .to_lowercase()
                    .replace(' ', "_"),
                caps[2].trim().to_string(),
            ),
            None => (line.trim().to_string(), String::new()),
        };

        report.insert(key, Value::String(value));
    }

    report
}

/// Generic `*:report` output: colon-split with normalized keys.
pub fn parse_report(text: &str) -> ReportMap {
    let mut report = ReportMap::new();

    for line in text.lines() {
        if line.contains(BANNER) {
            continue;
        }
        if let Some((key, value)) = line.split_once(':') {
            report.insert(report_key(key), Value::String(value.trim().to_string()));
        }
    }

    report
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub network: Option<String>,
}

/// `network:report` output reduced to the single attached network, mapped
/// back to the tenant-facing name.
pub fn parse_network_info(text: &str, namer: &ResourceNamer) -> NetworkInfo {
    let report = parse_report(text);

    let network = NETWORK_KEYS.iter().find_map(|key| {
        report
            .get(*key)
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
    });

    NetworkInfo {
        network: network.map(|n| namer.display(n, ResourceKind::Network)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMapping {
    pub protocol: String,
    pub origin: u16,
    pub dest: u16,
}

/// `ports:list` / `proxy:ports` output: `scheme host_port container_port` rows.
pub fn parse_port_mappings(text: &str) -> Vec<PortMapping> {
    if text.to_lowercase().contains("no port mappings") {
        return Vec::new();
    }

    text.lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            let [scheme, host, container] = parts.as_slice() else {
                return None;
            };
            Some(PortMapping {
                protocol: scheme.to_string(),
                origin: host.parse().ok()?,
                dest: container.parse().ok()?,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    pub version: String,
    pub status: String,
    pub description: String,
}

/// `plugin:list` output. Unlike `parse_ps_report`, lines that do not match
/// the four-column shape are dropped.
pub fn parse_plugins(text: &str) -> BTreeMap<String, PluginInfo> {
    text.lines()
        .filter_map(|line| {
            let caps = PLUGIN_LINE.captures(line)?;
            Some((
                caps[1].to_string(),
                PluginInfo {
                    version: caps[2].to_string(),
                    status: caps[3].to_string(),
                    description: caps
                        .get(4)
                        .map(|m| m.as_str().to_string())
                        .unwrap_or_default(),
                },
            ))
        })
        .collect()
}

/// `{plugin}:info` output. The first line is always a header.
pub fn parse_service_info(text: &str) -> ReportMap {
    let mut info = ReportMap::new();

    for line in text.lines().skip(1) {
        if let Some((key, value)) = line.split_once(':') {
            info.insert(report_key(key), Value::String(value.trim().to_string()));
        }
    }

    info
}

/// One entry per non-empty, non-banner line.
pub fn parse_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with(BANNER))
        .map(str::to_string)
        .collect()
}

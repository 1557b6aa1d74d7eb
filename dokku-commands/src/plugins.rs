//! Host plugin management. Install and uninstall run as root.

use anyhow::Result;

use dokku_core::parsers::parse_plugins;
use dokku_core::DokkuError;

use crate::context::{CommandResult, Commands};

/// Plugins installable by name alone.
pub const KNOWN_PLUGINS: [(&str, &str); 3] = [
    ("postgres", "https://github.com/dokku/dokku-postgres.git"),
    ("mysql", "https://github.com/dokku/dokku-mysql.git mysql"),
    ("letsencrypt", "https://github.com/dokku/dokku-letsencrypt.git"),
];

fn known_source(name: &str) -> Option<&'static str> {
    KNOWN_PLUGINS
        .iter()
        .find(|(known, _)| *known == name)
        .map(|(_, source)| *source)
}

pub async fn list(cmds: &Commands) -> Result<CommandResult> {
    let output = cmds.run("plugin:list").await;
    CommandResult::parsed(output, parse_plugins)
}

pub async fn installed(cmds: &Commands, name: &str) -> Result<CommandResult> {
    let output = cmds.run("plugin:list").await;
    if !output.success {
        return Ok(CommandResult::failed(output.output));
    }
    Ok(CommandResult::ok(parse_plugins(&output.output).contains_key(name)))
}

/// Install `name` from `url`, or from the known source for that name.
pub async fn install(cmds: &Commands, name: &str, url: Option<&str>) -> Result<CommandResult> {
    let source = match url.filter(|u| !u.trim().is_empty()) {
        Some(url) => format!("{} {name}", url.trim()),
        None => known_source(name)
            .ok_or_else(|| DokkuError::not_found("Plugin not found").into_anyhow())?
            .to_string(),
    };

    Ok(CommandResult::raw(
        cmds.run_as_root(&format!("plugin:install {source}")).await,
    ))
}

pub async fn uninstall(cmds: &Commands, name: &str) -> Result<CommandResult> {
    Ok(CommandResult::raw(
        cmds.run_as_root(&format!("plugin:uninstall {name}")).await,
    ))
}

// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Lookup order: `./membridge.toml` > `~/.config/membridge/membridge.toml` >
//! `/etc/membridge/membridge.toml`, with `MEMBRIDGE_` environment overrides on top.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use tracing::debug;

use crate::model::MembridgeConfig;

pub(crate) const SYSTEM_CONFIG: &str = "/etc/membridge/membridge.toml";
pub(crate) const LOCAL_CONFIG: &str = "membridge.toml";

/// Config sections addressable from the environment, in matching order.
const ENV_SECTIONS: &[&str] = &[
    "bridge",
    "server",
    "storage",
    "embedding",
    "retrieval",
    "memory",
    "gatekeeper",
    "gemini",
    "ollama",
];

pub(crate) fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("membridge").join("membridge.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/membridge/membridge.toml`
/// 3. `~/.config/membridge/membridge.toml`
/// 4. `./membridge.toml`
/// 5. `MEMBRIDGE_*` environment variables
pub fn load_config() -> Result<MembridgeConfig, figment::Error> {
    for path in config_files().iter().filter(|p| p.is_file()) {
        debug!(path = %path.display(), "merging config file");
    }
    build_figment().extract()
}

/// Candidate config files, lowest precedence first.
pub(crate) fn config_files() -> Vec<PathBuf> {
    let mut files = vec![PathBuf::from(SYSTEM_CONFIG)];
    files.extend(user_config_path());
    files.push(PathBuf::from(LOCAL_CONFIG));
    files
}

/// Load configuration from a TOML string only (no file lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<MembridgeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MembridgeConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<MembridgeConfig, figment::Error> {
    debug!(path = %path.display(), "loading config file");
    Figment::new()
        .merge(Serialized::defaults(MembridgeConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the layered Figment before extraction.
pub fn build_figment() -> Figment {
    config_files()
        .into_iter()
        .fold(
            Figment::new().merge(Serialized::defaults(MembridgeConfig::default())),
            |figment, path| figment.merge(Toml::file(path)),
        )
        .merge(env_provider())
}

/// Environment provider with explicit section mapping.
///
/// `Env::split("_")` would turn `MEMBRIDGE_STORAGE_DATABASE_PATH` into
/// `storage.database.path`; only the first segment names a section.
fn env_provider() -> Env {
    Env::prefixed("MEMBRIDGE_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env key to a dotted config path.
pub(crate) fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_'))
            && !rest.is_empty()
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

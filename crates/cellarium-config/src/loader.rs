// SPDX-FileCopyrightText: 2026 Cellarium Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./cellarium.toml` > `~/.config/cellarium/cellarium.toml`
//! > `/etc/cellarium/cellarium.toml`, with environment variable overrides via
//! the `CELLARIUM_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::CellarConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/cellarium/cellarium.toml` (system-wide)
/// 3. `~/.config/cellarium/cellarium.toml` (user XDG config)
/// 4. `./cellarium.toml` (local directory)
/// 5. `CELLARIUM_*` environment variables
pub fn load_config() -> Result<CellarConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
pub fn load_config_from_str(toml_content: &str) -> Result<CellarConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CellarConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<CellarConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CellarConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for the standard lookup, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(CellarConfig::default()))
        .merge(Toml::file("/etc/cellarium/cellarium.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("cellarium/cellarium.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("cellarium.toml"))
        .merge(env_provider())
}

/// Environment provider with explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")`: `CELLARIUM_API_BASE_URL`
/// must become `api.base_url`, not `api.base.url`.
fn env_provider() -> Env {
    Env::prefixed("CELLARIUM_").map(|key| {
        let mapped = key
            .as_str()
            .replacen("api_", "api.", 1)
            .replacen("auth_", "auth.", 1)
            .replacen("search_", "search.", 1)
            .replacen("logging_", "logging.", 1);
        mapped.into()
    })
}

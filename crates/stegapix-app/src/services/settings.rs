// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Loading and persisting `AppConfig` as pretty JSON.
//
// Credentials may be kept out of the file: the environment variables below
// replace the matching fields after the file is read.
//
//   STEGAPIX_GOOGLE_API_KEY   -> search.api_key
//   STEGAPIX_GOOGLE_CX        -> search.cx_id
//   STEGAPIX_IMGUR_CLIENT_ID  -> publish.client_id (imgur mode only)

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use stegapix_core::AppConfig;
use stegapix_core::config::PublishConfig;
use stegapix_core::error::Result;

/// Config filename inside the data directory.
pub const CONFIG_FILE: &str = "stegapix.json";

pub fn default_config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE)
}

/// Read the config at `path`, falling back to defaults when the file does not
/// exist, then apply environment overrides.
///
/// A file that exists but does not parse is an error.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let mut config = if path.exists() {
        let data = std::fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&data)?;
        debug!(path = %path.display(), "config loaded");
        config
    } else {
        debug!(path = %path.display(), "no config file, using defaults");
        AppConfig::default()
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Write `config` to `path` as pretty-printed JSON.
pub fn persist_config(path: &Path, config: &AppConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    info!(path = %path.display(), "config written");
    Ok(())
}

/// Replace credential fields with non-empty environment values.
pub fn apply_env_overrides(config: &mut AppConfig, var: impl Fn(&str) -> Option<String>) {
    let var = |key: &str| var(key).filter(|v| !v.trim().is_empty());

    if let Some(key) = var("STEGAPIX_GOOGLE_API_KEY") {
        config.search.api_key = key;
    }
    if let Some(cx) = var("STEGAPIX_GOOGLE_CX") {
        config.search.cx_id = cx;
    }
    if let PublishConfig::Imgur { client_id, .. } = &mut config.publish {
        if let Some(id) = var("STEGAPIX_IMGUR_CLIENT_ID") {
            *client_id = id;
        }
    }
}

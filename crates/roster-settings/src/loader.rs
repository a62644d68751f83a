//! Settings loading.
//!
//! Layers, lowest priority first:
//! 1. Compiled [`RosterSettings::default()`]
//! 2. JSON settings file (missing file contributes nothing)
//! 3. `ROSTER_*` environment variables, `__` separating nested keys
//!    (e.g. `ROSTER_SERVER__PORT=9000`)

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized};
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::RosterSettings;

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "ROSTER_";

/// Resolve the default settings file (`~/.roster/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".roster").join("settings.json")
}

/// Build the layered figment for a settings file.
pub fn figment(path: &Path) -> Figment {
    Figment::from(Serialized::defaults(RosterSettings::default()))
        .merge(Json::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Load settings from the default path.
pub fn load_settings() -> Result<RosterSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific file, then apply env overrides.
pub fn load_settings_from_path(path: &Path) -> Result<RosterSettings> {
    if path.exists() {
        debug!(?path, "loading settings from file");
    } else {
        debug!(?path, "settings file not found, using defaults");
    }
    let settings: RosterSettings = figment(path).extract()?;
    validate(&settings)?;
    Ok(settings)
}

/// Reject values the server cannot run with.
pub fn validate(settings: &RosterSettings) -> Result<()> {
    if settings.server.send_queue == 0 {
        return Err(SettingsError::InvalidValue(
            "server.send_queue must be at least 1".into(),
        ));
    }
    if settings.server.max_message_size == 0 {
        return Err(SettingsError::InvalidValue(
            "server.max_message_size must be at least 1".into(),
        ));
    }
    if settings.server.host.is_empty() {
        return Err(SettingsError::InvalidValue("server.host is empty".into()));
    }
    Ok(())
}

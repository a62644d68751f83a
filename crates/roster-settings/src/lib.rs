//! # roster-settings
//!
//! Configuration for the Roster server, layered with `figment`:
//! compiled defaults, then `~/.roster/settings.json` (or an explicit path),
//! then `ROSTER_*` environment variables.
//!
//! Settings are loaded once by the binary and passed down explicitly.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{load_settings, load_settings_from_path, settings_path};
pub use types::{AuthSettings, LoggingSettings, PrincipalSettings, RosterSettings, ServerSettings};

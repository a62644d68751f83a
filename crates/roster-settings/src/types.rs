//! Settings types with compiled defaults.
//!
//! Field names stay `snake_case` so that `ROSTER_SERVER__SEND_QUEUE` style
//! environment keys map onto them directly.

use roster_core::LogFormat;
use serde::{Deserialize, Serialize};

/// Root settings object.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterSettings {
    /// HTTP / WebSocket listener settings.
    pub server: ServerSettings,
    /// Handshake credential settings.
    pub auth: AuthSettings,
    /// Log output settings.
    pub logging: LoggingSettings,
}

/// Listener and per-connection limits.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Bind port (`0` picks a free port).
    pub port: u16,
    /// Outbound frames buffered per session before sends start failing.
    pub send_queue: usize,
    /// Largest inbound WebSocket message accepted, in bytes.
    pub max_message_size: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            send_queue: 256,
            max_message_size: 64 * 1024,
        }
    }
}

/// A principal known to the built-in identity store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalSettings {
    /// Principal name, matched against the token subject.
    pub name: String,
    /// Disabled principals are refused even with a valid token.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Bearer-token verification settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// HS256 shared secret used to verify handshake tokens.
    pub jwt_secret: String,
    /// Principals admitted by the built-in identity store.
    pub principals: Vec<PrincipalSettings>,
}

/// Log output settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Line format.
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

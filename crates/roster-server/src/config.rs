//! Server configuration.

use roster_settings::ServerSettings;
use serde::{Deserialize, Serialize};

/// Runtime configuration for [`crate::RosterServer`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
    pub port: u16,
    /// Per-session outbound queue capacity.
    pub send_queue: usize,
    /// Max inbound WebSocket message size in bytes.
    pub max_message_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            send_queue: 256,
            max_message_size: 64 * 1024,
        }
    }
}

impl From<&ServerSettings> for ServerConfig {
    fn from(settings: &ServerSettings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
            send_queue: settings.send_queue,
            max_message_size: settings.max_message_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_bind_loopback_on_any_port() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 0);
        assert_eq!(cfg.send_queue, 256);
        assert_eq!(cfg.max_message_size, 65_536);
    }

    #[test]
    fn from_settings_copies_every_field() {
        let settings = ServerSettings {
            host: "10.0.0.5".into(),
            port: 9000,
            send_queue: 8,
            max_message_size: 1024,
        };
        let cfg = ServerConfig::from(&settings);
        assert_eq!(cfg.host, "10.0.0.5");
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.send_queue, 8);
        assert_eq!(cfg.max_message_size, 1024);
    }
}

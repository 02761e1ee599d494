//! Client configuration.
//!
//! Loaded from TOML at startup; every field has a default, so an empty
//! file (or no file) yields a working local setup.
//!
//! ```toml
//! host = "corridors.example.org"
//! secure = true
//! reconnect_interval_ms = 3000
//! log_level = "debug"
//!
//! [keys]
//! game = "current_game"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Where the server writes each well-known record in the state tree.
///
/// Values are dotted keypaths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeKeys {
    /// The game record currently shown.
    pub game: String,
    /// The local user's seat in that game.
    pub color: String,
    pub user: String,
    /// Summaries of games that can be joined.
    pub games: String,
    pub notifications: String,
}

impl Default for TreeKeys {
    fn default() -> Self {
        Self {
            game: "current_game".to_string(),
            color: "current_color".to_string(),
            user: "user".to_string(),
            games: "games".to_string(),
            notifications: "notifications".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// `host[:port]` of the game server.
    pub host: String,
    /// Use `wss://` instead of `ws://`.
    pub secure: bool,
    pub socket_path: String,
    /// Delay between reconnect attempts, handed to the transport.
    pub reconnect_interval_ms: u64,
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_level: String,
    pub keys: TreeKeys,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost:8080".to_string(),
            secure: false,
            socket_path: "/ws/app/".to_string(),
            reconnect_interval_ms: 3000,
            log_level: "info".to_string(),
            keys: TreeKeys::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// WebSocket endpoint of the server.
    ///
    /// ```
    /// use corridors_client::config::ClientConfig;
    ///
    /// assert_eq!(ClientConfig::default().socket_url(), "ws://localhost:8080/ws/app/");
    /// ```
    pub fn socket_url(&self) -> String {
        let scheme = if self.secure { "wss" } else { "ws" };
        format!("{scheme}://{}{}", self.host, self.socket_path)
    }

    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }
}

//! Runtime configuration
//!
//! Tunables with environment-variable overrides. Validation limits are
//! fixed protocol constants, not configuration.

use std::env;
use std::time::Duration;

/// Maximum username length in characters
pub const MAX_USERNAME_LEN: usize = 50;

/// Maximum message body length in characters
pub const MAX_MESSAGE_LEN: usize = 1000;

/// Server runtime configuration
///
/// Built from environment variables with sensible defaults:
/// - `MAX_MESSAGE_HISTORY`: messages replayed to a joiner (default 50)
/// - `TYPING_TIMEOUT`: typing indicator expiry in milliseconds (default 3000)
/// - `DEFAULT_ROOM`: room assigned when a join names none (default "general")
#[derive(Debug, Clone)]
pub struct Config {
    /// How many recent messages a joiner receives
    pub history_limit: usize,
    /// Silence window after which a typing indicator expires
    pub typing_timeout: Duration,
    /// Room used when a join supplies no room name
    pub default_room: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history_limit: 50,
            typing_timeout: Duration::from_millis(3000),
            default_room: "general".to_string(),
        }
    }
}

impl Config {
    /// Build a configuration from the process environment
    ///
    /// Unset or unparseable variables fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let history_limit = env::var("MAX_MESSAGE_HISTORY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.history_limit);

        let typing_timeout = env::var("TYPING_TIMEOUT")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.typing_timeout);

        let default_room = env::var("DEFAULT_ROOM").unwrap_or(defaults.default_room);

        Self {
            history_limit,
            typing_timeout,
            default_room,
        }
    }
}

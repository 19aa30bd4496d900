//! Demo configuration, loaded from an optional JSON file
//!
//! ```json
//! {
//!   "coins": 250,
//!   "delay_ms": 1500,
//!   "store": { "label": "lottery", "qos": "user-interactive", "logging": { "exclude": [] } }
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use oneway::StoreConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::agent::{DEFAULT_DELAY, DEFAULT_TIMEOUT};
use crate::state::STARTING_COINS;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LotteryConfig {
    pub coins: u64,
    pub banned: bool,
    pub delay_ms: u64,
    pub timeout_ms: u64,
    pub store: StoreConfig,
}

impl Default for LotteryConfig {
    fn default() -> Self {
        Self {
            coins: STARTING_COINS,
            banned: false,
            delay_ms: DEFAULT_DELAY.as_millis() as u64,
            timeout_ms: DEFAULT_TIMEOUT.as_millis() as u64,
            store: StoreConfig::labeled("lottery"),
        }
    }
}

impl LotteryConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oneway::Qos;

    #[test]
    fn test_defaults() {
        let config = LotteryConfig::default();
        assert_eq!(config.coins, 100);
        assert_eq!(config.delay(), Duration::from_secs(2));
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.store.label, "lottery");
    }

    #[test]
    fn test_partial_json() {
        let config = LotteryConfig::from_json(
            r#"{ "coins": 250, "store": { "label": "lottery", "qos": "user-interactive" } }"#,
        )
        .unwrap();
        assert_eq!(config.coins, 250);
        assert_eq!(config.delay_ms, 2000);
        assert_eq!(config.store.qos, Qos::UserInteractive);
    }

    #[test]
    fn test_missing_file() {
        let err = LotteryConfig::from_file(Path::new("/nonexistent/lottery.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}

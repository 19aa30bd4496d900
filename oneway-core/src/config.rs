//! Store configuration

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::middleware::LogFilter;

/// Scheduling hint for a store's action worker.
///
/// Tokio has no task priorities, so the hint controls how eagerly the worker
/// drains its queue: the two lower classes yield to the scheduler after every
/// mutation so that other tasks on the runtime make progress first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Qos {
    UserInteractive,
    #[default]
    UserInitiated,
    Utility,
    Background,
}

impl Qos {
    /// Whether the worker yields between mutations.
    pub fn yields(self) -> bool {
        matches!(self, Qos::Utility | Qos::Background)
    }
}

/// Configuration applied by [`StoreBuilder::config`](crate::StoreBuilder::config).
///
/// ```
/// use oneway_core::{Qos, StoreConfig};
///
/// let config = StoreConfig::from_json(r#"{ "label": "lottery", "qos": "utility" }"#).unwrap();
/// assert_eq!(config.label, "lottery");
/// assert_eq!(config.qos, Qos::Utility);
/// assert!(config.logging.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Label used in log output.
    pub label: String,
    /// Scheduling hint for the action worker.
    pub qos: Qos,
    /// When set, a [`LoggingMiddleware`](crate::LoggingMiddleware) with this
    /// filter is installed.
    pub logging: Option<LogFilter>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            label: "store".to_string(),
            qos: Qos::default(),
            logging: None,
        }
    }
}

impl StoreConfig {
    /// Create a config with the given label and default settings
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the scheduling hint
    pub fn with_qos(mut self, qos: Qos) -> Self {
        self.qos = qos;
        self
    }

    /// Enable mutation logging with the given filter
    pub fn with_logging(mut self, filter: LogFilter) -> Self {
        self.logging = Some(filter);
        self
    }
}

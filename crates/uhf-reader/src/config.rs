//! Reader configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use uhf_core::ModuleType;
use uhf_core::constants::{DEFAULT_EVENT_CAPACITY, POLL_INTERVAL_MS, POWER_ON_SETTLE_MS};

/// Default name of the thread that creates and destroys module handles.
pub const DEFAULT_AFFINITY_THREAD_NAME: &str = "uhf-affinity";

/// Tunables of a [`UhfReader`](crate::UhfReader).
///
/// Deserializes with every field optional:
///
/// ```
/// use std::time::Duration;
/// use uhf_reader::ReaderConfig;
///
/// let config: ReaderConfig = serde_json::from_str(r#"{"pollIntervalMs": 20}"#).unwrap();
/// assert_eq!(config.poll_interval, Duration::from_millis(20));
/// assert_eq!(config.settle_period, Duration::from_millis(2500));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReaderConfig {
    /// Module family selected until `initialize` changes it.
    pub module_type: ModuleType,

    /// Use the 921 600 baud link instead of 115 200.
    pub high_baud: bool,

    /// Wait after a successful primitive power-on.
    #[serde(rename = "settlePeriodMs", with = "duration_ms")]
    pub settle_period: Duration,

    /// Pause between two buffered-frame reads while scanning.
    #[serde(rename = "pollIntervalMs", with = "duration_ms")]
    pub poll_interval: Duration,

    /// Readings buffered for the subscriber before new ones are dropped.
    pub event_capacity: usize,

    pub affinity_thread_name: String,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            module_type: ModuleType::default(),
            high_baud: false,
            settle_period: Duration::from_millis(POWER_ON_SETTLE_MS),
            poll_interval: Duration::from_millis(POLL_INTERVAL_MS),
            event_capacity: DEFAULT_EVENT_CAPACITY,
            affinity_thread_name: DEFAULT_AFFINITY_THREAD_NAME.to_string(),
        }
    }
}

impl ReaderConfig {
    pub fn with_module_type(mut self, module_type: ModuleType) -> Self {
        self.module_type = module_type;
        self
    }

    pub fn with_high_baud(mut self, high_baud: bool) -> Self {
        self.high_baud = high_baud;
        self
    }

    pub fn with_settle_period(mut self, settle_period: Duration) -> Self {
        self.settle_period = settle_period;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Set the subscriber channel capacity (at least 1).
    pub fn with_event_capacity(mut self, event_capacity: usize) -> Self {
        self.event_capacity = event_capacity.max(1);
        self
    }

    pub fn with_affinity_thread_name(mut self, name: impl Into<String>) -> Self {
        self.affinity_thread_name = name.into();
        self
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

//! Engine configuration with TOML file support.

use presence_types::{PresenceError, VerificationConfig};
use presence_utils::LogFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::source::{FixOptions, SubscriptionOptions};

/// Configuration for a [`SessionController`](crate::SessionController).
///
/// Can be loaded from a TOML file via [`EngineConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Period of the dwell tick scheduler in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Whether sessions spawn their own tick scheduler. Disable to drive
    /// `SessionHandle::tick` from an external scheduler.
    #[serde(default = "default_true")]
    pub auto_tick: bool,

    /// Capacity of each session's event queue.
    #[serde(default = "default_event_queue_capacity")]
    pub event_queue_capacity: usize,

    /// Capacity of each session's audit event broadcast.
    #[serde(default = "default_event_broadcast_capacity")]
    pub event_broadcast_capacity: usize,

    /// Minimum interval requested from the location subscription.
    #[serde(default = "default_location_min_interval_ms")]
    pub location_min_interval_ms: u64,

    /// Distance filter requested from the location subscription.
    #[serde(default)]
    pub location_distance_filter_m: f64,

    /// Accelerometer delivery interval.
    #[serde(default = "default_motion_interval_ms")]
    pub motion_interval_ms: u64,

    /// Default timeout for one-shot fixes.
    #[serde(default = "default_fix_timeout_ms")]
    pub fix_timeout_ms: u64,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Default thresholds for new sessions.
    #[serde(default)]
    pub verification: VerificationConfig,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_tick_interval_ms() -> u64 {
    1_000
}

fn default_true() -> bool {
    true
}

fn default_event_queue_capacity() -> usize {
    256
}

fn default_event_broadcast_capacity() -> usize {
    64
}

fn default_location_min_interval_ms() -> u64 {
    1_000
}

fn default_motion_interval_ms() -> u64 {
    100
}

fn default_fix_timeout_ms() -> u64 {
    10_000
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, PresenceError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| PresenceError::Config(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, PresenceError> {
        let config: Self = toml::from_str(s).map_err(|e| PresenceError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, PresenceError> {
        toml::to_string_pretty(self).map_err(|e| PresenceError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), PresenceError> {
        if self.tick_interval_ms == 0 {
            return Err(PresenceError::InvalidConfig("tick_interval_ms must be > 0".into()));
        }
        if self.event_queue_capacity == 0 || self.event_broadcast_capacity == 0 {
            return Err(PresenceError::InvalidConfig(
                "queue capacities must be > 0".into(),
            ));
        }
        if !(self.location_distance_filter_m.is_finite() && self.location_distance_filter_m >= 0.0)
        {
            return Err(PresenceError::InvalidConfig(
                "location_distance_filter_m must be >= 0".into(),
            ));
        }
        self.verification.validate()
    }

    /// Install the global tracing subscriber from `log_format` / `log_level`.
    pub fn init_logging(&self) -> bool {
        presence_utils::init_logging(self.log_format, &self.log_level)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn motion_interval(&self) -> Duration {
        Duration::from_millis(self.motion_interval_ms)
    }

    pub fn fix_timeout(&self) -> Duration {
        Duration::from_millis(self.fix_timeout_ms)
    }

    pub fn subscription_options(&self) -> SubscriptionOptions {
        SubscriptionOptions {
            min_interval: Duration::from_millis(self.location_min_interval_ms),
            distance_filter_m: self.location_distance_filter_m,
        }
    }

    /// One-shot fix parameters for a session gating on `max_accuracy_m`.
    pub fn fix_options(&self, max_accuracy_m: f64) -> FixOptions {
        FixOptions {
            max_accuracy_m,
            timeout: self.fix_timeout(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            auto_tick: default_true(),
            event_queue_capacity: default_event_queue_capacity(),
            event_broadcast_capacity: default_event_broadcast_capacity(),
            location_min_interval_ms: default_location_min_interval_ms(),
            location_distance_filter_m: 0.0,
            motion_interval_ms: default_motion_interval_ms(),
            fix_timeout_ms: default_fix_timeout_ms(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            verification: VerificationConfig::default(),
        }
    }
}

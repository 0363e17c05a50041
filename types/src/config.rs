//! Verification thresholds.

use crate::error::PresenceError;
use serde::{Deserialize, Serialize};

/// Tunable thresholds for a verification session.
///
/// Every field has a serde default, so a partial TOML table is enough.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerificationConfig {
    /// Samples with a worse horizontal accuracy fail the accuracy gate.
    #[serde(default = "default_max_accuracy_m")]
    pub max_accuracy_m: f64,

    /// Seconds of trusted in-radius dwell needed to reach `Verified`.
    #[serde(default = "default_required_dwell_secs")]
    pub required_dwell_secs: u64,

    /// Speed above which a short-gap position change counts as teleportation.
    /// Default 33 m/s (about 120 km/h).
    #[serde(default = "default_teleport_speed_threshold_mps")]
    pub teleport_speed_threshold_mps: f64,

    /// Gaps at or above this many seconds are never judged as teleportation.
    #[serde(default = "default_teleport_min_gap_secs")]
    pub teleport_min_gap_secs: f64,

    /// Number of location samples kept in the history ring buffer.
    #[serde(default = "default_sample_history_capacity")]
    pub sample_history_capacity: usize,

    /// Consecutive poor-accuracy samples while acquiring before `PoorSignal`.
    #[serde(default = "default_poor_signal_sample_limit")]
    pub poor_signal_sample_limit: u32,

    /// Seconds without any accepted sample after start before status reports a timeout.
    #[serde(default = "default_sample_timeout_secs")]
    pub sample_timeout_secs: u64,

    /// Acceleration magnitude, in g, that counts as observed motion.
    #[serde(default = "default_motion_threshold_g")]
    pub motion_threshold_g: f64,
}

fn default_max_accuracy_m() -> f64 {
    50.0
}

fn default_required_dwell_secs() -> u64 {
    30
}

fn default_teleport_speed_threshold_mps() -> f64 {
    33.0
}

fn default_teleport_min_gap_secs() -> f64 {
    5.0
}

fn default_sample_history_capacity() -> usize {
    10
}

fn default_poor_signal_sample_limit() -> u32 {
    3
}

fn default_sample_timeout_secs() -> u64 {
    15
}

fn default_motion_threshold_g() -> f64 {
    1.1
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            max_accuracy_m: default_max_accuracy_m(),
            required_dwell_secs: default_required_dwell_secs(),
            teleport_speed_threshold_mps: default_teleport_speed_threshold_mps(),
            teleport_min_gap_secs: default_teleport_min_gap_secs(),
            sample_history_capacity: default_sample_history_capacity(),
            poor_signal_sample_limit: default_poor_signal_sample_limit(),
            sample_timeout_secs: default_sample_timeout_secs(),
            motion_threshold_g: default_motion_threshold_g(),
        }
    }
}

impl VerificationConfig {
    /// Reject thresholds that would make the state machine meaningless.
    pub fn validate(&self) -> Result<(), PresenceError> {
        if !(self.max_accuracy_m.is_finite() && self.max_accuracy_m > 0.0) {
            return Err(PresenceError::InvalidConfig(format!(
                "max_accuracy_m must be > 0, got {}",
                self.max_accuracy_m
            )));
        }
        if !(self.teleport_speed_threshold_mps.is_finite() && self.teleport_speed_threshold_mps > 0.0)
        {
            return Err(PresenceError::InvalidConfig(format!(
                "teleport_speed_threshold_mps must be > 0, got {}",
                self.teleport_speed_threshold_mps
            )));
        }
        if !(self.teleport_min_gap_secs.is_finite() && self.teleport_min_gap_secs >= 0.0) {
            return Err(PresenceError::InvalidConfig(format!(
                "teleport_min_gap_secs must be >= 0, got {}",
                self.teleport_min_gap_secs
            )));
        }
        if self.sample_history_capacity < 2 {
            return Err(PresenceError::InvalidConfig(
                "sample_history_capacity must hold at least 2 samples".into(),
            ));
        }
        if self.poor_signal_sample_limit == 0 {
            return Err(PresenceError::InvalidConfig(
                "poor_signal_sample_limit must be >= 1".into(),
            ));
        }
        if !(self.motion_threshold_g.is_finite() && self.motion_threshold_g > 1.0) {
            return Err(PresenceError::InvalidConfig(format!(
                "motion_threshold_g must exceed 1 g, got {}",
                self.motion_threshold_g
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = VerificationConfig::default();
        assert_eq!(c.max_accuracy_m, 50.0);
        assert_eq!(c.required_dwell_secs, 30);
        assert_eq!(c.teleport_speed_threshold_mps, 33.0);
        assert_eq!(c.teleport_min_gap_secs, 5.0);
        assert_eq!(c.sample_history_capacity, 10);
        assert_eq!(c.poor_signal_sample_limit, 3);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let c: VerificationConfig = serde_json::from_str(r#"{"required_dwell_secs": 5}"#).unwrap();
        assert_eq!(c.required_dwell_secs, 5);
        assert_eq!(c.max_accuracy_m, 50.0);
    }

    #[test]
    fn tiny_history_rejected() {
        let c = VerificationConfig {
            sample_history_capacity: 1,
            ..Default::default()
        };
        assert!(matches!(c.validate(), Err(PresenceError::InvalidConfig(_))));
    }

    #[test]
    fn zero_accuracy_rejected() {
        let c = VerificationConfig {
            max_accuracy_m: 0.0,
            ..Default::default()
        };
        assert!(c.validate().is_err());
    }
}

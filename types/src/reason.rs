//! Structured reason codes surfaced to callers.

use serde::{Deserialize, Serialize};

/// Machine-readable reason attached to detector results and submission decisions.
///
/// Callers map these to user-facing copy; the engine never emits free text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    /// Check passed.
    Ok,
    /// Horizontal accuracy worse than the configured maximum.
    PoorAccuracy,
    /// Live distance exceeds the geofence radius.
    OutsideRadius,
    /// Implausible movement between consecutive samples.
    SpoofDetected,
    /// The platform reported the position as software-injected.
    SimulatedLocation,
    /// Dwell requirement not yet met. Advisory only.
    IncompleteDwell,
    /// No sample arrived within the configured window after start.
    Timeout,
    /// No location sample has been accepted yet.
    NoSample,
}

impl ReasonCode {
    /// Whether this reason blocks submission on its own.
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            Self::PoorAccuracy | Self::OutsideRadius | Self::SpoofDetected | Self::NoSample
        )
    }
}

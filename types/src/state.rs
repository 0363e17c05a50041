//! The trust state of a verification session.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a verification session sits in the trust state machine.
///
/// Success path: `Init → Acquiring → InsideVerifying → Verified`.
/// Failure states: `OutsideRadius`, `PoorSignal`, `SpoofDetected`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrustState {
    /// Session created, sources not yet delivering.
    Init,
    /// Waiting for the first trustworthy fix inside the geofence.
    Acquiring,
    /// Inside the geofence, accumulating dwell time.
    InsideVerifying,
    /// Dwell requirement met.
    Verified,
    /// A sample placed the user outside the geofence. Terminal for the session.
    OutsideRadius,
    /// Accuracy stayed above the threshold too long while acquiring. Recoverable.
    PoorSignal,
    /// Implausible movement detected. Terminal and non-retryable.
    SpoofDetected,
}

impl TrustState {
    /// Whether the session refuses further state progress.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::OutsideRadius | Self::SpoofDetected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Acquiring => "acquiring",
            Self::InsideVerifying => "inside_verifying",
            Self::Verified => "verified",
            Self::OutsideRadius => "outside_radius",
            Self::PoorSignal => "poor_signal",
            Self::SpoofDetected => "spoof_detected",
        }
    }
}

impl fmt::Display for TrustState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

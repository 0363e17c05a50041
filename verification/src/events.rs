//! Audit events emitted by a verification session.

use crate::session::SessionId;
use presence_types::{Timestamp, TrustState};
use serde::{Deserialize, Serialize};

/// What caused a state change, stamped in that cause's own time base.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum ChangeTrigger {
    /// A location sample; `sample_time` comes from the location source.
    Sample { sample_time: Timestamp },
    /// Session start or a dwell tick; `session_time` comes from the session clock.
    Clock { session_time: Timestamp },
}

/// Events emitted by a session for the caller's audit trail.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VerificationEvent {
    /// The trust state changed.
    StateChanged {
        session: SessionId,
        from: TrustState,
        to: TrustState,
        trigger: ChangeTrigger,
    },
    /// Teleport detected; the session's spoof flag is now permanently set.
    SpoofFlagged {
        session: SessionId,
        moved_m: f64,
        elapsed_secs: f64,
        implied_speed_mps: f64,
        /// Ground speed the source itself reported for the offending fix.
        reported_speed_mps: Option<f64>,
    },
    /// No sample arrived within the configured window after start.
    TimedOut { session: SessionId, waited_secs: u64 },
    /// First accelerometer reading above the motion threshold.
    MotionObserved { session: SessionId, magnitude_g: f64 },
}

impl VerificationEvent {
    pub fn session(&self) -> SessionId {
        match self {
            Self::StateChanged { session, .. }
            | Self::SpoofFlagged { session, .. }
            | Self::TimedOut { session, .. }
            | Self::MotionObserved { session, .. } => *session,
        }
    }
}

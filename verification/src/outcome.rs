//! Read-only views of a session: status snapshot, submission gate, audit metadata.

use crate::session::SessionId;
use presence_types::{ReasonCode, TrustState};
use serde::{Deserialize, Serialize};

/// Side-effect-free snapshot of a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub session_id: SessionId,
    pub state: TrustState,
    /// Live distance to the geofence center; `None` before the first sample.
    pub distance_m: Option<f64>,
    pub accuracy_m: Option<f64>,
    pub dwell_secs: u64,
    pub required_dwell_secs: u64,
    pub motion_ever_observed: bool,
    pub spoof_ever_detected: bool,
    /// No sample arrived within the timeout window after start.
    pub timed_out: bool,
    /// Location samples accepted so far.
    pub sample_count: u64,
}

/// Final gate answer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionDecision {
    pub allowed: bool,
    /// Blocking and advisory reasons, in a stable order.
    pub reasons: Vec<ReasonCode>,
}

impl SubmissionDecision {
    /// Build from reasons; submission is allowed when none of them blocks.
    pub fn from_reasons(reasons: Vec<ReasonCode>) -> Self {
        let allowed = !reasons.iter().any(ReasonCode::is_blocking);
        Self { allowed, reasons }
    }

    pub fn has(&self, reason: ReasonCode) -> bool {
        self.reasons.contains(&reason)
    }
}

/// Audit record attached to an outbound review submission.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubmissionMetadata {
    pub distance_at_submit_m: Option<f64>,
    pub accuracy_at_submit_m: Option<f64>,
    pub dwell_secs_at_submit: u64,
    pub motion_ever_observed: bool,
    pub spoof_ever_detected: bool,
    pub sample_count: u64,
}

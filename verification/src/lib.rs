//! Location trust verification.
//!
//! Decides whether a reviewer is physically present at a venue for a sustained
//! period:
//! 1. **Ingestion**: location samples are ordered, validated and kept in a bounded ring buffer.
//! 2. **Detectors**: accuracy, spoofed-source and teleport gates judge every sample;
//!    a separate motion detector watches the accelerometer stream.
//! 3. **State machine**: detector outcomes and dwell ticks drive the trust state.
//!
//! [`VerificationSession`] ties the pieces together and answers the final
//! "may this review be submitted" question.

pub mod detectors;
pub mod events;
pub mod history;
pub mod ingest;
pub mod outcome;
pub mod session;
pub mod state_machine;

pub use detectors::{
    AccuracyGate, Detector, DetectorContext, DetectorResult, MotionPresence, SampleAssessment,
    SpoofedSourceGate, TeleportGate,
};
pub use events::{ChangeTrigger, VerificationEvent};
pub use history::SampleHistory;
pub use ingest::{DropReason, IngestOutcome, LiveReading};
pub use outcome::{SessionStatus, SubmissionDecision, SubmissionMetadata};
pub use session::{FeedOutcome, SessionId, VerificationSession};
pub use state_machine::{StateChange, TrustStateMachine};

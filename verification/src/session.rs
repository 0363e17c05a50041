//! Verification session: connects ingestion, detectors and the trust state machine
//! into a single presence-verification workflow.
//!
//! The session is synchronous and single-owner. Async delivery, tick scheduling
//! and source subscriptions live in `presence-engine`, which drives one session
//! from one actor task.

use crate::detectors::{DetectorContext, MotionPresence, SampleAssessment, TeleportGate};
use crate::events::{ChangeTrigger, VerificationEvent};
use crate::history::SampleHistory;
use crate::ingest::{ingest, DropReason, IngestOutcome, LiveReading};
use crate::outcome::{SessionStatus, SubmissionDecision, SubmissionMetadata};
use crate::state_machine::{StateChange, TickOutcome, TrustStateMachine};
use presence_types::{
    GeofenceTarget, LocationSample, MotionSample, PresenceError, ReasonCode, Timestamp,
    TrustState, VerificationConfig,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one verification session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(u64);

impl SessionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// What happened to a fed location sample.
#[derive(Clone, Debug, PartialEq)]
pub enum FeedOutcome {
    Accepted {
        assessment: SampleAssessment,
        changes: Vec<StateChange>,
    },
    Dropped(DropReason),
}

impl FeedOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

/// One presence-verification attempt against one geofence.
pub struct VerificationSession {
    id: SessionId,
    target: GeofenceTarget,
    config: VerificationConfig,
    machine: TrustStateMachine,
    history: SampleHistory,
    live: LiveReading,
    motion_ever_observed: bool,
    spoof_ever_detected: bool,
    accepted_samples: u64,
    timed_out: bool,
    started_at: Timestamp,
    /// Pending events for the owner to drain.
    pending_events: Vec<VerificationEvent>,
}

impl VerificationSession {
    /// Create a session in `Init`. Fails fast on an invalid target or config.
    pub fn new(
        id: SessionId,
        target: GeofenceTarget,
        config: VerificationConfig,
        started_at: Timestamp,
    ) -> Result<Self, PresenceError> {
        target.validate()?;
        config.validate()?;
        Ok(Self {
            id,
            target,
            history: SampleHistory::with_capacity(config.sample_history_capacity),
            config,
            machine: TrustStateMachine::new(),
            live: LiveReading::default(),
            motion_ever_observed: false,
            spoof_ever_detected: false,
            accepted_samples: 0,
            timed_out: false,
            started_at,
            pending_events: Vec::new(),
        })
    }

    /// Create a session and move it straight to `Acquiring`.
    pub fn start(
        id: SessionId,
        target: GeofenceTarget,
        config: VerificationConfig,
        now: Timestamp,
    ) -> Result<Self, PresenceError> {
        let mut session = Self::new(id, target, config, now)?;
        session.begin(now);
        Ok(session)
    }

    /// `Init → Acquiring`.
    pub fn begin(&mut self, now: Timestamp) -> Option<StateChange> {
        let change = self.machine.begin();
        self.record_change(change, ChangeTrigger::Clock { session_time: now });
        change
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> TrustState {
        self.machine.state()
    }

    pub fn target(&self) -> &GeofenceTarget {
        &self.target
    }

    pub fn config(&self) -> &VerificationConfig {
        &self.config
    }

    pub fn history(&self) -> &SampleHistory {
        &self.history
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    /// Ingest a location sample, run the detectors and advance the state machine.
    ///
    /// Duplicate and out-of-order samples are dropped, not errored.
    pub fn feed_location(&mut self, sample: LocationSample) -> Result<FeedOutcome, PresenceError> {
        match ingest(&mut self.history, &self.target, &mut self.live, sample)? {
            IngestOutcome::Dropped(reason) => {
                tracing::trace!(session = %self.id, ?reason, "dropped location sample");
                return Ok(FeedOutcome::Dropped(reason));
            }
            IngestOutcome::Accepted { .. } => {}
        }
        self.accepted_samples += 1;
        self.timed_out = false;

        let previous = self.history.previous().copied();
        let ctx = DetectorContext {
            config: &self.config,
            previous: previous.as_ref(),
        };
        let assessment = SampleAssessment::evaluate(&ctx, &sample);

        if assessment.teleport_failed() && !self.spoof_ever_detected {
            self.spoof_ever_detected = true;
            if let Some(prev) = previous.as_ref() {
                let movement = TeleportGate::measure(prev, &sample);
                tracing::warn!(
                    session = %self.id,
                    moved_m = movement.moved_m,
                    elapsed_secs = movement.elapsed_secs,
                    "teleport detected, flagging session as spoofed"
                );
                self.pending_events.push(VerificationEvent::SpoofFlagged {
                    session: self.id,
                    moved_m: movement.moved_m,
                    elapsed_secs: movement.elapsed_secs,
                    implied_speed_mps: movement.speed_mps(),
                    reported_speed_mps: sample.speed_mps,
                });
            }
        }

        let inside = self
            .live
            .distance_m
            .is_some_and(|d| d <= self.target.radius_m);

        let trigger = ChangeTrigger::Sample {
            sample_time: sample.timestamp,
        };
        let mut changes = Vec::new();
        let change = self.machine.on_sample(inside, &assessment, &self.config);
        self.record_change(change, trigger);
        changes.extend(change);
        let settled = self.machine.settle(&self.config);
        self.record_change(settled, trigger);
        changes.extend(settled);

        Ok(FeedOutcome::Accepted {
            assessment,
            changes,
        })
    }

    /// Feed an accelerometer reading. Returns `true` the first time motion is observed.
    pub fn feed_motion(&mut self, sample: MotionSample) -> bool {
        if self.motion_ever_observed || !MotionPresence::is_motion(&self.config, &sample) {
            return false;
        }
        self.motion_ever_observed = true;
        tracing::debug!(session = %self.id, magnitude_g = sample.magnitude_g(), "motion observed");
        self.pending_events.push(VerificationEvent::MotionObserved {
            session: self.id,
            magnitude_g: sample.magnitude_g(),
        });
        true
    }

    /// Advance dwell accounting by one second and check the sample timeout.
    pub fn tick(&mut self, now: Timestamp) -> TickOutcome {
        let age_secs = self.started_at.elapsed_secs(now);

        if self.accepted_samples == 0
            && !self.timed_out
            && !self.state().is_terminal()
            && age_secs >= self.config.sample_timeout_secs
        {
            self.timed_out = true;
            tracing::debug!(session = %self.id, waited_secs = age_secs, "no sample before timeout");
            self.pending_events.push(VerificationEvent::TimedOut {
                session: self.id,
                waited_secs: age_secs,
            });
        }

        let outcome = self.machine.on_tick(age_secs, &self.config);
        self.record_change(outcome.change, ChangeTrigger::Clock { session_time: now });
        outcome
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            session_id: self.id,
            state: self.state(),
            distance_m: self.live.distance_m,
            accuracy_m: self.live.accuracy_m,
            dwell_secs: self.machine.dwell_secs(),
            required_dwell_secs: self.config.required_dwell_secs,
            motion_ever_observed: self.motion_ever_observed,
            spoof_ever_detected: self.spoof_ever_detected,
            timed_out: self.timed_out,
            sample_count: self.accepted_samples,
        }
    }

    /// Final submission gate, re-evaluated from live readings.
    ///
    /// Allowed iff the state is not `SpoofDetected`, the live distance is within
    /// the radius and the live accuracy is within the maximum. Incomplete dwell,
    /// a sample timeout and a simulated latest fix are reported but do not block.
    pub fn can_submit(&self) -> SubmissionDecision {
        let mut reasons = Vec::new();

        if self.state() == TrustState::SpoofDetected {
            reasons.push(ReasonCode::SpoofDetected);
        }
        match self.live.distance_m {
            None => reasons.push(ReasonCode::NoSample),
            Some(d) if d > self.target.radius_m => reasons.push(ReasonCode::OutsideRadius),
            Some(_) => {}
        }
        if self
            .live
            .accuracy_m
            .is_some_and(|a| a > self.config.max_accuracy_m)
        {
            reasons.push(ReasonCode::PoorAccuracy);
        }
        if self.machine.dwell_secs() < self.config.required_dwell_secs {
            reasons.push(ReasonCode::IncompleteDwell);
        }
        if self.timed_out {
            reasons.push(ReasonCode::Timeout);
        }
        if self
            .history
            .latest()
            .is_some_and(|s| s.simulated.is_simulated())
        {
            reasons.push(ReasonCode::SimulatedLocation);
        }

        SubmissionDecision::from_reasons(reasons)
    }

    pub fn submission_metadata(&self) -> SubmissionMetadata {
        SubmissionMetadata {
            distance_at_submit_m: self.live.distance_m,
            accuracy_at_submit_m: self.live.accuracy_m,
            dwell_secs_at_submit: self.machine.dwell_secs(),
            motion_ever_observed: self.motion_ever_observed,
            spoof_ever_detected: self.spoof_ever_detected,
            sample_count: self.accepted_samples,
        }
    }

    /// Drain all pending events.
    pub fn drain_events(&mut self) -> Vec<VerificationEvent> {
        std::mem::take(&mut self.pending_events)
    }

    fn record_change(&mut self, change: Option<StateChange>, trigger: ChangeTrigger) {
        let Some(StateChange { from, to }) = change else {
            return;
        };
        if to == TrustState::SpoofDetected || to == TrustState::OutsideRadius {
            tracing::info!(session = %self.id, %from, %to, distance_m = ?self.live.distance_m, "session reached terminal state");
        } else {
            tracing::debug!(session = %self.id, %from, %to, "state transition");
        }
        self.pending_events.push(VerificationEvent::StateChanged {
            session: self.id,
            from,
            to,
            trigger,
        });
    }
}

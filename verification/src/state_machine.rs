//! Trust state machine.
//!
//! Transitions are evaluated on every accepted sample and on every dwell tick:
//! - `Init → Acquiring` when the session begins.
//! - `Acquiring | PoorSignal → InsideVerifying` on the first in-radius sample passing every gate.
//! - `InsideVerifying → Verified` once dwell reaches the requirement.
//! - any non-terminal state except `Verified` `→ OutsideRadius` on a sample beyond the radius.
//! - any state `→ SpoofDetected` on a teleport failure.
//! - `Acquiring → PoorSignal` after `poor_signal_sample_limit` consecutive poor-accuracy samples.
//!
//! Dwell pauses while the latest sample is untrusted. It is never reset.

use crate::detectors::SampleAssessment;
use presence_types::{TrustState, VerificationConfig};
use serde::{Deserialize, Serialize};

/// A single state transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    pub from: TrustState,
    pub to: TrustState,
}

/// Result of a dwell tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Whether a dwell second was credited.
    pub credited: bool,
    pub change: Option<StateChange>,
}

#[derive(Clone, Debug)]
pub struct TrustStateMachine {
    state: TrustState,
    dwell_secs: u64,
    consecutive_poor: u32,
    /// Whether the most recent accepted sample satisfied every dwell condition.
    latest_trusted: bool,
}

impl Default for TrustStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl TrustStateMachine {
    pub fn new() -> Self {
        Self {
            state: TrustState::Init,
            dwell_secs: 0,
            consecutive_poor: 0,
            latest_trusted: false,
        }
    }

    pub fn state(&self) -> TrustState {
        self.state
    }

    pub fn dwell_secs(&self) -> u64 {
        self.dwell_secs
    }

    pub fn consecutive_poor(&self) -> u32 {
        self.consecutive_poor
    }

    pub fn latest_trusted(&self) -> bool {
        self.latest_trusted
    }

    fn transition(&mut self, to: TrustState) -> Option<StateChange> {
        if self.state == to {
            return None;
        }
        let change = StateChange {
            from: self.state,
            to,
        };
        self.state = to;
        Some(change)
    }

    /// `Init → Acquiring`. No-op in any other state.
    pub fn begin(&mut self) -> Option<StateChange> {
        if self.state == TrustState::Init {
            self.transition(TrustState::Acquiring)
        } else {
            None
        }
    }

    /// Apply one accepted, assessed sample.
    pub fn on_sample(
        &mut self,
        inside: bool,
        assessment: &SampleAssessment,
        config: &VerificationConfig,
    ) -> Option<StateChange> {
        self.latest_trusted = inside && assessment.all_pass();

        if assessment.teleport_failed() {
            return self.transition(TrustState::SpoofDetected);
        }

        match self.state {
            TrustState::Init
            | TrustState::Verified
            | TrustState::OutsideRadius
            | TrustState::SpoofDetected => None,
            TrustState::InsideVerifying => {
                if inside {
                    None
                } else {
                    self.transition(TrustState::OutsideRadius)
                }
            }
            TrustState::Acquiring | TrustState::PoorSignal => {
                if !inside {
                    return self.transition(TrustState::OutsideRadius);
                }
                if !assessment.accuracy_ok() {
                    self.consecutive_poor = self.consecutive_poor.saturating_add(1);
                    if self.state == TrustState::Acquiring
                        && self.consecutive_poor >= config.poor_signal_sample_limit
                    {
                        return self.transition(TrustState::PoorSignal);
                    }
                    return None;
                }
                self.consecutive_poor = 0;
                if self.latest_trusted {
                    self.transition(TrustState::InsideVerifying)
                } else {
                    // Accuracy recovered but another gate failed.
                    self.transition(TrustState::Acquiring)
                }
            }
        }
    }

    /// Credit one dwell second if the latest sample is trusted, then settle.
    ///
    /// `age_cap_secs` is the session's wall-clock age; dwell never exceeds it.
    pub fn on_tick(&mut self, age_cap_secs: u64, config: &VerificationConfig) -> TickOutcome {
        let mut credited = false;
        if self.state == TrustState::InsideVerifying
            && self.latest_trusted
            && self.dwell_secs < age_cap_secs
        {
            self.dwell_secs += 1;
            credited = true;
        }
        TickOutcome {
            credited,
            change: self.settle(config),
        }
    }

    /// `InsideVerifying → Verified` once the dwell requirement is met.
    pub fn settle(&mut self, config: &VerificationConfig) -> Option<StateChange> {
        if self.state == TrustState::InsideVerifying && self.dwell_secs >= config.required_dwell_secs
        {
            self.transition(TrustState::Verified)
        } else {
            None
        }
    }
}

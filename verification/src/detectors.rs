//! Anomaly detectors run against every accepted location sample.
//!
//! Each detector is a pure function of the session context and the new sample.
//! They run in a fixed order: accuracy, spoofed source, teleport. Any failure
//! makes the sample untrusted for dwell accounting; only a teleport failure
//! escalates to a spoof.
//!
//! The motion detector is separate: it watches the accelerometer stream and is
//! advisory only.

use presence_geo::distance_meters;
use presence_types::{LocationSample, MotionSample, ReasonCode, VerificationConfig};

/// Verdict of a single detector on a single sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DetectorResult {
    pub pass: bool,
    pub reason: ReasonCode,
}

impl DetectorResult {
    pub fn pass() -> Self {
        Self {
            pass: true,
            reason: ReasonCode::Ok,
        }
    }

    pub fn fail(reason: ReasonCode) -> Self {
        Self {
            pass: false,
            reason,
        }
    }
}

/// What a detector may look at besides the new sample.
pub struct DetectorContext<'a> {
    pub config: &'a VerificationConfig,
    /// The sample accepted immediately before the one under evaluation.
    pub previous: Option<&'a LocationSample>,
}

/// A location-sample check.
pub trait Detector: Send + Sync {
    /// Stable identifier used in logs.
    fn name(&self) -> &'static str;

    fn evaluate(&self, ctx: &DetectorContext<'_>, sample: &LocationSample) -> DetectorResult;
}

/// Fails when horizontal accuracy is worse than `max_accuracy_m`.
pub struct AccuracyGate;

impl Detector for AccuracyGate {
    fn name(&self) -> &'static str {
        "accuracy"
    }

    fn evaluate(&self, ctx: &DetectorContext<'_>, sample: &LocationSample) -> DetectorResult {
        if sample.horizontal_accuracy_m > ctx.config.max_accuracy_m {
            DetectorResult::fail(ReasonCode::PoorAccuracy)
        } else {
            DetectorResult::pass()
        }
    }
}

/// Fails only on an explicit `Simulated` report.
///
/// An `Unknown` flag passes this gate but is still not evidence of a genuine fix.
pub struct SpoofedSourceGate;

impl Detector for SpoofedSourceGate {
    fn name(&self) -> &'static str {
        "spoofed_source"
    }

    fn evaluate(&self, _ctx: &DetectorContext<'_>, sample: &LocationSample) -> DetectorResult {
        if sample.simulated.is_simulated() {
            DetectorResult::fail(ReasonCode::SimulatedLocation)
        } else {
            DetectorResult::pass()
        }
    }
}

/// Position change between two consecutive accepted samples.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Movement {
    pub moved_m: f64,
    pub elapsed_secs: f64,
}

impl Movement {
    pub fn speed_mps(&self) -> f64 {
        if self.elapsed_secs > 0.0 {
            self.moved_m / self.elapsed_secs
        } else {
            f64::INFINITY
        }
    }
}

/// Fails when a short-gap position change implies an implausible speed.
pub struct TeleportGate;

impl TeleportGate {
    /// Movement from `previous` to `sample`. Both are validated at ingestion.
    pub fn measure(previous: &LocationSample, sample: &LocationSample) -> Movement {
        let moved_m = distance_meters(
            previous.latitude,
            previous.longitude,
            sample.latitude,
            sample.longitude,
        )
        .unwrap_or(0.0);
        Movement {
            moved_m,
            elapsed_secs: sample.timestamp.secs_since(previous.timestamp),
        }
    }

    pub fn is_teleport(config: &VerificationConfig, movement: &Movement) -> bool {
        movement.elapsed_secs < config.teleport_min_gap_secs
            && movement.speed_mps() > config.teleport_speed_threshold_mps
    }
}

impl Detector for TeleportGate {
    fn name(&self) -> &'static str {
        "teleport"
    }

    fn evaluate(&self, ctx: &DetectorContext<'_>, sample: &LocationSample) -> DetectorResult {
        let Some(previous) = ctx.previous else {
            return DetectorResult::pass();
        };
        let movement = Self::measure(previous, sample);
        if Self::is_teleport(ctx.config, &movement) {
            DetectorResult::fail(ReasonCode::SpoofDetected)
        } else {
            DetectorResult::pass()
        }
    }
}

/// Location detectors in evaluation order.
pub static LOCATION_DETECTORS: [&dyn Detector; 3] = [&AccuracyGate, &SpoofedSourceGate, &TeleportGate];

/// Combined verdict of all location detectors on one sample.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleAssessment {
    pub results: Vec<(&'static str, DetectorResult)>,
}

impl SampleAssessment {
    /// Run every location detector in order.
    pub fn evaluate(ctx: &DetectorContext<'_>, sample: &LocationSample) -> Self {
        let results = LOCATION_DETECTORS
            .iter()
            .map(|d| (d.name(), d.evaluate(ctx, sample)))
            .collect();
        Self { results }
    }

    pub fn all_pass(&self) -> bool {
        self.results.iter().all(|(_, r)| r.pass)
    }

    fn failed_with(&self, reason: ReasonCode) -> bool {
        self.results.iter().any(|(_, r)| !r.pass && r.reason == reason)
    }

    pub fn accuracy_ok(&self) -> bool {
        !self.failed_with(ReasonCode::PoorAccuracy)
    }

    pub fn teleport_failed(&self) -> bool {
        self.failed_with(ReasonCode::SpoofDetected)
    }

    /// Reason codes of every failing detector, in evaluation order.
    pub fn failures(&self) -> Vec<ReasonCode> {
        self.results
            .iter()
            .filter(|(_, r)| !r.pass)
            .map(|(_, r)| r.reason)
            .collect()
    }
}

/// Advisory detector on the accelerometer stream.
pub struct MotionPresence;

impl MotionPresence {
    /// Whether this reading exceeds gravity by the configured margin.
    pub fn is_motion(config: &VerificationConfig, sample: &MotionSample) -> bool {
        sample.magnitude_mps2.is_finite() && sample.magnitude_g() > config.motion_threshold_g
    }
}

use proptest::prelude::*;

use presence_geo::destination;
use presence_types::{
    GeofenceTarget, LocationSample, SimulatedFlag, Timestamp, TrustState, VerificationConfig,
};
use presence_verification::{SampleHistory, SessionId, VerificationSession};

const LAT: f64 = -33.8688;
const LON: f64 = 151.2093;

/// One step of a randomly generated session: a sample and a number of ticks after it.
#[derive(Clone, Debug)]
struct Step {
    gap_ms: u64,
    range_m: f64,
    bearing: f64,
    accuracy: f64,
    simulated: Option<bool>,
    ticks: u8,
}

fn step() -> impl Strategy<Value = Step> {
    (
        0u64..8_000,
        0.0f64..1_500.0,
        0.0f64..360.0,
        1.0f64..120.0,
        prop::option::of(any::<bool>()),
        0u8..4,
    )
        .prop_map(|(gap_ms, range_m, bearing, accuracy, simulated, ticks)| Step {
            gap_ms,
            range_m,
            bearing,
            accuracy,
            simulated,
            ticks,
        })
}

fn run(steps: &[Step]) -> Vec<(TrustState, u64, bool, u64)> {
    let target = GeofenceTarget::new(LAT, LON, 500.0);
    let mut session = VerificationSession::start(
        SessionId::new(7),
        target,
        VerificationConfig::default(),
        Timestamp::EPOCH,
    )
    .unwrap();

    let mut source_ms = 0u64;
    let mut clock_ms = 0u64;
    let mut trace = Vec::new();
    for s in steps {
        source_ms += s.gap_ms;
        let (lat, lon) = destination(LAT, LON, s.bearing, s.range_m).unwrap();
        let sample = LocationSample::new(lat, lon, s.accuracy, Timestamp::from_millis(source_ms))
            .with_simulated(SimulatedFlag::from(s.simulated));
        session.feed_location(sample).unwrap();
        for _ in 0..s.ticks {
            clock_ms += 1_000;
            session.tick(Timestamp::from_millis(clock_ms));
        }
        let status = session.status();
        trace.push((status.state, status.dwell_secs, status.spoof_ever_detected, clock_ms));
    }
    trace
}

proptest! {
    /// History never exceeds capacity and always keeps the newest samples in order.
    #[test]
    fn history_keeps_newest_in_order(capacity in 1usize..16, count in 0u64..64) {
        let mut history = SampleHistory::with_capacity(capacity);
        for ts in 0..count {
            history.push(LocationSample::new(0.0, 0.0, 1.0, Timestamp::from_millis(ts)));
            prop_assert!(history.len() <= capacity);
        }
        let kept: Vec<u64> = history.iter().map(|s| s.timestamp.as_millis()).collect();
        let first = count.saturating_sub(capacity as u64);
        let expected: Vec<u64> = (first..count).collect();
        prop_assert_eq!(kept, expected);
    }

    /// Dwell never decreases and never exceeds the session's wall-clock age.
    #[test]
    fn dwell_monotonic_and_bounded(steps in prop::collection::vec(step(), 1..40)) {
        let trace = run(&steps);
        let mut last_dwell = 0;
        for (_, dwell, _, clock_ms) in trace {
            prop_assert!(dwell >= last_dwell);
            prop_assert!(dwell * 1_000 <= clock_ms);
            last_dwell = dwell;
        }
    }

    /// Once raised, the spoof flag stays raised and the state stays SpoofDetected.
    #[test]
    fn spoof_is_absorbing(steps in prop::collection::vec(step(), 1..40)) {
        let trace = run(&steps);
        let mut seen = false;
        for (state, _, spoof, _) in trace {
            if seen {
                prop_assert!(spoof);
                prop_assert_eq!(state, TrustState::SpoofDetected);
            }
            if spoof {
                prop_assert_eq!(state, TrustState::SpoofDetected);
                seen = true;
            }
        }
    }

    /// OutsideRadius is only ever left for SpoofDetected.
    #[test]
    fn outside_radius_is_terminal(steps in prop::collection::vec(step(), 1..40)) {
        let trace = run(&steps);
        let mut outside = false;
        for (state, _, _, _) in trace {
            if outside {
                prop_assert!(matches!(state, TrustState::OutsideRadius | TrustState::SpoofDetected));
            }
            outside |= state == TrustState::OutsideRadius;
        }
    }

    /// A clean in-radius stream fed once per second verifies with dwell == required.
    #[test]
    fn clean_stream_verifies(required in 1u64..60, range in 0.0f64..450.0, accuracy in 1.0f64..50.0) {
        let config = VerificationConfig { required_dwell_secs: required, ..Default::default() };
        let mut session = VerificationSession::start(
            SessionId::new(1),
            GeofenceTarget::new(LAT, LON, 500.0),
            config,
            Timestamp::EPOCH,
        ).unwrap();
        let (lat, lon) = destination(LAT, LON, 90.0, range).unwrap();
        session.feed_location(LocationSample::new(lat, lon, accuracy, Timestamp::EPOCH)).unwrap();
        let mut verified = 0;
        for sec in 1..=required {
            session
                .feed_location(LocationSample::new(lat, lon, accuracy, Timestamp::from_secs(sec)))
                .unwrap();
            if session.tick(Timestamp::from_secs(sec)).change.is_some_and(|c| c.to == TrustState::Verified) {
                verified += 1;
            }
        }
        prop_assert_eq!(verified, 1);
        prop_assert_eq!(session.status().dwell_secs, required);
        prop_assert!(session.can_submit().allowed);
    }
}

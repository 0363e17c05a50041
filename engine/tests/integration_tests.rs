//! End-to-end session tests against nullable sources.

use presence_engine::{EngineConfig, SessionController, SessionHandle, Stat};
use presence_geo::destination;
use presence_nullables::{NullClock, NullLocationSource, NullMotionSource};
use presence_types::{
    GeofenceTarget, LocationSample, MotionSample, PresenceError, ReasonCode, Timestamp,
    TrustState, VerificationConfig, STANDARD_GRAVITY_MPS2,
};
use presence_verification::VerificationEvent;
use std::sync::Arc;
use std::time::Duration;

const LAT: f64 = 40.7580;
const LON: f64 = -73.9855;

struct Fixture {
    location: Arc<NullLocationSource>,
    motion: Arc<NullMotionSource>,
    clock: Arc<NullClock>,
    controller: SessionController,
}

fn manual_config() -> EngineConfig {
    EngineConfig {
        auto_tick: false,
        ..EngineConfig::default()
    }
}

fn fixture(config: EngineConfig) -> Fixture {
    let location = Arc::new(NullLocationSource::new());
    let motion = Arc::new(NullMotionSource::new());
    let clock = Arc::new(NullClock::new(0));
    let controller =
        SessionController::with_clock(location.clone(), motion.clone(), clock.clone(), config);
    Fixture {
        location,
        motion,
        clock,
        controller,
    }
}

fn target() -> GeofenceTarget {
    GeofenceTarget::new(LAT, LON, 500.0)
}

fn sample_at(range_m: f64, accuracy_m: f64, ts_ms: u64) -> LocationSample {
    let (lat, lon) = destination(LAT, LON, 90.0, range_m).unwrap();
    LocationSample::new(lat, lon, accuracy_m, Timestamp::from_millis(ts_ms))
}

/// Advance the clock one second at a time, ticking after each step.
fn tick_secs(f: &Fixture, handle: &SessionHandle, secs: u64) {
    for _ in 0..secs {
        f.clock.advance_secs(1);
        handle.tick().unwrap();
    }
}

#[tokio::test]
async fn thirty_second_dwell_verifies_and_allows_submission() {
    let f = fixture(manual_config());
    let handle = f.controller.start_default(target()).await.unwrap();

    for i in 0..=10u64 {
        let delivered = f.location.emit(sample_at(100.0, 10.0, i * 3_000));
        assert_eq!(delivered, 1);
        if i < 10 {
            tick_secs(&f, &handle, 3);
        }
    }

    let status = handle.status().await.unwrap();
    assert_eq!(status.state, TrustState::Verified);
    assert_eq!(status.dwell_secs, 30);
    assert_eq!(status.sample_count, 11);
    assert!(!status.spoof_ever_detected);

    let decision = handle.can_submit().await.unwrap();
    assert!(decision.allowed, "reasons: {:?}", decision.reasons);
    assert!(decision.reasons.is_empty());

    let metadata = handle.submission_metadata().await.unwrap();
    assert_eq!(metadata.dwell_secs_at_submit, 30);
    let distance = metadata.distance_at_submit_m.unwrap();
    assert!((distance - 100.0).abs() < 0.5, "got {distance}");

    handle.stop().await.unwrap();
}

#[tokio::test]
async fn teleport_mid_session_is_flagged_and_blocks_submission() {
    let f = fixture(manual_config());
    let handle = f.controller.start_default(target()).await.unwrap();
    let mut events = handle.subscribe_events();

    let mut ts = 0;
    for _ in 0..5 {
        f.location.emit(sample_at(100.0, 10.0, ts));
        tick_secs(&f, &handle, 3);
        ts += 3_000;
    }
    // Sixth sample: 1000m further east, 2s after the fifth.
    f.location.emit(sample_at(1_100.0, 10.0, ts - 1_000));

    let status = handle.status().await.unwrap();
    assert_eq!(status.state, TrustState::SpoofDetected);
    assert!(status.spoof_ever_detected);

    let decision = handle.can_submit().await.unwrap();
    assert!(!decision.allowed);
    assert!(decision.has(ReasonCode::SpoofDetected));

    let mut flagged = None;
    while let Ok(event) = events.try_recv() {
        if let VerificationEvent::SpoofFlagged {
            implied_speed_mps, ..
        } = event
        {
            flagged = Some(implied_speed_mps);
        }
    }
    let speed = flagged.expect("spoof event published");
    assert!(speed > 400.0, "got {speed}");

    // Absorbing: a clean sample afterwards changes nothing.
    f.location.emit(sample_at(100.0, 10.0, ts + 60_000));
    let status = handle.status().await.unwrap();
    assert_eq!(status.state, TrustState::SpoofDetected);

    handle.stop().await.unwrap();
}

#[tokio::test]
async fn stop_releases_sources_exactly_once() {
    let f = fixture(manual_config());
    let handle = f.controller.start_default(target()).await.unwrap();
    assert_eq!(f.location.active_subscriptions(), 1);
    assert_eq!(f.motion.active_subscriptions(), 1);
    assert!(handle.is_active());

    handle.stop().await.unwrap();
    handle.stop().await.unwrap();

    assert_eq!(f.location.unsubscribe_calls(), 1);
    assert_eq!(f.motion.unsubscribe_calls(), 1);
    assert!(!handle.is_active());
    assert_eq!(f.controller.active_session(), None);

    // Nothing reaches the session after stop.
    assert_eq!(f.location.emit(sample_at(10.0, 5.0, 1_000)), 0);
    let motion = MotionSample::new(2.0 * STANDARD_GRAVITY_MPS2, Timestamp::from_millis(1_000));
    assert_eq!(f.motion.emit(motion), 0);

    assert!(matches!(
        handle.feed_location(sample_at(10.0, 5.0, 2_000)),
        Err(PresenceError::SessionClosed)
    ));
    assert!(matches!(handle.tick(), Err(PresenceError::SessionClosed)));
    assert!(matches!(
        handle.status().await,
        Err(PresenceError::SessionClosed)
    ));
}

#[tokio::test]
async fn dispose_frees_the_controller_for_a_new_session() {
    let f = fixture(manual_config());
    let first = f.controller.start_default(target()).await.unwrap();
    let err = f.controller.start_default(target()).await.unwrap_err();
    assert!(matches!(err, PresenceError::SessionActive(_)));

    first.dispose().await.unwrap();
    let second = f.controller.start_default(target()).await.unwrap();
    assert_eq!(f.controller.active_session(), Some(second.id()));
    assert_eq!(f.location.active_subscriptions(), 1);
    second.stop().await.unwrap();
}

#[tokio::test]
async fn dropping_every_handle_stops_the_session() {
    let f = fixture(manual_config());
    let handle = f.controller.start_default(target()).await.unwrap();
    let clone = handle.clone();
    drop(handle);
    assert!(clone.is_active());
    drop(clone);

    for _ in 0..100 {
        if f.controller.active_session().is_none() {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(f.controller.active_session(), None);
    assert_eq!(f.location.active_subscriptions(), 0);
    assert_eq!(f.motion.active_subscriptions(), 0);
}

#[tokio::test]
async fn failed_motion_subscribe_releases_location() {
    let f = fixture(manual_config());
    f.motion
        .fail_subscribe(PresenceError::SourceUnavailable("accelerometer".into()));

    let err = f.controller.start_default(target()).await.unwrap_err();
    assert!(matches!(err, PresenceError::SourceUnavailable(_)));
    assert!(err.is_recoverable());
    assert_eq!(f.location.subscribe_calls(), 1);
    assert_eq!(f.location.unsubscribe_calls(), 1);
    assert_eq!(f.location.active_subscriptions(), 0);
    assert_eq!(f.controller.active_session(), None);
}

#[tokio::test]
async fn denied_location_permission_fails_start() {
    let f = fixture(manual_config());
    f.location.deny_permission();

    let err = f.controller.start_default(target()).await.unwrap_err();
    assert!(matches!(err, PresenceError::PermissionDenied(_)));
    assert_eq!(f.motion.active_subscriptions(), 0);
    assert_eq!(f.controller.active_session(), None);
}

#[tokio::test]
async fn invalid_target_is_rejected_before_subscribing() {
    let f = fixture(manual_config());
    let err = f
        .controller
        .start(GeofenceTarget::new(LAT, LON, 0.0), VerificationConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PresenceError::InvalidTarget(_)));
    assert_eq!(f.location.subscribe_calls(), 0);
}

#[tokio::test]
async fn invalid_feed_is_rejected_at_the_call_site() {
    let f = fixture(manual_config());
    let handle = f.controller.start_default(target()).await.unwrap();
    let bad = LocationSample::new(91.0, 0.0, 5.0, Timestamp::from_millis(0));
    assert!(matches!(
        handle.feed_location(bad),
        Err(PresenceError::InvalidCoordinate { .. })
    ));
    assert_eq!(handle.status().await.unwrap().sample_count, 0);
    handle.stop().await.unwrap();
}

#[tokio::test]
async fn subscription_parameters_follow_engine_config() {
    let config = EngineConfig {
        location_min_interval_ms: 2_000,
        motion_interval_ms: 50,
        ..manual_config()
    };
    let f = fixture(config);
    let handle = f.controller.start_default(target()).await.unwrap();

    let options = f.location.last_options().unwrap();
    assert_eq!(options.min_interval, Duration::from_secs(2));
    assert_eq!(f.motion.last_interval(), Some(Duration::from_millis(50)));
    handle.stop().await.unwrap();
}

#[tokio::test]
async fn missing_samples_surface_as_timeout_without_transition() {
    let f = fixture(manual_config());
    let handle = f.controller.start_default(target()).await.unwrap();
    let mut events = handle.subscribe_events();

    tick_secs(&f, &handle, 15);
    let status = handle.status().await.unwrap();
    assert!(status.timed_out);
    assert_eq!(status.state, TrustState::Acquiring);
    assert!(handle.can_submit().await.unwrap().has(ReasonCode::NoSample));

    let mut saw_timeout = false;
    while let Ok(event) = events.try_recv() {
        saw_timeout |= matches!(event, VerificationEvent::TimedOut { .. });
    }
    assert!(saw_timeout);

    f.location.emit(sample_at(50.0, 10.0, 15_000));
    let status = handle.status().await.unwrap();
    assert!(!status.timed_out);
    assert_eq!(status.state, TrustState::InsideVerifying);
    handle.stop().await.unwrap();
}

#[tokio::test]
async fn motion_is_recorded_in_metadata() {
    let f = fixture(manual_config());
    let handle = f.controller.start_default(target()).await.unwrap();

    f.motion
        .emit(MotionSample::new(STANDARD_GRAVITY_MPS2, Timestamp::from_millis(0)));
    assert!(!handle.submission_metadata().await.unwrap().motion_ever_observed);

    f.motion.emit(MotionSample::new(
        1.5 * STANDARD_GRAVITY_MPS2,
        Timestamp::from_millis(100),
    ));
    assert!(handle.submission_metadata().await.unwrap().motion_ever_observed);
    handle.stop().await.unwrap();
}

#[tokio::test]
async fn full_queue_refuses_feeds() {
    let config = EngineConfig {
        event_queue_capacity: 2,
        ..manual_config()
    };
    let f = fixture(config);
    let handle = f.controller.start_default(target()).await.unwrap();

    // The actor is not polled between these calls on a current-thread runtime.
    let results: Vec<_> = (0..4).map(|_| handle.tick()).collect();
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(PresenceError::QueueFull))));

    // Reads fail fast instead of waiting behind the backlog.
    assert!(matches!(
        handle.status().await,
        Err(PresenceError::QueueFull)
    ));
    assert!(matches!(
        handle.can_submit().await,
        Err(PresenceError::QueueFull)
    ));

    handle.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn acquire_fix_times_out_then_feeds_the_session() {
    let f = fixture(manual_config());
    let handle = f.controller.start_default(target()).await.unwrap();

    let err = handle
        .acquire_fix(Some(Duration::from_secs(2)))
        .await
        .unwrap_err();
    assert!(matches!(err, PresenceError::Timeout { millis: 2_000, .. }));
    assert!(err.is_recoverable());

    f.location.set_fix(sample_at(20.0, 8.0, 500));
    let fix = handle.acquire_fix(None).await.unwrap();
    assert_eq!(fix.horizontal_accuracy_m, 8.0);

    let status = handle.status().await.unwrap();
    assert_eq!(status.sample_count, 1);
    assert_eq!(status.state, TrustState::InsideVerifying);
    handle.stop().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn scheduler_ticks_until_stop() {
    let location = Arc::new(NullLocationSource::new());
    let motion = Arc::new(NullMotionSource::new());
    let controller =
        SessionController::new(location.clone(), motion.clone(), EngineConfig::default());
    let config = VerificationConfig {
        required_dwell_secs: 5,
        ..VerificationConfig::default()
    };
    let handle = controller.start(target(), config).await.unwrap();

    location.emit(sample_at(100.0, 10.0, 0));
    tokio::time::sleep(Duration::from_millis(5_500)).await;

    let status = handle.status().await.unwrap();
    assert_eq!(status.state, TrustState::Verified);
    assert_eq!(status.dwell_secs, 5);

    handle.stop().await.unwrap();
    let ticks = controller.stats().get(Stat::Ticks);
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(controller.stats().get(Stat::Ticks), ticks);
    assert_eq!(controller.stats().get(Stat::SessionsStopped), 1);
}

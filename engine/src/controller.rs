//! Session lifecycle: start, single-session enforcement and wiring of
//! sources, scheduler and actor.

use crate::actor::{SessionActor, SessionEvent};
use crate::clock::{Clock, MonotonicClock};
use crate::config::EngineConfig;
use crate::handle::SessionHandle;
use crate::scheduler::spawn_tick_scheduler;
use crate::source::{LocationSink, LocationSource, MotionSink, MotionSource, Subscriptions};
use presence_types::{GeofenceTarget, LocationSample, MotionSample, PresenceError, VerificationConfig};
use presence_utils::{EngineStats, Stat};
use presence_verification::{SessionId, VerificationSession};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc, oneshot};

/// The id of the session currently running, if any.
#[derive(Clone, Default)]
pub(crate) struct ActiveSlot(Arc<Mutex<Option<SessionId>>>);

impl ActiveSlot {
    fn lock(&self) -> std::sync::MutexGuard<'_, Option<SessionId>> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn claim(&self, id: SessionId) -> Result<(), PresenceError> {
        let mut slot = self.lock();
        if let Some(active) = *slot {
            return Err(PresenceError::SessionActive(active.as_u64()));
        }
        *slot = Some(id);
        Ok(())
    }

    /// Free the slot if `id` still holds it.
    pub(crate) fn clear(&self, id: SessionId) {
        let mut slot = self.lock();
        if *slot == Some(id) {
            *slot = None;
        }
    }

    fn current(&self) -> Option<SessionId> {
        *self.lock()
    }
}

/// Starts verification sessions against a pair of sources.
///
/// At most one session is active per controller. A session is active from a
/// successful `start()` until it is stopped or every handle is dropped.
pub struct SessionController {
    location: Arc<dyn LocationSource>,
    motion: Arc<dyn MotionSource>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
    next_id: AtomicU64,
    active: ActiveSlot,
    stats: Arc<EngineStats>,
}

impl SessionController {
    pub fn new(
        location: Arc<dyn LocationSource>,
        motion: Arc<dyn MotionSource>,
        config: EngineConfig,
    ) -> Self {
        Self::with_clock(location, motion, Arc::new(MonotonicClock::new()), config)
    }

    pub fn with_clock(
        location: Arc<dyn LocationSource>,
        motion: Arc<dyn MotionSource>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Self {
        Self {
            location,
            motion,
            clock,
            config,
            next_id: AtomicU64::new(1),
            active: ActiveSlot::default(),
            stats: Arc::new(EngineStats::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    pub fn active_session(&self) -> Option<SessionId> {
        self.active.current()
    }

    /// Start a session using the controller's configured verification
    /// parameters.
    pub async fn start_default(&self, target: GeofenceTarget) -> Result<SessionHandle, PresenceError> {
        self.start(target, self.config.verification.clone()).await
    }

    /// Validate inputs, subscribe to both sources and spawn the session actor.
    ///
    /// On any error nothing stays subscribed and no session is active.
    pub async fn start(
        &self,
        target: GeofenceTarget,
        config: VerificationConfig,
    ) -> Result<SessionHandle, PresenceError> {
        self.config.validate()?;
        let id = SessionId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let fix_options = self.config.fix_options(config.max_accuracy_m);
        let mut session = VerificationSession::new(id, target, config, self.clock.now())?;

        self.active.claim(id)?;
        let wired = self.wire(id);
        let (tx, rx, subscriptions) = match wired {
            Ok(parts) => parts,
            Err(e) => {
                self.active.clear(id);
                tracing::warn!(session = %id, error = %e, "session start failed");
                return Err(e);
            }
        };

        session.begin(self.clock.now());

        let (stop_ticks, scheduler) = if self.config.auto_tick {
            let (stop_tx, stop_rx) = oneshot::channel();
            let task = spawn_tick_scheduler(
                id,
                self.config.tick_interval(),
                tx.clone(),
                stop_rx,
                Arc::clone(&self.stats),
            );
            (Some(stop_tx), Some(task))
        } else {
            (None, None)
        };

        let (events, _) = broadcast::channel(self.config.event_broadcast_capacity);
        let actor = SessionActor {
            session,
            rx,
            subscriptions,
            stop_ticks,
            scheduler,
            events: events.clone(),
            clock: Arc::clone(&self.clock),
            active: self.active.clone(),
            stats: Arc::clone(&self.stats),
        };
        let task = actor.spawn();

        self.stats.record(Stat::SessionsStarted);
        tracing::info!(
            session = %id,
            latitude = target.center_latitude,
            longitude = target.center_longitude,
            radius_m = target.radius_m,
            "verification session started"
        );

        Ok(SessionHandle::new(
            id,
            tx,
            events,
            Arc::clone(&self.location),
            fix_options,
            task,
        ))
    }

    /// Create the event queue and take both source subscriptions.
    #[allow(clippy::type_complexity)]
    fn wire(
        &self,
        id: SessionId,
    ) -> Result<
        (
            mpsc::Sender<SessionEvent>,
            mpsc::Receiver<SessionEvent>,
            Subscriptions,
        ),
        PresenceError,
    > {
        let (tx, rx) = mpsc::channel(self.config.event_queue_capacity);
        let mut subscriptions = Subscriptions::new();

        let location_sink: LocationSink = {
            let tx = tx.clone();
            let stats = Arc::clone(&self.stats);
            Arc::new(move |sample: LocationSample| {
                enqueue(&tx, &stats, id, SessionEvent::LocationSampleArrived(sample));
            })
        };
        subscriptions.subscribe_location(
            &self.location,
            self.config.subscription_options(),
            location_sink,
        )?;

        let motion_sink: MotionSink = {
            let tx = tx.clone();
            let stats = Arc::clone(&self.stats);
            Arc::new(move |sample: MotionSample| {
                enqueue(&tx, &stats, id, SessionEvent::MotionSampleArrived(sample));
            })
        };
        // Dropping `subscriptions` on error releases the location subscription.
        subscriptions.subscribe_motion(&self.motion, self.config.motion_interval(), motion_sink)?;

        Ok((tx, rx, subscriptions))
    }
}

/// Non-blocking enqueue from a source callback.
fn enqueue(
    tx: &mpsc::Sender<SessionEvent>,
    stats: &EngineStats,
    id: SessionId,
    event: SessionEvent,
) {
    match tx.try_send(event) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(_)) => {
            stats.record(Stat::QueueFull);
            tracing::warn!(session = %id, "session queue full, sample discarded");
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            tracing::trace!(session = %id, "sample after session close ignored");
        }
    }
}

//! Caller-facing handle to a running session.

use crate::actor::{Query, SessionEvent};
use crate::source::{FixOptions, LocationSource};
use presence_types::{LocationSample, MotionSample, PresenceError};
use presence_verification::{
    SessionId, SessionStatus, SubmissionDecision, SubmissionMetadata, VerificationEvent,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

struct Inner {
    id: SessionId,
    tx: mpsc::Sender<SessionEvent>,
    events: broadcast::Sender<VerificationEvent>,
    location: Arc<dyn LocationSource>,
    fix_options: FixOptions,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        // Last handle gone: ask the actor to close.
        let (ack, _) = oneshot::channel();
        if let Err(mpsc::error::TrySendError::Full(event)) = self.tx.try_send(SessionEvent::Stop(ack)) {
            match tokio::runtime::Handle::try_current() {
                Ok(runtime) => {
                    let tx = self.tx.clone();
                    runtime.spawn(async move {
                        let _ = tx.send(event).await;
                    });
                }
                Err(_) => {
                    tracing::warn!(session = %self.id, "session handle dropped outside a runtime with a full queue");
                }
            }
        }
    }
}

/// Cheaply cloneable handle to one verification session.
///
/// Feeds are non-blocking and ordered with source callbacks and ticks.
/// Queries go through the session queue, so they observe every event
/// enqueued before them.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<Inner>,
}

impl SessionHandle {
    pub(crate) fn new(
        id: SessionId,
        tx: mpsc::Sender<SessionEvent>,
        events: broadcast::Sender<VerificationEvent>,
        location: Arc<dyn LocationSource>,
        fix_options: FixOptions,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                id,
                tx,
                events,
                location,
                fix_options,
                task: Mutex::new(Some(task)),
            }),
        }
    }

    pub fn id(&self) -> SessionId {
        self.inner.id
    }

    /// `false` once the session has stopped.
    pub fn is_active(&self) -> bool {
        !self.inner.tx.is_closed()
    }

    /// Receive audit events (state changes, spoof flags, timeouts) from now on.
    pub fn subscribe_events(&self) -> broadcast::Receiver<VerificationEvent> {
        self.inner.events.subscribe()
    }

    /// Enqueue a location sample. Invalid coordinates are rejected here
    /// rather than inside the actor.
    pub fn feed_location(&self, sample: LocationSample) -> Result<(), PresenceError> {
        sample.validate()?;
        self.send(SessionEvent::LocationSampleArrived(sample))
    }

    pub fn feed_motion(&self, sample: MotionSample) -> Result<(), PresenceError> {
        self.send(SessionEvent::MotionSampleArrived(sample))
    }

    /// Enqueue a dwell tick, for callers running with `auto_tick = false`.
    pub fn tick(&self) -> Result<(), PresenceError> {
        self.send(SessionEvent::Tick)
    }

    fn send(&self, event: SessionEvent) -> Result<(), PresenceError> {
        self.inner.tx.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => PresenceError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => PresenceError::SessionClosed,
        })
    }

    /// Enqueue a read without waiting for queue space. A full queue yields
    /// `QueueFull` rather than a stale answer.
    async fn query<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Query,
    ) -> Result<T, PresenceError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionEvent::Query(make(reply)))?;
        rx.await.map_err(|_| PresenceError::SessionClosed)
    }

    pub async fn status(&self) -> Result<SessionStatus, PresenceError> {
        self.query(Query::Status).await
    }

    pub async fn can_submit(&self) -> Result<SubmissionDecision, PresenceError> {
        self.query(Query::CanSubmit).await
    }

    pub async fn submission_metadata(&self) -> Result<SubmissionMetadata, PresenceError> {
        self.query(Query::Metadata).await
    }

    /// One-shot read from the location source, fed into the session.
    ///
    /// Uses the engine's configured fix timeout when `timeout` is `None`.
    pub async fn acquire_fix(
        &self,
        timeout: Option<Duration>,
    ) -> Result<LocationSample, PresenceError> {
        if !self.is_active() {
            return Err(PresenceError::SessionClosed);
        }
        let options = FixOptions {
            timeout: timeout.unwrap_or(self.inner.fix_options.timeout),
            ..self.inner.fix_options
        };
        let sample = tokio::time::timeout(
            options.timeout,
            self.inner.location.current_position(options),
        )
        .await
        .map_err(|_| PresenceError::Timeout {
            what: "location fix".to_string(),
            millis: options.timeout.as_millis() as u64,
        })??;
        self.feed_location(sample)?;
        Ok(sample)
    }

    /// Stop the session: unsubscribe from both sources, cancel ticks and
    /// close the queue. Returns once the actor has finished. Idempotent.
    pub async fn stop(&self) -> Result<(), PresenceError> {
        let (ack, done) = oneshot::channel();
        if self.inner.tx.send(SessionEvent::Stop(ack)).await.is_ok() {
            // The actor may already be closing on behalf of another caller.
            let _ = done.await;
        }
        self.join().await;
        Ok(())
    }

    /// Stop and consume this handle.
    pub async fn dispose(self) -> Result<(), PresenceError> {
        self.stop().await
    }

    async fn join(&self) {
        let task = self
            .inner
            .task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::error!(session = %self.inner.id, error = %e, "session actor failed");
            }
        }
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.inner.id)
            .field("active", &self.is_active())
            .finish()
    }
}

//! The session actor: sole owner and mutator of one `VerificationSession`.

use crate::clock::Clock;
use crate::controller::ActiveSlot;
use crate::source::Subscriptions;
use presence_types::{LocationSample, MotionSample};
use presence_utils::{EngineStats, Stat};
use presence_verification::{
    FeedOutcome, SessionStatus, SubmissionDecision, SubmissionMetadata, VerificationEvent,
    VerificationSession,
};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

/// Everything that can happen to a session, in arrival order.
pub enum SessionEvent {
    LocationSampleArrived(LocationSample),
    MotionSampleArrived(MotionSample),
    Tick,
    Query(Query),
    /// Release sources, stop the scheduler and close the queue.
    Stop(oneshot::Sender<()>),
}

/// Read-only requests answered from the actor so they observe every earlier event.
pub enum Query {
    Status(oneshot::Sender<SessionStatus>),
    CanSubmit(oneshot::Sender<SubmissionDecision>),
    Metadata(oneshot::Sender<SubmissionMetadata>),
}

impl Query {
    fn respond(self, session: &VerificationSession) {
        // A dropped receiver only means the caller stopped waiting.
        match self {
            Self::Status(reply) => {
                let _ = reply.send(session.status());
            }
            Self::CanSubmit(reply) => {
                let _ = reply.send(session.can_submit());
            }
            Self::Metadata(reply) => {
                let _ = reply.send(session.submission_metadata());
            }
        }
    }
}

pub struct SessionActor {
    pub(crate) session: VerificationSession,
    pub(crate) rx: mpsc::Receiver<SessionEvent>,
    pub(crate) subscriptions: Subscriptions,
    /// Stops the tick scheduler; `None` without one or once fired.
    pub(crate) stop_ticks: Option<oneshot::Sender<()>>,
    pub(crate) scheduler: Option<JoinHandle<()>>,
    pub(crate) events: broadcast::Sender<VerificationEvent>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) active: ActiveSlot,
    pub(crate) stats: Arc<EngineStats>,
}

impl SessionActor {
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        let id = self.session.id();
        tracing::debug!(session = %id, "session actor started");
        self.publish_events();

        while let Some(event) = self.rx.recv().await {
            match event {
                SessionEvent::LocationSampleArrived(sample) => self.on_location(sample),
                SessionEvent::MotionSampleArrived(sample) => {
                    self.stats.record(Stat::MotionSamples);
                    self.session.feed_motion(sample);
                }
                SessionEvent::Tick => {
                    let now = self.clock.now();
                    self.session.tick(now);
                }
                SessionEvent::Query(query) => query.respond(&self.session),
                SessionEvent::Stop(ack) => {
                    self.close().await;
                    let _ = ack.send(());
                    tracing::debug!(session = %id, "session actor stopped");
                    return;
                }
            }
            self.publish_events();
        }

        // Every sender is gone without an explicit stop.
        self.close().await;
        tracing::debug!(session = %id, "session actor stopped, queue dropped");
    }

    fn on_location(&mut self, sample: LocationSample) {
        match self.session.feed_location(sample) {
            Ok(FeedOutcome::Accepted { .. }) => self.stats.record(Stat::SamplesAccepted),
            Ok(FeedOutcome::Dropped(_)) => self.stats.record(Stat::SamplesDropped),
            Err(e) => {
                self.stats.record(Stat::SamplesRejected);
                tracing::warn!(session = %self.session.id(), error = %e, "rejected location sample");
            }
        }
    }

    fn publish_events(&mut self) {
        for event in self.session.drain_events() {
            if matches!(event, VerificationEvent::SpoofFlagged { .. }) {
                self.stats.record(Stat::SpoofFlags);
            }
            // No subscribers is fine.
            let _ = self.events.send(event);
        }
    }

    /// Release sources, cancel the scheduler, refuse further events and free
    /// the controller's active slot.
    async fn close(&mut self) {
        self.subscriptions.release();
        if let Some(stop) = self.stop_ticks.take() {
            let _ = stop.send(());
        }
        self.rx.close();
        if let Some(scheduler) = self.scheduler.take() {
            let _ = scheduler.await;
        }
        self.active.clear(self.session.id());
        self.stats.record(Stat::SessionsStopped);
    }
}

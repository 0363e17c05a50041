//! Location and motion sources consumed by the engine.
//!
//! Sources are owned by the caller. The engine only subscribes, and every
//! subscription it takes is released exactly once through [`Subscriptions`].

use presence_types::{LocationSample, MotionSample, PresenceError};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Callback a source invokes for each new location sample.
pub type LocationSink = Arc<dyn Fn(LocationSample) + Send + Sync>;

/// Callback a source invokes for each new accelerometer reading.
pub type MotionSink = Arc<dyn Fn(MotionSample) + Send + Sync>;

/// Handle returned by a source subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// Parameters for a one-shot position read.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixOptions {
    /// Desired accuracy; sources may return a worse fix.
    pub max_accuracy_m: f64,
    pub timeout: Duration,
}

/// Parameters for a continuous location subscription.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubscriptionOptions {
    /// Minimum time between deliveries.
    pub min_interval: Duration,
    /// Minimum movement between deliveries; zero delivers every fix.
    pub distance_filter_m: f64,
}

/// A platform positioning provider.
///
/// Implementations report the simulated flag when the platform exposes it and
/// leave it `Unknown` otherwise.
pub trait LocationSource: Send + Sync {
    /// One-shot read of the current position.
    fn current_position(
        &self,
        options: FixOptions,
    ) -> BoxFuture<'_, Result<LocationSample, PresenceError>>;

    /// Start delivering samples to `sink`. May fail with `PermissionDenied`
    /// or `SourceUnavailable`.
    fn subscribe(
        &self,
        options: SubscriptionOptions,
        sink: LocationSink,
    ) -> Result<SubscriptionId, PresenceError>;

    fn unsubscribe(&self, id: SubscriptionId);
}

/// A platform accelerometer provider.
pub trait MotionSource: Send + Sync {
    fn subscribe(&self, interval: Duration, sink: MotionSink)
        -> Result<SubscriptionId, PresenceError>;

    fn unsubscribe(&self, id: SubscriptionId);
}

/// Source subscriptions held by one session.
///
/// Released on [`Subscriptions::release`] or on drop, whichever comes first,
/// so an error part-way through `start()` still unsubscribes what was acquired.
#[derive(Default)]
pub struct Subscriptions {
    location: Option<(Arc<dyn LocationSource>, SubscriptionId)>,
    motion: Option<(Arc<dyn MotionSource>, SubscriptionId)>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe_location(
        &mut self,
        source: &Arc<dyn LocationSource>,
        options: SubscriptionOptions,
        sink: LocationSink,
    ) -> Result<(), PresenceError> {
        let id = source.subscribe(options, sink)?;
        if let Some((old, old_id)) = self.location.replace((Arc::clone(source), id)) {
            old.unsubscribe(old_id);
        }
        Ok(())
    }

    pub fn subscribe_motion(
        &mut self,
        source: &Arc<dyn MotionSource>,
        interval: Duration,
        sink: MotionSink,
    ) -> Result<(), PresenceError> {
        let id = source.subscribe(interval, sink)?;
        if let Some((old, old_id)) = self.motion.replace((Arc::clone(source), id)) {
            old.unsubscribe(old_id);
        }
        Ok(())
    }

    /// Unsubscribe everything still held. Safe to call repeatedly.
    pub fn release(&mut self) {
        if let Some((source, id)) = self.location.take() {
            source.unsubscribe(id);
            tracing::debug!(subscription = id.as_u64(), "released location subscription");
        }
        if let Some((source, id)) = self.motion.take() {
            source.unsubscribe(id);
            tracing::debug!(subscription = id.as_u64(), "released motion subscription");
        }
    }
}

impl Drop for Subscriptions {
    fn drop(&mut self) {
        self.release();
    }
}

//! Nullable accelerometer.

use crate::location::lock;
use presence_engine::{MotionSink, MotionSource, SubscriptionId};
use presence_types::{MotionSample, PresenceError};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// A test motion source. Readings are pushed with [`NullMotionSource::emit`].
pub struct NullMotionSource {
    subscribers: Mutex<Vec<(SubscriptionId, MotionSink)>>,
    next_id: AtomicU64,
    unsubscribe_calls: AtomicUsize,
    subscribe_error: Mutex<Option<PresenceError>>,
    last_interval: Mutex<Option<Duration>>,
}

impl NullMotionSource {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            unsubscribe_calls: AtomicUsize::new(0),
            subscribe_error: Mutex::new(None),
            last_interval: Mutex::new(None),
        }
    }

    pub fn fail_subscribe(&self, error: PresenceError) {
        *lock(&self.subscribe_error) = Some(error);
    }

    pub fn emit(&self, sample: MotionSample) -> usize {
        let sinks: Vec<MotionSink> = lock(&self.subscribers)
            .iter()
            .map(|(_, sink)| sink.clone())
            .collect();
        for sink in &sinks {
            sink(sample);
        }
        sinks.len()
    }

    pub fn active_subscriptions(&self) -> usize {
        lock(&self.subscribers).len()
    }

    pub fn unsubscribe_calls(&self) -> usize {
        self.unsubscribe_calls.load(Ordering::SeqCst)
    }

    pub fn last_interval(&self) -> Option<Duration> {
        *lock(&self.last_interval)
    }
}

impl Default for NullMotionSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionSource for NullMotionSource {
    fn subscribe(&self, interval: Duration, sink: MotionSink) -> Result<SubscriptionId, PresenceError> {
        if let Some(error) = lock(&self.subscribe_error).clone() {
            return Err(error);
        }
        let id = SubscriptionId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        *lock(&self.last_interval) = Some(interval);
        lock(&self.subscribers).push((id, sink));
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.unsubscribe_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.subscribers).retain(|(sub, _)| *sub != id);
    }
}

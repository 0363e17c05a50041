//! Nullable location provider: push fixes by hand, record subscriptions.

use presence_engine::{
    BoxFuture, FixOptions, LocationSink, LocationSource, SubscriptionId, SubscriptionOptions,
};
use presence_types::{LocationSample, PresenceError};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

/// A test location source.
///
/// Samples reach subscribers only through [`NullLocationSource::emit`].
/// Unsubscribed sinks never receive anything again.
pub struct NullLocationSource {
    subscribers: Mutex<Vec<(SubscriptionId, LocationSink)>>,
    next_id: AtomicU64,
    subscribe_calls: AtomicUsize,
    unsubscribe_calls: AtomicUsize,
    /// Error returned by the next `subscribe`.
    subscribe_error: Mutex<Option<PresenceError>>,
    /// Result of `current_position`; `None` never resolves.
    fix: Mutex<Option<Result<LocationSample, PresenceError>>>,
    last_options: Mutex<Option<SubscriptionOptions>>,
}

impl NullLocationSource {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            subscribe_calls: AtomicUsize::new(0),
            unsubscribe_calls: AtomicUsize::new(0),
            subscribe_error: Mutex::new(None),
            fix: Mutex::new(None),
            last_options: Mutex::new(None),
        }
    }

    /// Make every following `subscribe` fail with `error`.
    pub fn fail_subscribe(&self, error: PresenceError) {
        *lock(&self.subscribe_error) = Some(error);
    }

    /// Deny location permission.
    pub fn deny_permission(&self) {
        self.fail_subscribe(PresenceError::PermissionDenied("location".to_string()));
    }

    /// Answer `current_position` with this fix.
    pub fn set_fix(&self, sample: LocationSample) {
        *lock(&self.fix) = Some(Ok(sample));
    }

    pub fn set_fix_error(&self, error: PresenceError) {
        *lock(&self.fix) = Some(Err(error));
    }

    /// Deliver a sample to every current subscriber. Returns how many sinks
    /// received it.
    pub fn emit(&self, sample: LocationSample) -> usize {
        let sinks: Vec<LocationSink> = lock(&self.subscribers)
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

    pub fn subscribe_calls(&self) -> usize {
        self.subscribe_calls.load(Ordering::SeqCst)
    }

    pub fn unsubscribe_calls(&self) -> usize {
        self.unsubscribe_calls.load(Ordering::SeqCst)
    }

    pub fn last_options(&self) -> Option<SubscriptionOptions> {
        *lock(&self.last_options)
    }
}

impl Default for NullLocationSource {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationSource for NullLocationSource {
    fn current_position(
        &self,
        _options: FixOptions,
    ) -> BoxFuture<'_, Result<LocationSample, PresenceError>> {
        let fix = lock(&self.fix).clone();
        Box::pin(async move {
            match fix {
                Some(result) => result,
                None => std::future::pending().await,
            }
        })
    }

    fn subscribe(
        &self,
        options: SubscriptionOptions,
        sink: LocationSink,
    ) -> Result<SubscriptionId, PresenceError> {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = lock(&self.subscribe_error).clone() {
            return Err(error);
        }
        let id = SubscriptionId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        *lock(&self.last_options) = Some(options);
        lock(&self.subscribers).push((id, sink));
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.unsubscribe_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.subscribers).retain(|(sub, _)| *sub != id);
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

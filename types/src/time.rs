//! Timestamp type used throughout the engine.
//!
//! Timestamps are milliseconds on whatever clock produced them. Location sources
//! stamp samples with their own (monotonic-ish) clock; the session clock is
//! only compared against itself.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A point in time in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch (time zero).
    pub const EPOCH: Self = Self(0);

    pub fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1000))
    }

    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// Milliseconds elapsed from this timestamp to `now` (zero if `now` is earlier).
    pub fn elapsed_millis(&self, now: Timestamp) -> u64 {
        now.0.saturating_sub(self.0)
    }

    /// Whole seconds elapsed from this timestamp to `now`.
    pub fn elapsed_secs(&self, now: Timestamp) -> u64 {
        self.elapsed_millis(now) / 1000
    }

    /// Fractional seconds between `earlier` and `self`.
    pub fn secs_since(&self, earlier: Timestamp) -> f64 {
        self.0.saturating_sub(earlier.0) as f64 / 1000.0
    }

    pub fn plus_millis(&self, millis: u64) -> Self {
        Self(self.0.saturating_add(millis))
    }

    pub fn plus_secs(&self, secs: u64) -> Self {
        self.plus_millis(secs.saturating_mul(1000))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

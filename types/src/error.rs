//! Top-level error type shared across crates.

use thiserror::Error;

/// Common error type for presence verification.
///
/// `PermissionDenied`, `SourceUnavailable` and `Timeout` are recoverable.
/// `InvalidCoordinate`, `InvalidTarget`, `InvalidSample` and `InvalidConfig`
/// are programmer errors and fail at the call site.
#[derive(Clone, Debug, Error)]
pub enum PresenceError {
    #[error("permission to read {0} was denied")]
    PermissionDenied(String),

    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("timed out after {millis}ms waiting for {what}")]
    Timeout { what: String, millis: u64 },

    #[error("invalid coordinate: lat {latitude}, lon {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("invalid geofence target: radius {0} must be > 0")]
    InvalidTarget(f64),

    #[error("invalid sample: {0}")]
    InvalidSample(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("session {0} is already active")]
    SessionActive(u64),

    #[error("session is closed")]
    SessionClosed,

    #[error("session event queue is full")]
    QueueFull,

    #[error("config error: {0}")]
    Config(String),
}

impl PresenceError {
    /// Whether the caller may retry without discarding the session.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied(_)
                | Self::SourceUnavailable(_)
                | Self::Timeout { .. }
                | Self::QueueFull
        )
    }
}

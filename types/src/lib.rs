//! Fundamental types for venue presence verification.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! location and motion samples, geofence targets, verification config, the trust
//! state enum, structured reason codes and the shared error type.

pub mod config;
pub mod error;
pub mod reason;
pub mod sample;
pub mod state;
pub mod target;
pub mod time;

pub use config::VerificationConfig;
pub use error::PresenceError;
pub use reason::ReasonCode;
pub use sample::{valid_coordinate, LocationSample, MotionSample, SimulatedFlag, STANDARD_GRAVITY_MPS2};
pub use state::TrustState;
pub use target::{GeofenceTarget, DEFAULT_RADIUS_M};
pub use time::Timestamp;

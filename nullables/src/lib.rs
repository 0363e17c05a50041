//! Nullable infrastructure for deterministic testing.
//!
//! Every platform dependency of the engine (clock, location provider,
//! accelerometer) is abstracted behind a trait. This crate provides
//! test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Record how the engine used them
//!
//! Usage: swap real providers for nullables in tests.

pub mod clock;
pub mod location;
pub mod motion;

pub use clock::NullClock;
pub use location::NullLocationSource;
pub use motion::NullMotionSource;

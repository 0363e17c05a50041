//! Shared utilities for the presence verification engine.

pub mod logging;
pub mod stats;

pub use logging::{init_logging, LogFormat};
pub use stats::{EngineStats, Stat};

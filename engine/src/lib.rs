//! Async session controller for location trust verification.
//!
//! Each verification session runs as a single actor task consuming a typed
//! event queue (`LocationSampleArrived`, `MotionSampleArrived`, `Tick`, `Query`,
//! `Stop`). Location/motion source callbacks, the tick scheduler and caller
//! feeds all enqueue; only the actor mutates session state.

mod actor;
pub mod clock;
pub mod config;
pub mod controller;
pub mod handle;
mod scheduler;
pub mod source;

pub use clock::{Clock, MonotonicClock};
pub use config::EngineConfig;
pub use controller::SessionController;
pub use handle::SessionHandle;
pub use presence_utils::{EngineStats, Stat};
pub use source::{
    BoxFuture, FixOptions, LocationSink, LocationSource, MotionSink, MotionSource,
    SubscriptionId, SubscriptionOptions,
};

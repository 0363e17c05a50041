//! Geodesic helpers for presence verification.
//!
//! - **Haversine** great-circle distance on a sphere of radius 6,371,000 m
//! - Forward projection (`destination`) for placing points at a known bearing/range

pub mod distance;

pub use distance::{destination, distance_meters, EARTH_RADIUS_M};

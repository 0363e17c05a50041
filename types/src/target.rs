//! Geofence target around a venue.

use crate::error::PresenceError;
use crate::sample::valid_coordinate;
use serde::{Deserialize, Serialize};

/// Default geofence radius in meters.
pub const DEFAULT_RADIUS_M: f64 = 500.0;

/// A circular region used as the presence boundary around a venue.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeofenceTarget {
    pub center_latitude: f64,
    pub center_longitude: f64,
    pub radius_m: f64,
}

impl GeofenceTarget {
    pub fn new(center_latitude: f64, center_longitude: f64, radius_m: f64) -> Self {
        Self {
            center_latitude,
            center_longitude,
            radius_m,
        }
    }

    /// Target with the default 500 m radius.
    pub fn with_default_radius(center_latitude: f64, center_longitude: f64) -> Self {
        Self::new(center_latitude, center_longitude, DEFAULT_RADIUS_M)
    }

    pub fn validate(&self) -> Result<(), PresenceError> {
        if !(self.radius_m.is_finite() && self.radius_m > 0.0) {
            return Err(PresenceError::InvalidTarget(self.radius_m));
        }
        if !valid_coordinate(self.center_latitude, self.center_longitude) {
            return Err(PresenceError::InvalidCoordinate {
                latitude: self.center_latitude,
                longitude: self.center_longitude,
            });
        }
        Ok(())
    }
}

//! Location and motion samples as delivered by platform sources.

use crate::error::PresenceError;
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};

/// Standard gravity in m/s².
pub const STANDARD_GRAVITY_MPS2: f64 = 9.80665;

/// Platform-reported mock-location indication.
///
/// Not every platform reports this. `Unknown` is never equivalent to `Genuine`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulatedFlag {
    /// The platform says the position was injected by software.
    Simulated,
    /// The platform says the position came from a real sensor.
    Genuine,
    /// The platform did not say.
    #[default]
    Unknown,
}

impl SimulatedFlag {
    pub fn is_simulated(&self) -> bool {
        matches!(self, Self::Simulated)
    }
}

impl From<Option<bool>> for SimulatedFlag {
    fn from(flag: Option<bool>) -> Self {
        match flag {
            Some(true) => Self::Simulated,
            Some(false) => Self::Genuine,
            None => Self::Unknown,
        }
    }
}

/// A single position fix.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Horizontal accuracy radius in meters (lower is better).
    pub horizontal_accuracy_m: f64,
    /// Source-clock timestamp.
    pub timestamp: Timestamp,
    #[serde(default)]
    pub simulated: SimulatedFlag,
    /// Ground speed reported by the platform, if any.
    #[serde(default)]
    pub speed_mps: Option<f64>,
}

impl LocationSample {
    pub fn new(latitude: f64, longitude: f64, horizontal_accuracy_m: f64, timestamp: Timestamp) -> Self {
        Self {
            latitude,
            longitude,
            horizontal_accuracy_m,
            timestamp,
            simulated: SimulatedFlag::Unknown,
            speed_mps: None,
        }
    }

    pub fn with_simulated(mut self, simulated: SimulatedFlag) -> Self {
        self.simulated = simulated;
        self
    }

    pub fn with_speed(mut self, speed_mps: f64) -> Self {
        self.speed_mps = Some(speed_mps);
        self
    }

    /// Reject coordinates outside the valid ranges and unusable accuracy values.
    pub fn validate(&self) -> Result<(), PresenceError> {
        if !valid_coordinate(self.latitude, self.longitude) {
            return Err(PresenceError::InvalidCoordinate {
                latitude: self.latitude,
                longitude: self.longitude,
            });
        }
        if !self.horizontal_accuracy_m.is_finite() || self.horizontal_accuracy_m < 0.0 {
            return Err(PresenceError::InvalidSample(format!(
                "horizontal accuracy {} is not a finite non-negative value",
                self.horizontal_accuracy_m
            )));
        }
        Ok(())
    }
}

/// Whether a latitude/longitude pair lies in [-90, 90] × [-180, 180].
pub fn valid_coordinate(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude)
}

/// A triaxial accelerometer reading reduced to its magnitude.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MotionSample {
    /// Acceleration magnitude in m/s², gravity included.
    pub magnitude_mps2: f64,
    pub timestamp: Timestamp,
}

impl MotionSample {
    pub fn new(magnitude_mps2: f64, timestamp: Timestamp) -> Self {
        Self {
            magnitude_mps2,
            timestamp,
        }
    }

    /// Magnitude expressed in multiples of standard gravity.
    pub fn magnitude_g(&self) -> f64 {
        self.magnitude_mps2 / STANDARD_GRAVITY_MPS2
    }
}

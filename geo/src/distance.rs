//! Haversine distance.

use presence_types::{valid_coordinate, PresenceError};

/// Mean Earth radius used by the spherical approximation.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters between two points given in decimal degrees.
///
/// Fails with `InvalidCoordinate` when either point lies outside
/// [-90, 90] × [-180, 180] or is not finite.
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Result<f64, PresenceError> {
    check(lat1, lon1)?;
    check(lat2, lon2)?;

    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    // Rounding can push `a` a hair past 1 for antipodal points.
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    Ok(EARTH_RADIUS_M * c)
}

/// Point reached by travelling `distance_m` from a start point on an initial
/// bearing (degrees clockwise from north).
pub fn destination(
    lat: f64,
    lon: f64,
    bearing_deg: f64,
    distance_m: f64,
) -> Result<(f64, f64), PresenceError> {
    check(lat, lon)?;
    let delta = distance_m / EARTH_RADIUS_M;
    let theta = bearing_deg.to_radians();
    let phi1 = lat.to_radians();
    let lambda1 = lon.to_radians();

    let phi2 = (phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos()).asin();
    let lambda2 = lambda1
        + (theta.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * phi2.sin());

    let lon2 = (lambda2.to_degrees() + 540.0) % 360.0 - 180.0;
    Ok((phi2.to_degrees(), lon2))
}

fn check(latitude: f64, longitude: f64) -> Result<(), PresenceError> {
    if valid_coordinate(latitude, longitude) {
        Ok(())
    } else {
        Err(PresenceError::InvalidCoordinate {
            latitude,
            longitude,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_within(actual: f64, expected: f64, tolerance: f64) {
        let err = (actual - expected).abs() / expected;
        assert!(
            err <= tolerance,
            "expected {expected}, got {actual} (relative error {err})"
        );
    }

    #[test]
    fn identical_points_are_zero() {
        assert_eq!(distance_meters(51.5, -0.12, 51.5, -0.12).unwrap(), 0.0);
    }

    #[test]
    fn london_paris() {
        let d = distance_meters(51.5074, -0.1278, 48.8566, 2.3522).unwrap();
        assert_within(d, 343_556.0, 0.001);
    }

    #[test]
    fn new_york_los_angeles() {
        let d = distance_meters(40.7128, -74.0060, 34.0522, -118.2437).unwrap();
        assert_within(d, 3_935_746.0, 0.001);
    }

    #[test]
    fn tokyo_sydney() {
        let d = distance_meters(35.6762, 139.6503, -33.8688, 151.2093).unwrap();
        assert_within(d, 7_825_819.0, 0.001);
    }

    #[test]
    fn antipodal_is_half_circumference() {
        let d = distance_meters(0.0, 0.0, 0.0, 180.0).unwrap();
        assert_within(d, std::f64::consts::PI * EARTH_RADIUS_M, 1e-9);
    }

    #[test]
    fn out_of_range_rejected() {
        assert!(matches!(
            distance_meters(90.1, 0.0, 0.0, 0.0),
            Err(PresenceError::InvalidCoordinate { .. })
        ));
        assert!(distance_meters(0.0, 0.0, 0.0, 181.0).is_err());
        assert!(distance_meters(0.0, f64::NAN, 0.0, 0.0).is_err());
    }

    #[test]
    fn destination_round_trips_distance() {
        let (lat, lon) = destination(48.8566, 2.3522, 90.0, 500.0).unwrap();
        let d = distance_meters(48.8566, 2.3522, lat, lon).unwrap();
        assert!((d - 500.0).abs() < 0.01, "got {d}");
    }
}

//! Sample ingestion: ordering, validation, buffering, live reading update.

use crate::history::SampleHistory;
use presence_geo::distance_meters;
use presence_types::{GeofenceTarget, LocationSample, PresenceError, Timestamp};
use serde::{Deserialize, Serialize};

/// Distance and accuracy of the most recently accepted sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveReading {
    pub distance_m: Option<f64>,
    pub accuracy_m: Option<f64>,
}

/// Why a sample was dropped without error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropReason {
    /// Timestamp not strictly after the last accepted sample (duplicate or out of order).
    Stale { last: Timestamp, received: Timestamp },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum IngestOutcome {
    Accepted { evicted: Option<LocationSample> },
    Dropped(DropReason),
}

/// Accept `sample` into `history` if it is newer than everything already accepted.
///
/// The live reading is updated before returning so detectors see the new
/// distance and accuracy. Invalid coordinates fail fast.
pub fn ingest(
    history: &mut SampleHistory,
    target: &GeofenceTarget,
    live: &mut LiveReading,
    sample: LocationSample,
) -> Result<IngestOutcome, PresenceError> {
    sample.validate()?;

    if let Some(last) = history.latest() {
        if sample.timestamp <= last.timestamp {
            return Ok(IngestOutcome::Dropped(DropReason::Stale {
                last: last.timestamp,
                received: sample.timestamp,
            }));
        }
    }

    let distance = distance_meters(
        target.center_latitude,
        target.center_longitude,
        sample.latitude,
        sample.longitude,
    )?;

    let evicted = history.push(sample);
    live.distance_m = Some(distance);
    live.accuracy_m = Some(sample.horizontal_accuracy_m);

    Ok(IngestOutcome::Accepted { evicted })
}

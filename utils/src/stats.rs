//! Engine counters.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Something the engine counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    SessionsStarted,
    SessionsStopped,
    SamplesAccepted,
    /// Duplicate or out-of-order location samples.
    SamplesDropped,
    /// Location samples that failed validation inside a session.
    SamplesRejected,
    MotionSamples,
    Ticks,
    SpoofFlags,
    /// Source samples discarded because a session queue was full.
    QueueFull,
}

impl Stat {
    pub const ALL: [Stat; 9] = [
        Stat::SessionsStarted,
        Stat::SessionsStopped,
        Stat::SamplesAccepted,
        Stat::SamplesDropped,
        Stat::SamplesRejected,
        Stat::MotionSamples,
        Stat::Ticks,
        Stat::SpoofFlags,
        Stat::QueueFull,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::SessionsStarted => "sessions_started",
            Self::SessionsStopped => "sessions_stopped",
            Self::SamplesAccepted => "samples_accepted",
            Self::SamplesDropped => "samples_dropped",
            Self::SamplesRejected => "samples_rejected",
            Self::MotionSamples => "motion_samples",
            Self::Ticks => "ticks",
            Self::SpoofFlags => "spoof_flags",
            Self::QueueFull => "queue_full",
        }
    }
}

/// Lock-free counters shared by a controller, its session actors and their
/// tick schedulers.
#[derive(Debug, Default)]
pub struct EngineStats {
    counters: [AtomicU64; Stat::ALL.len()],
}

impl EngineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, stat: Stat) {
        self.counters[stat as usize].fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self, stat: Stat) -> u64 {
        self.counters[stat as usize].load(Ordering::Relaxed)
    }

    /// All counters by name, for logging or export.
    pub fn snapshot(&self) -> BTreeMap<&'static str, u64> {
        Stat::ALL
            .iter()
            .map(|stat| (stat.name(), self.get(*stat)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_independent() {
        let stats = EngineStats::new();
        stats.record(Stat::Ticks);
        stats.record(Stat::Ticks);
        stats.record(Stat::SpoofFlags);
        assert_eq!(stats.get(Stat::Ticks), 2);
        assert_eq!(stats.get(Stat::SpoofFlags), 1);
        assert_eq!(stats.get(Stat::QueueFull), 0);
    }

    #[test]
    fn snapshot_names_every_counter() {
        let stats = EngineStats::new();
        stats.record(Stat::SamplesAccepted);
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.len(), Stat::ALL.len());
        assert_eq!(snapshot["samples_accepted"], 1);
        assert_eq!(snapshot["sessions_started"], 0);
    }

    #[test]
    fn index_matches_declaration_order() {
        for (i, stat) in Stat::ALL.iter().enumerate() {
            assert_eq!(*stat as usize, i);
        }
    }

    #[test]
    fn stat_serializes_as_its_name() {
        for stat in Stat::ALL {
            let json = serde_json::to_string(&stat).unwrap();
            assert_eq!(json, format!("\"{}\"", stat.name()));
        }
    }
}

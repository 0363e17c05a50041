//! Dwell tick scheduler.

use crate::actor::SessionEvent;
use presence_utils::{EngineStats, Stat};
use presence_verification::SessionId;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Spawn a task that enqueues a `Tick` every `period` until `stop` fires (or
/// its sender is dropped) or the session queue closes.
pub fn spawn_tick_scheduler(
    session: SessionId,
    period: Duration,
    tx: mpsc::Sender<SessionEvent>,
    mut stop: oneshot::Receiver<()>,
    stats: Arc<EngineStats>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = &mut stop => {
                    tracing::debug!(%session, "tick scheduler stopped");
                    break;
                }
                _ = interval.tick() => {
                    if tx.send(SessionEvent::Tick).await.is_err() {
                        break;
                    }
                    stats.record(Stat::Ticks);
                }
            }
        }
    })
}

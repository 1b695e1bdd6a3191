//! Per-game tick scheduling. One task per game sleeps until the deadline,
//! then runs exactly one tick off the async runtime. Missed deadlines after
//! downtime are fast-forwarded one fully processed tick at a time.

use std::sync::{Arc, Weak};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use engine_core::AdvisorSuite;
use tokio::sync::Mutex;

use crate::EngineApi;

pub(crate) fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

/// Drive a game's ticks until the game is dropped. The weak handle keeps the
/// scheduler from pinning a game alive on its own.
pub(crate) fn spawn_tick_loop(
    server_id: String,
    game: Weak<Mutex<EngineApi>>,
    advisors: Arc<dyn AdvisorSuite + Send + Sync>,
) {
    tokio::spawn(async move {
        loop {
            let Some(strong) = game.upgrade() else {
                return;
            };
            let deadline_ms = strong.lock().await.tick_deadline_ms();
            drop(strong);

            let now = epoch_ms();
            if deadline_ms > now {
                tokio::time::sleep(Duration::from_millis(deadline_ms - now)).await;
            }

            let Some(strong) = game.upgrade() else {
                return;
            };
            let advisors = advisors.clone();
            let tick_result = tokio::task::spawn_blocking(move || {
                let mut api = strong.blocking_lock();
                api.run_tick(advisors.as_ref())
            })
            .await;

            match tick_result {
                Ok(report) => {
                    tracing::debug!(
                        server = server_id.as_str(),
                        tick = report.tick,
                        "scheduled tick completed"
                    );
                }
                Err(err) => {
                    tracing::error!(server = server_id.as_str(), %err, "tick task failed");
                    return;
                }
            }
        }
    });
}

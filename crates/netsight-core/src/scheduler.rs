// ── Polling scheduler ──
//
// Keeps REST data fresh. While the push channel is down every category
// polls on its own timer; once it is open those timers stop and a single
// slower backup timer sweeps all categories. A supervisor task watches the
// transport status and swaps between the two.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use strum::Display;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use netsight_api::websocket::ConnectionStatus;

use crate::config::PollingIntervals;
use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum PollCategory {
    NetworkStats,
    DeviceStatus,
    Traffic,
    Events,
}

impl PollCategory {
    pub const ALL: [Self; 4] = [
        Self::NetworkStats,
        Self::DeviceStatus,
        Self::Traffic,
        Self::Events,
    ];
}

/// One fetch-and-merge per category. Implementations write to the store
/// through its merge operations only.
pub trait Poller: Send + Sync + 'static {
    fn poll(&self, category: PollCategory) -> impl Future<Output = Result<(), CoreError>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum PollingMode {
    /// Not started, or shut down.
    Stopped,
    /// Push channel down: every category on its own timer.
    Full,
    /// Push channel open: one backup sweep per `backup` interval.
    Backup,
}

/// Handle to the running scheduler. Dropping it does not stop the timers;
/// call [`shutdown`](Self::shutdown).
pub struct PollingScheduler {
    cancel: CancellationToken,
    supervisor: Mutex<Option<JoinHandle<()>>>,
    mode: watch::Receiver<PollingMode>,
}

impl PollingScheduler {
    /// Spawn the supervisor. Must be called from within a tokio runtime.
    pub fn start<P: Poller>(
        poller: Arc<P>,
        intervals: PollingIntervals,
        transport: watch::Receiver<ConnectionStatus>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let (mode_tx, mode) = watch::channel(PollingMode::Stopped);
        let supervisor = tokio::spawn(supervise(
            poller,
            intervals,
            transport,
            mode_tx,
            cancel.clone(),
        ));

        Self {
            cancel,
            supervisor: Mutex::new(Some(supervisor)),
            mode,
        }
    }

    pub fn mode(&self) -> PollingMode {
        *self.mode.borrow()
    }

    pub fn watch_mode(&self) -> watch::Receiver<PollingMode> {
        self.mode.clone()
    }

    /// Cancel every timer and wait for the tasks to exit. No poll starts
    /// after this returns, and any in flight is abandoned.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let supervisor = self
            .supervisor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = supervisor {
            if let Err(e) = handle.await {
                warn!(error = %e, "polling supervisor failed");
            }
        }
    }
}

// ── Background tasks ─────────────────────────────────────────────────

async fn supervise<P: Poller>(
    poller: Arc<P>,
    intervals: PollingIntervals,
    mut transport: watch::Receiver<ConnectionStatus>,
    mode_tx: watch::Sender<PollingMode>,
    cancel: CancellationToken,
) {
    // Once the transport is dropped it can never be live again.
    let mut transport_gone = false;

    loop {
        let live = !transport_gone && transport.borrow_and_update().connected();
        let mode = if live {
            PollingMode::Backup
        } else {
            PollingMode::Full
        };
        mode_tx.send_replace(mode);
        info!(%mode, "polling mode");

        let round = cancel.child_token();
        let mut tasks = JoinSet::new();
        match mode {
            PollingMode::Backup => {
                tasks.spawn(backup_loop(
                    Arc::clone(&poller),
                    intervals.backup,
                    round.clone(),
                ));
            }
            _ => {
                for category in PollCategory::ALL {
                    tasks.spawn(category_loop(
                        Arc::clone(&poller),
                        category,
                        intervals.for_category(category),
                        round.clone(),
                    ));
                }
            }
        }

        let stopping = loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break true,
                changed = transport.changed(), if !transport_gone => {
                    if changed.is_err() {
                        debug!("transport status channel closed");
                        transport_gone = true;
                        if live {
                            break false;
                        }
                    } else if transport.borrow_and_update().connected() != live {
                        break false;
                    }
                }
            }
        };

        round.cancel();
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "polling task failed");
            }
        }

        if stopping {
            break;
        }
    }

    mode_tx.send_replace(PollingMode::Stopped);
    debug!("polling scheduler stopped");
}

/// Poll one category every `period`. A zero period disables the category.
async fn category_loop<P: Poller>(
    poller: Arc<P>,
    category: PollCategory,
    period: Duration,
    cancel: CancellationToken,
) {
    if period.is_zero() {
        debug!(%category, "polling disabled");
        return;
    }

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => run_poll(poller.as_ref(), category, &cancel).await,
        }
    }
}

/// Sweep every category once per `period`.
async fn backup_loop<P: Poller>(poller: Arc<P>, period: Duration, cancel: CancellationToken) {
    if period.is_zero() {
        debug!("backup polling disabled");
        return;
    }

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval.tick().await;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                debug!("backup poll sweep");
                for category in PollCategory::ALL {
                    run_poll(poller.as_ref(), category, &cancel).await;
                }
            }
        }
    }
}

/// Run one poll, racing cancellation. Failures are logged and dropped so
/// the caller's schedule continues.
async fn run_poll<P: Poller>(poller: &P, category: PollCategory, cancel: &CancellationToken) {
    tokio::select! {
        biased;
        () = cancel.cancelled() => {}
        result = poller.poll(category) => {
            if let Err(e) = result {
                warn!(%category, error = %e, "poll failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_names() {
        assert_eq!(PollCategory::NetworkStats.to_string(), "network-stats");
        assert_eq!(PollCategory::DeviceStatus.to_string(), "device-status");
        assert_eq!(PollingMode::Backup.to_string(), "backup");
    }
}

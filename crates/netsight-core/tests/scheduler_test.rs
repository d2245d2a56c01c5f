// Polling scheduler timing under paused time.
#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;

use netsight_core::{
    ConnectionPhase, ConnectionStatus, CoreError, PollCategory, Poller, PollingIntervals,
    PollingMode, PollingScheduler,
};

#[derive(Default)]
struct CountingPoller {
    counts: Mutex<HashMap<PollCategory, usize>>,
    failing: Option<PollCategory>,
}

impl CountingPoller {
    fn failing(category: PollCategory) -> Self {
        Self {
            failing: Some(category),
            ..Self::default()
        }
    }

    fn count(&self, category: PollCategory) -> usize {
        self.counts.lock().unwrap().get(&category).copied().unwrap_or(0)
    }

    fn snapshot(&self) -> HashMap<PollCategory, usize> {
        self.counts.lock().unwrap().clone()
    }

    fn reset(&self) {
        self.counts.lock().unwrap().clear();
    }
}

impl Poller for CountingPoller {
    async fn poll(&self, category: PollCategory) -> Result<(), CoreError> {
        *self.counts.lock().unwrap().entry(category).or_default() += 1;
        if self.failing == Some(category) {
            return Err(CoreError::Internal(format!("{category} unavailable")));
        }
        Ok(())
    }
}

fn status(phase: ConnectionPhase) -> ConnectionStatus {
    ConnectionStatus {
        phase,
        reconnect_attempts: 0,
        reconnect_enabled: true,
        url: "ws://dashboard.test/ws".into(),
    }
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

#[tokio::test(start_paused = true)]
async fn full_polling_uses_per_category_intervals() {
    let poller = Arc::new(CountingPoller::default());
    let (_tx, rx) = watch::channel(status(ConnectionPhase::Closed));
    let scheduler = PollingScheduler::start(Arc::clone(&poller), PollingIntervals::default(), rx);

    settle().await;
    assert_eq!(scheduler.mode(), PollingMode::Full);

    tokio::time::sleep(Duration::from_secs(31)).await;
    scheduler.shutdown().await;

    assert_eq!(poller.count(PollCategory::Traffic), 6);
    assert_eq!(poller.count(PollCategory::NetworkStats), 3);
    assert_eq!(poller.count(PollCategory::DeviceStatus), 2);
    assert_eq!(poller.count(PollCategory::Events), 1);
}

#[tokio::test(start_paused = true)]
async fn open_transport_switches_to_backup_sweeps() {
    let poller = Arc::new(CountingPoller::default());
    let (tx, rx) = watch::channel(status(ConnectionPhase::Closed));
    let scheduler = PollingScheduler::start(Arc::clone(&poller), PollingIntervals::default(), rx);
    settle().await;

    tx.send_replace(status(ConnectionPhase::Open));
    settle().await;
    assert_eq!(scheduler.mode(), PollingMode::Backup);
    poller.reset();

    tokio::time::sleep(Duration::from_secs(61)).await;
    for category in PollCategory::ALL {
        assert_eq!(poller.count(category), 2, "{category}");
    }

    tx.send_replace(status(ConnectionPhase::Closed));
    settle().await;
    assert_eq!(scheduler.mode(), PollingMode::Full);

    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn failing_category_keeps_its_schedule_and_spares_others() {
    let poller = Arc::new(CountingPoller::failing(PollCategory::Traffic));
    let (_tx, rx) = watch::channel(status(ConnectionPhase::Idle));
    let scheduler = PollingScheduler::start(Arc::clone(&poller), PollingIntervals::default(), rx);

    tokio::time::sleep(Duration::from_secs(31)).await;
    scheduler.shutdown().await;

    assert_eq!(poller.count(PollCategory::Traffic), 6);
    assert_eq!(poller.count(PollCategory::NetworkStats), 3);
}

#[tokio::test(start_paused = true)]
async fn nothing_fires_after_shutdown() {
    let poller = Arc::new(CountingPoller::default());
    let (_tx, rx) = watch::channel(status(ConnectionPhase::Closed));
    let scheduler = PollingScheduler::start(Arc::clone(&poller), PollingIntervals::default(), rx);

    tokio::time::sleep(Duration::from_secs(12)).await;
    scheduler.shutdown().await;
    assert_eq!(scheduler.mode(), PollingMode::Stopped);

    let before = poller.snapshot();
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(poller.snapshot(), before);
}

#[tokio::test(start_paused = true)]
async fn dropped_transport_falls_back_to_full_polling() {
    let poller = Arc::new(CountingPoller::default());
    let (tx, rx) = watch::channel(status(ConnectionPhase::Open));
    let scheduler = PollingScheduler::start(Arc::clone(&poller), PollingIntervals::default(), rx);
    settle().await;
    assert_eq!(scheduler.mode(), PollingMode::Backup);

    drop(tx);
    settle().await;
    assert_eq!(scheduler.mode(), PollingMode::Full);

    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn zero_interval_disables_a_category() {
    let poller = Arc::new(CountingPoller::default());
    let (_tx, rx) = watch::channel(status(ConnectionPhase::Closed));
    let intervals = PollingIntervals {
        events: Duration::ZERO,
        ..PollingIntervals::default()
    };
    let scheduler = PollingScheduler::start(Arc::clone(&poller), intervals, rx);

    tokio::time::sleep(Duration::from_secs(61)).await;
    scheduler.shutdown().await;

    assert_eq!(poller.count(PollCategory::Events), 0);
    assert_eq!(poller.count(PollCategory::NetworkStats), 6);
}

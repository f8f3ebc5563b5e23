//! Periodic snapshots delivered over a channel
//!
//! Each tick runs one blocking snapshot on tokio's blocking pool, stores it in
//! the shared [`SensorService`] and sends a [`PollEvent`]. The poller stops
//! when the receiving side is dropped.

use anyhow::Result;
use hwsens_core::{SegmentProvider, SegmentState, Snapshot, SnapshotError, SnapshotReader};
use hwsens_sources::{RefreshOutcome, SensorService};
use log::{debug, trace, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Result of one tick
#[derive(Debug)]
pub enum PollEvent {
    Snapshot {
        snapshot: Arc<Snapshot>,
        /// The producer has not refreshed since the previous snapshot
        stale: bool,
    },
    Inactive {
        signature: [u8; 4],
    },
    /// The snapshot failed; polling continues
    Failed(SnapshotError),
}

/// Polls a segment at a fixed interval
pub struct Poller<P> {
    reader: Arc<SnapshotReader<P>>,
    service: Arc<SensorService>,
    interval: Duration,
}

impl<P: SegmentProvider + 'static> Poller<P> {
    pub fn new(reader: SnapshotReader<P>, service: Arc<SensorService>, interval: Duration) -> Self {
        Self {
            reader: Arc::new(reader),
            service,
            interval,
        }
    }

    pub fn service(&self) -> &Arc<SensorService> {
        &self.service
    }

    /// Start polling on the current runtime
    pub fn spawn(self, buffer: usize) -> (mpsc::Receiver<PollEvent>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let handle = tokio::spawn(async move { self.run(tx).await });
        (rx, handle)
    }

    /// Poll until `tx` is closed or a cancel request stops the reader
    pub async fn run(self, tx: mpsc::Sender<PollEvent>) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            if tx.is_closed() {
                break;
            }

            let start = Instant::now();
            let event = match self.poll_once().await {
                Ok(event) => event,
                Err(e) => {
                    warn!("Polling stopped: {}", e);
                    break;
                }
            };
            trace!("Poll cycle took {:?}", start.elapsed());

            let cancelled = matches!(event, PollEvent::Failed(SnapshotError::Cancelled));
            if tx.send(event).await.is_err() || cancelled {
                break;
            }
        }
        debug!("Poller for {} finished", self.reader.provider().describe());
    }

    /// Take one snapshot and store it in the service
    pub async fn poll_once(&self) -> Result<PollEvent> {
        let reader = Arc::clone(&self.reader);
        let state = match tokio::task::spawn_blocking(move || reader.read()).await? {
            Ok(state) => state,
            Err(e) => {
                if e.is_transient() {
                    debug!("Snapshot skipped: {}", e);
                } else {
                    warn!("Snapshot failed: {}", e);
                }
                return Ok(PollEvent::Failed(e));
            }
        };

        let signature = match &state {
            SegmentState::Inactive { signature } => Some(*signature),
            SegmentState::Active(_) => None,
        };

        let outcome = self.service.apply(state);
        let event = match (outcome, self.service.snapshot()) {
            (RefreshOutcome::Updated, Some(snapshot)) => PollEvent::Snapshot {
                snapshot,
                stale: false,
            },
            (RefreshOutcome::Stale, Some(snapshot)) => PollEvent::Snapshot {
                snapshot,
                stale: true,
            },
            _ => PollEvent::Inactive {
                signature: signature.unwrap_or_default(),
            },
        };
        Ok(event)
    }
}

//! Single-flight background poller
//!
//! A tick starts a fetch only when the previous one has finished; otherwise
//! the tick is skipped and counted. Fetches run on their own task so a slow
//! backend never delays the ticker.

use crate::error::ClientError;
use chargeops_core::Record;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Capacity of the event channel
const EVENT_BUFFER: usize = 4;

/// Result of one background fetch
#[derive(Debug)]
pub enum PollEvent {
    /// Fresh collection
    Refreshed(Vec<Record>),
    /// Fetch failed; the caller keeps its collection
    Failed(ClientError),
}

/// Snapshot of poller counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollerStats {
    /// Interval ticks observed
    pub ticks: u64,
    /// Fetches started
    pub fetches: u64,
    /// Ticks skipped because a fetch was outstanding
    pub skipped: u64,
    /// Fetches that failed
    pub failures: u64,
}

#[derive(Debug, Default)]
struct PollerMetrics {
    ticks: AtomicU64,
    fetches: AtomicU64,
    skipped: AtomicU64,
    failures: AtomicU64,
}

impl PollerMetrics {
    fn snapshot(&self) -> PollerStats {
        PollerStats {
            ticks: self.ticks.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// Handle to a running poller
#[derive(Debug)]
pub struct Poller {
    token: CancellationToken,
    metrics: Arc<PollerMetrics>,
    handle: JoinHandle<()>,
}

impl Poller {
    /// Start polling every `interval` until `token` is cancelled
    ///
    /// The first fetch happens one interval after spawning; the initial load
    /// is the caller's. No event is sent once `token` is cancelled, and the
    /// receiver closes after the loop and any outstanding fetch have ended.
    pub fn spawn<F, Fut>(
        interval: Duration,
        token: CancellationToken,
        fetch: F,
    ) -> (Self, mpsc::Receiver<PollEvent>)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<Record>, ClientError>> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let metrics = Arc::new(PollerMetrics::default());
        let handle = tokio::spawn(run(interval, token.clone(), Arc::clone(&metrics), fetch, tx));

        info!(interval_secs = interval.as_secs(), "Started poller");
        (
            Self {
                token,
                metrics,
                handle,
            },
            rx,
        )
    }

    /// Counter snapshot
    #[must_use]
    pub fn stats(&self) -> PollerStats {
        self.metrics.snapshot()
    }

    /// Cancel polling without waiting
    pub fn stop(&self) {
        self.token.cancel();
    }

    /// Cancel polling and wait for the loop to exit
    pub async fn shutdown(self) -> PollerStats {
        self.token.cancel();
        if let Err(e) = self.handle.await {
            warn!(error = %e, "Poller task ended abnormally");
        }
        self.metrics.snapshot()
    }
}

async fn run<F, Fut>(
    interval: Duration,
    token: CancellationToken,
    metrics: Arc<PollerMetrics>,
    fetch: F,
    tx: mpsc::Sender<PollEvent>,
) where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<Record>, ClientError>> + Send + 'static,
{
    let in_flight = Arc::new(AtomicBool::new(false));
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            () = token.cancelled() => break,
            _ = ticker.tick() => {}
        }
        metrics.ticks.fetch_add(1, Ordering::Relaxed);

        if in_flight.swap(true, Ordering::AcqRel) {
            metrics.skipped.fetch_add(1, Ordering::Relaxed);
            warn!("Skipping poll: previous fetch still outstanding");
            continue;
        }
        metrics.fetches.fetch_add(1, Ordering::Relaxed);

        let request = fetch();
        let token = token.clone();
        let metrics = Arc::clone(&metrics);
        let in_flight = Arc::clone(&in_flight);
        let tx = tx.clone();
        tokio::spawn(async move {
            let outcome = tokio::select! {
                () = token.cancelled() => None,
                result = request => Some(result),
            };
            in_flight.store(false, Ordering::Release);

            let event = match outcome {
                Some(Ok(records)) => PollEvent::Refreshed(records),
                Some(Err(e)) => {
                    metrics.failures.fetch_add(1, Ordering::Relaxed);
                    PollEvent::Failed(e)
                }
                None => return,
            };
            if token.is_cancelled() {
                return;
            }
            if tx.send(event).await.is_err() {
                debug!("Poll receiver dropped");
            }
        });
    }

    debug!("Poller stopped");
}

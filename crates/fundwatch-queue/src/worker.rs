//! Background worker that reports backlog health on a schedule

use crate::{QueueConfig, QueueError, QueueMetrics, VerificationQueue};
use fundwatch_domain::clock::current_timestamp;
use fundwatch_domain::FundingStore;
use std::fmt::Display;
use std::sync::{Arc, Mutex};
use tokio::time::{interval, Duration};

/// Periodically measures the verification backlog and logs it
///
/// The worker only observes. Time never changes a task; overdue tasks are
/// reported, not escalated.
///
/// # Examples
///
/// ```no_run
/// use fundwatch_queue::{BacklogWorker, QueueConfig};
/// use fundwatch_store::SqliteStore;
/// use std::sync::{Arc, Mutex};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = Arc::new(Mutex::new(SqliteStore::new("fundwatch.db")?));
///     let mut worker = BacklogWorker::new(QueueConfig::default())?;
///
///     // Run until Ctrl+C
///     worker.run(store).await?;
///     Ok(())
/// }
/// ```
pub struct BacklogWorker {
    queue: VerificationQueue,
    interval: Duration,
    sweeps: usize,
    last: Option<QueueMetrics>,
}

impl BacklogWorker {
    /// Create a worker with the given configuration
    pub fn new(config: QueueConfig) -> Result<Self, QueueError> {
        let interval = config.sweep_interval();
        Ok(Self {
            queue: VerificationQueue::new(config)?,
            interval,
            sweeps: 0,
            last: None,
        })
    }

    /// Create a worker with default configuration
    pub fn default_config() -> Self {
        Self {
            queue: VerificationQueue::default_config(),
            interval: QueueConfig::default().sweep_interval(),
            sweeps: 0,
            last: None,
        }
    }

    /// Number of completed sweeps
    pub fn sweep_count(&self) -> usize {
        self.sweeps
    }

    /// Metrics from the latest sweep
    pub fn last_metrics(&self) -> Option<&QueueMetrics> {
        self.last.as_ref()
    }

    /// Measure the backlog once
    pub fn sweep<S: FundingStore>(&mut self, store: &Mutex<S>) -> Result<QueueMetrics, QueueError>
    where
        S::Error: Display,
    {
        let metrics = {
            let guard = store
                .lock()
                .map_err(|e| QueueError::Worker(format!("Store lock error: {}", e)))?;
            self.queue.backlog(&*guard, current_timestamp())?
        };

        self.sweeps += 1;
        if metrics.overdue > 0 {
            tracing::warn!(
                "Backlog: {} open, {} overdue, oldest {}s",
                metrics.open(),
                metrics.overdue,
                metrics.oldest_open_age_secs.unwrap_or(0)
            );
        } else {
            tracing::info!(
                "Backlog: {} open ({} pending, {} in review)",
                metrics.open(),
                metrics.pending,
                metrics.in_review
            );
        }
        self.last = Some(metrics.clone());
        Ok(metrics)
    }

    /// Run the worker until a shutdown signal (Ctrl+C) is received
    ///
    /// A failed sweep is logged and the worker keeps going.
    pub async fn run<S>(&mut self, store: Arc<Mutex<S>>) -> Result<(), QueueError>
    where
        S: FundingStore,
        S::Error: Display,
    {
        let mut ticker = interval(self.interval);
        tracing::info!("Backlog worker started (interval: {:?})", self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep(&store) {
                        tracing::error!("Backlog sweep failed: {}", e);
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown signal received, stopping backlog worker");
                    break;
                }
            }
        }

        if let Some(metrics) = &self.last {
            tracing::info!("Backlog worker stopped. Last snapshot:\n{}", metrics.summary());
        }
        Ok(())
    }

    /// Run for a specific number of sweeps
    pub async fn run_cycles<S>(&mut self, store: Arc<Mutex<S>>, cycles: usize) -> Result<(), QueueError>
    where
        S: FundingStore,
        S::Error: Display,
    {
        let mut ticker = interval(self.interval);
        tracing::info!(
            "Backlog worker started for {} cycles (interval: {:?})",
            cycles,
            self.interval
        );

        for cycle in 0..cycles {
            ticker.tick().await;
            tracing::debug!("Starting backlog sweep {}/{}", cycle + 1, cycles);
            self.sweep(&store)?;
        }
        Ok(())
    }
}

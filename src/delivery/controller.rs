use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use rand::Rng;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::metrics::{FlushReport, MetricsSnapshot};
use crate::models::PageVisitRecord;
use crate::settings::DeliverySettings;
use crate::tracking::PageActivityTracker;
use crate::transport::{Acknowledgement, DeliveryError, HttpTransport, Transport};

use super::dead_letter::DeadLetter;
use super::worker::DeliveryWorker;

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Owns a [`DeliveryWorker`] and the background task that flushes it on a
/// fixed interval.
///
/// Created with [`start`](Self::start) and torn down with
/// [`shutdown`](Self::shutdown), which stops the timer and runs one last
/// flush.
pub struct DeliveryService {
    worker: DeliveryWorker,
    handle: Option<JoinHandle<()>>,
    cancel_token: CancellationToken,
}

impl DeliveryService {
    /// Build the HTTP transport from `settings` and start flushing.
    /// Must be called from within a tokio runtime.
    pub fn from_settings(settings: &DeliverySettings) -> Result<Self> {
        let transport = HttpTransport::new(&settings.server_url, settings.request_timeout())
            .with_context(|| format!("failed to configure transport for {}", settings.server_url))?
            .with_delivery_id(settings.include_delivery_id);

        Ok(Self::start(settings, Arc::new(transport), Arc::new(SystemClock)))
    }

    pub fn start(
        settings: &DeliverySettings,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let worker = DeliveryWorker::new(
            transport,
            clock,
            settings.retry,
            settings.dead_letter_capacity,
        );
        Self::with_worker(worker, settings.flush_interval())
    }

    pub fn with_worker(worker: DeliveryWorker, flush_interval: Duration) -> Self {
        let flush_interval = flush_interval.max(Duration::from_millis(1));
        let cancel_token = CancellationToken::new();
        let jitter = startup_jitter(flush_interval);

        if worker.policy().is_unbounded() {
            log_info!("delivery retry policy is unbounded; failing records are kept until delivered");
        }

        let handle = tokio::spawn(flush_loop(
            worker.clone(),
            flush_interval,
            jitter,
            cancel_token.clone(),
        ));

        log_info!(
            "delivery service started (flush every {}s)",
            flush_interval.as_secs_f64()
        );

        Self {
            worker,
            handle: Some(handle),
            cancel_token,
        }
    }

    pub fn worker(&self) -> &DeliveryWorker {
        &self.worker
    }

    pub async fn enqueue(&self, record: PageVisitRecord, user_id: Option<String>) -> Uuid {
        self.worker.enqueue(record, user_id).await
    }

    /// Page teardown: finalize the tracker and queue its record.
    pub async fn finish_page(
        &self,
        tracker: PageActivityTracker,
        user_id: Option<String>,
    ) -> Uuid {
        self.enqueue(tracker.finalize(), user_id).await
    }

    pub async fn flush(&self) -> FlushReport {
        self.worker.flush().await
    }

    pub async fn send_immediately(
        &self,
        record: PageVisitRecord,
        user_id: Option<String>,
    ) -> Result<Acknowledgement, DeliveryError> {
        self.worker.send_immediately(record, user_id).await
    }

    pub async fn test_connection(&self) -> bool {
        self.worker.test_connection().await
    }

    pub fn pending_len(&self) -> usize {
        self.worker.queue().len()
    }

    pub fn dead_letters(&self) -> Vec<DeadLetter> {
        self.worker.dead_letters().snapshot()
    }

    pub fn requeue_dead_letters(&self) -> usize {
        self.worker.requeue_dead_letters()
    }

    pub async fn metrics(&self) -> MetricsSnapshot {
        self.worker.metrics().await
    }

    /// Stop the periodic flush and make a final delivery attempt. Records
    /// that still fail remain in the worker's queue.
    pub async fn shutdown(mut self) -> Result<FlushReport> {
        self.cancel_token.cancel();

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("delivery flush loop failed to join")?;
        }

        let report = self.worker.flush().await;
        if report.requeued > 0 {
            log_warn!(
                "shutting down with {} undelivered records",
                self.worker.queue().len()
            );
        }
        Ok(report)
    }
}

impl Drop for DeliveryService {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

/// Spread first flushes of services started together over a tenth of the
/// interval.
fn startup_jitter(interval: Duration) -> Duration {
    let max_ms = (interval.as_millis() / 10) as u64;
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
}

async fn flush_loop(
    worker: DeliveryWorker,
    interval: Duration,
    jitter: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval + jitter, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // Runs to completion even if cancellation arrives meanwhile.
                worker.flush().await;
            }
            _ = cancel_token.cancelled() => {
                log_info!("delivery flush loop shutting down");
                break;
            }
        }
    }
}

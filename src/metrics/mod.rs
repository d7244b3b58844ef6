mod types;

pub use types::{FailureCounts, FailureSample, FlushReport, MetricsSnapshot};

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::transport::DeliveryError;

const MAX_RECENT_FAILURES: usize = 20;

/// Delivery counters shared between the worker and whoever reports on it.
#[derive(Clone)]
pub struct DeliveryMetrics {
    inner: Arc<Mutex<MetricsSnapshot>>,
}

impl DeliveryMetrics {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MetricsSnapshot::default())),
        }
    }

    pub async fn record_enqueued(&self) {
        self.inner.lock().await.enqueued += 1;
    }

    pub async fn record_success(&self) {
        let mut state = self.inner.lock().await;
        state.attempts += 1;
        state.delivered += 1;
        state.last_success_at = Some(Utc::now());
    }

    pub async fn record_failure(&self, delivery_id: Uuid, err: &DeliveryError) {
        let mut state = self.inner.lock().await;
        state.attempts += 1;
        state.failures.increment(err.kind());

        state.recent_failures.push(FailureSample {
            delivery_id,
            kind: err.kind(),
            message: err.to_string(),
            at: Utc::now(),
        });

        if state.recent_failures.len() > MAX_RECENT_FAILURES {
            state.recent_failures.remove(0);
        }
    }

    pub async fn record_dead_letter(&self) {
        self.inner.lock().await.dead_lettered += 1;
    }

    pub async fn record_flush(&self, report: FlushReport) {
        let mut state = self.inner.lock().await;
        state.flushes += 1;
        state.last_flush = Some(report);
    }

    pub async fn get_snapshot(&self) -> MetricsSnapshot {
        self.inner.lock().await.clone()
    }

    pub async fn reset(&self) {
        *self.inner.lock().await = MetricsSnapshot::default();
    }

    /// Hold the counters so that every recorder blocks until the guard drops.
    #[cfg(test)]
    pub(crate) async fn hold(&self) -> tokio::sync::MutexGuard<'_, MetricsSnapshot> {
        self.inner.lock().await
    }
}

impl Default for DeliveryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::clock::Clock;
use crate::metrics::{DeliveryMetrics, FlushReport, MetricsSnapshot};
use crate::models::{PageVisitRecord, QueuedRecord};
use crate::transport::{Acknowledgement, DeliveryError, Transport};

use super::dead_letter::{DeadLetter, DeadLetterQueue};
use super::policy::RetryPolicy;
use super::queue::DeliveryQueue;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// Drains the [`DeliveryQueue`] through a [`Transport`].
///
/// Flushes are serialized: a second `flush` waits until the first one has
/// put its failures back, so a record is never in flight twice.
#[derive(Clone)]
pub struct DeliveryWorker {
    queue: DeliveryQueue,
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    dead_letters: DeadLetterQueue,
    metrics: DeliveryMetrics,
    clock: Arc<dyn Clock>,
    flush_lock: Arc<Mutex<()>>,
}

/// Records taken out of the queue by one flush.
///
/// Whatever has not been resolved when this is dropped (failures, plus
/// anything not yet attempted if the flush future was cancelled) goes back
/// to the front of the queue.
struct FlushBatch<'a> {
    queue: &'a DeliveryQueue,
    remaining: VecDeque<QueuedRecord>,
    retained: Vec<QueuedRecord>,
}

impl Drop for FlushBatch<'_> {
    fn drop(&mut self) {
        let mut back = std::mem::take(&mut self.retained);
        back.extend(self.remaining.drain(..));
        self.queue.requeue_front(back);
    }
}

impl DeliveryWorker {
    pub fn new(
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
        policy: RetryPolicy,
        dead_letter_capacity: usize,
    ) -> Self {
        Self {
            queue: DeliveryQueue::new(clock.clone()),
            transport,
            policy,
            dead_letters: DeadLetterQueue::new(dead_letter_capacity),
            metrics: DeliveryMetrics::new(),
            clock,
            flush_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn queue(&self) -> &DeliveryQueue {
        &self.queue
    }

    pub fn dead_letters(&self) -> &DeadLetterQueue {
        &self.dead_letters
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub async fn metrics(&self) -> MetricsSnapshot {
        self.metrics.get_snapshot().await
    }

    /// Append a finalized record for later delivery. Never blocks on an
    /// in-progress flush.
    pub async fn enqueue(&self, record: PageVisitRecord, user_id: Option<String>) -> Uuid {
        let queued = self.queue.enqueue(record, user_id);
        self.metrics.record_enqueued().await;

        log_debug!(
            "queued {} for {} ({} pending, user {})",
            queued.delivery_id,
            queued.record.url,
            self.queue.len(),
            queued.user_id.as_deref().unwrap_or("<none>")
        );
        queued.delivery_id
    }

    /// Attempt every record pending at the time of the call, one at a time.
    pub async fn flush(&self) -> FlushReport {
        let _guard = self.flush_lock.lock().await;

        let mut batch = FlushBatch {
            queue: &self.queue,
            remaining: self.queue.take_all(),
            retained: Vec::new(),
        };

        let mut report = FlushReport {
            attempted: batch.remaining.len(),
            ..FlushReport::default()
        };

        if report.attempted == 0 {
            log_debug!("flush: nothing pending");
            return report;
        }

        log_info!("flush: sending {} records", report.attempted);

        // The record in flight stays at the front of `remaining` until its
        // outcome is known.
        while let Some(current) = batch.remaining.front() {
            let outcome = self.transport.send(current).await;
            let Some(mut queued) = batch.remaining.pop_front() else {
                break;
            };

            match outcome {
                Ok(_) => {
                    report.delivered += 1;
                    self.metrics.record_success().await;
                }
                Err(err) => {
                    queued.attempts += 1;
                    queued.last_error = Some(err.kind());
                    let delivery_id = queued.delivery_id;

                    // The record must be back in the batch or dead-lettered
                    // before the next await, or a cancelled flush loses it.
                    let now = self.clock.now();
                    let dead_lettered = match self.policy.exhausted(&queued, now) {
                        Some(reason) => {
                            log_warn!(
                                "dead-lettering {} ({}): {}",
                                delivery_id,
                                queued.record.url,
                                reason
                            );
                            self.dead_letters.push(DeadLetter {
                                record: queued,
                                reason,
                                last_error: err.to_string(),
                                failed_at: now,
                            });
                            report.dead_lettered += 1;
                            true
                        }
                        None => {
                            log_debug!(
                                "delivery {} failed (attempt {}): {}",
                                delivery_id,
                                queued.attempts,
                                err
                            );
                            batch.retained.push(queued);
                            false
                        }
                    };

                    self.metrics.record_failure(delivery_id, &err).await;
                    if dead_lettered {
                        self.metrics.record_dead_letter().await;
                    }
                }
            }
        }

        report.requeued = batch.retained.len();
        drop(batch);

        if report.requeued > 0 {
            log_warn!(
                "flush: {} of {} records failed and stay queued ({} pending)",
                report.requeued,
                report.attempted,
                self.queue.len()
            );
        } else {
            log_info!("flush: delivered {} records", report.delivered);
        }

        self.metrics.record_flush(report).await;
        report
    }

    /// Deliver one record right away, bypassing the queue. No retry; the
    /// caller decides whether to enqueue on failure.
    pub async fn send_immediately(
        &self,
        record: PageVisitRecord,
        user_id: Option<String>,
    ) -> Result<Acknowledgement, DeliveryError> {
        let queued = QueuedRecord::new(record, user_id, self.clock.now());

        match self.transport.send(&queued).await {
            Ok(ack) => {
                self.metrics.record_success().await;
                Ok(ack)
            }
            Err(err) => {
                log_warn!("immediate delivery of {} failed: {}", queued.record.url, err);
                self.metrics.record_failure(queued.delivery_id, &err).await;
                Err(err)
            }
        }
    }

    pub async fn test_connection(&self) -> bool {
        match self.transport.probe().await {
            Ok(()) => {
                log_info!("backend reachable");
                true
            }
            Err(err) => {
                log_warn!("backend unreachable: {}", err);
                false
            }
        }
    }

    /// Move every dead letter back to the tail of the queue with a fresh
    /// attempt count. Returns how many were requeued.
    pub fn requeue_dead_letters(&self) -> usize {
        let letters = self.dead_letters.drain();
        let count = letters.len();
        for letter in letters {
            let mut queued = letter.record;
            queued.attempts = 0;
            queued.last_error = None;
            queued.queued_at = self.clock.now();
            self.queue.push(queued);
        }

        if count > 0 {
            log_info!("requeued {} dead-lettered records", count);
        }
        count
    }
}

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

use crate::clock::Clock;
use crate::models::{PageVisitRecord, QueuedRecord};

/// Ordered buffer of records that have not been delivered yet.
///
/// Clones share the same buffer. The lock is only held for in-memory
/// operations, never across a network call.
#[derive(Clone)]
pub struct DeliveryQueue {
    pending: Arc<Mutex<VecDeque<QueuedRecord>>>,
    clock: Arc<dyn Clock>,
}

impl DeliveryQueue {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            pending: Arc::new(Mutex::new(VecDeque::new())),
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<QueuedRecord>> {
        match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Stamp the record with `user_id` and the current time and append it.
    pub fn enqueue(&self, record: PageVisitRecord, user_id: Option<String>) -> QueuedRecord {
        let queued = QueuedRecord::new(record, user_id, self.clock.now());
        self.push(queued.clone());
        queued
    }

    pub fn push(&self, queued: QueuedRecord) {
        self.lock().push_back(queued);
    }

    /// Take everything currently pending, leaving the buffer empty.
    pub fn take_all(&self) -> VecDeque<QueuedRecord> {
        std::mem::take(&mut *self.lock())
    }

    /// Put records back ahead of anything enqueued since they were taken,
    /// keeping their relative order.
    pub fn requeue_front(&self, records: Vec<QueuedRecord>) {
        if records.is_empty() {
            return;
        }
        let mut pending = self.lock();
        for record in records.into_iter().rev() {
            pending.push_front(record);
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn contains(&self, delivery_id: Uuid) -> bool {
        self.lock().iter().any(|r| r.delivery_id == delivery_id)
    }

    pub fn snapshot(&self) -> Vec<QueuedRecord> {
        self.lock().iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{TimeZone, Utc};

    fn record(url: &str) -> PageVisitRecord {
        PageVisitRecord {
            url: url.into(),
            domain: String::new(),
            title: String::new(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            time_spent: 3,
            max_scroll_depth: 10,
            is_active: true,
        }
    }

    fn urls(queue: &DeliveryQueue) -> Vec<String> {
        queue.snapshot().into_iter().map(|q| q.record.url).collect()
    }

    #[test]
    fn enqueue_stamps_user_and_time() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 30, 0).unwrap();
        let queue = DeliveryQueue::new(Arc::new(ManualClock::new(at)));

        let queued = queue.enqueue(record("https://a.test/"), Some("u-1".into()));

        assert_eq!(queued.user_id.as_deref(), Some("u-1"));
        assert_eq!(queued.queued_at, at);
        assert_eq!(queued.attempts, 0);
        assert!(queue.contains(queued.delivery_id));
    }

    #[test]
    fn take_all_empties_in_fifo_order() {
        let queue = DeliveryQueue::new(Arc::new(ManualClock::new(Utc::now())));
        queue.enqueue(record("https://a.test/"), None);
        queue.enqueue(record("https://b.test/"), None);

        let taken: Vec<_> = queue.take_all().into_iter().map(|q| q.record.url).collect();

        assert_eq!(taken, vec!["https://a.test/", "https://b.test/"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn requeued_records_go_ahead_of_newer_ones() {
        let queue = DeliveryQueue::new(Arc::new(ManualClock::new(Utc::now())));
        queue.enqueue(record("https://a.test/"), None);
        queue.enqueue(record("https://b.test/"), None);
        let taken: Vec<_> = queue.take_all().into_iter().collect();

        queue.enqueue(record("https://c.test/"), None);
        queue.requeue_front(taken);

        assert_eq!(
            urls(&queue),
            vec!["https://a.test/", "https://b.test/", "https://c.test/"]
        );
    }
}

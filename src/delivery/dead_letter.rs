//! Holding area for records the retry policy gave up on.
//!
//! Bounded and in-memory; the oldest entry is evicted when full.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::QueuedRecord;

const ENABLE_LOGS: bool = true;

use crate::log_warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadLetter {
    pub record: QueuedRecord,
    /// Why the retry policy stopped retrying.
    pub reason: String,
    /// The error of the final attempt.
    pub last_error: String,
    pub failed_at: DateTime<Utc>,
}

struct DeadLetterState {
    entries: VecDeque<DeadLetter>,
    evicted: u64,
}

#[derive(Clone)]
pub struct DeadLetterQueue {
    inner: Arc<Mutex<DeadLetterState>>,
    capacity: usize,
}

impl DeadLetterQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(DeadLetterState {
                entries: VecDeque::new(),
                evicted: 0,
            })),
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DeadLetterState> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn push(&self, letter: DeadLetter) {
        let mut state = self.lock();
        if state.entries.len() >= self.capacity {
            if let Some(dropped) = state.entries.pop_front() {
                state.evicted += 1;
                log_warn!(
                    "dead-letter queue full ({}), evicting {} ({})",
                    self.capacity,
                    dropped.record.delivery_id,
                    dropped.record.record.url
                );
            }
        }
        state.entries.push_back(letter);
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    pub fn evicted(&self) -> u64 {
        self.lock().evicted
    }

    pub fn snapshot(&self) -> Vec<DeadLetter> {
        self.lock().entries.iter().cloned().collect()
    }

    /// Remove and return every entry, oldest first.
    pub fn drain(&self) -> Vec<DeadLetter> {
        self.lock().entries.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PageVisitRecord;

    fn letter(url: &str) -> DeadLetter {
        let now = Utc::now();
        DeadLetter {
            record: QueuedRecord::new(
                PageVisitRecord {
                    url: url.into(),
                    domain: String::new(),
                    title: String::new(),
                    timestamp: now,
                    time_spent: 0,
                    max_scroll_depth: 0,
                    is_active: true,
                },
                None,
                now,
            ),
            reason: "gave up after 3 attempts".into(),
            last_error: "network error: refused".into(),
            failed_at: now,
        }
    }

    #[test]
    fn evicts_oldest_when_full() {
        let dlq = DeadLetterQueue::new(2);
        dlq.push(letter("https://a.test/"));
        dlq.push(letter("https://b.test/"));
        dlq.push(letter("https://c.test/"));

        let urls: Vec<_> = dlq
            .snapshot()
            .into_iter()
            .map(|l| l.record.record.url)
            .collect();
        assert_eq!(urls, vec!["https://b.test/", "https://c.test/"]);
        assert_eq!(dlq.evicted(), 1);
    }

    #[test]
    fn drain_empties_queue() {
        let dlq = DeadLetterQueue::new(10);
        dlq.push(letter("https://a.test/"));

        assert_eq!(dlq.drain().len(), 1);
        assert!(dlq.is_empty());
    }
}

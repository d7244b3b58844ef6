use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::QueuedRecord;

/// Bounds on how long a failing record keeps being retried.
///
/// Both bounds are unset by default, which retries forever.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    /// Failed attempts after which a record is dead-lettered.
    #[serde(default)]
    pub max_attempts: Option<u32>,
    /// Age since enqueue after which a failing record is dead-lettered.
    #[serde(default)]
    pub max_age_secs: Option<u64>,
}

impl RetryPolicy {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn is_unbounded(&self) -> bool {
        self.max_attempts.is_none() && self.max_age_secs.is_none()
    }

    /// Why a record that just failed should stop being retried, if it should.
    pub fn exhausted(&self, record: &QueuedRecord, now: DateTime<Utc>) -> Option<String> {
        if let Some(max) = self.max_attempts {
            if record.attempts >= max {
                return Some(format!("gave up after {} attempts", record.attempts));
            }
        }

        if let Some(max_age) = self.max_age_secs {
            let age_secs = (now - record.queued_at).num_seconds();
            if age_secs >= i64::try_from(max_age).unwrap_or(i64::MAX) {
                return Some(format!(
                    "expired after {age_secs}s in queue (limit {max_age}s)"
                ));
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PageVisitRecord;
    use chrono::Duration;

    fn queued(attempts: u32, queued_at: DateTime<Utc>) -> QueuedRecord {
        let mut queued = QueuedRecord::new(
            PageVisitRecord {
                url: "https://example.com/".into(),
                domain: "example.com".into(),
                title: String::new(),
                timestamp: queued_at,
                time_spent: 1,
                max_scroll_depth: 0,
                is_active: true,
            },
            None,
            queued_at,
        );
        queued.attempts = attempts;
        queued
    }

    #[test]
    fn unbounded_never_exhausts() {
        let now = Utc::now();
        let record = queued(10_000, now - Duration::days(365));
        assert!(RetryPolicy::unbounded().exhausted(&record, now).is_none());
    }

    #[test]
    fn attempt_cap_applies_at_limit() {
        let now = Utc::now();
        let policy = RetryPolicy {
            max_attempts: Some(3),
            max_age_secs: None,
        };

        assert!(policy.exhausted(&queued(2, now), now).is_none());
        let reason = policy.exhausted(&queued(3, now), now).unwrap();
        assert!(reason.contains("3 attempts"));
    }

    #[test]
    fn age_limit_uses_queue_time() {
        let now = Utc::now();
        let policy = RetryPolicy {
            max_attempts: None,
            max_age_secs: Some(60),
        };

        assert!(policy
            .exhausted(&queued(1, now - Duration::seconds(59)), now)
            .is_none());
        assert!(policy
            .exhausted(&queued(1, now - Duration::seconds(61)), now)
            .is_some());
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::transport::ErrorKind;

/// Failure counts split by error kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureCounts {
    pub network: u64,
    pub http: u64,
    pub malformed_response: u64,
}

impl FailureCounts {
    pub fn increment(&mut self, kind: ErrorKind) {
        match kind {
            ErrorKind::Network => self.network += 1,
            ErrorKind::Http => self.http += 1,
            ErrorKind::MalformedResponse => self.malformed_response += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.network + self.http + self.malformed_response
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureSample {
    pub delivery_id: Uuid,
    pub kind: ErrorKind,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Outcome of one flush pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlushReport {
    pub attempted: usize,
    pub delivered: usize,
    pub requeued: usize,
    pub dead_lettered: usize,
}

impl FlushReport {
    pub fn is_clean(&self) -> bool {
        self.requeued == 0 && self.dead_lettered == 0
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub enqueued: u64,
    pub attempts: u64,
    pub delivered: u64,
    pub failures: FailureCounts,
    pub dead_lettered: u64,
    pub flushes: u64,
    pub last_flush: Option<FlushReport>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub recent_failures: Vec<FailureSample>,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::transport::ErrorKind;

use super::PageVisitRecord;

/// A visit record waiting for delivery, plus the bookkeeping the queue needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedRecord {
    pub delivery_id: Uuid,
    pub record: PageVisitRecord,
    pub user_id: Option<String>,
    /// Delivery timestamp; sent as the payload `timestamp`.
    pub queued_at: DateTime<Utc>,
    pub attempts: u32,
    pub last_error: Option<ErrorKind>,
}

impl QueuedRecord {
    pub fn new(record: PageVisitRecord, user_id: Option<String>, queued_at: DateTime<Utc>) -> Self {
        Self {
            delivery_id: Uuid::new_v4(),
            record,
            user_id,
            queued_at,
            attempts: 0,
            last_error: None,
        }
    }

    pub fn payload(&self, include_delivery_id: bool) -> DeliveryPayload<'_> {
        DeliveryPayload {
            url: &self.record.url,
            domain: &self.record.domain,
            title: &self.record.title,
            timestamp: self.queued_at,
            time_spent: self.record.time_spent,
            max_scroll_depth: self.record.max_scroll_depth,
            is_active: self.record.is_active,
            user_id: self.user_id.as_deref(),
            delivery_id: include_delivery_id.then_some(self.delivery_id),
        }
    }
}

/// JSON body of `POST /browsing-data`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryPayload<'a> {
    pub url: &'a str,
    pub domain: &'a str,
    pub title: &'a str,
    pub timestamp: DateTime<Utc>,
    pub time_spent: u64,
    pub max_scroll_depth: u32,
    pub is_active: bool,
    pub user_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_id: Option<Uuid>,
}

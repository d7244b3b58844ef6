//! Single-shot network calls to the telemetry backend.
//!
//! A [`Transport`] performs exactly one request per call and reports the
//! outcome. Retrying belongs to the delivery worker.

mod error;
mod http;

pub use error::{DeliveryError, ErrorKind};
pub use http::HttpTransport;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::QueuedRecord;

/// Body the backend returns for an accepted record. Every field is optional;
/// any JSON object counts as well-formed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Acknowledgement {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// POST one record. `Ok` only for a 2xx with a parseable acknowledgment.
    async fn send(&self, record: &QueuedRecord) -> Result<Acknowledgement, DeliveryError>;

    /// GET the liveness endpoint. `Ok` only for a 2xx.
    async fn probe(&self) -> Result<(), DeliveryError>;
}

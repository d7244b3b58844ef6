use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};

use crate::models::QueuedRecord;

use super::{Acknowledgement, DeliveryError, Transport};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

const BROWSING_DATA_PATH: &str = "browsing-data";
const HEALTH_PATH: &str = "health";
/// Error bodies are kept for logs only; long HTML error pages are cut.
const MAX_ERROR_BODY_CHARS: usize = 256;

/// [`Transport`] backed by a reqwest client with a fixed request timeout.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    records_url: Url,
    health_url: Url,
    include_delivery_id: bool,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base = parse_base_url(base_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            records_url: base
                .join(BROWSING_DATA_PATH)
                .with_context(|| format!("invalid records endpoint under {base}"))?,
            health_url: base
                .join(HEALTH_PATH)
                .with_context(|| format!("invalid health endpoint under {base}"))?,
            include_delivery_id: false,
        })
    }

    /// Send the local `deliveryId` with each record so a cooperating backend
    /// can drop duplicates.
    pub fn with_delivery_id(mut self, include: bool) -> Self {
        self.include_delivery_id = include;
        self
    }

    pub fn records_url(&self) -> &Url {
        &self.records_url
    }

    pub fn health_url(&self) -> &Url {
        &self.health_url
    }
}

/// Parse the backend base URL, making sure it ends with `/` so that
/// `Url::join` appends instead of replacing the last path segment.
fn parse_base_url(base_url: &str) -> Result<Url> {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("server URL is empty"));
    }

    let normalized = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };

    let url = Url::parse(&normalized).with_context(|| format!("invalid server URL '{trimmed}'"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(anyhow!("unsupported server URL scheme '{other}'")),
    }
}

async fn error_body(response: reqwest::Response) -> String {
    match response.text().await {
        Ok(text) => text.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        Err(_) => String::new(),
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, record: &QueuedRecord) -> Result<Acknowledgement, DeliveryError> {
        let response = self
            .client
            .post(self.records_url.clone())
            .json(&record.payload(self.include_delivery_id))
            .send()
            .await
            .map_err(DeliveryError::from)?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            log_warn!(
                "delivery {} rejected with {}: {}",
                record.delivery_id,
                status,
                body
            );
            return Err(DeliveryError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(DeliveryError::from)?;
        let ack: Acknowledgement = serde_json::from_slice(&bytes)
            .map_err(|err| DeliveryError::MalformedResponse(err.to_string()))?;

        log_debug!(
            "delivery {} acknowledged (id={:?})",
            record.delivery_id,
            ack.id
        );
        Ok(ack)
    }

    async fn probe(&self) -> Result<(), DeliveryError> {
        let response = self
            .client
            .get(self.health_url.clone())
            .send()
            .await
            .map_err(DeliveryError::from)?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(DeliveryError::Http {
                status: status.as_u16(),
                body: error_body(response).await,
            })
        }
    }
}

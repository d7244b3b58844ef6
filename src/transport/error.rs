//! Delivery failure types.
//!
//! The worker treats every failure the same way (requeue), but the kind is
//! kept so metrics and logs can tell an outage from a misbehaving backend.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    Network,
    Http,
    MalformedResponse,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Network => "network",
            ErrorKind::Http => "http",
            ErrorKind::MalformedResponse => "malformed_response",
        }
    }
}

#[derive(Error, Debug)]
pub enum DeliveryError {
    /// The request never completed (connect failure, timeout, reset).
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Success status, but the acknowledgment body did not parse.
    #[error("malformed acknowledgment: {0}")]
    MalformedResponse(String),
}

impl DeliveryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DeliveryError::Network(_) => ErrorKind::Network,
            DeliveryError::Http { .. } => ErrorKind::Http,
            DeliveryError::MalformedResponse(_) => ErrorKind::MalformedResponse,
        }
    }
}

impl From<reqwest::Error> for DeliveryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DeliveryError::MalformedResponse(err.to_string())
        } else if let Some(status) = err.status() {
            DeliveryError::Http {
                status: status.as_u16(),
                body: String::new(),
            }
        } else {
            DeliveryError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_from_variants() {
        assert_eq!(DeliveryError::Network("refused".into()).kind(), ErrorKind::Network);
        assert_eq!(
            DeliveryError::Http {
                status: 503,
                body: "busy".into()
            }
            .kind(),
            ErrorKind::Http
        );
        assert_eq!(
            DeliveryError::MalformedResponse("eof".into()).kind(),
            ErrorKind::MalformedResponse
        );
    }

    #[test]
    fn http_error_display_includes_status() {
        let err = DeliveryError::Http {
            status: 422,
            body: "userId required".into(),
        };
        assert_eq!(err.to_string(), "HTTP 422: userId required");
    }
}

//! pagepulse: per-page browsing activity tracking with buffered delivery.
//!
//! A [`PageActivityTracker`] turns one page view's scroll and focus events
//! into a [`PageVisitRecord`]. Records are handed to a [`DeliveryService`],
//! which buffers them and delivers them to the backend with at-least-once
//! semantics, requeueing anything that fails.
//!
//! ```ignore
//! use std::sync::Arc;
//! use pagepulse::{DeliveryService, PageActivityTracker, PageEvent, PageInfo, SystemClock};
//!
//! let service = DeliveryService::from_settings(&Default::default())?;
//! let record = PageActivityTracker::observe(
//!     PageInfo::new("https://example.com/", "Example"),
//!     Arc::new(SystemClock),
//!     events,
//! );
//! service.enqueue(record, Some(user_id)).await;
//! ```

pub mod clock;
pub mod delivery;
pub mod metrics;
pub mod models;
pub mod settings;
pub mod tracking;
pub mod transport;
pub mod utils;

pub use clock::{Clock, ManualClock, SystemClock};
pub use delivery::{
    DeadLetter, DeadLetterQueue, DeliveryQueue, DeliveryService, DeliveryWorker, RetryPolicy,
};
pub use metrics::{FlushReport, MetricsSnapshot};
pub use models::{PageInfo, PageVisitRecord, QueuedRecord};
pub use settings::{DeliverySettings, SettingsStore};
pub use tracking::{ActivityState, PageActivityTracker, PageEvent, ScrollGeometry};
pub use transport::{Acknowledgement, DeliveryError, ErrorKind, HttpTransport, Transport};
pub use utils::init_logging;

//! Buffered, retrying delivery of finalized page visits.
//!
//! - `queue` - ordered buffer of undelivered records
//! - `worker` - serialized flush through a `Transport`
//! - `controller` - service lifecycle and the periodic flush task
//! - `policy` / `dead_letter` - optional retry bounds and where exhausted
//!   records end up

pub mod controller;
pub mod dead_letter;
pub mod policy;
pub mod queue;
pub mod worker;

pub use controller::DeliveryService;
pub use dead_letter::{DeadLetter, DeadLetterQueue};
pub use policy::RetryPolicy;
pub use queue::DeliveryQueue;
pub use worker::DeliveryWorker;

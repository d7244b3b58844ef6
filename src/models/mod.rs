mod queued;
mod visit;

pub use queued::{DeliveryPayload, QueuedRecord};
pub use visit::{PageInfo, PageVisitRecord};

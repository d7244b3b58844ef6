pub mod events;
pub mod state;
pub mod tracker;

pub use events::PageEvent;
pub use state::{ActivitySignals, ActivityState, ScrollGeometry};
pub use tracker::PageActivityTracker;

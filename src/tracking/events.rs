use serde::{Deserialize, Serialize};

use super::state::ScrollGeometry;

/// Browser signal delivered to a page tracker by the host environment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PageEvent {
    Scroll(ScrollGeometry),
    Focus,
    Blur,
    /// Page teardown (unload or navigation). Ends the tracker's lifetime.
    Unload,
}

impl PageEvent {
    pub fn scroll(scroll_top: f64, viewport_height: f64, document_height: f64) -> Self {
        PageEvent::Scroll(ScrollGeometry::new(
            scroll_top,
            viewport_height,
            document_height,
        ))
    }

    pub fn is_teardown(&self) -> bool {
        matches!(self, PageEvent::Unload)
    }
}

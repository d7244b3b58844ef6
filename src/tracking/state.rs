use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ActivityState {
    #[default]
    Active,
    Inactive,
}

/// Viewport geometry reported with a scroll event, in CSS pixels.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScrollGeometry {
    pub scroll_top: f64,
    pub viewport_height: f64,
    pub document_height: f64,
}

impl ScrollGeometry {
    pub fn new(scroll_top: f64, viewport_height: f64, document_height: f64) -> Self {
        Self {
            scroll_top,
            viewport_height,
            document_height,
        }
    }

    /// Percentage of the document above the bottom edge of the viewport.
    ///
    /// Degenerate geometry (empty, negative or non-finite document height)
    /// yields 0. Overscroll is clamped to 100.
    pub fn depth_percent(&self) -> u32 {
        if !self.document_height.is_finite() || self.document_height <= 0.0 {
            return 0;
        }

        let ratio = (self.scroll_top + self.viewport_height) / self.document_height;
        if !ratio.is_finite() {
            return 0;
        }

        // f64::round rounds half away from zero, which matches half-up for
        // the non-negative values that survive the clamp.
        (ratio * 100.0).round().clamp(0.0, 100.0) as u32
    }
}

/// Mutable signals accumulated over one page view.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySignals {
    pub state: ActivityState,
    pub scroll_depth: u32,
    pub max_scroll_depth: u32,
}

impl ActivitySignals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.state == ActivityState::Active
    }

    pub fn focus(&mut self) {
        self.state = ActivityState::Active;
    }

    pub fn blur(&mut self) {
        self.state = ActivityState::Inactive;
    }

    pub fn scroll(&mut self, geometry: &ScrollGeometry) {
        self.scroll_depth = geometry.depth_percent();
        self.max_scroll_depth = self.max_scroll_depth.max(self.scroll_depth);
    }
}

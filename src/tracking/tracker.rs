use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::clock::Clock;
use crate::models::{PageInfo, PageVisitRecord};

use super::events::PageEvent;
use super::state::{ActivitySignals, ScrollGeometry};

const ENABLE_LOGS: bool = true;

use crate::log_debug;

/// Observes a single page view and turns its browser signals into one
/// [`PageVisitRecord`].
///
/// One tracker per page load. [`finalize`](Self::finalize) consumes it, so a
/// torn-down page cannot receive further events.
pub struct PageActivityTracker {
    page: PageInfo,
    clock: Arc<dyn Clock>,
    started_at: DateTime<Utc>,
    signals: ActivitySignals,
}

impl PageActivityTracker {
    pub fn new(page: PageInfo, clock: Arc<dyn Clock>) -> Self {
        let started_at = clock.now();
        log_debug!("tracking page {} from {}", page.url, started_at);

        Self {
            page,
            clock,
            started_at,
            signals: ActivitySignals::new(),
        }
    }

    /// Track a page from a finite stream of events.
    ///
    /// Events are applied until [`PageEvent::Unload`]; anything after it is
    /// left unconsumed. A stream that ends without an unload still finalizes.
    pub fn observe<I>(page: PageInfo, clock: Arc<dyn Clock>, events: I) -> PageVisitRecord
    where
        I: IntoIterator<Item = PageEvent>,
    {
        let mut tracker = Self::new(page, clock);
        for event in events {
            if tracker.apply(event) {
                break;
            }
        }
        tracker.finalize()
    }

    /// Apply one event. Returns `true` when the event is the teardown signal.
    pub fn apply(&mut self, event: PageEvent) -> bool {
        match event {
            PageEvent::Scroll(geometry) => self.record_scroll(&geometry),
            PageEvent::Focus => self.record_focus(),
            PageEvent::Blur => self.record_blur(),
            PageEvent::Unload => return true,
        }
        false
    }

    pub fn record_scroll(&mut self, geometry: &ScrollGeometry) {
        self.signals.scroll(geometry);
    }

    pub fn record_focus(&mut self) {
        self.signals.focus();
    }

    pub fn record_blur(&mut self) {
        self.signals.blur();
    }

    pub fn page(&self) -> &PageInfo {
        &self.page
    }

    pub fn signals(&self) -> &ActivitySignals {
        &self.signals
    }

    pub fn max_scroll_depth(&self) -> u32 {
        self.signals.max_scroll_depth
    }

    /// Whole seconds since the tracker was created, rounded half-up.
    pub fn time_spent_secs(&self) -> u64 {
        let elapsed_ms = (self.clock.now() - self.started_at).num_milliseconds();
        if elapsed_ms <= 0 {
            return 0;
        }
        (elapsed_ms as u64 + 500) / 1000
    }

    pub fn finalize(self) -> PageVisitRecord {
        let time_spent = self.time_spent_secs();
        let record = PageVisitRecord {
            domain: self.page.domain(),
            url: self.page.url,
            title: self.page.title,
            timestamp: self.clock.now(),
            time_spent,
            max_scroll_depth: self.signals.max_scroll_depth,
            is_active: self.signals.is_active(),
        };

        log_debug!(
            "finalized {} after {}s (scroll {}%, active {})",
            record.url,
            record.time_spent,
            record.max_scroll_depth,
            record.is_active
        );

        record
    }
}

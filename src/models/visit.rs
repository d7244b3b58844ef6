use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Static description of the page a tracker is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub url: String,
    pub title: String,
}

impl PageInfo {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
        }
    }

    /// Host name of the page URL, or an empty string for host-less or
    /// unparsable URLs.
    pub fn domain(&self) -> String {
        reqwest::Url::parse(&self.url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_owned))
            .unwrap_or_default()
    }
}

/// Behavioral summary of a single page view, produced once at teardown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageVisitRecord {
    pub url: String,
    pub domain: String,
    pub title: String,
    pub timestamp: DateTime<Utc>,
    /// Whole seconds between tracker creation and finalization.
    pub time_spent: u64,
    pub max_scroll_depth: u32,
    pub is_active: bool,
}

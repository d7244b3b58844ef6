use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use crate::delivery::RetryPolicy;

const ENABLE_LOGS: bool = true;

use crate::log_warn;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";
pub const SERVER_URL_ENV: &str = "PAGEPULSE_SERVER_URL";
pub const DEBUG_ENV: &str = "PAGEPULSE_DEBUG";
const DEBUG_FLUSH_INTERVAL_SECS: u64 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeliverySettings {
    pub server_url: String,
    pub request_timeout_ms: u64,
    pub flush_interval_secs: u64,
    pub retry: RetryPolicy,
    pub dead_letter_capacity: usize,
    pub include_delivery_id: bool,
}

impl Default for DeliverySettings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.into(),
            request_timeout_ms: 10_000,
            flush_interval_secs: 30,
            retry: RetryPolicy::unbounded(),
            dead_letter_capacity: 1_000,
            include_delivery_id: false,
        }
    }
}

impl DeliverySettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.max(1))
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs.max(1))
    }

    /// Apply `PAGEPULSE_SERVER_URL` and `PAGEPULSE_DEBUG`.
    pub fn with_env_overrides(self) -> Self {
        let server_url = std::env::var(SERVER_URL_ENV).ok();
        let debug_mode = std::env::var(DEBUG_ENV)
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        self.with_overrides(server_url, debug_mode)
    }

    fn with_overrides(mut self, server_url: Option<String>, debug_mode: bool) -> Self {
        if let Some(url) = server_url.filter(|url| !url.trim().is_empty()) {
            self.server_url = url;
        }
        if debug_mode {
            self.flush_interval_secs = DEBUG_FLUSH_INTERVAL_SECS;
        }
        self
    }
}

/// JSON-file backed delivery settings.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<DeliverySettings>,
}

impl SettingsStore {
    /// Load settings from `path`. A missing or unreadable-as-JSON file falls
    /// back to defaults; an I/O error on an existing file is returned.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log_warn!(
                    "ignoring malformed settings in {}: {err}",
                    path.display()
                );
                DeliverySettings::default()
            })
        } else {
            DeliverySettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, DeliverySettings> {
        match self.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, DeliverySettings> {
        match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Stored settings without environment overrides.
    pub fn stored(&self) -> DeliverySettings {
        self.read().clone()
    }

    /// Settings to run with: stored values plus environment overrides.
    pub fn effective(&self) -> DeliverySettings {
        self.stored().with_env_overrides()
    }

    pub fn update(&self, settings: DeliverySettings) -> Result<()> {
        let mut guard = self.write();
        self.persist(&settings)?;
        *guard = settings;
        Ok(())
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {}", self.path.display()))?;
        let data: DeliverySettings = serde_json::from_str(&contents)
            .with_context(|| format!("Malformed settings in {}", self.path.display()))?;
        *self.write() = data;
        Ok(())
    }

    fn persist(&self, data: &DeliverySettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create settings directory {}", parent.display())
            })?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

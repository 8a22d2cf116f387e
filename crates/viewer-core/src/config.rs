//! Engine configuration.
//!
//! Every delay and threshold the coordinator uses lives here so hosts can tune
//! them. Configuration can be loaded from a JSON file, environment variables,
//! or built programmatically.

use crate::collaborators::ScrollAlign;
use crate::error::ConfigError;
use crate::events::SourceId;
use crate::window::DEFAULT_WINDOW_RADIUS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

const ENV_WINDOW_RADIUS: &str = "VIEWER_SYNC_WINDOW_RADIUS";
const ENV_FILE_SWITCH_THRESHOLD: &str = "VIEWER_SYNC_FILE_SWITCH_THRESHOLD";
const ENV_DEBOUNCE_MS: &str = "VIEWER_SYNC_DEBOUNCE_MS";
const ENV_GUARD_RELEASE_MS: &str = "VIEWER_SYNC_GUARD_RELEASE_MS";
const ENV_FILE_SWITCH_GRACE_MS: &str = "VIEWER_SYNC_FILE_SWITCH_GRACE_MS";
const ENV_NAVIGATION_TIMEOUT_MS: &str = "VIEWER_SYNC_NAVIGATION_TIMEOUT_MS";
const ENV_SCROLL_IDLE_MS: &str = "VIEWER_SYNC_SCROLL_IDLE_MS";
const ENV_SCROLL_ALIGN: &str = "VIEWER_SYNC_SCROLL_ALIGN";
const ENV_SOURCE_ID: &str = "VIEWER_SYNC_SOURCE_ID";

/// Tunables for the viewport coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Pages on each side of the center page kept visible.
    pub window_radius: u32,
    /// Visibility ratio another document must exceed to become current.
    pub file_switch_threshold: f32,
    /// Window during which an echo of our own dispatch is dropped.
    pub debounce_window_ms: u64,
    /// Delay between a dispatch and releasing the event guard.
    pub guard_release_delay_ms: u64,
    /// Workspace-wide scroll suppression after the current document changes.
    pub file_switch_grace_ms: u64,
    /// Upper bound on waiting for a smooth scroll to report completion.
    pub navigation_timeout_ms: u64,
    /// Quiet period after which scroll tracking returns to idle.
    pub scroll_idle_ms: u64,
    /// Placement of the target page when scrolling to it.
    pub scroll_align: ScrollAlign,
    /// Identity stamped on every event this coordinator broadcasts.
    pub source_id: SourceId,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            window_radius: DEFAULT_WINDOW_RADIUS,
            file_switch_threshold: 0.6,
            debounce_window_ms: 100,
            guard_release_delay_ms: 50,
            file_switch_grace_ms: 200,
            navigation_timeout_ms: 300,
            scroll_idle_ms: 80,
            scroll_align: ScrollAlign::Start,
            source_id: SourceId::generate(),
        }
    }
}

impl SyncConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window_radius(mut self, radius: u32) -> Self {
        self.window_radius = radius;
        self
    }

    pub fn with_file_switch_threshold(mut self, threshold: f32) -> Self {
        self.file_switch_threshold = threshold;
        self
    }

    pub fn with_debounce_window(mut self, window: Duration) -> Self {
        self.debounce_window_ms = window.as_millis() as u64;
        self
    }

    pub fn with_guard_release_delay(mut self, delay: Duration) -> Self {
        self.guard_release_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_file_switch_grace(mut self, grace: Duration) -> Self {
        self.file_switch_grace_ms = grace.as_millis() as u64;
        self
    }

    pub fn with_navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_scroll_idle(mut self, idle: Duration) -> Self {
        self.scroll_idle_ms = idle.as_millis() as u64;
        self
    }

    pub fn with_scroll_align(mut self, align: ScrollAlign) -> Self {
        self.scroll_align = align;
        self
    }

    pub fn with_source_id(mut self, source_id: SourceId) -> Self {
        self.source_id = source_id;
        self
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_window_ms)
    }

    pub fn guard_release_delay(&self) -> Duration {
        Duration::from_millis(self.guard_release_delay_ms)
    }

    pub fn file_switch_grace(&self) -> Duration {
        Duration::from_millis(self.file_switch_grace_ms)
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn scroll_idle(&self) -> Duration {
        Duration::from_millis(self.scroll_idle_ms)
    }

    /// Reject values the coordinator cannot work with.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] for a threshold outside `(0, 1]`,
    /// a zero debounce window, or an empty source id.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.file_switch_threshold > 0.0 && self.file_switch_threshold <= 1.0) {
            return Err(ConfigError::invalid(
                "file_switch_threshold",
                format!("{} is outside (0, 1]", self.file_switch_threshold),
            ));
        }
        if self.debounce_window_ms == 0 {
            return Err(ConfigError::invalid("debounce_window_ms", "must be positive"));
        }
        if self.source_id.as_str().is_empty() {
            return Err(ConfigError::invalid("source_id", "must not be empty"));
        }
        Ok(())
    }

    /// Loads configuration from environment variables.
    ///
    /// Environment variables (all optional):
    /// - `VIEWER_SYNC_WINDOW_RADIUS`
    /// - `VIEWER_SYNC_FILE_SWITCH_THRESHOLD`
    /// - `VIEWER_SYNC_DEBOUNCE_MS`
    /// - `VIEWER_SYNC_GUARD_RELEASE_MS`
    /// - `VIEWER_SYNC_FILE_SWITCH_GRACE_MS`
    /// - `VIEWER_SYNC_NAVIGATION_TIMEOUT_MS`
    /// - `VIEWER_SYNC_SCROLL_IDLE_MS`
    /// - `VIEWER_SYNC_SCROLL_ALIGN` (`start`, `center`, `end` or `nearest`)
    /// - `VIEWER_SYNC_SOURCE_ID`
    ///
    /// # Errors
    /// Returns an error if any variable holds an unparsable or invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`SyncConfig::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = parse_var(&lookup, ENV_WINDOW_RADIUS)? {
            config.window_radius = value;
        }
        if let Some(value) = parse_var(&lookup, ENV_FILE_SWITCH_THRESHOLD)? {
            config.file_switch_threshold = value;
        }
        if let Some(value) = parse_var(&lookup, ENV_DEBOUNCE_MS)? {
            config.debounce_window_ms = value;
        }
        if let Some(value) = parse_var(&lookup, ENV_GUARD_RELEASE_MS)? {
            config.guard_release_delay_ms = value;
        }
        if let Some(value) = parse_var(&lookup, ENV_FILE_SWITCH_GRACE_MS)? {
            config.file_switch_grace_ms = value;
        }
        if let Some(value) = parse_var(&lookup, ENV_NAVIGATION_TIMEOUT_MS)? {
            config.navigation_timeout_ms = value;
        }
        if let Some(value) = parse_var(&lookup, ENV_SCROLL_IDLE_MS)? {
            config.scroll_idle_ms = value;
        }
        if let Some(value) = parse_var(&lookup, ENV_SCROLL_ALIGN)? {
            config.scroll_align = value;
        }
        if let Some(value) = lookup(ENV_SOURCE_ID) {
            config.source_id = SourceId::new(value.trim());
        }

        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a JSON file. Missing keys take defaults.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves configuration as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, name: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|err| ConfigError::invalid(name, err.to_string())),
        None => Ok(None),
    }
}

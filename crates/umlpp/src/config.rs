//! Configuration types for the umlpp completion engine.
//!
//! All types implement [`serde::Deserialize`] with every field defaulted, so
//! a partial configuration file only needs to name what it changes.
//!
//! # Overview
//!
//! - [`EngineConfig`] - Top-level engine configuration.
//! - [`FetchConfig`] - Limits applied to every external document fetch.
//! - [`StdlibConfig`] - How `<module>` includes are matched against the
//!   standard library index.
//!
//! # Example
//!
//! ```
//! # use umlpp::config::EngineConfig;
//! let config = EngineConfig::default();
//! assert_eq!(config.fetch().timeout_ms(), 10_000);
//! assert_eq!(config.stdlib().extension(), ".puml");
//! ```

use std::time::Duration;

use serde::Deserialize;

const DEFAULT_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_EXTENSION: &str = ".puml";

/// Top-level engine configuration combining fetch and stdlib settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    /// Fetch configuration section.
    #[serde(default)]
    fetch: FetchConfig,

    /// Standard library configuration section.
    #[serde(default)]
    stdlib: StdlibConfig,
}

impl EngineConfig {
    /// Creates a new [`EngineConfig`] from its sections.
    pub fn new(fetch: FetchConfig, stdlib: StdlibConfig) -> Self {
        Self { fetch, stdlib }
    }

    /// Returns the fetch configuration.
    pub fn fetch(&self) -> &FetchConfig {
        &self.fetch
    }

    /// Returns the standard library configuration.
    pub fn stdlib(&self) -> &StdlibConfig {
        &self.stdlib
    }
}

/// Limits applied to every call into the document source.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Timeout in milliseconds. `0` disables the timeout.
    #[serde(default = "default_timeout_ms")]
    timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl FetchConfig {
    pub fn new(timeout_ms: u64) -> Self {
        Self { timeout_ms }
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// The fetch timeout, or `None` when disabled.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

/// Standard library lookup settings.
#[derive(Debug, Clone, Deserialize)]
pub struct StdlibConfig {
    /// Extension tried after the bare path when matching `<module>` includes.
    #[serde(default = "default_extension")]
    extension: String,
}

fn default_extension() -> String {
    DEFAULT_EXTENSION.to_string()
}

impl Default for StdlibConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
        }
    }
}

impl StdlibConfig {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }
}

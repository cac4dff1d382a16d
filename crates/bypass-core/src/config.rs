//! Configuration types for the bypass reconciler
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::traits::IpFamily;

/// Main reconciler configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BypassConfig {
    /// Domain store configuration
    #[serde(default)]
    pub domain_store: DomainStoreConfig,

    /// Resolver configuration
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Settings applier configuration
    #[serde(default)]
    pub applier: ApplierConfig,

    /// Engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl BypassConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.domain_store.validate()?;
        self.applier.validate()?;
        self.engine.validate()?;
        Ok(())
    }
}

/// Domain store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainStoreConfig {
    /// Newline-separated text file
    File {
        /// Path to the whitelist file
        path: PathBuf,
    },

    /// In-memory store (not persistent)
    Memory,
}

impl DomainStoreConfig {
    /// Validate the domain store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            DomainStoreConfig::File { path } if path.as_os_str().is_empty() => Err(
                crate::Error::config("Domain whitelist path cannot be empty"),
            ),
            _ => Ok(()),
        }
    }
}

impl Default for DomainStoreConfig {
    fn default() -> Self {
        DomainStoreConfig::File {
            path: PathBuf::from(DEFAULT_DOMAINS_FILE),
        }
    }
}

/// Default whitelist file name
pub const DEFAULT_DOMAINS_FILE: &str = "domain_whitelist.txt";

/// Resolver configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Address family to keep from resolution results
    #[serde(default)]
    pub family: IpFamily,
}

/// Settings applier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ApplierConfig {
    /// Private Internet Access command-line client
    Piactl {
        /// Path or name of the `piactl` binary
        #[serde(default = "default_piactl_binary")]
        binary: String,
        /// Log the payload instead of applying it
        #[serde(default)]
        dry_run: bool,
    },
}

impl ApplierConfig {
    /// Validate the applier configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ApplierConfig::Piactl { binary, .. } => {
                if binary.is_empty() {
                    return Err(crate::Error::config("piactl binary cannot be empty"));
                }
                if binary.chars().any(char::is_whitespace) {
                    return Err(crate::Error::config(format!(
                        "piactl binary must not contain whitespace. Got: '{}'",
                        binary
                    )));
                }
                Ok(())
            }
        }
    }

    /// Get the applier type name
    pub fn type_name(&self) -> &str {
        match self {
            ApplierConfig::Piactl { .. } => "piactl",
        }
    }
}

impl Default for ApplierConfig {
    fn default() -> Self {
        ApplierConfig::Piactl {
            binary: default_piactl_binary(),
            dry_run: false,
        }
    }
}

fn default_piactl_binary() -> String {
    "piactl".to_string()
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seconds between the end of one tick and the start of the next
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Window after which the cached bypass set is force-cleared and rebuilt
    ///
    /// Bounds how long an address that silently stopped resolving can stay
    /// bypassed.
    #[serde(default = "default_clear_window_secs")]
    pub clear_window_secs: u64,

    /// Capacity of the engine event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.poll_interval_secs == 0 {
            return Err(crate::Error::config("Poll interval must be > 0 seconds"));
        }
        if self.clear_window_secs == 0 {
            return Err(crate::Error::config("Clear window must be > 0 seconds"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }

    /// Number of ticks between forced clears of the bypass set
    ///
    /// `ceil(clear_window_secs / poll_interval_secs)`, never less than 1.
    pub fn reset_counter_initial(&self) -> u64 {
        self.clear_window_secs
            .div_ceil(self.poll_interval_secs.max(1))
            .max(1)
    }

    /// Set the poll interval
    pub fn with_poll_interval_secs(mut self, secs: u64) -> Self {
        self.poll_interval_secs = secs;
        self
    }

    /// Set the clear window
    pub fn with_clear_window_secs(mut self, secs: u64) -> Self {
        self.clear_window_secs = secs;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            clear_window_secs: default_clear_window_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_poll_interval_secs() -> u64 {
    15
}

fn default_clear_window_secs() -> u64 {
    15 * 60
}

fn default_event_channel_capacity() -> usize {
    256
}

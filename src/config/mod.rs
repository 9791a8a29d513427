//! Configuration module
//!
//! This module handles application configuration, including loading from
//! different sources (files, environment variables, command line arguments)
//! and validating the configuration.

// Submodules
pub mod defaults;
mod loader;
mod validator;

// Re-export types and traits
pub use self::defaults::{DEFAULT_CONFIG_FILE, ENV_PREFIX};
pub use self::loader::{ConfigLoader, ConfigOverrides};
pub use self::validator::validate_config;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::common::{ProxyError, Result};
use crate::protocol::FramingMode;

/// One backend database endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendConfig {
    /// Hostname or IP address, resolved at connect time
    pub host: String,
    /// TCP port
    pub port: u16,
}

impl fmt::Display for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Proxy configuration
///
/// Contains all configuration options needed for the proxy server.
/// Supports loading from a JSON file, environment variables and
/// command-line arguments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProxyConfig {
    // --- Network settings ---

    /// Listen host for the proxy server
    #[serde(default = "defaults::host")]
    pub host: String,

    /// Listen port for the proxy server
    #[serde(default = "defaults::port")]
    pub port: u16,

    /// Ordered backend list. Only the first entry is ever connected to;
    /// the rest are accepted for forward compatibility.
    #[serde(default = "defaults::backends")]
    pub backends: Vec<BackendConfig>,

    // --- Session settings ---

    /// Session timeout. A session ends after `ceil(timeout / 2)`
    /// consecutive idle poll rounds.
    #[serde(default = "defaults::timeout")]
    pub timeout: u64,

    /// Poll timeout of one forwarding round, in milliseconds
    #[serde(default = "defaults::poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Seconds allowed for one backend connect attempt
    #[serde(default = "defaults::connect_timeout")]
    pub connect_timeout: u64,

    /// Read each payload until its declared length instead of with a single read
    #[serde(default)]
    pub strict_framing: bool,

    // --- General settings ---

    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "defaults::log_level")]
    pub log_level: String,

    /// Append log lines to this file instead of stderr
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Default for ProxyConfig {
    /// Create a default configuration using centralized defaults
    #[inline]
    fn default() -> Self {
        Self {
            host: defaults::host(),
            port: defaults::port(),
            backends: defaults::backends(),
            timeout: defaults::timeout(),
            poll_interval_ms: defaults::poll_interval_ms(),
            connect_timeout: defaults::connect_timeout(),
            strict_framing: false,
            log_level: defaults::log_level(),
            log_file: None,
        }
    }
}

impl ProxyConfig {
    /// Listen address in `host:port` form, bracketing IPv6 literals
    pub fn listen_addr(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// The backend every new session connects to first
    pub fn primary_backend(&self) -> Result<&BackendConfig> {
        self.backends
            .first()
            .ok_or_else(|| ProxyError::Config("No backend configured".to_string()))
    }

    /// Number of consecutive idle poll rounds before a session ends
    #[inline]
    pub fn idle_round_limit(&self) -> u64 {
        self.timeout.div_ceil(2).max(1)
    }

    /// Poll timeout of one forwarding round
    #[inline]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Time allowed for one backend connect attempt
    #[inline]
    pub fn backend_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    /// Payload read strategy for the packet framer
    #[inline]
    pub fn framing_mode(&self) -> FramingMode {
        if self.strict_framing {
            FramingMode::Exact
        } else {
            FramingMode::SingleRead
        }
    }
}

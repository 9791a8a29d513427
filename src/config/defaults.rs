//! Default configuration values
//!
//! This module provides default values for configuration options.
//! It is the single source of truth for defaults.

use super::BackendConfig;

/// Environment variable prefix for all configuration options
pub const ENV_PREFIX: &str = "TNS_PROXY_";

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Default listen host
pub const HOST_STR: &str = "0.0.0.0";

/// Default backend host
pub const BACKEND_HOST_STR: &str = "127.0.0.1";

/// Default log level as string
pub const LOG_LEVEL_STR: &str = "info";

/// Default listen host
pub fn host() -> String {
    HOST_STR.to_string()
}

/// Default listen port
pub fn port() -> u16 {
    1521
}

/// Default session timeout, in the same units as the poll interval budget
pub fn timeout() -> u64 {
    30
}

/// Default backend list
pub fn backends() -> Vec<BackendConfig> {
    vec![BackendConfig {
        host: BACKEND_HOST_STR.to_string(),
        port: 1522,
    }]
}

/// Default poll interval (2 seconds)
pub fn poll_interval_ms() -> u64 {
    2000
}

/// Default backend connect timeout in seconds
pub fn connect_timeout() -> u64 {
    30
}

/// Default log level
pub fn log_level() -> String {
    LOG_LEVEL_STR.to_string()
}

//! Configuration validator
//!
//! This module provides functionality for validating configuration.

use log::warn;

use crate::common::{ProxyError, Result};
use crate::config::ProxyConfig;

/// Validate the configuration
///
/// Unknown log levels are not fatal; they are reported and the logger
/// falls back to its own default.
pub fn validate_config(config: &ProxyConfig) -> Result<()> {
    validate_backends(config)?;
    validate_session_settings(config)?;
    validate_general_settings(config);

    Ok(())
}

/// Validate backend settings
fn validate_backends(config: &ProxyConfig) -> Result<()> {
    if config.backends.is_empty() {
        return Err(ProxyError::Config("At least one backend must be configured".to_string()));
    }

    for backend in &config.backends {
        if backend.host.trim().is_empty() {
            return Err(ProxyError::Config("Backend host must not be empty".to_string()));
        }
        if backend.port == 0 {
            return Err(ProxyError::Config(format!("Backend {} has port 0", backend.host)));
        }
    }

    if config.backends.len() > 1 {
        warn!(
            "{} backends configured; only the first ({}) is used",
            config.backends.len(),
            config.backends[0]
        );
    }

    Ok(())
}

/// Validate session settings
fn validate_session_settings(config: &ProxyConfig) -> Result<()> {
    if config.timeout == 0 {
        return Err(ProxyError::Config("Timeout must be greater than 0".to_string()));
    }

    if config.poll_interval_ms == 0 {
        return Err(ProxyError::Config("Poll interval must be greater than 0".to_string()));
    }

    if config.connect_timeout == 0 {
        return Err(ProxyError::Config("Connect timeout must be greater than 0".to_string()));
    }

    Ok(())
}

/// Validate general settings
fn validate_general_settings(config: &ProxyConfig) {
    match config.log_level.as_str() {
        "error" | "warn" | "info" | "debug" | "trace" => {}
        level => {
            warn!("Invalid log level: {}. Using default: info", level);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ProxyConfig::default()).is_ok());
    }

    #[test]
    fn test_rejects_missing_backends() {
        let config = ProxyConfig { backends: Vec::new(), ..ProxyConfig::default() };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_rejects_bad_backend() {
        let config = ProxyConfig {
            backends: vec![BackendConfig { host: " ".to_string(), port: 1521 }],
            ..ProxyConfig::default()
        };
        assert!(validate_config(&config).is_err());

        let config = ProxyConfig {
            backends: vec![BackendConfig { host: "db".to_string(), port: 0 }],
            ..ProxyConfig::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_rejects_zero_durations() {
        let config = ProxyConfig { timeout: 0, ..ProxyConfig::default() };
        assert!(validate_config(&config).is_err());

        let config = ProxyConfig { poll_interval_ms: 0, ..ProxyConfig::default() };
        assert!(validate_config(&config).is_err());

        let config = ProxyConfig { connect_timeout: 0, ..ProxyConfig::default() };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_extra_backends_and_odd_log_level_are_allowed() {
        let config = ProxyConfig {
            backends: vec![
                BackendConfig { host: "db1".to_string(), port: 1521 },
                BackendConfig { host: "db2".to_string(), port: 1521 },
            ],
            log_level: "verbose".to_string(),
            ..ProxyConfig::default()
        };
        assert!(validate_config(&config).is_ok());
    }
}

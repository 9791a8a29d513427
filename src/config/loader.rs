//! Configuration loading functionality
//!
//! Configuration is layered with proper priority:
//! 1. Default values (lowest priority)
//! 2. Configuration file (JSON)
//! 3. Environment variables prefixed with `TNS_PROXY_`
//! 4. Command line arguments (highest priority)

use std::fs;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use log::debug;

use crate::common::{parse_host_port, ProxyError, Result};
use crate::config::{defaults, BackendConfig, ProxyConfig};

/// Trait for loading configuration from different sources
pub trait ConfigLoader {
    /// Load configuration from a JSON file only
    fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> where Self: Sized;

    /// Load defaults, then the file (if any), then environment variables
    ///
    /// An explicitly given file must exist. Without one, `config.json` in
    /// the working directory is used when present.
    fn load(config_file: Option<&Path>) -> Result<Self> where Self: Sized;
}

impl ConfigLoader for ProxyConfig {
    fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let path_display = path.display();

        let content = fs::read_to_string(path)
            .map_err(|e| ProxyError::Config(format!("Failed to read config file {}: {}", path_display, e)))?;

        serde_json::from_str(&content)
            .map_err(|e| ProxyError::Config(format!("Failed to parse JSON config file {}: {}", path_display, e)))
    }

    fn load(config_file: Option<&Path>) -> Result<Self> {
        let (path, required) = match config_file {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(defaults::DEFAULT_CONFIG_FILE), false),
        };

        if path.exists() {
            debug!("Loading configuration file {}", path.display());
        }

        let prefix = defaults::ENV_PREFIX.trim_end_matches('_');
        let layered = Config::builder()
            .add_source(File::from(path.clone()).format(FileFormat::Json).required(required))
            .add_source(Environment::with_prefix(prefix).try_parsing(true))
            .build()
            .map_err(|e| ProxyError::Config(format!("Failed to load configuration: {}", e)))?;

        layered
            .try_deserialize::<ProxyConfig>()
            .map_err(|e| ProxyError::Config(format!("Invalid configuration: {}", e)))
    }
}

/// Values given on the command line, each overriding the loaded configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub timeout: Option<u64>,
    /// `host:port` strings; when non-empty they replace the whole list
    pub backends: Vec<String>,
    pub poll_interval_ms: Option<u64>,
    pub connect_timeout: Option<u64>,
    pub strict_framing: bool,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl ProxyConfig {
    /// Apply command line overrides on top of this configuration
    pub fn apply(mut self, overrides: ConfigOverrides) -> Result<Self> {
        if let Some(host) = overrides.host {
            self.host = host;
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(timeout) = overrides.timeout {
            self.timeout = timeout;
        }
        if !overrides.backends.is_empty() {
            self.backends = overrides
                .backends
                .iter()
                .map(|addr| parse_host_port(addr).map(|(host, port)| BackendConfig { host, port }))
                .collect::<Result<Vec<_>>>()?;
        }
        if let Some(interval) = overrides.poll_interval_ms {
            self.poll_interval_ms = interval;
        }
        if let Some(connect_timeout) = overrides.connect_timeout {
            self.connect_timeout = connect_timeout;
        }
        if overrides.strict_framing {
            self.strict_framing = true;
        }
        if let Some(level) = overrides.log_level {
            self.log_level = level;
        }
        if let Some(file) = overrides.log_file {
            self.log_file = Some(file);
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_overrides() {
        let overrides = ConfigOverrides {
            port: Some(1600),
            backends: vec!["10.0.0.1:1521".to_string(), "10.0.0.2:1522".to_string()],
            strict_framing: true,
            log_level: Some("debug".to_string()),
            ..ConfigOverrides::default()
        };

        let config = ProxyConfig::default().apply(overrides).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 1600);
        assert_eq!(config.backends.len(), 2);
        assert_eq!(config.backends[1], BackendConfig { host: "10.0.0.2".to_string(), port: 1522 });
        assert!(config.strict_framing);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.timeout, 30);
    }

    #[test]
    fn test_empty_overrides_change_nothing() {
        let config = ProxyConfig::default().apply(ConfigOverrides::default()).unwrap();
        assert_eq!(config, ProxyConfig::default());
    }

    #[test]
    fn test_bad_backend_override() {
        let overrides = ConfigOverrides {
            backends: vec!["missing-port".to_string()],
            ..ConfigOverrides::default()
        };
        assert!(ProxyConfig::default().apply(overrides).is_err());
    }
}

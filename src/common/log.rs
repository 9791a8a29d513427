//! Logging utilities
//!
//! Initializes the `env_logger` backend behind the `log` facade.

use std::fs::OpenOptions;
use std::path::Path;

use super::error::{ProxyError, Result};

/// Initialize the logging system
///
/// `RUST_LOG` takes precedence over `level`. When `log_file` is given, log
/// lines are appended to it instead of going to stderr.
///
/// # Parameters
///
/// * `level` - Log level
/// * `log_file` - Optional file to append log lines to
pub fn init_logger(level: &str, log_file: Option<&Path>) -> Result<()> {
    let env = env_logger::Env::default()
        .filter_or("RUST_LOG", level);

    let mut builder = env_logger::Builder::from_env(env);

    if let Some(path) = log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| ProxyError::Config(format!(
                "Failed to open log file {}: {}", path.display(), e
            )))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder
        .try_init()
        .map_err(|e| ProxyError::Other(format!("Failed to initialize logger: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logger_with_file() {
        // The global logger can only be installed once per process, so a
        // second call must fail cleanly rather than panic.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proxy.log");

        let _ = init_logger("debug", Some(&path));
        let second = init_logger("debug", Some(&path));

        assert!(path.exists());
        assert!(second.is_err());
    }

    #[test]
    fn test_init_logger_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = init_logger("info", Some(dir.path()));
        assert!(matches!(result, Err(ProxyError::Config(_))));
    }
}

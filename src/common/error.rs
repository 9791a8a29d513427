//! Error handling module
//!
//! This module defines the error types and result type aliases used in the application.

use thiserror::Error;
use std::io;

use crate::protocol::Method;

/// TNS proxy error type
///
/// Every variant except `Config` is fatal to the session that raised it.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// IO error while reading or writing a packet
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Backend address could not be resolved or connected
    #[error("Failed to connect to backend {host}:{port}: {source}")]
    Connection {
        /// Backend host as configured or extracted from a redirect
        host: String,
        /// Backend port
        port: u16,
        /// Underlying resolution or connect error
        #[source]
        source: io::Error,
    },

    /// Redirect payload did not carry a usable HOST/PORT pair
    #[error("Redirect parse error: {0}")]
    RedirectParse(String),

    /// Readiness poll reported an error condition
    #[error("Poll error: {0}")]
    Poll(io::Error),

    /// Redirect handling needed the client's CONNECT packet before one was seen
    #[error("No CONNECT packet captured before {0}")]
    MissingConnect(Method),

    /// Other error
    #[error("Other error: {0}")]
    Other(String),
}

/// Result type alias
///
/// This is a `Result` type alias that uses our custom `ProxyError`.
pub type Result<T> = std::result::Result<T, ProxyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer");
        let proxy_err: ProxyError = io_err.into();

        match proxy_err {
            ProxyError::Io(_) => {}
            _ => panic!("Should convert to IO error"),
        }
    }

    #[test]
    fn test_error_display() {
        let err = ProxyError::Config("Invalid configuration".to_string());
        assert!(err.to_string().contains("Invalid configuration"));

        let err = ProxyError::Connection {
            host: "10.0.0.5".to_string(),
            port: 1522,
            source: io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
        };
        assert_eq!(
            err.to_string(),
            "Failed to connect to backend 10.0.0.5:1522: refused"
        );

        let err = ProxyError::MissingConnect(Method::Resend);
        assert_eq!(err.to_string(), "No CONNECT packet captured before RESEND");
    }
}

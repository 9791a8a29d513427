//! TNS Redirect Proxy
//!
//! A transparent proxy for the TNS database wire protocol. It forwards
//! packets between a client and a backend unchanged, except when the backend
//! redirects the client elsewhere: the proxy then reconnects to the new
//! backend itself and replays the client's original CONNECT packet, so the
//! client never notices the switch.
//!
//! # Main Features
//!
//! - Packet framing and method classification for the 14 TNS packet types
//! - Transparent handling of server-initiated redirects
//! - One independent session task per client connection
//! - Idle timeout measured in poll rounds
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tns_redirect_proxy::{Proxy, Result};
//! use tns_redirect_proxy::config::{BackendConfig, ProxyConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ProxyConfig {
//!         port: 1521,
//!         backends: vec![BackendConfig { host: "10.0.0.4".to_string(), port: 1521 }],
//!         ..ProxyConfig::default()
//!     };
//!
//!     let proxy = Proxy::new(Arc::new(config));
//!     proxy.run().await
//! }
//! ```

// Public modules
pub mod common;
pub mod config;
pub mod protocol;
pub mod proxy;

// Re-export commonly used structures and functions for convenience
pub use proxy::{Proxy, Session, SessionEnd};
pub use common::{ProxyError, Result};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

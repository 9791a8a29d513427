//! Proxy service module
//!
//! This module implements the proxy itself: the listener that accepts
//! clients, the per-client session that forwards packets and follows
//! redirects, and the connector used to reach backends.

pub mod server;
mod connector;
mod forwarder;
mod handler;
mod session;

pub use server::Proxy;
pub use connector::connect_backend;
pub use forwarder::{send_packet, Side};
pub use handler::handle_connection;
pub use session::{Session, SessionEnd};

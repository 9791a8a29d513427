//! Backend connector
//!
//! Opens connections to backend endpoints, for the initial backend of a
//! session as well as for redirect targets. Failures are never retried.

use std::io;
use std::time::Duration;

use log::debug;
use tokio::net::{lookup_host, TcpStream};
use tokio::time::timeout;

use crate::common::{ProxyError, Result};

/// Resolve `host:port` and connect to the first candidate address
///
/// # Errors
///
/// Returns `ProxyError::Connection` when resolution yields nothing, the
/// connect attempt fails, or it does not finish within `connect_timeout`.
pub async fn connect_backend(host: &str, port: u16, connect_timeout: Duration) -> Result<TcpStream> {
    let connection_error = |source: io::Error| ProxyError::Connection {
        host: host.to_string(),
        port,
        source,
    };

    let addr = lookup_host((host, port))
        .await
        .map_err(connection_error)?
        .next()
        .ok_or_else(|| connection_error(io::Error::new(
            io::ErrorKind::NotFound,
            "address resolved to no candidates",
        )))?;

    debug!("Connecting to backend {}:{} ({})", host, port, addr);

    let stream = timeout(connect_timeout, TcpStream::connect(addr))
        .await
        .map_err(|_| connection_error(io::Error::new(io::ErrorKind::TimedOut, "Connection timed out")))?
        .map_err(connection_error)?;

    // Packets are small and latency bound
    if let Err(e) = stream.set_nodelay(true) {
        debug!("Failed to set TCP_NODELAY on backend socket: {}", e);
    }

    Ok(stream)
}

//! Connection handler module
//!
//! This module handles individual client connections.

use log::{debug, error};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;

use crate::common::Result;
use crate::config::ProxyConfig;
use super::session::{Session, SessionEnd};

/// Handle a single client connection
///
/// Connects the session to the first configured backend and runs it to
/// completion. A failed initial connect drops the client immediately.
///
/// # Parameters
///
/// * `client_stream` - Client TCP stream
/// * `client_addr` - Client address, used for logging
/// * `config` - Proxy configuration
///
/// # Returns
///
/// Returns how the session ended, or the error that prevented it from starting.
pub async fn handle_connection(
    client_stream: TcpStream,
    client_addr: SocketAddr,
    config: Arc<ProxyConfig>,
) -> Result<SessionEnd> {
    if let Err(e) = client_stream.set_nodelay(true) {
        debug!("Failed to set TCP_NODELAY for {}: {}", client_addr, e);
    }

    let session = match Session::connect(client_stream, client_addr, &config).await {
        Ok(session) => session,
        Err(e) => {
            error!("Session error for {}: {}", client_addr, e);
            return Err(e);
        }
    };

    let end = session.run().await;
    debug!("Session {} ended: {:?}", client_addr, end);
    Ok(end)
}

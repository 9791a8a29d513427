//! Proxy server module
//!
//! This module implements the listener: it accepts client connections and
//! runs one proxy session per connection on its own task.

use log::{info, error, debug};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinSet;

use crate::common::{ProxyError, Result};
use crate::config::ProxyConfig;
use super::handler::handle_connection;
use super::session::SessionEnd;

/// Proxy server structure
///
/// Accepts client connections and hands each to its own session. Sessions
/// share nothing but the read-only configuration.
pub struct Proxy {
    /// Listen address for the proxy server (`host:port`)
    listen_addr: String,
    /// Proxy configuration (wrapped in Arc for efficient sharing)
    config: Arc<ProxyConfig>,
}

impl Proxy {
    /// Create a new proxy instance
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use std::sync::Arc;
    /// # use tns_redirect_proxy::Proxy;
    /// # use tns_redirect_proxy::config::ProxyConfig;
    /// let proxy = Proxy::new(Arc::new(ProxyConfig::default()));
    /// assert_eq!(proxy.listen_addr(), "0.0.0.0:1521");
    /// ```
    pub fn new(config: Arc<ProxyConfig>) -> Self {
        Self {
            listen_addr: config.listen_addr(),
            config,
        }
    }

    /// Address the proxy binds to in `run`
    pub fn listen_addr(&self) -> &str {
        &self.listen_addr
    }

    /// Start the proxy service
    ///
    /// Binds the listen address and serves until Ctrl+C.
    ///
    /// # Errors
    ///
    /// Returns an error if it cannot bind to the listen address.
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(&self.listen_addr).await
            .map_err(|e| ProxyError::Config(format!("Failed to bind {}: {}", self.listen_addr, e)))?;

        self.serve(listener, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Accept connections on `listener` until `shutdown` resolves
    ///
    /// Sessions still running at shutdown are aborted.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let local_addr = listener.local_addr()?;
        info!("Proxy service started, listening on {}", local_addr);
        if let Ok(backend) = self.config.primary_backend() {
            info!("Forwarding to {}", backend);
        }

        let mut tasks: JoinSet<Result<SessionEnd>> = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping listener on {}", local_addr);
                    break;
                }

                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((client_stream, client_addr)) => {
                            info!("Accepted connection from {}", client_addr);
                            let config = Arc::clone(&self.config);
                            tasks.spawn(handle_connection(client_stream, client_addr, config));
                        }
                        Err(e) => {
                            error!("Error accepting connection: {}", e);
                        }
                    }
                }

                Some(result) = tasks.join_next() => {
                    match result {
                        Ok(Ok(end)) => debug!("Session finished: {:?}", end),
                        // Already logged by the handler
                        Ok(Err(_)) => {}
                        Err(e) => error!("Task error: {}", e),
                    }
                }
            }
        }

        if !tasks.is_empty() {
            info!("Aborting {} active sessions", tasks.len());
        }
        tasks.shutdown().await;

        info!("Proxy service shutdown complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_new() {
        let config = ProxyConfig {
            host: "127.0.0.1".to_string(),
            port: 1600,
            ..ProxyConfig::default()
        };
        let proxy = Proxy::new(Arc::new(config));

        assert_eq!(proxy.listen_addr(), "127.0.0.1:1600");
    }
}

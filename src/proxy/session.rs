//! Proxy session
//!
//! One session per client connection. The session owns the client socket
//! and the current backend socket, moves one packet at a time between them,
//! and follows a backend-initiated redirect by reconnecting to the new
//! backend and replaying the client's original CONNECT packet there.
//!
//! The loop works in poll rounds: wait up to `poll_interval` for either
//! socket to become readable or report an error, frame and dispatch one
//! packet from each readable socket, then count the round as idle or
//! active. A session ends after `idle_round_limit` consecutive idle rounds,
//! on a poll error, or on the first fault while handling a packet.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use futures::FutureExt;
use log::{debug, error, info, warn};
use tokio::io::{AsyncWriteExt, Interest};
use tokio::net::TcpStream;
use tokio::time::{timeout_at, Instant};

use crate::common::{ProxyError, Result};
use crate::config::ProxyConfig;
use crate::protocol::{connect_descriptor, extract_redirect, read_ready_packet, FramingMode, Method, Packet, RedirectTarget};
use super::connector::connect_backend;
use super::forwarder::{send_packet, Side};

/// Why a session stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// No classified traffic for the whole idle budget
    IdleTimeout,
    /// The readiness poll reported an error on one of the sockets
    PollError,
    /// Handling a packet failed (I/O, malformed redirect, backend connect)
    Fault,
}

/// A single proxied client connection
pub struct Session {
    client: TcpStream,
    client_addr: SocketAddr,
    /// `None` only between closing a redirected backend and opening its replacement
    backend: Option<TcpStream>,
    backend_host: String,
    backend_port: u16,
    /// First CONNECT seen in the session, replayed to redirected backends
    saved_connect: Option<Packet>,
    redirect_pending: bool,
    idle_rounds: u64,
    idle_round_limit: u64,
    poll_interval: Duration,
    connect_timeout: Duration,
    framing: FramingMode,
}

impl Session {
    /// Create a session for an accepted client, connecting to the first configured backend
    ///
    /// # Errors
    ///
    /// Returns an error if no backend is configured or the connection fails.
    pub async fn connect(client: TcpStream, client_addr: SocketAddr, config: &ProxyConfig) -> Result<Self> {
        let primary = config.primary_backend()?;
        let backend = connect_backend(&primary.host, primary.port, config.backend_connect_timeout()).await?;

        debug!("Session {} connected to backend {}", client_addr, primary);

        Ok(Self {
            client,
            client_addr,
            backend: Some(backend),
            backend_host: primary.host.clone(),
            backend_port: primary.port,
            saved_connect: None,
            redirect_pending: false,
            idle_rounds: 0,
            idle_round_limit: config.idle_round_limit(),
            poll_interval: config.poll_interval(),
            connect_timeout: config.backend_connect_timeout(),
            framing: config.framing_mode(),
        })
    }

    /// Address of the backend currently in use
    pub fn backend_addr(&self) -> (&str, u16) {
        (&self.backend_host, self.backend_port)
    }

    /// Run the forwarding loop until the session ends, then close both sockets
    pub async fn run(mut self) -> SessionEnd {
        let end = loop {
            match self.round().await {
                Ok(true) => self.idle_rounds = 0,
                Ok(false) => self.idle_rounds += 1,
                Err(ProxyError::Poll(e)) => {
                    error!("Poll error on session {}: {}", self.client_addr, e);
                    break SessionEnd::PollError;
                }
                // Already logged with the offending packet
                Err(_) => break SessionEnd::Fault,
            }

            if self.idle_rounds >= self.idle_round_limit {
                debug!(
                    "Session {} idle for {} rounds, closing",
                    self.client_addr, self.idle_rounds
                );
                break SessionEnd::IdleTimeout;
            }
        };

        self.close().await;
        end
    }

    /// One poll round. Returns whether any classified packet was handled.
    ///
    /// The round lasts until a packet has been read or `poll_interval` has
    /// passed. Readiness that turns out to be stale does not end it.
    async fn round(&mut self) -> Result<bool> {
        let deadline = Instant::now() + self.poll_interval;

        loop {
            let ready = match self.poll(deadline).await? {
                Some(ready) => ready,
                None => return Ok(false),
            };

            let mut read_any = false;
            let mut active = false;

            for source in ready {
                let packet = match self.read_from(source).await? {
                    Some(packet) => packet,
                    None => continue,
                };
                read_any = true;

                let method = packet.method();
                if let Err(e) = self.dispatch(method, &packet, source).await {
                    error!(
                        "Exception: [SOURCE]:{} [METHOD]:{} [ERROR]:{} [DATA]:{:?}",
                        source, method, e, packet
                    );
                    return Err(e);
                }

                if method.is_classified() {
                    active = true;
                }
            }

            if read_any {
                return Ok(active);
            }
        }
    }

    /// Frame one packet from a side reported readable, `None` if nothing was queued
    async fn read_from(&mut self, source: Side) -> Result<Option<Packet>> {
        let framing = self.framing;
        match read_ready_packet(self.stream_mut(source)?, framing).await {
            Ok(packet) => Ok(packet),
            Err(e) => {
                error!(
                    "Exception: [SOURCE]:{} [METHOD]:- [ERROR]:{} [DATA]:-",
                    source, e
                );
                Err(e.into())
            }
        }
    }

    /// Wait until `deadline` for either socket to become readable
    ///
    /// Returns the ready sides in the order they became ready, or `None`
    /// when the deadline passed. Socket errors are checked on both sides
    /// before anything is read.
    async fn poll(&self, deadline: Instant) -> Result<Option<Vec<Side>>> {
        let interest = Interest::READABLE | Interest::ERROR;
        let client = &self.client;
        let backend = self.stream(Side::Backend)?;

        let first = timeout_at(deadline, async {
            tokio::select! {
                r = client.ready(interest) => (Side::Client, r),
                r = backend.ready(interest) => (Side::Backend, r),
            }
        })
        .await;

        let (side, ready) = match first {
            Ok((side, ready)) => (side, ready.map_err(ProxyError::Poll)?),
            Err(_elapsed) => {
                self.check_socket_errors()?;
                return Ok(None);
            }
        };

        let mut sides = vec![(side, ready)];
        let other = side.peer();
        if let Some(result) = self.stream(other)?.ready(interest).now_or_never() {
            sides.push((other, result.map_err(ProxyError::Poll)?));
        }

        self.check_socket_errors()?;
        if let Some((side, _)) = sides.iter().find(|(_, ready)| ready.is_error()) {
            return Err(ProxyError::Poll(io::Error::new(
                io::ErrorKind::Other,
                format!("error condition on {} socket", side),
            )));
        }

        Ok(Some(sides.into_iter().map(|(side, _)| side).collect()))
    }

    /// Report a pending socket error on either side as a poll error
    fn check_socket_errors(&self) -> Result<()> {
        for side in [Side::Client, Side::Backend] {
            if let Some(e) = self.stream(side)?.take_error().map_err(ProxyError::Poll)? {
                return Err(ProxyError::Poll(e));
            }
        }
        Ok(())
    }

    fn stream(&self, side: Side) -> Result<&TcpStream> {
        match side {
            Side::Client => Ok(&self.client),
            Side::Backend => self.backend.as_ref().ok_or_else(backend_closed),
        }
    }

    fn stream_mut(&mut self, side: Side) -> Result<&mut TcpStream> {
        match side {
            Side::Client => Ok(&mut self.client),
            Side::Backend => self.backend.as_mut().ok_or_else(backend_closed),
        }
    }

    /// Route a packet to its method handler
    async fn dispatch(&mut self, method: Method, packet: &Packet, source: Side) -> Result<()> {
        match method {
            Method::Connect => self.on_connect(packet, source).await,
            Method::Accept => self.on_accept(packet, source).await,
            Method::Redirect => {
                self.on_redirect(packet, source);
                Ok(())
            }
            Method::Data => self.on_data(packet, source).await,
            Method::Resend => self.on_resend(packet, source).await,
            Method::Ack
            | Method::Refute
            | Method::Null
            | Method::Other1
            | Method::Abort
            | Method::Other2
            | Method::Marker
            | Method::Attention
            | Method::Control
            | Method::Unclassified => self.forward(packet, source).await,
        }
    }

    /// Pass a packet through to the other side unchanged
    async fn forward(&mut self, packet: &Packet, source: Side) -> Result<()> {
        send_packet(self.stream_mut(source.peer())?, packet).await
    }

    async fn on_connect(&mut self, packet: &Packet, source: Side) -> Result<()> {
        if self.saved_connect.is_none() {
            match connect_descriptor(packet.as_bytes()) {
                Some(descriptor) => info!("CONNECT from {} ({}): {}", self.client_addr, source, descriptor),
                None => info!("CONNECT from {} ({}): {} bytes", self.client_addr, source, packet.len()),
            }
            self.saved_connect = Some(packet.clone());
        }
        self.forward(packet, source).await
    }

    async fn on_accept(&mut self, packet: &Packet, source: Side) -> Result<()> {
        self.forward(packet, source).await?;
        if self.redirect_pending {
            info!(
                "Session {} accepted by redirected backend {}:{}",
                self.client_addr, self.backend_host, self.backend_port
            );
        }
        self.redirect_pending = false;
        Ok(())
    }

    /// Swallow the redirect; the DATA packet that follows carries the new address
    fn on_redirect(&mut self, packet: &Packet, source: Side) {
        if source == Side::Client {
            warn!("REDIRECT received from client {}", self.client_addr);
        }
        debug!("REDIRECT ({} bytes) from {}, awaiting target", packet.len(), source);
        self.redirect_pending = true;
    }

    async fn on_data(&mut self, packet: &Packet, source: Side) -> Result<()> {
        if !self.redirect_pending {
            return self.forward(packet, source).await;
        }

        let target = extract_redirect(packet.as_bytes())?;
        let connect = self
            .saved_connect
            .clone()
            .ok_or(ProxyError::MissingConnect(Method::Data))?;

        self.reconnect(target).await?;

        // Forge the handshake so the new backend sees the client's CONNECT.
        // The redirect stays pending until that backend sends ACCEPT, so a
        // RESEND before then is answered with the saved CONNECT.
        send_packet(self.stream_mut(Side::Backend)?, &connect).await
    }

    async fn on_resend(&mut self, packet: &Packet, source: Side) -> Result<()> {
        if !self.redirect_pending {
            return self.forward(packet, source).await;
        }

        let connect = self
            .saved_connect
            .clone()
            .ok_or(ProxyError::MissingConnect(Method::Resend))?;

        debug!("RESEND during redirect, replaying CONNECT to {}:{}", self.backend_host, self.backend_port);
        send_packet(self.stream_mut(Side::Backend)?, &connect).await
    }

    /// Close the current backend, then connect to the redirect target
    async fn reconnect(&mut self, target: RedirectTarget) -> Result<()> {
        info!(
            "Redirecting session {} from {}:{} to {}",
            self.client_addr, self.backend_host, self.backend_port, target
        );

        if let Some(mut old) = self.backend.take() {
            if let Err(e) = old.shutdown().await {
                debug!("Failed to shut down backend {}:{}: {}", self.backend_host, self.backend_port, e);
            }
        }

        self.backend_host = target.host;
        self.backend_port = target.port;

        let stream = connect_backend(&self.backend_host, self.backend_port, self.connect_timeout).await?;
        self.backend = Some(stream);
        Ok(())
    }

    /// Best-effort close of both sockets
    async fn close(&mut self) {
        if let Err(e) = self.client.shutdown().await {
            debug!("Failed to shut down client {}: {}", self.client_addr, e);
        }
        if let Some(mut backend) = self.backend.take() {
            if let Err(e) = backend.shutdown().await {
                debug!("Failed to shut down backend {}:{}: {}", self.backend_host, self.backend_port, e);
            }
        }
        debug!("Session {} closed", self.client_addr);
    }
}

fn backend_closed() -> ProxyError {
    ProxyError::Other("backend connection is closed".to_string())
}

//! Shared helpers for integration tests
//!
//! Sessions are driven over real loopback sockets: the test holds the
//! client end and plays the backend through its own listeners.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use tns_redirect_proxy::config::{BackendConfig, ProxyConfig};
use tns_redirect_proxy::{Session, SessionEnd};

pub const CONNECT: u8 = 1;
pub const ACCEPT: u8 = 2;
pub const ACK: u8 = 3;
pub const REDIRECT: u8 = 5;
pub const DATA: u8 = 6;
pub const RESEND: u8 = 11;
pub const MARKER: u8 = 12;

/// Upper bound for any single step of a test
pub const STEP: Duration = Duration::from_secs(5);

/// Build a packet with a correct length header
pub fn frame(method: u8, payload: &[u8]) -> Vec<u8> {
    let total = (8 + payload.len()) as u16;
    let mut raw = total.to_be_bytes().to_vec();
    raw.extend_from_slice(&[0x00, 0x00, method, 0x00, 0x00, 0x00]);
    raw.extend_from_slice(payload);
    raw
}

pub fn connect_packet() -> Vec<u8> {
    frame(
        CONNECT,
        b"\x01\x3a\x01\x2c(DESCRIPTION=(ADDRESS=(PROTOCOL=TCP)(HOST=proxy)(PORT=1521))(CONNECT_DATA=(SERVICE_NAME=orcl)))",
    )
}

pub fn redirect_data(port: u16) -> Vec<u8> {
    let payload = format!(
        "\x00\x00(ADDRESS=(PROTOCOL=tcp)(HOST=127.0.0.1)(PORT={}))\x00(DESCRIPTION=(CONNECT_DATA=(SERVICE_NAME=orcl)))",
        port
    );
    frame(DATA, payload.as_bytes())
}

/// Session configuration pointing at `backend`, with a short poll interval
pub fn test_config(backend: SocketAddr) -> ProxyConfig {
    ProxyConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        backends: vec![BackendConfig {
            host: backend.ip().to_string(),
            port: backend.port(),
        }],
        timeout: 20,
        poll_interval_ms: 100,
        connect_timeout: 5,
        ..ProxyConfig::default()
    }
}

/// A backend the test plays by hand
pub async fn backend_listener() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

pub struct Harness {
    /// Test side of the client connection
    pub client: TcpStream,
    /// Test side of the initial backend connection
    pub backend: TcpStream,
    pub session: JoinHandle<SessionEnd>,
}

/// Connect a session between a fresh client and `backend_listener` without running it
pub async fn connect_session(backend_listener: &TcpListener, config: ProxyConfig) -> (TcpStream, TcpStream, Session) {
    let front = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let client = TcpStream::connect(front.local_addr().unwrap()).await.unwrap();
    let (accepted, client_addr) = front.accept().await.unwrap();

    let session = Session::connect(accepted, client_addr, &config).await.unwrap();
    let (backend, _) = timeout(STEP, backend_listener.accept()).await.unwrap().unwrap();

    (client, backend, session)
}

/// Start a session between a fresh client and `backend_listener`
pub async fn start_session(backend_listener: &TcpListener, config: ProxyConfig) -> Harness {
    let (client, backend, session) = connect_session(backend_listener, config).await;
    let session = tokio::spawn(session.run());

    Harness { client, backend, session }
}

/// Read exactly `len` bytes
pub async fn read_n(stream: &mut TcpStream, len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    timeout(STEP, stream.read_exact(&mut buf)).await.unwrap().unwrap();
    buf
}

/// Read until the peer closes, returning everything received
pub async fn read_to_eof(stream: &mut TcpStream) -> Vec<u8> {
    let mut buf = Vec::new();
    // A reset peer still counts as closed
    let _ = timeout(STEP, stream.read_to_end(&mut buf)).await.unwrap();
    buf
}

/// Assert nothing arrives on `stream` within `wait`
pub async fn assert_silent(stream: &mut TcpStream, wait: Duration) {
    let mut buf = [0u8; 64];
    if let Ok(result) = timeout(wait, stream.read(&mut buf)).await {
        let n = result.unwrap();
        panic!("expected silence, received {} bytes: {:?}", n, &buf[..n]);
    }
}

pub async fn send(stream: &mut TcpStream, packet: &[u8]) {
    stream.write_all(packet).await.unwrap();
}

pub async fn session_end(session: JoinHandle<SessionEnd>) -> SessionEnd {
    timeout(STEP, session).await.unwrap().unwrap()
}

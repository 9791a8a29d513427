//! Packet framing
//!
//! A TNS packet starts with an 8-byte header whose first two bytes hold the
//! big-endian length of the whole packet, header included. The framer reads
//! the header, then the remaining payload, and hands back the raw bytes.

use std::fmt;
use std::io;

use bytes::{Bytes, BytesMut};
use log::trace;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::TcpStream;

use super::method::Method;

/// Fixed header length of every packet
pub const HEADER_LEN: usize = 8;

/// How the payload of a packet is read once the header is known
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FramingMode {
    /// Issue one read for the payload and accept whatever it returns.
    /// A fragmented payload yields a packet shorter than its declared length.
    #[default]
    SingleRead,
    /// Keep reading until the declared length is reached or the peer closes
    Exact,
}

/// One length-framed protocol message
#[derive(Clone, PartialEq, Eq)]
pub struct Packet {
    raw: Bytes,
}

impl Packet {
    /// Wrap raw bytes, header included
    pub fn from_bytes(raw: impl Into<Bytes>) -> Self {
        Self { raw: raw.into() }
    }

    /// Raw bytes as read from the wire
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Cheap clone of the underlying buffer
    #[inline]
    pub fn bytes(&self) -> Bytes {
        self.raw.clone()
    }

    /// Number of bytes actually read
    #[inline]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Length declared by the header, 0 if the header was too short
    pub fn declared_len(&self) -> usize {
        declared_length(&self.raw)
    }

    /// Method carried by this packet
    pub fn method(&self) -> Method {
        Method::classify(&self.raw)
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Bytes renders as an escaped byte string, which is what the logs want
        write!(f, "{:?}", self.raw)
    }
}

/// Total packet length declared by a header
///
/// Returns 0 when fewer than two bytes are available.
pub fn declared_length(header: &[u8]) -> usize {
    match header {
        [hi, lo, ..] => u16::from_be_bytes([*hi, *lo]) as usize,
        _ => 0,
    }
}

/// Read one packet from `reader`
///
/// The header is read with a single call. A closed or erroring peer that
/// returns fewer than two bytes produces a short packet with no payload
/// read attempted; that is not an error.
pub async fn read_packet<R>(reader: &mut R, mode: FramingMode) -> io::Result<Packet>
where
    R: AsyncRead + Unpin,
{
    let mut buf = BytesMut::zeroed(HEADER_LEN);
    let n = reader.read(&mut buf[..]).await?;
    buf.truncate(n);
    read_payload(reader, buf, mode).await
}

/// Read one packet from a socket that was reported readable
///
/// The header read does not wait: `None` means the readiness was stale and
/// nothing is queued, which also clears the socket's cached readiness. Once
/// a header arrived the payload is read as in [`read_packet`].
pub async fn read_ready_packet(stream: &mut TcpStream, mode: FramingMode) -> io::Result<Option<Packet>> {
    let mut buf = BytesMut::zeroed(HEADER_LEN);
    let n = match stream.try_read(&mut buf[..]) {
        Ok(n) => n,
        Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(None),
        Err(e) => return Err(e),
    };
    buf.truncate(n);
    read_payload(stream, buf, mode).await.map(Some)
}

/// Complete a packet whose header (possibly short) is in `buf`
async fn read_payload<R>(reader: &mut R, mut buf: BytesMut, mode: FramingMode) -> io::Result<Packet>
where
    R: AsyncRead + Unpin,
{
    let header_len = buf.len();
    let payload_len = declared_length(&buf).saturating_sub(HEADER_LEN);
    if payload_len > 0 {
        let start = buf.len();
        buf.resize(start + payload_len, 0);
        let filled = match mode {
            FramingMode::SingleRead => reader.read(&mut buf[start..]).await?,
            FramingMode::Exact => fill(reader, &mut buf[start..]).await?,
        };
        buf.truncate(start + filled);
    }

    trace!("Framed packet: header {} bytes, total {} bytes", header_len, buf.len());
    Ok(Packet { raw: buf.freeze() })
}

/// Read until `buf` is full or the peer closes, returning the bytes filled
async fn fill<R>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]).await? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

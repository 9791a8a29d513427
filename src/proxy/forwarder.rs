//! Packet forwarding
//!
//! This module names the two ends of a session and writes packets to them.

use std::fmt;

use log::trace;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::common::Result;
use crate::protocol::Packet;

/// One end of a proxied session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Client,
    Backend,
}

impl Side {
    /// The opposite end, where packets read from this side are forwarded
    #[inline]
    pub fn peer(self) -> Self {
        match self {
            Self::Client => Self::Backend,
            Self::Backend => Self::Client,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Client => write!(f, "CLIENT"),
            Self::Backend => write!(f, "BACKEND"),
        }
    }
}

/// Write a packet to `writer` unchanged
///
/// An empty packet (closed peer) writes nothing.
pub async fn send_packet<W>(writer: &mut W, packet: &Packet) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    if packet.is_empty() {
        return Ok(());
    }
    writer.write_all(packet.as_bytes()).await?;
    trace!("Sent {} bytes", packet.len());
    Ok(())
}

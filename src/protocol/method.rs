//! Packet method classification
//!
//! Byte 4 of every TNS header carries the packet type. This module maps it
//! onto a closed set of methods; anything outside the table, or a packet too
//! short to carry the byte, is `Unclassified` and forwarded untouched.

use std::fmt;

/// Offset of the method code inside the packet header
pub const METHOD_OFFSET: usize = 4;

/// Symbolic packet method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Connect,
    Accept,
    Ack,
    Refute,
    Redirect,
    Data,
    Null,
    Other1,
    Abort,
    Other2,
    Resend,
    Marker,
    Attention,
    Control,
    /// Too short to carry a method code, or an unknown code
    Unclassified,
}

impl Method {
    /// Map a wire code onto a method
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Self::Connect,
            2 => Self::Accept,
            3 => Self::Ack,
            4 => Self::Refute,
            5 => Self::Redirect,
            6 => Self::Data,
            7 => Self::Null,
            8 => Self::Other1,
            9 => Self::Abort,
            10 => Self::Other2,
            11 => Self::Resend,
            12 => Self::Marker,
            13 => Self::Attention,
            14 => Self::Control,
            _ => Self::Unclassified,
        }
    }

    /// Classify a raw packet
    pub fn classify(raw: &[u8]) -> Self {
        raw.get(METHOD_OFFSET)
            .map_or(Self::Unclassified, |&code| Self::from_code(code))
    }

    /// Whether this method resets the idle counter
    #[inline]
    pub fn is_classified(self) -> bool {
        self != Self::Unclassified
    }

    /// Upper-case protocol name, as it appears in logs
    pub fn name(self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Accept => "ACCEPT",
            Self::Ack => "ACK",
            Self::Refute => "REFUTE",
            Self::Redirect => "REDIRECT",
            Self::Data => "DATA",
            Self::Null => "NULL",
            Self::Other1 => "OTHER1",
            Self::Abort => "ABORT",
            Self::Other2 => "OTHER2",
            Self::Resend => "RESEND",
            Self::Marker => "MARKER",
            Self::Attention => "ATTENTION",
            Self::Control => "CONTROL",
            Self::Unclassified => "NONE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

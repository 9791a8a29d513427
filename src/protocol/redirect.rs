//! Redirect target extraction
//!
//! A backend that wants the client elsewhere answers the CONNECT with a
//! REDIRECT packet followed by a DATA packet whose payload carries an
//! address descriptor such as
//! `(ADDRESS=(PROTOCOL=tcp)(HOST=10.0.0.5)(PORT=1522))\0(DESCRIPTION=...)`.

use std::fmt;

use once_cell::sync::Lazy;
use regex::bytes::Regex;

use crate::common::{ProxyError, Result};

/// HOST/PORT pair followed somewhere by a DESCRIPTION block. The leading
/// greedy `.*` selects the last qualifying pair.
static REDIRECT_ADDRESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s-u)^.*\((?i:HOST)=([A-Za-z0-9._\-]+)\)\((?i:PORT)=([0-9]+)\).*(?i:DESCRIPTION)")
        .expect("redirect address pattern is valid")
});

static DESCRIPTOR_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?-u)\((?i:DESCRIPTION)=").expect("descriptor pattern is valid")
});

/// Backend address carried by a redirect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTarget {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for RedirectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Extract the new backend address from a redirect DATA packet
///
/// Fails with `RedirectParse` when no HOST/PORT pair precedes a
/// DESCRIPTION block, or when the port does not fit in 16 bits.
pub fn extract_redirect(raw: &[u8]) -> Result<RedirectTarget> {
    let caps = REDIRECT_ADDRESS.captures(raw).ok_or_else(|| {
        ProxyError::RedirectParse(format!(
            "no (HOST=...)(PORT=...) descriptor in {} byte payload",
            raw.len()
        ))
    })?;

    // Both groups only match ASCII
    let host = String::from_utf8_lossy(&caps[1]).into_owned();
    let port_text = String::from_utf8_lossy(&caps[2]);
    let port = port_text
        .parse::<u16>()
        .map_err(|_| ProxyError::RedirectParse(format!("invalid port {}", port_text)))?;

    Ok(RedirectTarget { host, port })
}

/// Connect descriptor text of a CONNECT packet, from `(DESCRIPTION=` on
///
/// Used for logging only. Trailing NUL padding is dropped.
pub fn connect_descriptor(raw: &[u8]) -> Option<String> {
    let start = DESCRIPTOR_START.find(raw)?.start();
    let text = &raw[start..];
    let end = text.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    Some(String::from_utf8_lossy(&text[..end]).into_owned())
}

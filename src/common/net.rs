//! Network utility functions
//!
//! This module provides utility functions for network operations.

use super::error::{ProxyError, Result};

/// Split a `host:port` string into its host and port parts
///
/// The host is not resolved here; backends may be hostnames that only
/// resolve at connect time. Bracketed IPv6 literals (`[::1]:1521`) are
/// accepted and returned without brackets.
///
/// # Arguments
///
/// * `addr` - The address string to parse
pub fn parse_host_port(addr: &str) -> Result<(String, u16)> {
    let (host, port) = addr
        .rsplit_once(':')
        .ok_or_else(|| ProxyError::Config(format!("Missing port in address: {}", addr)))?;

    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return Err(ProxyError::Config(format!("Missing host in address: {}", addr)));
    }

    let port = port
        .parse::<u16>()
        .map_err(|e| ProxyError::Config(format!("Invalid port in address {}: {}", addr, e)))?;

    Ok((host.to_string(), port))
}

//! Client IP resolution behind proxies
//!
//! Forwarding headers are only believed when the TCP peer is a trusted proxy.
//! `X-Forwarded-For` is walked right to left: the first address that is not a
//! trusted proxy is the client, so entries a client prepends are ignored.
//!
//! Example: `X-Forwarded-For: spoofed, real-client, 10.0.0.1` resolves to
//! `real-client` when `10.0.0.1` is trusted.

use actix_web::HttpRequest;
use std::net::IpAddr;
use std::str::FromStr;
use tracing::{debug, warn};

/// Returned when no peer address is available
pub const UNKNOWN_IP: &str = "unknown";

/// Set of trusted proxy addresses and CIDR ranges
#[derive(Debug, Clone, Default)]
pub struct TrustedProxies {
    networks: Vec<Network>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Network {
    addr: IpAddr,
    prefix_len: u8,
}

impl TrustedProxies {
    /// Parse entries such as `127.0.0.1` or `10.0.0.0/8`
    ///
    /// Invalid entries are logged and skipped.
    pub fn parse<S: AsRef<str>>(entries: &[S]) -> Self {
        let networks = entries
            .iter()
            .filter_map(|entry| {
                let entry = entry.as_ref().trim();
                let network = Network::parse(entry);
                if network.is_none() {
                    warn!(entry = %entry, "Ignoring invalid trusted proxy entry");
                }
                network
            })
            .collect();

        Self { networks }
    }

    pub fn contains(&self, ip: &IpAddr) -> bool {
        self.networks.iter().any(|network| network.contains(ip))
    }

    fn contains_str(&self, ip: &str) -> bool {
        IpAddr::from_str(ip).is_ok_and(|addr| self.contains(&addr))
    }
}

impl Network {
    fn parse(entry: &str) -> Option<Self> {
        match entry.split_once('/') {
            Some((addr, prefix)) => {
                let addr = IpAddr::from_str(addr).ok()?;
                let prefix_len: u8 = prefix.parse().ok()?;
                let max = if addr.is_ipv4() { 32 } else { 128 };
                (prefix_len <= max).then_some(Self { addr, prefix_len })
            }
            None => {
                let addr = IpAddr::from_str(entry).ok()?;
                let prefix_len = if addr.is_ipv4() { 32 } else { 128 };
                Some(Self { addr, prefix_len })
            }
        }
    }

    fn contains(&self, ip: &IpAddr) -> bool {
        match (ip, self.addr) {
            (IpAddr::V4(ip_v4), IpAddr::V4(net_v4)) => {
                let mask = if self.prefix_len == 0 {
                    0
                } else {
                    !0u32 << (32 - self.prefix_len)
                };
                (u32::from(*ip_v4) & mask) == (u32::from(net_v4) & mask)
            }
            (IpAddr::V6(ip_v6), IpAddr::V6(net_v6)) => {
                let mask = if self.prefix_len == 0 {
                    0
                } else {
                    !0u128 << (128 - self.prefix_len)
                };
                (u128::from(*ip_v6) & mask) == (u128::from(net_v6) & mask)
            }
            _ => false,
        }
    }
}

/// Extract the client's IP address from the request
///
/// Order: `X-Forwarded-For` (trusted peer only), `X-Real-IP` (trusted peer
/// only), then the connection peer address.
pub fn extract_ip(req: &HttpRequest, trusted: &TrustedProxies) -> String {
    let Some(peer_ip) = req.peer_addr().map(|addr| addr.ip()) else {
        return UNKNOWN_IP.to_string();
    };

    if !trusted.contains(&peer_ip) {
        debug!(peer_ip = %peer_ip, "Using peer address (not from trusted proxy)");
        return peer_ip.to_string();
    }

    if let Some(value) = header_str(req, "X-Forwarded-For") {
        for ip in value.split(',').map(str::trim).rev() {
            if IpAddr::from_str(ip).is_err() {
                warn!(ip = %ip, "Invalid IP in X-Forwarded-For chain, skipping");
                continue;
            }

            if !trusted.contains_str(ip) {
                debug!(
                    client_ip = %ip,
                    peer_ip = %peer_ip,
                    "Extracted client IP from X-Forwarded-For (right-to-left)"
                );
                return ip.to_string();
            }
        }

        debug!(chain = %value, "All IPs in X-Forwarded-For are trusted proxies");
    }

    if let Some(value) = header_str(req, "X-Real-IP").map(str::trim) {
        if IpAddr::from_str(value).is_ok() {
            debug!(client_ip = %value, peer_ip = %peer_ip, "Using X-Real-IP header");
            return value.to_string();
        }
    }

    debug!(peer_ip = %peer_ip, "Using peer address (no valid headers)");
    peer_ip.to_string()
}

fn header_str<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|value| value.to_str().ok())
}

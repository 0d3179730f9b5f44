use std::net::IpAddr;

use axum::http::HeaderMap;
use sha2::{Digest, Sha256};

/// Creates a truncated, salted hash of an identifier for safe logging.
pub fn log_safe_id(id: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(id.as_bytes());
    let hash = hasher.finalize();

    hash[..4].iter().map(|b| format!("{:02x}", b)).collect()
}

/// Derives the rate limiting key for a request
///
/// Checks, in order:
/// 1. X-Forwarded-For (first address in the chain)
/// 2. X-Real-IP
/// 3. The direct peer address
///
/// X-Forwarded-For is client-controlled unless a trusted proxy rewrites it,
/// so deployments must strip it at the edge.
pub fn extract_client_key(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok());
    if let Some(ip) = forwarded {
        return normalize_ip(ip);
    }

    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<IpAddr>().ok());
    if let Some(ip) = real_ip {
        return normalize_ip(ip);
    }

    match direct_ip {
        Some(ip) => normalize_ip(ip),
        None => "unknown".to_string(),
    }
}

fn normalize_ip(ip: IpAddr) -> String {
    match ip {
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => v4.to_string(),
            None => v6.to_string(),
        },
        IpAddr::V4(v4) => v4.to_string(),
    }
}

/// Strips NUL and control characters (keeping tab, newline and carriage
/// return) and trims surrounding whitespace.
pub fn sanitize_string(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Canonical channel name: sanitized, lowercased, spaces become dashes
pub fn normalize_channel_name(input: &str) -> String {
    sanitize_string(input).to_lowercase().replace(' ', "-")
}

//! Request Extraction Helpers
//!
//! Pulls the bearer credential and the client address out of request
//! headers. Both live here so the handlers stay free of header parsing.

use axum::http::{header, HeaderMap};

/// Extract the bearer credential from the Authorization header.
///
/// The header must be exactly two space-separated parts with a
/// case-insensitive `Bearer` scheme. Anything else yields no credential;
/// the caller decides whether that means 401 or spectator access.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;

    let mut parts = value.split(' ');
    let (Some(scheme), Some(token), None) = (parts.next(), parts.next(), parts.next()) else {
        return None;
    };
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token)
}

/// Best-effort client address for per-IP rate limiting.
///
/// Takes the first entry of `x-forwarded-for`, then `x-real-ip`, then the
/// literal `unknown`. Spoofable, which is acceptable for a courtesy limit
/// on spectator reads.
pub fn client_ip(headers: &HeaderMap) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if !forwarded.is_empty() {
            if let Some(first) = forwarded.split(',').next() {
                return first.trim().to_string();
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        if !real_ip.is_empty() {
            return real_ip.to_string();
        }
    }

    "unknown".to_string()
}

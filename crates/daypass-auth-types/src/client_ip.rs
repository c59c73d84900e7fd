//! Client network identity extractor.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use http::request::Parts;

/// Placeholder identity when no address information is available.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Best-effort client address used to key abuse limits.
///
/// Resolution order: last `x-forwarded-for` entry, `x-real-ip`, the socket
/// peer address (when served with connect info), then `"unknown"`.
///
/// Entries left of the last one are client supplied and ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

fn header_ip(parts: &Parts) -> Option<String> {
    let forwarded = parts
        .headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.rsplit(',').map(str::trim).find(|s| !s.is_empty()));
    if let Some(ip) = forwarded {
        return Some(ip.to_owned());
    }
    parts
        .headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let ip = header_ip(parts)
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            })
            .unwrap_or_else(|| UNKNOWN_CLIENT.to_owned());
        async move { Ok(Self(ip)) }
    }
}

//! Gateway-injected identity headers extractor.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use http::StatusCode;
use http::request::Parts;
use uuid::Uuid;

/// Header carrying the authenticated account id.
pub const USER_ID_HEADER: &str = "x-daypass-user-id";

/// Header carrying the authenticated account role (`u8` wire value).
pub const USER_ROLE_HEADER: &str = "x-daypass-user-role";

/// User identity injected by the gateway via `x-daypass-user-id` and `x-daypass-user-role` headers.
///
/// Returns 401 if either header is absent or unparsable.
#[derive(Debug, Clone)]
pub struct IdentityHeaders {
    pub user_id: Uuid,
    pub user_role: u8,
}

impl IdentityHeaders {
    fn from_parts(parts: &Parts) -> Option<Self> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<Uuid>().ok())?;
        let user_role = parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u8>().ok())?;
        Some(Self { user_id, user_role })
    }
}

impl<S> FromRequestParts<S> for IdentityHeaders
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    // axum-core 0.5 defines this as `fn -> impl Future + Send` (not `async fn`).
    // Extract synchronously, return a 'static async move block.
    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let identity = Self::from_parts(parts);
        async move { identity.ok_or(StatusCode::UNAUTHORIZED) }
    }
}

/// Identity for routes that also serve anonymous callers.
///
/// Never rejects: missing or malformed headers yield `MaybeIdentity(None)`.
#[derive(Debug, Clone)]
pub struct MaybeIdentity(pub Option<IdentityHeaders>);

impl<S> FromRequestParts<S> for MaybeIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let identity = IdentityHeaders::from_parts(parts);
        async move { Ok(Self(identity)) }
    }
}

//! Mock gateway identity for router tests.
//!
//! Services behind the gateway receive `x-daypass-user-id` + `x-daypass-user-role`
//! headers. Tests inject them directly so no real gateway is needed.

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use uuid::Uuid;

use daypass_auth_types::identity::{USER_ID_HEADER, USER_ROLE_HEADER};
use daypass_domain::user::UserRole;

/// Identity injected into test requests.
pub struct MockAuth {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl MockAuth {
    pub fn new(user_id: Uuid, role: UserRole) -> Self {
        Self { user_id, role }
    }

    /// A regular account with a fresh id.
    pub fn user() -> Self {
        Self::new(Uuid::now_v7(), UserRole::User)
    }

    /// Header pairs as the gateway would inject them.
    pub fn header_pairs(&self) -> [(HeaderName, HeaderValue); 2] {
        [
            (
                HeaderName::from_static(USER_ID_HEADER),
                HeaderValue::from_str(&self.user_id.to_string()).unwrap(),
            ),
            (
                HeaderName::from_static(USER_ROLE_HEADER),
                HeaderValue::from(u16::from(self.role.as_u8())),
            ),
        ]
    }

    pub fn headers(&self) -> HeaderMap {
        self.header_pairs().into_iter().collect()
    }
}

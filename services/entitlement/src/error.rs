use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};

/// Entitlement service domain error variants.
///
/// Every variant maps to a stable `kind()` code so callers can branch
/// (e.g. `VOUCHER_TAKEN` refreshes the claimable list).
#[derive(Debug, thiserror::Error)]
pub enum EntitlementError {
    #[error("too many requests, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
    #[error("verification email could not be delivered")]
    DeliveryFailed,
    #[error("verification code not found")]
    CodeNotFound,
    #[error("verification code expired")]
    CodeExpired,
    #[error("too many verification attempts")]
    TooManyAttempts,
    #[error("invalid verification code")]
    InvalidCode { attempts_remaining: u32 },
    #[error("user not found")]
    UserNotFound,
    #[error("account inactive")]
    AccountInactive,
    #[error("daily claim limit reached")]
    LimitExceeded,
    #[error("voucher already claimed by this account")]
    AlreadyClaimed,
    #[error("voucher already taken")]
    VoucherTaken,
    #[error("voucher not found")]
    VoucherNotFound,
    #[error("voucher expired")]
    VoucherExpired,
    #[error("email already registered")]
    EmailTaken,
    #[error("account signs in with {provider}; password reset is unavailable")]
    FederatedAccount { provider: String },
    #[error("password must be at least 8 characters")]
    InvalidPassword,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl EntitlementError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::DeliveryFailed => "DELIVERY_FAILED",
            Self::CodeNotFound => "CODE_NOT_FOUND",
            Self::CodeExpired => "CODE_EXPIRED",
            Self::TooManyAttempts => "TOO_MANY_ATTEMPTS",
            Self::InvalidCode { .. } => "INVALID_CODE",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::AccountInactive => "ACCOUNT_INACTIVE",
            Self::LimitExceeded => "LIMIT_EXCEEDED",
            Self::AlreadyClaimed => "ALREADY_CLAIMED",
            Self::VoucherTaken => "VOUCHER_TAKEN",
            Self::VoucherNotFound => "VOUCHER_NOT_FOUND",
            Self::VoucherExpired => "VOUCHER_EXPIRED",
            Self::EmailTaken => "EMAIL_TAKEN",
            Self::FederatedAccount { .. } => "FEDERATED_ACCOUNT",
            Self::InvalidPassword => "INVALID_PASSWORD",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::RateLimited { .. } | Self::TooManyAttempts | Self::LimitExceeded => {
                StatusCode::TOO_MANY_REQUESTS
            }
            Self::DeliveryFailed => StatusCode::BAD_GATEWAY,
            Self::CodeNotFound | Self::UserNotFound | Self::VoucherNotFound => {
                StatusCode::NOT_FOUND
            }
            Self::CodeExpired | Self::VoucherExpired => StatusCode::GONE,
            Self::InvalidCode { .. } | Self::FederatedAccount { .. } | Self::InvalidPassword => {
                StatusCode::BAD_REQUEST
            }
            Self::AccountInactive => StatusCode::FORBIDDEN,
            Self::AlreadyClaimed | Self::VoucherTaken | Self::EmailTaken => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for EntitlementError {
    fn into_response(self) -> Response {
        let status = self.status();
        // 4xx are expected client outcomes; only internal errors carry a cause worth logging.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = ?e, kind = "INTERNAL", "internal error");
        }
        let mut body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        match &self {
            Self::RateLimited { retry_after_secs } => {
                body["retryAfterSeconds"] = (*retry_after_secs).into();
            }
            Self::InvalidCode { attempts_remaining } => {
                body["attemptsRemaining"] = (*attempts_remaining).into();
            }
            _ => {}
        }
        let mut response = (status, axum::Json(body)).into_response();
        if let Self::RateLimited { retry_after_secs } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }
        response
    }
}

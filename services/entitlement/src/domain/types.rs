use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use daypass_domain::id::{UserId, VoucherId};
use daypass_domain::user::{PASSWORD_PROVIDER, UserRole};
use daypass_domain::verification::CodePurpose;

use crate::domain::time_window::{is_same_calendar_day, seconds_until};

/// Registered account with its claim history.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    /// bcrypt hash; `None` for accounts created through a federated provider.
    pub password_hash: Option<String>,
    pub auth_provider: String,
    pub role: UserRole,
    pub is_active: bool,
    pub points: i64,
    pub last_claim_at: Option<DateTime<Utc>>,
    /// Oldest first.
    pub claimed_vouchers: Vec<ClaimedVoucher>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Never claimed, or last claim was on an earlier calendar day.
    pub fn can_claim_on(&self, now: DateTime<Utc>) -> bool {
        match self.last_claim_at {
            None => true,
            Some(last) => !is_same_calendar_day(last, now),
        }
    }

    pub fn holds_voucher(&self, voucher_id: VoucherId) -> bool {
        self.claimed_vouchers
            .iter()
            .any(|c| c.voucher_id == voucher_id)
    }

    pub fn uses_password(&self) -> bool {
        self.auth_provider == PASSWORD_PROVIDER && self.password_hash.is_some()
    }
}

/// A voucher assigned to a user, embedded in the user's record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimedVoucher {
    pub voucher_id: VoucherId,
    pub claimed_at: DateTime<Utc>,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandInfo {
    pub name: String,
    pub logo_url: Option<String>,
}

/// Scarce voucher. `claimed_by` is set once and never cleared.
#[derive(Debug, Clone)]
pub struct Voucher {
    pub id: VoucherId,
    pub code: String,
    pub title: String,
    pub brand: BrandInfo,
    pub expiry_date: DateTime<Utc>,
    pub is_active: bool,
    pub claimed_by: Option<UserId>,
    pub claimed_at: Option<DateTime<Utc>>,
}

impl Voucher {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date <= now
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed_by.is_some()
    }
}

/// Account details held with a signup code until the code is verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSignup {
    pub name: String,
    /// bcrypt hash; plaintext never reaches storage.
    pub password_hash: String,
}

/// Stored one-time code. At most one per `(address, purpose)`.
#[derive(Debug, Clone)]
pub struct VerificationCode {
    pub address: String,
    pub purpose: CodePurpose,
    pub code_hash: String,
    pub attempts: u32,
    pub max_attempts: u32,
    pub pending_payload: Option<PendingSignup>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl VerificationCode {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }

    /// Seconds left before another code may be issued for the same pair, if any.
    pub fn resend_cooldown_remaining(&self, now: DateTime<Utc>) -> Option<u64> {
        let until = self.created_at + chrono::Duration::seconds(RESEND_COOLDOWN_SECS);
        match seconds_until(until, now) {
            0 => None,
            secs => Some(secs),
        }
    }
}

/// Contact-form submission.
#[derive(Debug, Clone)]
pub struct ContactMessage {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub body: String,
    pub client_ip: String,
    pub created_at: DateTime<Utc>,
}

/// Rendered transactional email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Canonical form used as the verification key and account email.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Verification code length in digits.
pub const CODE_LEN: usize = 6;

/// Verification code time-to-live in seconds.
pub const CODE_TTL_SECS: i64 = 600;

/// Minimum gap between two codes for the same `(address, purpose)`.
pub const RESEND_COOLDOWN_SECS: i64 = 60;

/// Wrong submissions allowed before a code is discarded.
pub const MAX_VERIFY_ATTEMPTS: u32 = 5;

/// Loyalty points awarded per successful claim.
pub const CLAIM_REWARD_POINTS: i64 = 10;

/// Minimum gap between two contact submissions from the same email.
pub const CONTACT_EMAIL_COOLDOWN_SECS: i64 = 300;

pub const MIN_PASSWORD_LEN: usize = 8;

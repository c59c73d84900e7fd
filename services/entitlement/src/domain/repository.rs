#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};

use daypass_domain::id::{UserId, VoucherId};
use daypass_domain::verification::CodePurpose;

use crate::domain::types::{
    ClaimedVoucher, ContactMessage, EmailMessage, User, VerificationCode, Voucher,
};
use crate::error::EntitlementError;

/// Repository for accounts and their claim history.
pub trait UserRepository: Send + Sync {
    /// Load a user together with their claimed vouchers.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, EntitlementError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, EntitlementError>;

    /// Insert a new account. Fails with `EmailTaken` on a duplicate email.
    async fn create(&self, user: &User) -> Result<(), EntitlementError>;

    async fn update_password(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), EntitlementError>;
}

/// Repository for the voucher pool.
pub trait VoucherRepository: Send + Sync {
    async fn find_by_id(&self, id: VoucherId) -> Result<Option<Voucher>, EntitlementError>;

    /// Assign `voucher_id` to `user_id` if, and only if, it is still unclaimed.
    ///
    /// The check and the write are one conditional update. On success the
    /// claimed entry is appended to the user, `last_claim_at` is set to
    /// `claimed.claimed_at` and `reward_points` are added, all in the same
    /// transaction. Returns `false` when another caller got there first.
    async fn claim(
        &self,
        voucher_id: VoucherId,
        user_id: UserId,
        claimed: &ClaimedVoucher,
        reward_points: i64,
    ) -> Result<bool, EntitlementError>;
}

/// Repository for one-time verification codes, keyed by `(address, purpose)`.
pub trait VerificationCodeRepository: Send + Sync {
    async fn find(
        &self,
        address: &str,
        purpose: CodePurpose,
    ) -> Result<Option<VerificationCode>, EntitlementError>;

    /// Insert, replacing any existing record for the same pair.
    async fn upsert(&self, code: &VerificationCode) -> Result<(), EntitlementError>;

    /// Claim one attempt on a live record before the code is compared.
    ///
    /// A single conditional write: increments `attempts` only while
    /// `attempts < max_attempts` and `expires_at > now`. Returns the new
    /// attempt count, or `None` when the record is missing, expired or spent.
    async fn reserve_attempt(
        &self,
        address: &str,
        purpose: CodePurpose,
        now: DateTime<Utc>,
    ) -> Result<Option<u32>, EntitlementError>;

    /// Delete the record only if it still carries `code_hash`. Returns whether
    /// this call removed it, so at most one caller consumes a given code.
    async fn consume(
        &self,
        address: &str,
        purpose: CodePurpose,
        code_hash: &str,
    ) -> Result<bool, EntitlementError>;

    /// Remove the record. Deleting a missing record is not an error.
    async fn delete(&self, address: &str, purpose: CodePurpose) -> Result<(), EntitlementError>;
}

/// Repository for contact-form submissions.
pub trait MessageRepository: Send + Sync {
    async fn create(&self, message: &ContactMessage) -> Result<(), EntitlementError>;
}

/// Port for the transactional email provider.
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), EntitlementError>;
}

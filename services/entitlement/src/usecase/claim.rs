use chrono::{DateTime, Utc};

use daypass_domain::id::{UserId, VoucherId};

use crate::domain::clock::Clock;
use crate::domain::repository::{UserRepository, VoucherRepository};
use crate::domain::types::{BrandInfo, CLAIM_REWARD_POINTS, ClaimedVoucher};
use crate::error::EntitlementError;

// ── GetClaimStatus ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimStatus {
    pub is_authenticated: bool,
    pub can_claim_today: bool,
    pub claimed_voucher_ids: Vec<VoucherId>,
}

impl ClaimStatus {
    fn anonymous() -> Self {
        Self {
            is_authenticated: false,
            can_claim_today: false,
            claimed_voucher_ids: vec![],
        }
    }
}

pub struct GetClaimStatusUseCase<U, C>
where
    U: UserRepository,
    C: Clock,
{
    pub users: U,
    pub clock: C,
}

impl<U, C> GetClaimStatusUseCase<U, C>
where
    U: UserRepository,
    C: Clock,
{
    /// Read-only. Unknown or anonymous callers see the anonymous status.
    pub async fn execute(&self, user_id: Option<UserId>) -> Result<ClaimStatus, EntitlementError> {
        let Some(user_id) = user_id else {
            return Ok(ClaimStatus::anonymous());
        };
        let Some(user) = self.users.find_by_id(user_id).await? else {
            return Ok(ClaimStatus::anonymous());
        };

        Ok(ClaimStatus {
            is_authenticated: true,
            can_claim_today: user.is_active && user.can_claim_on(self.clock.now()),
            claimed_voucher_ids: user
                .claimed_vouchers
                .iter()
                .map(|c| c.voucher_id)
                .collect(),
        })
    }
}

// ── ClaimVoucher ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimReceipt {
    pub code: String,
    pub title: String,
    pub brand: BrandInfo,
    pub expires_at: DateTime<Utc>,
    pub points_earned: i64,
}

pub struct ClaimVoucherUseCase<U, V, C>
where
    U: UserRepository,
    V: VoucherRepository,
    C: Clock,
{
    pub users: U,
    pub vouchers: V,
    pub clock: C,
}

impl<U, V, C> ClaimVoucherUseCase<U, V, C>
where
    U: UserRepository,
    V: VoucherRepository,
    C: Clock,
{
    pub async fn execute(
        &self,
        user_id: UserId,
        voucher_id: VoucherId,
    ) -> Result<ClaimReceipt, EntitlementError> {
        let now = self.clock.now();

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(EntitlementError::UserNotFound)?;
        if !user.is_active {
            return Err(EntitlementError::AccountInactive);
        }
        if !user.can_claim_on(now) {
            return Err(EntitlementError::LimitExceeded);
        }
        if user.holds_voucher(voucher_id) {
            return Err(EntitlementError::AlreadyClaimed);
        }

        let voucher = self
            .vouchers
            .find_by_id(voucher_id)
            .await?
            .filter(|v| v.is_active)
            .ok_or(EntitlementError::VoucherNotFound)?;
        if voucher.is_expired_at(now) {
            return Err(EntitlementError::VoucherExpired);
        }
        if voucher.is_claimed() {
            return Err(EntitlementError::VoucherTaken);
        }

        let claimed = ClaimedVoucher {
            voucher_id,
            claimed_at: now,
            code: voucher.code.clone(),
            expires_at: voucher.expiry_date,
        };
        // The read above is advisory; this conditional write decides the race.
        let won = self
            .vouchers
            .claim(voucher_id, user_id, &claimed, CLAIM_REWARD_POINTS)
            .await?;
        if !won {
            tracing::info!(%user_id, %voucher_id, "lost claim race");
            return Err(EntitlementError::VoucherTaken);
        }

        tracing::info!(%user_id, %voucher_id, points = CLAIM_REWARD_POINTS, "voucher claimed");
        Ok(ClaimReceipt {
            code: voucher.code,
            title: voucher.title,
            brand: voucher.brand,
            expires_at: voucher.expiry_date,
            points_earned: CLAIM_REWARD_POINTS,
        })
    }
}

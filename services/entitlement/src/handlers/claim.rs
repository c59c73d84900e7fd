use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use uuid::Uuid;

use daypass_auth_types::identity::{IdentityHeaders, MaybeIdentity};
use daypass_domain::id::{UserId, VoucherId};

use crate::error::EntitlementError;
use crate::state::AppState;
use crate::usecase::claim::{ClaimVoucherUseCase, GetClaimStatusUseCase};

// ── GET /vouchers/claim-status ───────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimStatusResponse {
    pub is_authenticated: bool,
    pub can_claim_today: bool,
    pub claimed_voucher_ids: Vec<String>,
}

pub async fn get_claim_status(
    MaybeIdentity(identity): MaybeIdentity,
    State(state): State<AppState>,
) -> Result<Json<ClaimStatusResponse>, EntitlementError> {
    let usecase = GetClaimStatusUseCase {
        users: state.user_repo(),
        clock: state.clock.clone(),
    };
    let status = usecase
        .execute(identity.map(|i| UserId(i.user_id)))
        .await?;
    Ok(Json(ClaimStatusResponse {
        is_authenticated: status.is_authenticated,
        can_claim_today: status.can_claim_today,
        claimed_voucher_ids: status
            .claimed_voucher_ids
            .iter()
            .map(ToString::to_string)
            .collect(),
    }))
}

// ── POST /vouchers/{voucher_id}/claim ────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandResponse {
    pub name: String,
    pub logo_url: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimReceiptResponse {
    pub code: String,
    pub title: String,
    pub brand: BrandResponse,
    #[serde(serialize_with = "daypass_core::serde::to_rfc3339_ms")]
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub points_earned: i64,
}

pub async fn claim_voucher(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Path(voucher_id): Path<String>,
) -> Result<Json<ClaimReceiptResponse>, EntitlementError> {
    // A malformed id cannot name a voucher.
    let voucher_id = voucher_id
        .parse::<Uuid>()
        .map_err(|_| EntitlementError::VoucherNotFound)?;
    let usecase = ClaimVoucherUseCase {
        users: state.user_repo(),
        vouchers: state.voucher_repo(),
        clock: state.clock.clone(),
    };
    let receipt = usecase
        .execute(UserId(identity.user_id), VoucherId(voucher_id))
        .await?;
    Ok(Json(ClaimReceiptResponse {
        code: receipt.code,
        title: receipt.title,
        brand: BrandResponse {
            name: receipt.brand.name,
            logo_url: receipt.brand.logo_url,
        },
        expires_at: receipt.expires_at,
        points_earned: receipt.points_earned,
    }))
}

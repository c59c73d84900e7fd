use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    DbErr, EntityTrait, QueryFilter, QueryOrder, SqlErr, TransactionTrait,
    sea_query::{Expr, OnConflict},
};

use daypass_domain::id::{UserId, VoucherId};
use daypass_domain::user::UserRole;
use daypass_domain::verification::CodePurpose;
use daypass_entitlement_schema::{
    claimed_vouchers, contact_messages, users, verification_codes, vouchers,
};

use crate::domain::repository::{
    MessageRepository, UserRepository, VerificationCodeRepository, VoucherRepository,
};
use crate::domain::types::{
    BrandInfo, ClaimedVoucher, ContactMessage, PendingSignup, User, VerificationCode, Voucher,
};
use crate::error::EntitlementError;

// ── User repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl DbUserRepository {
    async fn with_claims(&self, model: users::Model) -> Result<User, EntitlementError> {
        let claims = claimed_vouchers::Entity::find()
            .filter(claimed_vouchers::Column::UserId.eq(model.id))
            .order_by_asc(claimed_vouchers::Column::ClaimedAt)
            .all(&self.db)
            .await
            .context("list claimed vouchers")?;
        Ok(user_from_model(model, claims))
    }
}

impl UserRepository for DbUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, EntitlementError> {
        let model = users::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .context("find user by id")?;
        match model {
            Some(m) => Ok(Some(self.with_claims(m).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, EntitlementError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .context("find user by email")?;
        match model {
            Some(m) => Ok(Some(self.with_claims(m).await?)),
            None => Ok(None),
        }
    }

    async fn create(&self, user: &User) -> Result<(), EntitlementError> {
        let result = users::ActiveModel {
            id: Set(user.id.0),
            name: Set(user.name.clone()),
            email: Set(user.email.clone()),
            password_hash: Set(user.password_hash.clone()),
            auth_provider: Set(user.auth_provider.clone()),
            role: Set(user.role.as_u8() as i16),
            is_active: Set(user.is_active),
            points: Set(user.points),
            last_claim_at: Set(user.last_claim_at),
            created_at: Set(user.created_at),
            updated_at: Set(user.updated_at),
        }
        .insert(&self.db)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(EntitlementError::EmailTaken)
            }
            Err(e) => Err(anyhow::Error::new(e).context("create user").into()),
        }
    }

    async fn update_password(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), EntitlementError> {
        users::ActiveModel {
            id: Set(id.0),
            password_hash: Set(Some(password_hash.to_owned())),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("update user password")?;
        Ok(())
    }
}

fn user_from_model(model: users::Model, claims: Vec<claimed_vouchers::Model>) -> User {
    User {
        id: UserId(model.id),
        name: model.name,
        email: model.email,
        password_hash: model.password_hash,
        auth_provider: model.auth_provider,
        role: UserRole::from_u8(model.role as u8).unwrap_or(UserRole::User),
        is_active: model.is_active,
        points: model.points,
        last_claim_at: model.last_claim_at,
        claimed_vouchers: claims.into_iter().map(claimed_from_model).collect(),
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

fn claimed_from_model(model: claimed_vouchers::Model) -> ClaimedVoucher {
    ClaimedVoucher {
        voucher_id: VoucherId(model.voucher_id),
        claimed_at: model.claimed_at,
        code: model.code,
        expires_at: model.expires_at,
    }
}

// ── Voucher repository ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbVoucherRepository {
    pub db: DatabaseConnection,
}

impl VoucherRepository for DbVoucherRepository {
    async fn find_by_id(&self, id: VoucherId) -> Result<Option<Voucher>, EntitlementError> {
        let model = vouchers::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .context("find voucher by id")?;
        Ok(model.map(voucher_from_model))
    }

    async fn claim(
        &self,
        voucher_id: VoucherId,
        user_id: UserId,
        claimed: &ClaimedVoucher,
        reward_points: i64,
    ) -> Result<bool, EntitlementError> {
        let claimed = claimed.clone();
        let won = self
            .db
            .transaction::<_, bool, DbErr>(|txn| {
                Box::pin(async move {
                    // Zero rows means someone else set claimed_by first.
                    let taken = vouchers::Entity::update_many()
                        .col_expr(vouchers::Column::ClaimedBy, Expr::value(user_id.0))
                        .col_expr(vouchers::Column::ClaimedAt, Expr::value(claimed.claimed_at))
                        .filter(vouchers::Column::Id.eq(voucher_id.0))
                        .filter(vouchers::Column::ClaimedBy.is_null())
                        .exec(txn)
                        .await?;
                    if taken.rows_affected == 0 {
                        return Ok(false);
                    }

                    insert_claimed_voucher(txn, user_id, &claimed).await?;

                    users::Entity::update_many()
                        .col_expr(
                            users::Column::Points,
                            Expr::col(users::Column::Points).add(reward_points),
                        )
                        .col_expr(users::Column::LastClaimAt, Expr::value(claimed.claimed_at))
                        .col_expr(users::Column::UpdatedAt, Expr::value(claimed.claimed_at))
                        .filter(users::Column::Id.eq(user_id.0))
                        .exec(txn)
                        .await?;

                    Ok(true)
                })
            })
            .await
            .context("claim voucher")?;
        Ok(won)
    }
}

async fn insert_claimed_voucher(
    txn: &DatabaseTransaction,
    user_id: UserId,
    claimed: &ClaimedVoucher,
) -> Result<(), DbErr> {
    claimed_vouchers::ActiveModel {
        voucher_id: Set(claimed.voucher_id.0),
        user_id: Set(user_id.0),
        code: Set(claimed.code.clone()),
        claimed_at: Set(claimed.claimed_at),
        expires_at: Set(claimed.expires_at),
    }
    .insert(txn)
    .await?;
    Ok(())
}

fn voucher_from_model(model: vouchers::Model) -> Voucher {
    Voucher {
        id: VoucherId(model.id),
        code: model.code,
        title: model.title,
        brand: BrandInfo {
            name: model.brand_name,
            logo_url: model.brand_logo_url,
        },
        expiry_date: model.expiry_date,
        is_active: model.is_active,
        claimed_by: model.claimed_by.map(UserId),
        claimed_at: model.claimed_at,
    }
}

// ── Verification code repository ─────────────────────────────────────────────

#[derive(Clone)]
pub struct DbVerificationCodeRepository {
    pub db: DatabaseConnection,
}

impl VerificationCodeRepository for DbVerificationCodeRepository {
    async fn find(
        &self,
        address: &str,
        purpose: CodePurpose,
    ) -> Result<Option<VerificationCode>, EntitlementError> {
        let model =
            verification_codes::Entity::find_by_id((address.to_owned(), purpose.as_str().to_owned()))
                .one(&self.db)
                .await
                .context("find verification code")?;
        match model {
            Some(m) => Ok(Some(code_from_model(m)?)),
            None => Ok(None),
        }
    }

    async fn upsert(&self, code: &VerificationCode) -> Result<(), EntitlementError> {
        let payload = code
            .pending_payload
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .context("encode pending signup")?;
        let model = verification_codes::ActiveModel {
            address: Set(code.address.clone()),
            purpose: Set(code.purpose.as_str().to_owned()),
            code_hash: Set(code.code_hash.clone()),
            attempts: Set(code.attempts as i32),
            max_attempts: Set(code.max_attempts as i32),
            pending_payload: Set(payload),
            created_at: Set(code.created_at),
            expires_at: Set(code.expires_at),
        };
        verification_codes::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    verification_codes::Column::Address,
                    verification_codes::Column::Purpose,
                ])
                .update_columns([
                    verification_codes::Column::CodeHash,
                    verification_codes::Column::Attempts,
                    verification_codes::Column::MaxAttempts,
                    verification_codes::Column::PendingPayload,
                    verification_codes::Column::CreatedAt,
                    verification_codes::Column::ExpiresAt,
                ])
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .context("upsert verification code")?;
        Ok(())
    }

    async fn reserve_attempt(
        &self,
        address: &str,
        purpose: CodePurpose,
        now: DateTime<Utc>,
    ) -> Result<Option<u32>, EntitlementError> {
        let updated = verification_codes::Entity::update_many()
            .col_expr(
                verification_codes::Column::Attempts,
                Expr::col(verification_codes::Column::Attempts).add(1),
            )
            .filter(verification_codes::Column::Address.eq(address))
            .filter(verification_codes::Column::Purpose.eq(purpose.as_str()))
            .filter(
                Expr::col(verification_codes::Column::Attempts)
                    .lt(Expr::col(verification_codes::Column::MaxAttempts)),
            )
            .filter(verification_codes::Column::ExpiresAt.gt(now))
            .exec_with_returning(&self.db)
            .await
            .context("reserve verification attempt")?;
        Ok(updated.first().map(|m| m.attempts as u32))
    }

    async fn consume(
        &self,
        address: &str,
        purpose: CodePurpose,
        code_hash: &str,
    ) -> Result<bool, EntitlementError> {
        let result = verification_codes::Entity::delete_many()
            .filter(verification_codes::Column::Address.eq(address))
            .filter(verification_codes::Column::Purpose.eq(purpose.as_str()))
            .filter(verification_codes::Column::CodeHash.eq(code_hash))
            .exec(&self.db)
            .await
            .context("consume verification code")?;
        Ok(result.rows_affected == 1)
    }

    async fn delete(&self, address: &str, purpose: CodePurpose) -> Result<(), EntitlementError> {
        verification_codes::Entity::delete_many()
            .filter(verification_codes::Column::Address.eq(address))
            .filter(verification_codes::Column::Purpose.eq(purpose.as_str()))
            .exec(&self.db)
            .await
            .context("delete verification code")?;
        Ok(())
    }
}

fn code_from_model(model: verification_codes::Model) -> Result<VerificationCode, EntitlementError> {
    let purpose: CodePurpose = model.purpose.parse().context("decode code purpose")?;
    let pending_payload = model
        .pending_payload
        .map(serde_json::from_value::<PendingSignup>)
        .transpose()
        .context("decode pending signup")?;
    Ok(VerificationCode {
        address: model.address,
        purpose,
        code_hash: model.code_hash,
        attempts: model.attempts as u32,
        max_attempts: model.max_attempts as u32,
        pending_payload,
        created_at: model.created_at,
        expires_at: model.expires_at,
    })
}

// ── Contact message repository ───────────────────────────────────────────────

#[derive(Clone)]
pub struct DbMessageRepository {
    pub db: DatabaseConnection,
}

impl MessageRepository for DbMessageRepository {
    async fn create(&self, message: &ContactMessage) -> Result<(), EntitlementError> {
        contact_messages::ActiveModel {
            id: Set(message.id),
            name: Set(message.name.clone()),
            email: Set(message.email.clone()),
            subject: Set(message.subject.clone()),
            body: Set(message.body.clone()),
            client_ip: Set(message.client_ip.clone()),
            created_at: Set(message.created_at),
        }
        .insert(&self.db)
        .await
        .context("create contact message")?;
        Ok(())
    }
}

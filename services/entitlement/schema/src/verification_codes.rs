use sea_orm::entity::prelude::*;

/// One-time code sent by email. One row per (address, purpose); reissuing replaces it.
/// Expires after 10 minutes; deleted after 5 failed attempts or on success.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "verification_codes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub address: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub purpose: String,
    /// Hex SHA-256 of the code.
    pub code_hash: String,
    pub attempts: i32,
    pub max_attempts: i32,
    /// Signup only: `{ "name": ..., "password_hash": ... }`.
    pub pending_payload: Option<Json>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

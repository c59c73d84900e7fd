use sea_orm::entity::prelude::*;

/// Claimable voucher. `claimed_by` transitions from NULL to a user id exactly once.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "vouchers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Redeemable secret; only revealed to the claiming user.
    pub code: String,
    pub title: String,
    pub brand_name: String,
    pub brand_logo_url: Option<String>,
    pub expiry_date: chrono::DateTime<chrono::Utc>,
    pub is_active: bool,
    pub claimed_by: Option<Uuid>,
    pub claimed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

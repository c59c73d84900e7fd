use sea_orm::entity::prelude::*;

/// Registered account. Created only after a signup code is verified.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    /// bcrypt hash; `None` for federated accounts.
    pub password_hash: Option<String>,
    pub auth_provider: String,
    pub role: i16,
    pub is_active: bool,
    pub points: i64,
    pub last_claim_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::claimed_vouchers::Entity")]
    ClaimedVouchers,
}

impl Related<super::claimed_vouchers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClaimedVouchers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

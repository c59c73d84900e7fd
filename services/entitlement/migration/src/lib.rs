pub use sea_orm_migration::prelude::*;

mod m20261001_000001_create_users;
mod m20261001_000002_create_vouchers;
mod m20261001_000003_create_claimed_vouchers;
mod m20261001_000004_create_verification_codes;
mod m20261001_000005_create_contact_messages;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261001_000001_create_users::Migration),
            Box::new(m20261001_000002_create_vouchers::Migration),
            Box::new(m20261001_000003_create_claimed_vouchers::Migration),
            Box::new(m20261001_000004_create_verification_codes::Migration),
            Box::new(m20261001_000005_create_contact_messages::Migration),
        ]
    }
}

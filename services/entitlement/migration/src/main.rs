use sea_orm_migration::prelude::*;

use daypass_entitlement_migration::Migrator;

#[tokio::main]
async fn main() {
    cli::run_cli(Migrator).await;
}

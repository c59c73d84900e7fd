use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Vouchers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Vouchers::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Vouchers::Code).string().not_null())
                    .col(ColumnDef::new(Vouchers::Title).string().not_null())
                    .col(ColumnDef::new(Vouchers::BrandName).string().not_null())
                    .col(ColumnDef::new(Vouchers::BrandLogoUrl).string())
                    .col(
                        ColumnDef::new(Vouchers::ExpiryDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Vouchers::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Vouchers::ClaimedBy).uuid())
                    .col(ColumnDef::new(Vouchers::ClaimedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Vouchers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Vouchers::Table, Vouchers::ClaimedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Claimable-pool listing filters on unclaimed vouchers.
        manager
            .create_index(
                Index::create()
                    .table(Vouchers::Table)
                    .col(Vouchers::ClaimedBy)
                    .name("idx_vouchers_claimed_by")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Vouchers::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Vouchers {
    Table,
    Id,
    Code,
    Title,
    BrandName,
    BrandLogoUrl,
    ExpiryDate,
    IsActive,
    ClaimedBy,
    ClaimedAt,
    CreatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}

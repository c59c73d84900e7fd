use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ClaimedVouchers::Table)
                    .if_not_exists()
                    // Primary key on voucher_id: a voucher appears once across all users.
                    .col(
                        ColumnDef::new(ClaimedVouchers::VoucherId)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ClaimedVouchers::UserId).uuid().not_null())
                    .col(ColumnDef::new(ClaimedVouchers::Code).string().not_null())
                    .col(
                        ColumnDef::new(ClaimedVouchers::ClaimedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ClaimedVouchers::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ClaimedVouchers::Table, ClaimedVouchers::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ClaimedVouchers::Table, ClaimedVouchers::VoucherId)
                            .to(Vouchers::Table, Vouchers::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(ClaimedVouchers::Table)
                    .col(ClaimedVouchers::UserId)
                    .col(ClaimedVouchers::ClaimedAt)
                    .name("idx_claimed_vouchers_user_id_claimed_at")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ClaimedVouchers::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ClaimedVouchers {
    Table,
    VoucherId,
    UserId,
    Code,
    ClaimedAt,
    ExpiresAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}

#[derive(Iden)]
enum Vouchers {
    Table,
    Id,
}

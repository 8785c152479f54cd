use sea_orm_migration::{prelude::*, schema::*};

use crate::m20260301_000000_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Organizations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Organizations::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(string_len(Organizations::Name, 255))
                    .col(string_len_null(Organizations::Email, 255))
                    .col(
                        ColumnDef::new(Organizations::Status)
                            .string_len(32)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Organizations::AdminUserId).big_integer().null())
                    .col(timestamp_with_time_zone(Organizations::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp_with_time_zone(Organizations::UpdatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_organizations_admin_user")
                            .from(Organizations::Table, Organizations::AdminUserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Organizations::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Organizations {
    Table,
    Id,
    Name,
    Email,
    Status,
    AdminUserId,
    CreatedAt,
    UpdatedAt,
}

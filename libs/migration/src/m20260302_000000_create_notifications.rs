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
                    .table(Notifications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notifications::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Notifications::UserId).big_integer().not_null())
                    .col(string_len_null(Notifications::Title, 255))
                    .col(text(Notifications::Message))
                    .col(string_len(Notifications::NotificationType, 50))
                    .col(
                        ColumnDef::new(Notifications::Priority)
                            .string_len(20)
                            .not_null()
                            .default("normal"),
                    )
                    .col(boolean(Notifications::IsRead).default(false))
                    .col(timestamp_with_time_zone_null(Notifications::ReadAt))
                    .col(boolean(Notifications::EmailSent).default(false))
                    .col(timestamp_with_time_zone_null(Notifications::EmailSentAt))
                    .col(json_binary_null(Notifications::Data))
                    .col(timestamp_with_time_zone(Notifications::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp_with_time_zone(Notifications::UpdatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notifications_user")
                            .from(Notifications::Table, Notifications::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_notifications_user_id")
                    .table(Notifications::Table)
                    .col(Notifications::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_notifications_created_at")
                    .table(Notifications::Table)
                    .col(Notifications::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Notifications::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Notifications {
    Table,
    Id,
    UserId,
    Title,
    Message,
    NotificationType,
    Priority,
    IsRead,
    ReadAt,
    EmailSent,
    EmailSentAt,
    Data,
    CreatedAt,
    UpdatedAt,
}

use sea_orm_migration::{prelude::*, schema::*};

use crate::m20260301_000000_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

fn flag(column: NotificationPreferences, default: bool) -> ColumnDef {
    ColumnDef::new(column).boolean().not_null().default(default).to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        use NotificationPreferences as P;

        manager
            .create_table(
                Table::create()
                    .table(P::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(P::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(P::UserId).big_integer().not_null().unique_key())
                    .col(flag(P::EmailWelcome, true))
                    .col(flag(P::EmailOrganizationUpdates, true))
                    .col(flag(P::EmailContactMessages, true))
                    .col(flag(P::EmailSystemAnnouncements, true))
                    .col(flag(P::EmailSecurityAlerts, true))
                    .col(flag(P::EmailBookmarkDigest, false))
                    .col(flag(P::EmailReminders, true))
                    .col(flag(P::InappWelcome, true))
                    .col(flag(P::InappOrganizationUpdates, true))
                    .col(flag(P::InappContactMessages, true))
                    .col(flag(P::InappSystemAnnouncements, true))
                    .col(flag(P::InappSecurityAlerts, true))
                    .col(flag(P::InappBookmarkDigest, true))
                    .col(flag(P::InappReminders, true))
                    .col(
                        ColumnDef::new(P::FrequencyDigest)
                            .string_len(20)
                            .not_null()
                            .default("weekly"),
                    )
                    .col(string_len(P::Timezone, 50).default("UTC"))
                    .col(string_len(P::Language, 10).default("en"))
                    .col(timestamp_with_time_zone(P::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp_with_time_zone(P::UpdatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notification_preferences_user")
                            .from(P::Table, P::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(NotificationPreferences::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum NotificationPreferences {
    Table,
    Id,
    UserId,
    EmailWelcome,
    EmailOrganizationUpdates,
    EmailContactMessages,
    EmailSystemAnnouncements,
    EmailSecurityAlerts,
    EmailBookmarkDigest,
    EmailReminders,
    InappWelcome,
    InappOrganizationUpdates,
    InappContactMessages,
    InappSystemAnnouncements,
    InappSecurityAlerts,
    InappBookmarkDigest,
    InappReminders,
    FrequencyDigest,
    Timezone,
    Language,
    CreatedAt,
    UpdatedAt,
}

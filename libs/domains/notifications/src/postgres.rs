use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain_users::UserId;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

use crate::{
    entity::{notification, preference},
    error::{NotificationError, NotificationResult},
    models::{NewNotification, Notification, NotificationId, NotificationPriority, NotificationStats, NotificationType},
    preference::NotificationPreference,
    repository::{NotificationRepository, PreferenceRepository},
};

pub struct PgNotificationRepository {
    db: DatabaseConnection,
}

impl PgNotificationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn create(&self, input: NewNotification) -> NotificationResult<Notification> {
        let active: notification::ActiveModel = input.into();
        let model = active.insert(&self.db).await?;

        tracing::debug!(notification_id = model.id, user_id = model.user_id, "Inserted notification");
        Ok(model.into())
    }

    async fn get_by_id(&self, id: NotificationId) -> NotificationResult<Option<Notification>> {
        let model = notification::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Into::into))
    }

    async fn list_for_user(&self, user_id: UserId) -> NotificationResult<Vec<Notification>> {
        let models = notification::Entity::find()
            .filter(notification::Column::UserId.eq(user_id))
            .order_by_desc(notification::Column::CreatedAt)
            .order_by_desc(notification::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn count_for_user(&self, user_id: UserId) -> NotificationResult<u64> {
        let count = notification::Entity::find()
            .filter(notification::Column::UserId.eq(user_id))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    async fn mark_email_sent(&self, id: NotificationId, at: DateTime<Utc>) -> NotificationResult<()> {
        let result = notification::Entity::update_many()
            .col_expr(notification::Column::EmailSent, Expr::value(true))
            .col_expr(notification::Column::EmailSentAt, Expr::value(at))
            .col_expr(notification::Column::UpdatedAt, Expr::value(at))
            .filter(notification::Column::Id.eq(id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(NotificationError::DatabaseError(format!("Notification {} not found", id)));
        }
        Ok(())
    }

    async fn stats_since(&self, since: DateTime<Utc>, period_days: u32) -> NotificationResult<NotificationStats> {
        let recent = || notification::Entity::find().filter(notification::Column::CreatedAt.gte(since));

        let total = recent().count(&self.db).await?;
        let unread = recent()
            .filter(notification::Column::IsRead.eq(false))
            .count(&self.db)
            .await?;

        let by_type: Vec<(NotificationType, i64)> = recent()
            .select_only()
            .column(notification::Column::NotificationType)
            .column_as(notification::Column::Id.count(), "count")
            .group_by(notification::Column::NotificationType)
            .into_tuple()
            .all(&self.db)
            .await?;

        let by_priority: Vec<(NotificationPriority, i64)> = recent()
            .select_only()
            .column(notification::Column::Priority)
            .column_as(notification::Column::Id.count(), "count")
            .group_by(notification::Column::Priority)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(NotificationStats {
            period_days,
            total,
            unread,
            by_type: by_type.into_iter().map(|(t, n)| (t, n as u64)).collect(),
            by_priority: by_priority.into_iter().map(|(p, n)| (p, n as u64)).collect(),
        })
    }
}

pub struct PgPreferenceRepository {
    db: DatabaseConnection,
}

impl PgPreferenceRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_model(&self, user_id: UserId) -> NotificationResult<Option<preference::Model>> {
        let model = preference::Entity::find()
            .filter(preference::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;
        Ok(model)
    }
}

#[async_trait]
impl PreferenceRepository for PgPreferenceRepository {
    async fn get_for_user(&self, user_id: UserId) -> NotificationResult<Option<NotificationPreference>> {
        Ok(self.find_model(user_id).await?.map(Into::into))
    }

    async fn create_default(&self, user_id: UserId) -> NotificationResult<NotificationPreference> {
        let defaults = NotificationPreference::defaults_for(0, user_id);

        preference::Entity::insert(preference::active_model(&defaults, false))
            .on_conflict(
                OnConflict::column(preference::Column::UserId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        let model = self.find_model(user_id).await?.ok_or_else(|| {
            NotificationError::DatabaseError(format!("Preferences for user {} missing after insert", user_id))
        })?;

        tracing::debug!(user_id, "Created default notification preferences");
        Ok(model.into())
    }

    async fn save(&self, mut prefs: NotificationPreference) -> NotificationResult<NotificationPreference> {
        prefs.updated_at = Utc::now();

        let model = match self.find_model(prefs.user_id).await? {
            Some(existing) => {
                prefs.id = existing.id;
                prefs.created_at = existing.created_at.into();
                preference::active_model(&prefs, true).update(&self.db).await?
            }
            None => preference::active_model(&prefs, false).insert(&self.db).await?,
        };

        Ok(model.into())
    }

    async fn delete_for_user(&self, user_id: UserId) -> NotificationResult<bool> {
        let result = preference::Entity::delete_many()
            .filter(preference::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preference::DigestFrequency;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn notification_row(id: i64, user_id: i64) -> notification::Model {
        let now = Utc::now();
        notification::Model {
            id,
            user_id,
            title: Some("Welcome to Charity Directory!".into()),
            message: "Welcome Ana!".into(),
            notification_type: NotificationType::Welcome,
            priority: NotificationPriority::High,
            is_read: false,
            read_at: None,
            email_sent: false,
            email_sent_at: None,
            data: None,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    fn preference_row(id: i64, user_id: i64) -> preference::Model {
        let prefs = NotificationPreference::defaults_for(id, user_id);
        preference::Model {
            id,
            user_id,
            email_welcome: true,
            email_organization_updates: true,
            email_contact_messages: true,
            email_system_announcements: true,
            email_security_alerts: false,
            email_bookmark_digest: false,
            email_reminders: true,
            inapp_welcome: true,
            inapp_organization_updates: true,
            inapp_contact_messages: true,
            inapp_system_announcements: true,
            inapp_security_alerts: true,
            inapp_bookmark_digest: true,
            inapp_reminders: true,
            frequency_digest: DigestFrequency::Weekly,
            timezone: prefs.timezone,
            language: prefs.language,
            created_at: prefs.created_at.into(),
            updated_at: prefs.updated_at.into(),
        }
    }

    #[tokio::test]
    async fn test_create_returns_inserted_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![notification_row(11, 42)]])
            .into_connection();
        let repo = PgNotificationRepository::new(db);

        let created = repo
            .create(NewNotification {
                user_id: 42,
                title: Some("Welcome to Charity Directory!".into()),
                message: "Welcome Ana!".into(),
                notification_type: NotificationType::Welcome,
                priority: NotificationPriority::High,
                data: None,
            })
            .await
            .unwrap();

        assert_eq!(created.id, 11);
        assert_eq!(created.user_id, 42);
        assert_eq!(created.priority, NotificationPriority::High);
    }

    #[tokio::test]
    async fn test_mark_email_sent_missing_row_errors() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let repo = PgNotificationRepository::new(db);

        assert!(repo.mark_email_sent(5, Utc::now()).await.is_err());
    }

    #[tokio::test]
    async fn test_get_for_user_maps_flags() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![preference_row(1, 42)]])
            .into_connection();
        let repo = PgPreferenceRepository::new(db);

        let prefs = repo.get_for_user(42).await.unwrap().unwrap();
        assert!(!prefs.email.security_alerts);
        assert!(prefs.in_app.security_alerts);
    }

    #[tokio::test]
    async fn test_create_default_reads_back_existing_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .append_query_results([vec![preference_row(3, 9)]])
            .into_connection();
        let repo = PgPreferenceRepository::new(db);

        let prefs = repo.create_default(9).await.unwrap();
        assert_eq!(prefs.id, 3);
        assert_eq!(prefs.user_id, 9);
    }
}

use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;

use crate::models::{NewNotification, Notification, NotificationPriority, NotificationType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub title: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    pub notification_type: NotificationType,
    pub priority: NotificationPriority,
    pub is_read: bool,
    pub read_at: Option<DateTimeWithTimeZone>,
    pub email_sent: bool,
    pub email_sent_at: Option<DateTimeWithTimeZone>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub data: Option<Json>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Notification {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            title: model.title,
            message: model.message,
            notification_type: model.notification_type,
            priority: model.priority,
            is_read: model.is_read,
            read_at: model.read_at.map(Into::into),
            email_sent: model.email_sent,
            email_sent_at: model.email_sent_at.map(Into::into),
            data: model.data,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<NewNotification> for ActiveModel {
    fn from(input: NewNotification) -> Self {
        let now = chrono::Utc::now();
        ActiveModel {
            id: NotSet,
            user_id: Set(input.user_id),
            title: Set(input.title),
            message: Set(input.message),
            notification_type: Set(input.notification_type),
            priority: Set(input.priority),
            is_read: Set(false),
            read_at: Set(None),
            email_sent: Set(false),
            email_sent_at: Set(None),
            data: Set(input.data),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
    }
}

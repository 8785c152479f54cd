use chrono::{DateTime, Utc};
use domain_users::UserId;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumString, IntoStaticStr};

pub type NotificationId = i64;

/// Semantic category tag of a notification.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
    DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationType {
    #[sea_orm(string_value = "welcome")]
    Welcome,
    #[sea_orm(string_value = "email_verification")]
    EmailVerification,
    #[sea_orm(string_value = "password_reset")]
    PasswordReset,
    #[sea_orm(string_value = "organization_approved")]
    OrganizationApproved,
    #[sea_orm(string_value = "organization_rejected")]
    OrganizationRejected,
    #[sea_orm(string_value = "contact_message")]
    ContactMessage,
    #[sea_orm(string_value = "bookmark_digest")]
    BookmarkDigest,
    #[sea_orm(string_value = "system_announcement")]
    SystemAnnouncement,
    #[sea_orm(string_value = "security_alert")]
    SecurityAlert,
    #[sea_orm(string_value = "reminder")]
    Reminder,
    #[sea_orm(string_value = "general")]
    General,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationPriority {
    #[sea_orm(string_value = "low")]
    Low,
    #[default]
    #[sea_orm(string_value = "normal")]
    Normal,
    #[sea_orm(string_value = "high")]
    High,
    #[sea_orm(string_value = "urgent")]
    Urgent,
}

/// An in-app notification. Rows are append-only apart from the read and
/// email-sent markers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub title: Option<String>,
    pub message: String,
    pub notification_type: NotificationType,
    pub priority: NotificationPriority,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub email_sent: bool,
    pub email_sent_at: Option<DateTime<Utc>>,
    /// Free-form payload for the client
    pub data: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(id: NotificationId, input: NewNotification) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id: input.user_id,
            title: input.title,
            message: input.message,
            notification_type: input.notification_type,
            priority: input.priority,
            is_read: false,
            read_at: None,
            email_sent: false,
            email_sent_at: None,
            data: input.data,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn mark_as_read(&mut self) {
        let now = Utc::now();
        self.is_read = true;
        self.read_at = Some(now);
        self.updated_at = now;
    }

    pub fn mark_email_sent(&mut self, at: DateTime<Utc>) {
        self.email_sent = true;
        self.email_sent_at = Some(at);
        self.updated_at = at;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewNotification {
    pub user_id: UserId,
    pub title: Option<String>,
    pub message: String,
    pub notification_type: NotificationType,
    #[serde(default)]
    pub priority: NotificationPriority,
    pub data: Option<serde_json::Value>,
}

/// Aggregate counts over a recent window.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NotificationStats {
    pub period_days: u32,
    pub total: u64,
    pub unread: u64,
    pub by_type: BTreeMap<NotificationType, u64>,
    pub by_priority: BTreeMap<NotificationPriority, u64>,
}

impl NotificationStats {
    /// Tally notifications created at or after `since`.
    pub fn tally<'a>(
        notifications: impl IntoIterator<Item = &'a Notification>,
        since: DateTime<Utc>,
        period_days: u32,
    ) -> Self {
        let mut stats = Self {
            period_days,
            ..Default::default()
        };
        for n in notifications.into_iter().filter(|n| n.created_at >= since) {
            stats.total += 1;
            if !n.is_read {
                stats.unread += 1;
            }
            *stats.by_type.entry(n.notification_type).or_default() += 1;
            *stats.by_priority.entry(n.priority).or_default() += 1;
        }
        stats
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain_users::UserId;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

use crate::error::{NotificationError, NotificationResult};
use crate::models::{NewNotification, Notification, NotificationId, NotificationStats};
use crate::preference::NotificationPreference;

/// Append-only store of in-app notifications.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, input: NewNotification) -> NotificationResult<Notification>;

    async fn get_by_id(&self, id: NotificationId) -> NotificationResult<Option<Notification>>;

    async fn list_for_user(&self, user_id: UserId) -> NotificationResult<Vec<Notification>>;

    async fn count_for_user(&self, user_id: UserId) -> NotificationResult<u64>;

    async fn mark_email_sent(&self, id: NotificationId, at: DateTime<Utc>) -> NotificationResult<()>;

    /// Counts over notifications created at or after `since`
    async fn stats_since(&self, since: DateTime<Utc>, period_days: u32) -> NotificationResult<NotificationStats>;
}

/// One preference record per user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PreferenceRepository: Send + Sync {
    async fn get_for_user(&self, user_id: UserId) -> NotificationResult<Option<NotificationPreference>>;

    /// Insert the default record, or return the existing one if another
    /// writer got there first.
    async fn create_default(&self, user_id: UserId) -> NotificationResult<NotificationPreference>;

    async fn save(&self, prefs: NotificationPreference) -> NotificationResult<NotificationPreference>;

    /// Remove the user's record. Returns whether one existed.
    async fn delete_for_user(&self, user_id: UserId) -> NotificationResult<bool>;
}

/// In-memory implementation of NotificationRepository (for development/testing)
#[derive(Debug, Clone)]
pub struct InMemoryNotificationRepository {
    notifications: Arc<RwLock<HashMap<NotificationId, Notification>>>,
    next_id: Arc<AtomicI64>,
}

impl Default for InMemoryNotificationRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryNotificationRepository {
    pub fn new() -> Self {
        Self {
            notifications: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }

    pub async fn len(&self) -> usize {
        self.notifications.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.notifications.read().await.is_empty()
    }

    /// Every stored row, ordered by id.
    pub async fn all(&self) -> Vec<Notification> {
        let mut rows: Vec<Notification> = self.notifications.read().await.values().cloned().collect();
        rows.sort_by_key(|n| n.id);
        rows
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn create(&self, input: NewNotification) -> NotificationResult<Notification> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let notification = Notification::new(id, input);
        self.notifications.write().await.insert(id, notification.clone());
        Ok(notification)
    }

    async fn get_by_id(&self, id: NotificationId) -> NotificationResult<Option<Notification>> {
        Ok(self.notifications.read().await.get(&id).cloned())
    }

    async fn list_for_user(&self, user_id: UserId) -> NotificationResult<Vec<Notification>> {
        let mut rows: Vec<Notification> = self
            .notifications
            .read()
            .await
            .values()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn count_for_user(&self, user_id: UserId) -> NotificationResult<u64> {
        let rows = self.notifications.read().await;
        Ok(rows.values().filter(|n| n.user_id == user_id).count() as u64)
    }

    async fn mark_email_sent(&self, id: NotificationId, at: DateTime<Utc>) -> NotificationResult<()> {
        let mut rows = self.notifications.write().await;
        let notification = rows
            .get_mut(&id)
            .ok_or_else(|| NotificationError::DatabaseError(format!("Notification {} not found", id)))?;
        notification.mark_email_sent(at);
        Ok(())
    }

    async fn stats_since(&self, since: DateTime<Utc>, period_days: u32) -> NotificationResult<NotificationStats> {
        let rows = self.notifications.read().await;
        Ok(NotificationStats::tally(rows.values(), since, period_days))
    }
}

/// In-memory implementation of PreferenceRepository (for development/testing)
#[derive(Debug, Clone)]
pub struct InMemoryPreferenceRepository {
    preferences: Arc<RwLock<HashMap<UserId, NotificationPreference>>>,
    next_id: Arc<AtomicI64>,
}

impl Default for InMemoryPreferenceRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPreferenceRepository {
    pub fn new() -> Self {
        Self {
            preferences: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }
}

#[async_trait]
impl PreferenceRepository for InMemoryPreferenceRepository {
    async fn get_for_user(&self, user_id: UserId) -> NotificationResult<Option<NotificationPreference>> {
        Ok(self.preferences.read().await.get(&user_id).cloned())
    }

    async fn create_default(&self, user_id: UserId) -> NotificationResult<NotificationPreference> {
        let mut prefs = self.preferences.write().await;
        let record = prefs.entry(user_id).or_insert_with(|| {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            NotificationPreference::defaults_for(id, user_id)
        });
        Ok(record.clone())
    }

    async fn save(&self, mut prefs: NotificationPreference) -> NotificationResult<NotificationPreference> {
        let mut store = self.preferences.write().await;
        match store.get(&prefs.user_id) {
            Some(existing) => prefs.id = existing.id,
            None => prefs.id = self.next_id.fetch_add(1, Ordering::SeqCst),
        }
        store.insert(prefs.user_id, prefs.clone());
        Ok(prefs)
    }

    async fn delete_for_user(&self, user_id: UserId) -> NotificationResult<bool> {
        Ok(self.preferences.write().await.remove(&user_id).is_some())
    }
}

use domain_users::UserId;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::error::NotificationResult;
use crate::preference::{BulkPreferenceToggle, NotificationPreference, PreferenceSummary, UpdatePreferences};
use crate::repository::PreferenceRepository;

/// Reads and edits a user's notification preferences.
///
/// Works over a concrete repository or `dyn PreferenceRepository`.
pub struct PreferenceService<R: PreferenceRepository + ?Sized> {
    repository: Arc<R>,
}

impl<R: PreferenceRepository + ?Sized> Clone for PreferenceService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: PreferenceRepository> PreferenceService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }
}

impl<R: PreferenceRepository + ?Sized> PreferenceService<R> {
    pub fn from_arc(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// The stored record, created with defaults on first access.
    pub async fn get_or_create(&self, user_id: UserId) -> NotificationResult<NotificationPreference> {
        match self.repository.get_for_user(user_id).await? {
            Some(prefs) => Ok(prefs),
            None => self.repository.create_default(user_id).await,
        }
    }

    /// Apply a partial update. Flags not named keep their value.
    pub async fn update(&self, user_id: UserId, input: UpdatePreferences) -> NotificationResult<NotificationPreference> {
        input.validate()?;

        let mut prefs = self.get_or_create(user_id).await?;
        prefs.apply(&input);
        let saved = self.repository.save(prefs).await?;

        info!(user_id, "Updated notification preferences");
        Ok(saved)
    }

    pub async fn apply_bulk(
        &self,
        user_id: UserId,
        toggle: BulkPreferenceToggle,
    ) -> NotificationResult<NotificationPreference> {
        let mut prefs = self.get_or_create(user_id).await?;
        prefs.apply_bulk(&toggle);
        let saved = self.repository.save(prefs).await?;

        info!(user_id, ?toggle, "Applied bulk preference toggle");
        Ok(saved)
    }

    /// Counts for the stored record, or for the defaults when the user has
    /// none yet. Never creates a record.
    pub async fn summary(&self, user_id: UserId) -> NotificationResult<PreferenceSummary> {
        let summary = match self.repository.get_for_user(user_id).await? {
            Some(prefs) => prefs.summary(),
            None => NotificationPreference::defaults_for(0, user_id).summary(),
        };
        Ok(summary)
    }

    /// Drop the stored record and start again from defaults.
    pub async fn reset(&self, user_id: UserId) -> NotificationResult<NotificationPreference> {
        self.repository.delete_for_user(user_id).await?;
        let prefs = self.repository.create_default(user_id).await?;

        info!(user_id, "Reset notification preferences to defaults");
        Ok(prefs)
    }
}

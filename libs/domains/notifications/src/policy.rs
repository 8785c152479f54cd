//! Type-to-category mapping used to gate each channel.
//!
//! A [`PreferencePolicy`] is built once at startup and shared behind an `Arc`;
//! it has no interior mutability.

use sea_orm::Iterable;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::NotificationType;
use crate::outcome::SkipReason;
use crate::preference::{Channel, NotificationCategory, NotificationPreference};

/// What to do with a type that has no category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmappedTypePolicy {
    /// Channels follow the caller's request only
    #[default]
    Allow,
    Deny,
}

/// Whether a channel may be attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    Open,
    Closed(SkipReason),
}

impl Gate {
    pub fn is_open(&self) -> bool {
        matches!(self, Gate::Open)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreferencePolicy {
    categories: HashMap<NotificationType, NotificationCategory>,
    unmapped: UnmappedTypePolicy,
}

impl Default for PreferencePolicy {
    fn default() -> Self {
        Self::standard()
    }
}

impl PreferencePolicy {
    /// The directory's standard mapping. Every type has a category.
    pub fn standard() -> Self {
        use NotificationCategory as C;
        use NotificationType as T;

        Self::from_entries([
            (T::Welcome, C::Welcome),
            (T::EmailVerification, C::Welcome),
            (T::PasswordReset, C::SecurityAlerts),
            (T::SecurityAlert, C::SecurityAlerts),
            (T::OrganizationApproved, C::OrganizationUpdates),
            (T::OrganizationRejected, C::OrganizationUpdates),
            (T::ContactMessage, C::ContactMessages),
            (T::BookmarkDigest, C::BookmarkDigest),
            (T::SystemAnnouncement, C::SystemAnnouncements),
            (T::General, C::SystemAnnouncements),
            (T::Reminder, C::Reminders),
        ])
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (NotificationType, NotificationCategory)>) -> Self {
        Self {
            categories: entries.into_iter().collect(),
            unmapped: UnmappedTypePolicy::default(),
        }
    }

    pub fn with_unmapped(mut self, unmapped: UnmappedTypePolicy) -> Self {
        self.unmapped = unmapped;
        self
    }

    pub fn category_for(&self, ty: NotificationType) -> Option<NotificationCategory> {
        self.categories.get(&ty).copied()
    }

    /// Types with no category, in declaration order.
    pub fn unmapped_types(&self) -> Vec<NotificationType> {
        NotificationType::iter()
            .filter(|ty| !self.categories.contains_key(ty))
            .collect()
    }

    /// Decide whether `channel` may be attempted for `ty`.
    ///
    /// Evaluation order: the caller's request, then the unmapped-type rule
    /// (which applies whether or not the user has preferences), then the
    /// user's flag. A user with no preference record is never opted out.
    pub fn resolve(
        &self,
        prefs: Option<&NotificationPreference>,
        ty: NotificationType,
        channel: Channel,
        requested: bool,
    ) -> Gate {
        if !requested {
            return Gate::Closed(SkipReason::NotRequested);
        }

        let Some(category) = self.category_for(ty) else {
            return match self.unmapped {
                UnmappedTypePolicy::Allow => Gate::Open,
                UnmappedTypePolicy::Deny => Gate::Closed(SkipReason::UnmappedType),
            };
        };

        match prefs {
            Some(prefs) if !prefs.flag(channel, category) => {
                Gate::Closed(SkipReason::OptedOut { category })
            }
            _ => Gate::Open,
        }
    }
}

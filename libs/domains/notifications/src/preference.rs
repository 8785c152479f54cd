//! Per-user channel preferences.
//!
//! Flags are addressed by `(Channel, NotificationCategory)` rather than by
//! column name, so adding a category is a compile-time change everywhere
//! flags are read.

use chrono::{DateTime, Utc};
use domain_users::UserId;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumString, IntoEnumIterator};
use validator::Validate;

pub type PreferenceId = i64;

/// Preference bucket that one or more notification types map onto.
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
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationCategory {
    Welcome,
    OrganizationUpdates,
    ContactMessages,
    SystemAnnouncements,
    SecurityAlerts,
    BookmarkDigest,
    Reminders,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Channel {
    Email,
    InApp,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::InApp => "in_app",
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
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
pub enum DigestFrequency {
    #[sea_orm(string_value = "daily")]
    Daily,
    #[default]
    #[sea_orm(string_value = "weekly")]
    Weekly,
    #[sea_orm(string_value = "monthly")]
    Monthly,
}

/// One boolean per category for a single channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryFlags {
    pub welcome: bool,
    pub organization_updates: bool,
    pub contact_messages: bool,
    pub system_announcements: bool,
    pub security_alerts: bool,
    pub bookmark_digest: bool,
    pub reminders: bool,
}

impl CategoryFlags {
    pub fn all(enabled: bool) -> Self {
        Self {
            welcome: enabled,
            organization_updates: enabled,
            contact_messages: enabled,
            system_announcements: enabled,
            security_alerts: enabled,
            bookmark_digest: enabled,
            reminders: enabled,
        }
    }

    pub fn get(&self, category: NotificationCategory) -> bool {
        match category {
            NotificationCategory::Welcome => self.welcome,
            NotificationCategory::OrganizationUpdates => self.organization_updates,
            NotificationCategory::ContactMessages => self.contact_messages,
            NotificationCategory::SystemAnnouncements => self.system_announcements,
            NotificationCategory::SecurityAlerts => self.security_alerts,
            NotificationCategory::BookmarkDigest => self.bookmark_digest,
            NotificationCategory::Reminders => self.reminders,
        }
    }

    pub fn set(&mut self, category: NotificationCategory, enabled: bool) {
        let slot = match category {
            NotificationCategory::Welcome => &mut self.welcome,
            NotificationCategory::OrganizationUpdates => &mut self.organization_updates,
            NotificationCategory::ContactMessages => &mut self.contact_messages,
            NotificationCategory::SystemAnnouncements => &mut self.system_announcements,
            NotificationCategory::SecurityAlerts => &mut self.security_alerts,
            NotificationCategory::BookmarkDigest => &mut self.bookmark_digest,
            NotificationCategory::Reminders => &mut self.reminders,
        };
        *slot = enabled;
    }

    pub fn enabled_count(&self) -> usize {
        NotificationCategory::iter().filter(|c| self.get(*c)).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPreference {
    pub id: PreferenceId,
    pub user_id: UserId,
    pub email: CategoryFlags,
    pub in_app: CategoryFlags,
    pub frequency_digest: DigestFrequency,
    pub timezone: String,
    pub language: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NotificationPreference {
    /// Lazily-created defaults: everything on except the bookmark digest email.
    pub fn defaults_for(id: PreferenceId, user_id: UserId) -> Self {
        let now = Utc::now();
        let mut email = CategoryFlags::all(true);
        email.bookmark_digest = false;

        Self {
            id,
            user_id,
            email,
            in_app: CategoryFlags::all(true),
            frequency_digest: DigestFrequency::default(),
            timezone: "UTC".to_string(),
            language: "en".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn flags(&self, channel: Channel) -> &CategoryFlags {
        match channel {
            Channel::Email => &self.email,
            Channel::InApp => &self.in_app,
        }
    }

    pub fn flags_mut(&mut self, channel: Channel) -> &mut CategoryFlags {
        match channel {
            Channel::Email => &mut self.email,
            Channel::InApp => &mut self.in_app,
        }
    }

    pub fn flag(&self, channel: Channel, category: NotificationCategory) -> bool {
        self.flags(channel).get(category)
    }

    pub fn set_flag(&mut self, channel: Channel, category: NotificationCategory, enabled: bool) {
        self.flags_mut(channel).set(category, enabled);
    }

    /// Apply a partial update. Absent fields keep their current value.
    pub fn apply(&mut self, update: &UpdatePreferences) {
        for (category, enabled) in &update.email {
            self.email.set(*category, *enabled);
        }
        for (category, enabled) in &update.in_app {
            self.in_app.set(*category, *enabled);
        }
        if let Some(frequency) = update.frequency_digest {
            self.frequency_digest = frequency;
        }
        if let Some(timezone) = &update.timezone {
            self.timezone = timezone.clone();
        }
        if let Some(language) = &update.language {
            self.language = language.clone();
        }
        self.updated_at = Utc::now();
    }

    pub fn apply_bulk(&mut self, toggle: &BulkPreferenceToggle) {
        if toggle.enable_all_emails {
            self.email = CategoryFlags::all(true);
        }
        if toggle.disable_all_emails {
            self.email = CategoryFlags::all(false);
        }
        if toggle.enable_all_inapp {
            self.in_app = CategoryFlags::all(true);
        }
        if toggle.disable_all_inapp {
            self.in_app = CategoryFlags::all(false);
        }
        self.updated_at = Utc::now();
    }

    pub fn summary(&self) -> PreferenceSummary {
        let total = NotificationCategory::iter().count();
        let email_enabled = self.email.enabled_count();
        let inapp_enabled = self.in_app.enabled_count();

        PreferenceSummary {
            total_enabled: email_enabled + inapp_enabled,
            email_enabled,
            inapp_enabled,
            email_disabled: total - email_enabled,
            inapp_disabled: total - inapp_enabled,
            frequency_digest: self.frequency_digest,
            timezone: self.timezone.clone(),
            language: self.language.clone(),
        }
    }
}

/// Partial preference update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct UpdatePreferences {
    #[serde(default)]
    pub email: BTreeMap<NotificationCategory, bool>,
    #[serde(default)]
    pub in_app: BTreeMap<NotificationCategory, bool>,
    pub frequency_digest: Option<DigestFrequency>,
    #[validate(length(min = 1, max = 50))]
    pub timezone: Option<String>,
    #[validate(length(min = 1, max = 10))]
    pub language: Option<String>,
}

impl UpdatePreferences {
    pub fn set(mut self, channel: Channel, category: NotificationCategory, enabled: bool) -> Self {
        match channel {
            Channel::Email => self.email.insert(category, enabled),
            Channel::InApp => self.in_app.insert(category, enabled),
        };
        self
    }
}

/// All-on / all-off switches, applied in field order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkPreferenceToggle {
    #[serde(default)]
    pub enable_all_emails: bool,
    #[serde(default)]
    pub disable_all_emails: bool,
    #[serde(default)]
    pub enable_all_inapp: bool,
    #[serde(default)]
    pub disable_all_inapp: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceSummary {
    pub total_enabled: usize,
    pub email_enabled: usize,
    pub inapp_enabled: usize,
    pub email_disabled: usize,
    pub inapp_disabled: usize,
    pub frequency_digest: DigestFrequency,
    pub timezone: String,
    pub language: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_disable_only_bookmark_digest_email() {
        let prefs = NotificationPreference::defaults_for(1, 7);
        for category in NotificationCategory::iter() {
            assert!(prefs.flag(Channel::InApp, category), "inapp {category}");
            let expected = category != NotificationCategory::BookmarkDigest;
            assert_eq!(prefs.flag(Channel::Email, category), expected, "email {category}");
        }
        assert_eq!(prefs.frequency_digest, DigestFrequency::Weekly);
        assert_eq!(prefs.timezone, "UTC");
        assert_eq!(prefs.language, "en");
    }

    #[test]
    fn test_set_flag_touches_one_channel() {
        let mut prefs = NotificationPreference::defaults_for(1, 42);
        prefs.set_flag(Channel::Email, NotificationCategory::SecurityAlerts, false);
        assert!(!prefs.flag(Channel::Email, NotificationCategory::SecurityAlerts));
        assert!(prefs.flag(Channel::InApp, NotificationCategory::SecurityAlerts));
    }

    #[test]
    fn test_partial_update() {
        let mut prefs = NotificationPreference::defaults_for(1, 1);
        let update = UpdatePreferences {
            frequency_digest: Some(DigestFrequency::Daily),
            language: Some("pt".into()),
            ..Default::default()
        }
        .set(Channel::InApp, NotificationCategory::Reminders, false)
        .set(Channel::Email, NotificationCategory::BookmarkDigest, true);

        prefs.apply(&update);

        assert!(!prefs.in_app.reminders);
        assert!(prefs.email.bookmark_digest);
        assert_eq!(prefs.frequency_digest, DigestFrequency::Daily);
        assert_eq!(prefs.language, "pt");
        assert_eq!(prefs.timezone, "UTC");
    }

    #[test]
    fn test_update_validation_limits() {
        let too_long = UpdatePreferences {
            timezone: Some("x".repeat(51)),
            ..Default::default()
        };
        assert!(too_long.validate().is_err());

        let ok = UpdatePreferences {
            timezone: Some("America/Sao_Paulo".into()),
            language: Some("pt-BR".into()),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_update_deserializes_category_keys() {
        let update: UpdatePreferences =
            serde_json::from_str(r#"{"email":{"security_alerts":false},"timezone":"UTC"}"#).unwrap();
        assert_eq!(update.email.get(&NotificationCategory::SecurityAlerts), Some(&false));
        assert!(update.in_app.is_empty());
    }

    #[test]
    fn test_bulk_toggle_order_disable_wins() {
        let mut prefs = NotificationPreference::defaults_for(1, 1);
        prefs.apply_bulk(&BulkPreferenceToggle {
            enable_all_emails: true,
            disable_all_emails: true,
            enable_all_inapp: true,
            ..Default::default()
        });
        assert_eq!(prefs.email, CategoryFlags::all(false));
        assert_eq!(prefs.in_app, CategoryFlags::all(true));
    }

    #[test]
    fn test_summary_counts() {
        let mut prefs = NotificationPreference::defaults_for(1, 1);
        prefs.in_app.reminders = false;
        let summary = prefs.summary();
        assert_eq!(summary.email_enabled, 6);
        assert_eq!(summary.email_disabled, 1);
        assert_eq!(summary.inapp_enabled, 6);
        assert_eq!(summary.inapp_disabled, 1);
        assert_eq!(summary.total_enabled, 12);
    }
}

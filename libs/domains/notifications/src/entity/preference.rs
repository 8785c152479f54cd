//! `notification_preferences` rows. The 14 flag columns are folded into two
//! [`CategoryFlags`] values on the way out and unfolded on the way in.

use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;

use crate::preference::{CategoryFlags, DigestFrequency, NotificationPreference};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "notification_preferences")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub user_id: i64,
    pub email_welcome: bool,
    pub email_organization_updates: bool,
    pub email_contact_messages: bool,
    pub email_system_announcements: bool,
    pub email_security_alerts: bool,
    pub email_bookmark_digest: bool,
    pub email_reminders: bool,
    pub inapp_welcome: bool,
    pub inapp_organization_updates: bool,
    pub inapp_contact_messages: bool,
    pub inapp_system_announcements: bool,
    pub inapp_security_alerts: bool,
    pub inapp_bookmark_digest: bool,
    pub inapp_reminders: bool,
    pub frequency_digest: DigestFrequency,
    pub timezone: String,
    pub language: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for NotificationPreference {
    fn from(m: Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            email: CategoryFlags {
                welcome: m.email_welcome,
                organization_updates: m.email_organization_updates,
                contact_messages: m.email_contact_messages,
                system_announcements: m.email_system_announcements,
                security_alerts: m.email_security_alerts,
                bookmark_digest: m.email_bookmark_digest,
                reminders: m.email_reminders,
            },
            in_app: CategoryFlags {
                welcome: m.inapp_welcome,
                organization_updates: m.inapp_organization_updates,
                contact_messages: m.inapp_contact_messages,
                system_announcements: m.inapp_system_announcements,
                security_alerts: m.inapp_security_alerts,
                bookmark_digest: m.inapp_bookmark_digest,
                reminders: m.inapp_reminders,
            },
            frequency_digest: m.frequency_digest,
            timezone: m.timezone,
            language: m.language,
            created_at: m.created_at.into(),
            updated_at: m.updated_at.into(),
        }
    }
}

/// Every column set; `id` is left unset for inserts.
pub fn active_model(prefs: &NotificationPreference, with_id: bool) -> ActiveModel {
    let e = &prefs.email;
    let i = &prefs.in_app;
    ActiveModel {
        id: if with_id { Set(prefs.id) } else { NotSet },
        user_id: Set(prefs.user_id),
        email_welcome: Set(e.welcome),
        email_organization_updates: Set(e.organization_updates),
        email_contact_messages: Set(e.contact_messages),
        email_system_announcements: Set(e.system_announcements),
        email_security_alerts: Set(e.security_alerts),
        email_bookmark_digest: Set(e.bookmark_digest),
        email_reminders: Set(e.reminders),
        inapp_welcome: Set(i.welcome),
        inapp_organization_updates: Set(i.organization_updates),
        inapp_contact_messages: Set(i.contact_messages),
        inapp_system_announcements: Set(i.system_announcements),
        inapp_security_alerts: Set(i.security_alerts),
        inapp_bookmark_digest: Set(i.bookmark_digest),
        inapp_reminders: Set(i.reminders),
        frequency_digest: Set(prefs.frequency_digest),
        timezone: Set(prefs.timezone.clone()),
        language: Set(prefs.language.clone()),
        created_at: Set(prefs.created_at.into()),
        updated_at: Set(prefs.updated_at.into()),
    }
}

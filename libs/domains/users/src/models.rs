use chrono::{DateTime, Utc};
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use validator::Validate;

pub type UserId = i64;

/// Directory roles. Assigned directly; there is no transition logic.
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
pub enum Role {
    #[default]
    #[sea_orm(string_value = "visitor")]
    Visitor,
    #[sea_orm(string_value = "org_admin")]
    OrgAdmin,
    #[sea_orm(string_value = "platform_admin")]
    PlatformAdmin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: Option<String>,
    /// Absent for accounts created through Google sign-in
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub role: Role,
    pub is_verified: bool,
    pub google_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(id: UserId, input: NewUser) -> Self {
        let now = Utc::now();
        Self {
            id,
            email: input.email,
            name: input.name,
            password_hash: input.password_hash,
            role: input.role,
            is_verified: input.is_verified,
            google_id: input.google_id,
            created_at: now,
            updated_at: now,
            last_login: None,
        }
    }

    /// Name to greet the user with, falling back to the mailbox part of the email.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => self.email.split('@').next().unwrap_or(&self.email),
        }
    }

    pub fn has_email(&self) -> bool {
        !self.email.trim().is_empty()
    }

    pub fn logged_in_since(&self, cutoff: DateTime<Utc>) -> bool {
        self.last_login.is_some_and(|at| at >= cutoff)
    }
}

/// Input for registering a user
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct NewUser {
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 255))]
    pub name: Option<String>,
    #[serde(default)]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub google_id: Option<String>,
}

impl NewUser {
    pub fn new(email: impl Into<String>, role: Role) -> Self {
        Self {
            email: email.into(),
            role,
            ..Default::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn verified(mut self) -> Self {
        self.is_verified = true;
        self
    }
}

/// Audience filter for bulk dispatch and preview.
///
/// Every field is optional; unset fields match everyone. Unknown keys in a
/// JSON filter are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub is_verified: Option<bool>,
    /// Inclusive lower bound on `created_at`
    pub created_after: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`
    pub created_before: Option<DateTime<Utc>>,
    /// Inclusive lower bound on `last_login`; users who never logged in are excluded
    pub last_login_after: Option<DateTime<Utc>>,
}

impl UserFilter {
    pub fn by_role(role: Role) -> Self {
        Self {
            role: Some(role),
            ..Default::default()
        }
    }

    pub fn matches(&self, user: &User) -> bool {
        if self.role.is_some_and(|role| user.role != role) {
            return false;
        }
        if self.is_verified.is_some_and(|v| user.is_verified != v) {
            return false;
        }
        if self.created_after.is_some_and(|after| user.created_at < after) {
            return false;
        }
        if self.created_before.is_some_and(|before| user.created_at > before) {
            return false;
        }
        if let Some(after) = self.last_login_after {
            if !user.logged_in_since(after) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::str::FromStr;

    fn user(role: Role, verified: bool) -> User {
        let mut input = NewUser::new("ana@example.org", role);
        input.is_verified = verified;
        User::new(1, input)
    }

    #[test]
    fn test_role_string_forms() {
        assert_eq!(Role::OrgAdmin.to_string(), "org_admin");
        assert_eq!(Role::from_str("platform_admin").unwrap(), Role::PlatformAdmin);
        assert!(Role::from_str("superuser").is_err());
    }

    #[test]
    fn test_empty_filter_matches_everyone() {
        let filter = UserFilter::default();
        assert!(filter.matches(&user(Role::Visitor, false)));
        assert!(filter.matches(&user(Role::PlatformAdmin, true)));
    }

    #[test]
    fn test_role_and_verification_filters() {
        let filter = UserFilter {
            role: Some(Role::Visitor),
            is_verified: Some(true),
            ..Default::default()
        };
        assert!(filter.matches(&user(Role::Visitor, true)));
        assert!(!filter.matches(&user(Role::Visitor, false)));
        assert!(!filter.matches(&user(Role::OrgAdmin, true)));
    }

    #[test]
    fn test_created_after_is_inclusive() {
        let u = user(Role::Visitor, false);
        let at_creation = UserFilter {
            created_after: Some(u.created_at),
            ..Default::default()
        };
        assert!(at_creation.matches(&u));

        let later = UserFilter {
            created_after: Some(u.created_at + Duration::seconds(1)),
            ..Default::default()
        };
        assert!(!later.matches(&u));
    }

    #[test]
    fn test_created_before_and_last_login() {
        let mut u = user(Role::Visitor, false);
        let before = UserFilter {
            created_before: Some(u.created_at - Duration::days(1)),
            ..Default::default()
        };
        assert!(!before.matches(&u));

        let active = UserFilter {
            last_login_after: Some(Utc::now() - Duration::days(30)),
            ..Default::default()
        };
        assert!(!active.matches(&u), "never logged in");
        u.last_login = Some(Utc::now() - Duration::days(2));
        assert!(active.matches(&u));
    }

    #[test]
    fn test_filter_deserialize_ignores_unknown_keys() {
        let filter: UserFilter =
            serde_json::from_str(r#"{"role":"visitor","favourite_colour":"teal"}"#).unwrap();
        assert_eq!(filter, UserFilter::by_role(Role::Visitor));
    }

    #[test]
    fn test_display_name_falls_back_to_mailbox() {
        let mut u = user(Role::Visitor, false);
        assert_eq!(u.display_name(), "ana");
        u.name = Some("Ana Lima".into());
        assert_eq!(u.display_name(), "Ana Lima");
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let mut u = user(Role::Visitor, false);
        u.password_hash = Some("argon2id$secret".into());
        let json = serde_json::to_string(&u).unwrap();
        assert!(!json.contains("secret"));
    }
}

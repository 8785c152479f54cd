use chrono::{DateTime, Utc};
use domain_users::UserId;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use validator::Validate;

pub type OrganizationId = i64;

/// Moderation state of a listing
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
pub enum OrganizationStatus {
    #[default]
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "flagged")]
    Flagged,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
    pub email: Option<String>,
    pub status: OrganizationStatus,
    pub admin_user_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    pub fn new(id: OrganizationId, input: NewOrganization) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: input.name,
            email: input.email,
            status: OrganizationStatus::Pending,
            admin_user_id: input.admin_user_id,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct NewOrganization {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(email)]
    pub email: Option<String>,
    pub admin_user_id: Option<UserId>,
}

impl NewOrganization {
    pub fn new(name: impl Into<String>, admin_user_id: Option<UserId>) -> Self {
        Self {
            name: name.into(),
            email: None,
            admin_user_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_new_organization_starts_pending() {
        let org = Organization::new(1, NewOrganization::new("Food Bank", Some(3)));
        assert_eq!(org.status, OrganizationStatus::Pending);
        assert_eq!(org.admin_user_id, Some(3));
    }

    #[test]
    fn test_status_round_trips_through_strings() {
        assert_eq!(OrganizationStatus::Flagged.to_string(), "flagged");
        assert_eq!(
            OrganizationStatus::from_str("approved").unwrap(),
            OrganizationStatus::Approved
        );
    }

    #[test]
    fn test_validation_rejects_blank_name() {
        let input = NewOrganization::new("", None);
        assert!(input.validate().is_err());
    }
}

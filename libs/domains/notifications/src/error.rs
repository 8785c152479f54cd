//! Error types for the notifications domain.
//!
//! Channel-level problems during a dispatch (opt-outs, mail failures, a
//! failed insert) are reported through [`crate::outcome::ChannelOutcome`], not
//! through this type. `NotificationError` is reserved for failures that stop an
//! operation as a whole.

use domain_organizations::{OrganizationError, OrganizationId};
use domain_users::{UserError, UserId};
use thiserror::Error;

/// Result type for notification operations.
pub type NotificationResult<T> = Result<T, NotificationError>;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    #[error("Organization not found: {0}")]
    OrganizationNotFound(OrganizationId),

    /// The organization has no admin user to notify.
    #[error("Organization {0} has no admin user")]
    OrganizationWithoutAdmin(OrganizationId),

    #[error("Email provider error: {0}")]
    ProviderError(String),

    #[error("Template rendering error: {0}")]
    TemplateError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for NotificationError {
    fn from(err: sea_orm::DbErr) -> Self {
        NotificationError::DatabaseError(err.to_string())
    }
}

impl From<handlebars::RenderError> for NotificationError {
    fn from(err: handlebars::RenderError) -> Self {
        NotificationError::TemplateError(err.to_string())
    }
}

impl From<handlebars::TemplateError> for NotificationError {
    fn from(err: handlebars::TemplateError) -> Self {
        NotificationError::TemplateError(err.to_string())
    }
}

impl From<serde_json::Error> for NotificationError {
    fn from(err: serde_json::Error) -> Self {
        NotificationError::Internal(format!("JSON serialization error: {}", err))
    }
}

impl From<std::io::Error> for NotificationError {
    fn from(err: std::io::Error) -> Self {
        NotificationError::Internal(format!("IO error: {}", err))
    }
}

impl From<validator::ValidationErrors> for NotificationError {
    fn from(err: validator::ValidationErrors) -> Self {
        NotificationError::Validation(err.to_string())
    }
}

impl From<core_config::ConfigError> for NotificationError {
    fn from(err: core_config::ConfigError) -> Self {
        NotificationError::ConfigError(err.to_string())
    }
}

impl From<UserError> for NotificationError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(id) => NotificationError::UserNotFound(id),
            other => NotificationError::DatabaseError(other.to_string()),
        }
    }
}

impl From<OrganizationError> for NotificationError {
    fn from(err: OrganizationError) -> Self {
        match err {
            OrganizationError::NotFound(id) => NotificationError::OrganizationNotFound(id),
            other => NotificationError::DatabaseError(other.to_string()),
        }
    }
}

use thiserror::Error;

use crate::models::OrganizationId;

#[derive(Debug, Error)]
pub enum OrganizationError {
    #[error("Organization not found: {0}")]
    NotFound(OrganizationId),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type OrganizationResult<T> = Result<T, OrganizationError>;

impl From<validator::ValidationErrors> for OrganizationError {
    fn from(err: validator::ValidationErrors) -> Self {
        OrganizationError::Validation(err.to_string())
    }
}

impl From<sea_orm::DbErr> for OrganizationError {
    fn from(err: sea_orm::DbErr) -> Self {
        OrganizationError::Internal(format!("Database error: {}", err))
    }
}

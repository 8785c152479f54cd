//! Organizations Domain
//!
//! Nonprofit listings. The notification flows read an organization to name it
//! in message text and to find the admin who should hear about moderation
//! decisions and contact messages.

pub mod entity;
pub mod error;
pub mod models;
pub mod postgres;
pub mod repository;

pub use error::{OrganizationError, OrganizationResult};
pub use models::{NewOrganization, Organization, OrganizationId, OrganizationStatus};
pub use postgres::PgOrganizationRepository;
pub use repository::{InMemoryOrganizationRepository, OrganizationRepository};

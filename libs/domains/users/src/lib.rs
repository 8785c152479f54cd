//! Users Domain
//!
//! The recipients of notifications: identity, role, verification state and
//! the audience filter used by bulk dispatch.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │ Repository  │  ← UserRepository trait, in-memory and Postgres implementations
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← User, Role, UserFilter
//! └─────────────┘
//! ```

pub mod entity;
pub mod error;
pub mod models;
pub mod postgres;
pub mod repository;

pub use error::{UserError, UserResult};
pub use models::{NewUser, Role, User, UserFilter, UserId};
pub use postgres::PgUserRepository;
pub use repository::{InMemoryUserRepository, UserRepository};

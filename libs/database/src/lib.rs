//! Postgres connectivity for the notification services.
//!
//! - [`postgres`]: pool configuration, connect-with-retry, migrations, health ping
//! - [`retry`]: exponential backoff used for connections and per-recipient dispatch retries
//!
//! ```ignore
//! use core_config::FromEnv;
//! use database::postgres::{self, PostgresConfig};
//!
//! let config = PostgresConfig::from_env()?;
//! let db = postgres::connect_with_retry(config, RetryPolicy::default()).await?;
//! postgres::run_migrations::<migration::Migrator>(&db).await?;
//! ```

pub mod error;
pub mod postgres;
pub mod retry;

pub use error::{DatabaseError, DatabaseResult};
pub use retry::{RetryPolicy, retry_with_backoff};

//! Configuration for the notify CLI

use core_config::{ConfigError, Environment, FromEnv, env_parse_or};
use database::RetryPolicy;
use database::postgres::PostgresConfig;
use domain_notifications::{BulkOptions, DispatchConfig, SmtpConfig};

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub database: PostgresConfig,
    /// `None` leaves mail unconfigured unless `--dry-run` is given
    pub smtp: Option<SmtpConfig>,
    pub dispatch: DispatchConfig,
    pub bulk: BulkOptions,
    /// Retries for the initial database connection
    pub connect_retry: RetryPolicy,
}

/// Aggregates every section's variables, plus `DB_CONNECT_RETRIES`
/// (default 5).
impl FromEnv for Config {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            environment: Environment::from_env(),
            database: PostgresConfig::from_env()?,
            smtp: SmtpConfig::maybe_from_env()?,
            dispatch: DispatchConfig::from_env()?,
            bulk: BulkOptions::from_env()?,
            connect_retry: RetryPolicy::default().with_max_retries(env_parse_or("DB_CONNECT_RETRIES", 5)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_environment() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgres://localhost/charity")),
                ("SMTP_HOST", None),
                ("FRONTEND_URL", None),
                ("BULK_CONCURRENCY", None),
                ("DB_CONNECT_RETRIES", None),
                ("APP_ENV", None),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert!(config.smtp.is_none());
                assert!(config.dispatch.frontend_url.is_none());
                assert_eq!(config.bulk.concurrency, 1);
                assert_eq!(config.connect_retry.max_retries, 5);
                assert!(config.environment.is_development());
            },
        );
    }

    #[test]
    fn test_full_environment() {
        temp_env::with_vars(
            [
                ("DATABASE_URL", Some("postgres://localhost/charity")),
                ("SMTP_HOST", Some("smtp.example.org")),
                ("FRONTEND_URL", Some("https://charity.example/")),
                ("BULK_CONCURRENCY", Some("4")),
                ("APP_ENV", Some("production")),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.smtp.unwrap().host, "smtp.example.org");
                assert_eq!(config.dispatch.frontend_url.as_deref(), Some("https://charity.example"));
                assert_eq!(config.bulk.concurrency, 4);
                assert!(config.environment.is_production());
            },
        );
    }

    #[test]
    fn test_missing_database_url() {
        temp_env::with_var_unset("DATABASE_URL", || {
            assert!(matches!(Config::from_env(), Err(ConfigError::MissingEnvVar(_))));
        });
    }
}

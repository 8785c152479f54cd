use core_config::{ConfigError, FromEnv, env_optional, env_or_default};

use crate::error::{NotificationError, NotificationResult};

pub const DEFAULT_SITE_NAME: &str = "Charity Directory";
pub const DEFAULT_PARTNERSHIPS_EMAIL: &str = "partnerships@charity.directory";

/// Settings for building messages and links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Base URL of the web frontend. Email is not sent without it.
    pub frontend_url: Option<String>,
    pub site_name: String,
    /// Directory with `<type>.html` overrides
    pub templates_dir: Option<String>,
    pub partnerships_email: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            frontend_url: None,
            site_name: DEFAULT_SITE_NAME.to_string(),
            templates_dir: None,
            partnerships_email: DEFAULT_PARTNERSHIPS_EMAIL.to_string(),
        }
    }
}

impl DispatchConfig {
    pub fn with_frontend_url(mut self, url: impl Into<String>) -> Self {
        self.frontend_url = Some(url.into().trim_end_matches('/').to_string());
        self
    }

    /// Frontend base URL, or a config error naming the variable.
    pub fn require_frontend_url(&self) -> NotificationResult<&str> {
        self.frontend_url
            .as_deref()
            .ok_or_else(|| NotificationError::ConfigError("FRONTEND_URL is not configured".to_string()))
    }

    /// `<frontend_url><path>`
    pub fn link(&self, path: &str) -> NotificationResult<String> {
        Ok(format!("{}{}", self.require_frontend_url()?, path))
    }
}

/// Environment variables:
/// - `FRONTEND_URL` (optional)
/// - `SITE_NAME` (default "Charity Directory")
/// - `EMAIL_TEMPLATES_DIR` (optional)
/// - `PARTNERSHIPS_EMAIL`
impl FromEnv for DispatchConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            frontend_url: env_optional("FRONTEND_URL").map(|url| url.trim_end_matches('/').to_string()),
            site_name: env_or_default("SITE_NAME", DEFAULT_SITE_NAME),
            templates_dir: env_optional("EMAIL_TEMPLATES_DIR"),
            partnerships_email: env_or_default("PARTNERSHIPS_EMAIL", DEFAULT_PARTNERSHIPS_EMAIL),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_defaults() {
        temp_env::with_vars(
            [
                ("FRONTEND_URL", None::<&str>),
                ("SITE_NAME", None),
                ("EMAIL_TEMPLATES_DIR", None),
                ("PARTNERSHIPS_EMAIL", None),
            ],
            || {
                let config = DispatchConfig::from_env().unwrap();
                assert_eq!(config, DispatchConfig::default());
                assert!(config.require_frontend_url().is_err());
            },
        );
    }

    #[test]
    fn test_frontend_url_trailing_slash_trimmed() {
        temp_env::with_vars(
            [
                ("FRONTEND_URL", Some("https://charity.example/")),
                ("SITE_NAME", Some("Cause Book")),
            ],
            || {
                let config = DispatchConfig::from_env().unwrap();
                assert_eq!(config.site_name, "Cause Book");
                assert_eq!(
                    config.link("/unsubscribe").unwrap(),
                    "https://charity.example/unsubscribe"
                );
            },
        );
    }

    #[test]
    fn test_link_without_frontend_is_config_error() {
        let err = DispatchConfig::default().link("/verify-email").unwrap_err();
        assert!(matches!(err, NotificationError::ConfigError(_)));
    }
}

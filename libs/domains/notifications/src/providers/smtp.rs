//! SMTP delivery through lettre.

use async_trait::async_trait;
use core_config::{ConfigError, FromEnv, env_flag, env_optional, env_or_default, env_parse_or, env_required};
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use std::sync::Arc;

use super::{EmailContent, EmailProvider, SentEmail};
use crate::config::DEFAULT_SITE_NAME;
use crate::error::{NotificationError, NotificationResult};

#[derive(Clone, PartialEq, Eq)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
    pub use_tls: bool,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("from_email", &self.from_email)
            .field("from_name", &self.from_name)
            .field("use_tls", &self.use_tls)
            .finish()
    }
}

impl SmtpConfig {
    /// Local catcher such as Mailpit: no auth, no TLS.
    pub fn local(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            username: String::new(),
            password: String::new(),
            from_email: "noreply@localhost".to_string(),
            from_name: DEFAULT_SITE_NAME.to_string(),
            use_tls: false,
        }
    }

    /// `None` when `SMTP_HOST` is unset, which leaves mail unconfigured.
    pub fn maybe_from_env() -> Result<Option<Self>, ConfigError> {
        match env_optional("SMTP_HOST") {
            Some(_) => Self::from_env().map(Some),
            None => Ok(None),
        }
    }

    fn from_mailbox(&self) -> NotificationResult<Mailbox> {
        format!("{} <{}>", self.from_name, self.from_email)
            .parse()
            .map_err(|e| NotificationError::ConfigError(format!("Invalid from address: {}", e)))
    }
}

/// Environment variables:
/// - `SMTP_HOST` (required here; see [`SmtpConfig::maybe_from_env`])
/// - `SMTP_PORT` (default 587)
/// - `SMTP_USERNAME`, `SMTP_PASSWORD` (default empty, no auth)
/// - `SMTP_FROM_EMAIL` (default noreply@localhost)
/// - `SMTP_FROM_NAME` (default "Charity Directory")
/// - `SMTP_USE_TLS` (default true)
impl FromEnv for SmtpConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env_required("SMTP_HOST")?,
            port: env_parse_or("SMTP_PORT", 587)?,
            username: env_or_default("SMTP_USERNAME", ""),
            password: env_or_default("SMTP_PASSWORD", ""),
            from_email: env_or_default("SMTP_FROM_EMAIL", "noreply@localhost"),
            from_name: env_or_default("SMTP_FROM_NAME", DEFAULT_SITE_NAME),
            use_tls: env_flag("SMTP_USE_TLS", true),
        })
    }
}

pub struct SmtpProvider {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    config: Arc<SmtpConfig>,
}

impl SmtpProvider {
    pub fn new(config: SmtpConfig) -> NotificationResult<Self> {
        let builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| NotificationError::ConfigError(format!("Failed to create SMTP relay: {}", e)))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };

        let builder = if config.username.is_empty() {
            builder
        } else {
            builder.credentials(Credentials::new(config.username.clone(), config.password.clone()))
        };

        let transport = builder.port(config.port).build();

        tracing::info!(host = %config.host, port = config.port, tls = config.use_tls, "SMTP provider configured");
        Ok(Self {
            transport,
            config: Arc::new(config),
        })
    }

    fn build_message(&self, email: &EmailContent) -> NotificationResult<Message> {
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| NotificationError::ProviderError(format!("Invalid recipient '{}': {}", email.to, e)))?;

        let mut builder = Message::builder()
            .from(self.config.from_mailbox()?)
            .to(to)
            .subject(&email.subject);

        if let Some(reply_to) = &email.reply_to {
            let mailbox: Mailbox = reply_to
                .parse()
                .map_err(|e| NotificationError::ProviderError(format!("Invalid reply-to address: {}", e)))?;
            builder = builder.reply_to(mailbox);
        }

        let html = SinglePart::builder()
            .header(ContentType::TEXT_HTML)
            .body(email.html.clone());

        let message = match &email.text {
            Some(text) => builder.multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text.clone()),
                    )
                    .singlepart(html),
            ),
            None => builder.singlepart(html),
        };

        message.map_err(|e| NotificationError::ProviderError(format!("Failed to build message: {}", e)))
    }
}

#[async_trait]
impl EmailProvider for SmtpProvider {
    async fn send(&self, email: &EmailContent) -> NotificationResult<SentEmail> {
        let message = self.build_message(email)?;

        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| NotificationError::ProviderError(format!("SMTP send failed: {}", e)))?;

        let message_id = response.message().next().map(str::to_string).unwrap_or_default();

        tracing::info!(to = %email.to, subject = %email.subject, "Email sent");
        Ok(SentEmail { message_id })
    }

    async fn health_check(&self) -> NotificationResult<()> {
        let ok = self
            .transport
            .test_connection()
            .await
            .map_err(|e| NotificationError::ProviderError(format!("SMTP health check failed: {}", e)))?;
        if ok {
            Ok(())
        } else {
            Err(NotificationError::ProviderError("SMTP server rejected NOOP".to_string()))
        }
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}

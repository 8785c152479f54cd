//! Outbound mail.

pub mod recording;
pub mod smtp;

pub use recording::RecordingProvider;
pub use smtp::{SmtpConfig, SmtpProvider};

use async_trait::async_trait;
use serde::Serialize;

use crate::error::NotificationResult;

/// A fully rendered message ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailContent {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: Option<String>,
    pub reply_to: Option<String>,
}

impl EmailContent {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            html: html.into(),
            text: None,
            reply_to: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_reply_to(mut self, reply_to: impl Into<String>) -> Self {
        self.reply_to = Some(reply_to.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    /// Transport-specific id, when the server returns one
    pub message_id: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send(&self, email: &EmailContent) -> NotificationResult<SentEmail>;

    async fn health_check(&self) -> NotificationResult<()>;

    fn name(&self) -> &'static str;
}

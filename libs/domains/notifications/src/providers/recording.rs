//! Provider that keeps messages in memory instead of sending them. Used by
//! tests and by the CLI's `--dry-run`.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::{EmailContent, EmailProvider, SentEmail};
use crate::error::{NotificationError, NotificationResult};

#[derive(Debug, Clone, Default)]
pub struct RecordingProvider {
    sent: Arc<Mutex<Vec<EmailContent>>>,
    failure: Option<String>,
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every send fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            sent: Arc::default(),
            failure: Some(message.into()),
        }
    }

    pub async fn sent(&self) -> Vec<EmailContent> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    pub async fn was_sent_to(&self, address: &str) -> bool {
        self.sent.lock().await.iter().any(|e| e.to == address)
    }
}

#[async_trait]
impl EmailProvider for RecordingProvider {
    async fn send(&self, email: &EmailContent) -> NotificationResult<SentEmail> {
        if let Some(message) = &self.failure {
            return Err(NotificationError::ProviderError(message.clone()));
        }

        let mut sent = self.sent.lock().await;
        sent.push(email.clone());
        tracing::debug!(to = %email.to, subject = %email.subject, "Recorded email");

        Ok(SentEmail {
            message_id: format!("recorded-{}", sent.len()),
        })
    }

    async fn health_check(&self) -> NotificationResult<()> {
        match &self.failure {
            Some(message) => Err(NotificationError::ProviderError(message.clone())),
            None => Ok(()),
        }
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

//! Per-channel dispatch results.

use serde::{Deserialize, Serialize};

use crate::models::NotificationId;
use crate::preference::NotificationCategory;

/// Why a channel was not attempted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The caller turned the channel off
    NotRequested,
    UserNotFound,
    OptedOut { category: NotificationCategory },
    /// No category exists for the type and the policy denies unmapped types
    UnmappedType,
    NoEmailAddress,
}

/// Why an attempted channel did not deliver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cause", content = "detail", rename_all = "snake_case")]
pub enum FailureCause {
    MailNotConfigured,
    SiteUrlNotConfigured,
    Render(String),
    Transport(String),
    Persistence(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChannelOutcome {
    Delivered,
    Skipped(SkipReason),
    Failed(FailureCause),
}

impl ChannelOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, ChannelOutcome::Delivered)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ChannelOutcome::Failed(_))
    }

    /// Metric label
    pub fn label(&self) -> &'static str {
        match self {
            ChannelOutcome::Delivered => "delivered",
            ChannelOutcome::Skipped(_) => "skipped",
            ChannelOutcome::Failed(_) => "failed",
        }
    }
}

/// Outcome of one `send_notification` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReport {
    pub email: ChannelOutcome,
    pub in_app: ChannelOutcome,
    /// Id of the in-app row, when one was written
    pub notification_id: Option<NotificationId>,
}

impl DispatchReport {
    pub fn skipped(reason: SkipReason) -> Self {
        Self {
            email: ChannelOutcome::Skipped(reason.clone()),
            in_app: ChannelOutcome::Skipped(reason),
            notification_id: None,
        }
    }

    pub fn delivered(&self) -> DeliveryFlags {
        DeliveryFlags {
            email: self.email.is_delivered(),
            in_app: self.in_app.is_delivered(),
        }
    }
}

/// Boolean view of a [`DispatchReport`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryFlags {
    pub email: bool,
    pub in_app: bool,
}

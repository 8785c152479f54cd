//! Bulk dispatch to a filtered audience, and the audience preview.

use chrono::{Duration, Utc};
use core_config::{ConfigError, FromEnv, env_parse_or};
use database::{RetryPolicy, retry_with_backoff};
use domain_users::{Role, User, UserFilter, UserId};
use futures::stream::{self, StreamExt};
use observability::{NotificationMetrics, duration_millis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration as StdDuration, Instant};
use tracing::{error, info};

use crate::error::NotificationResult;
use crate::models::{NotificationPriority, NotificationType};
use crate::outcome::DispatchReport;
use crate::service::{DispatchRequest, NotificationService};

/// Users who logged in within this many days count as active.
pub const ACTIVE_WINDOW_DAYS: i64 = 30;

/// Concurrency and retry settings for bulk runs.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkOptions {
    /// Recipients dispatched at once. 1 is sequential.
    pub concurrency: usize,
    /// Applied per recipient when its dispatch errors
    pub retry: RetryPolicy,
}

impl Default for BulkOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            retry: RetryPolicy::none(),
        }
    }
}

impl BulkOptions {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Environment variables:
/// - `BULK_CONCURRENCY` (default 1)
/// - `BULK_MAX_RETRIES` (default 0)
/// - `BULK_RETRY_INITIAL_DELAY_MS` (default 100)
impl FromEnv for BulkOptions {
    fn from_env() -> Result<Self, ConfigError> {
        let concurrency: usize = env_parse_or("BULK_CONCURRENCY", 1)?;
        let max_retries: u32 = env_parse_or("BULK_MAX_RETRIES", 0)?;
        let initial_delay_ms: u64 = env_parse_or("BULK_RETRY_INITIAL_DELAY_MS", 100)?;

        Ok(Self::default().with_concurrency(concurrency).with_retry(
            RetryPolicy::default()
                .with_max_retries(max_retries)
                .with_initial_delay(StdDuration::from_millis(initial_delay_ms)),
        ))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BulkRequest {
    pub notification_type: NotificationType,
    pub subject: String,
    pub message: String,
    pub email_content: Option<String>,
    pub filter: UserFilter,
    pub send_email: bool,
    pub send_in_app: bool,
    pub priority: NotificationPriority,
}

impl BulkRequest {
    pub fn new(notification_type: NotificationType, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            notification_type,
            subject: subject.into(),
            message: message.into(),
            email_content: None,
            filter: UserFilter::default(),
            send_email: true,
            send_in_app: true,
            priority: NotificationPriority::default(),
        }
    }

    pub fn filter(mut self, filter: UserFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn email_content(mut self, content: impl Into<String>) -> Self {
        self.email_content = Some(content.into());
        self
    }

    pub fn send_email(mut self, enabled: bool) -> Self {
        self.send_email = enabled;
        self
    }

    pub fn send_in_app(mut self, enabled: bool) -> Self {
        self.send_in_app = enabled;
        self
    }

    pub fn priority(mut self, priority: NotificationPriority) -> Self {
        self.priority = priority;
        self
    }

    fn for_user(&self, user_id: UserId) -> DispatchRequest {
        let mut request = DispatchRequest::new(user_id, self.notification_type, &self.subject, &self.message)
            .send_email(self.send_email)
            .send_in_app(self.send_in_app)
            .priority(self.priority);
        request.email_content = self.email_content.clone();
        request
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkSummary {
    pub total_users: usize,
    pub email_count: usize,
    pub in_app_count: usize,
    /// Recipients whose dispatch errored after all retries
    pub failed_count: usize,
    pub elapsed_ms: u64,
}

impl BulkSummary {
    fn add(&mut self, result: &NotificationResult<DispatchReport>) {
        match result {
            Ok(report) => {
                let delivered = report.delivered();
                self.email_count += usize::from(delivered.email);
                self.in_app_count += usize::from(delivered.in_app);
            }
            Err(_) => self.failed_count += 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudiencePreview {
    pub total_users: usize,
    pub by_role: BTreeMap<Role, usize>,
    pub verified_users: usize,
    pub unverified_users: usize,
    /// Logged in within the last 30 days
    pub active_users: usize,
}

impl AudiencePreview {
    pub fn from_users(users: &[User]) -> Self {
        let active_cutoff = Utc::now() - Duration::days(ACTIVE_WINDOW_DAYS);
        let mut preview = Self {
            total_users: users.len(),
            ..Default::default()
        };

        for user in users {
            *preview.by_role.entry(user.role).or_default() += 1;
            if user.is_verified {
                preview.verified_users += 1;
            } else {
                preview.unverified_users += 1;
            }
            if user.logged_in_since(active_cutoff) {
                preview.active_users += 1;
            }
        }
        preview
    }
}

impl NotificationService {
    /// Dispatch once per user matching `request.filter`.
    ///
    /// A recipient whose dispatch errors is retried per the bulk options and
    /// then counted in `failed_count`; the run continues. Calls are not
    /// deduplicated.
    pub async fn send_bulk_notification(&self, request: BulkRequest) -> NotificationResult<BulkSummary> {
        let started = Instant::now();
        let users = self.stores.users.list(&request.filter).await?;
        let options = &self.bulk;

        info!(
            notification_type = %request.notification_type,
            recipients = users.len(),
            concurrency = options.concurrency,
            "Starting bulk notification"
        );

        let results: Vec<(UserId, NotificationResult<DispatchReport>)> = stream::iter(users.iter())
            .map(|user| {
                let dispatch = request.for_user(user.id);
                async move {
                    let result = retry_with_backoff(|| self.dispatch_to(user, &dispatch), &options.retry).await;
                    (user.id, result)
                }
            })
            .buffer_unordered(options.concurrency.max(1))
            .collect()
            .await;

        let mut summary = BulkSummary {
            total_users: users.len(),
            ..Default::default()
        };
        for (user_id, result) in &results {
            if let Err(e) = result {
                error!(user_id, error = %e, "Bulk notification failed for user");
            }
            summary.add(result);
        }

        let elapsed = started.elapsed();
        summary.elapsed_ms = duration_millis(elapsed);
        NotificationMetrics::record_bulk_run(
            request.notification_type.as_str(),
            summary.total_users,
            summary.failed_count,
            elapsed,
        );

        info!(
            notification_type = %request.notification_type,
            total_users = summary.total_users,
            email_count = summary.email_count,
            in_app_count = summary.in_app_count,
            failed_count = summary.failed_count,
            elapsed_ms = summary.elapsed_ms,
            "Bulk notification finished"
        );
        Ok(summary)
    }

    /// Who a bulk run with `filter` would reach. Sends nothing.
    pub async fn preview_audience(&self, filter: &UserFilter) -> NotificationResult<AudiencePreview> {
        let users = self.stores.users.list(filter).await?;
        Ok(AudiencePreview::from_users(&users))
    }
}

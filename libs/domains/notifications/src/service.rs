//! Preference-aware dispatch of one notification to one user.

use chrono::{Datelike, Duration, Utc};
use domain_organizations::{InMemoryOrganizationRepository, OrganizationRepository, PgOrganizationRepository};
use domain_users::{InMemoryUserRepository, PgUserRepository, User, UserId, UserRepository};
use observability::NotificationMetrics;
use sea_orm::DatabaseConnection;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::bulk::BulkOptions;
use crate::config::DispatchConfig;
use crate::error::{NotificationError, NotificationResult};
use crate::models::{NewNotification, NotificationPriority, NotificationStats, NotificationType};
use crate::outcome::{ChannelOutcome, DispatchReport, FailureCause, SkipReason};
use crate::policy::{Gate, PreferencePolicy};
use crate::postgres::{PgNotificationRepository, PgPreferenceRepository};
use crate::preference::Channel;
use crate::providers::{EmailContent, EmailProvider, SentEmail};
use crate::repository::{
    InMemoryNotificationRepository, InMemoryPreferenceRepository, NotificationRepository, PreferenceRepository,
};
use crate::templates::{RenderedEmail, TemplateEngine};

pub const DEFAULT_STATS_DAYS: u32 = 30;

/// Repositories the dispatch service reads and writes.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserRepository>,
    pub organizations: Arc<dyn OrganizationRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub preferences: Arc<dyn PreferenceRepository>,
}

impl Stores {
    pub fn postgres(db: DatabaseConnection) -> Self {
        Self {
            users: Arc::new(PgUserRepository::new(db.clone())),
            organizations: Arc::new(PgOrganizationRepository::new(db.clone())),
            notifications: Arc::new(PgNotificationRepository::new(db.clone())),
            preferences: Arc::new(PgPreferenceRepository::new(db)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryUserRepository::new()),
            organizations: Arc::new(InMemoryOrganizationRepository::new()),
            notifications: Arc::new(InMemoryNotificationRepository::new()),
            preferences: Arc::new(InMemoryPreferenceRepository::new()),
        }
    }
}

/// Input to [`NotificationService::send_notification`].
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchRequest {
    pub user_id: UserId,
    pub notification_type: NotificationType,
    /// Email subject and in-app title
    pub subject: String,
    /// In-app body, and the email body unless `email_content` is set
    pub message: String,
    pub email_content: Option<String>,
    pub template_vars: Map<String, Value>,
    pub send_email: bool,
    pub send_in_app: bool,
    pub priority: NotificationPriority,
    pub data: Option<Value>,
}

impl DispatchRequest {
    pub fn new(
        user_id: UserId,
        notification_type: NotificationType,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            notification_type,
            subject: subject.into(),
            message: message.into(),
            email_content: None,
            template_vars: Map::new(),
            send_email: true,
            send_in_app: true,
            priority: NotificationPriority::default(),
            data: None,
        }
    }

    pub fn email_content(mut self, content: impl Into<String>) -> Self {
        self.email_content = Some(content.into());
        self
    }

    pub fn var(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.template_vars.insert(key.into(), value.into());
        self
    }

    pub fn vars(mut self, vars: Map<String, Value>) -> Self {
        self.template_vars.extend(vars);
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

    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Dispatches notifications over the in-app and email channels.
///
/// Channel problems never surface as `Err`: they are reported per channel in
/// the [`DispatchReport`]. `Err` means the recipient could not be looked up.
#[derive(Clone)]
pub struct NotificationService {
    pub(crate) stores: Stores,
    pub(crate) policy: Arc<PreferencePolicy>,
    pub(crate) templates: TemplateEngine,
    pub(crate) mailer: Option<Arc<dyn EmailProvider>>,
    pub(crate) config: Arc<DispatchConfig>,
    pub(crate) bulk: BulkOptions,
}

impl NotificationService {
    /// Service with the standard policy and no mail client. Templates come
    /// from `config.templates_dir` when set.
    pub fn new(stores: Stores, config: DispatchConfig) -> NotificationResult<Self> {
        let templates = match &config.templates_dir {
            Some(dir) => TemplateEngine::with_directory(dir)?,
            None => TemplateEngine::new()?,
        };

        Ok(Self {
            stores,
            policy: Arc::new(PreferencePolicy::standard()),
            templates,
            mailer: None,
            config: Arc::new(config),
            bulk: BulkOptions::default(),
        })
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn EmailProvider>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    pub fn with_policy(mut self, policy: PreferencePolicy) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    pub fn with_templates(mut self, templates: TemplateEngine) -> Self {
        self.templates = templates;
        self
    }

    pub fn with_bulk_options(mut self, options: BulkOptions) -> Self {
        self.bulk = options;
        self
    }

    pub fn policy(&self) -> &PreferencePolicy {
        &self.policy
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn mail_configured(&self) -> bool {
        self.mailer.is_some()
    }

    /// Send one notification to one user.
    ///
    /// An unknown user yields a report with both channels skipped and no
    /// writes.
    pub async fn send_notification(&self, request: DispatchRequest) -> NotificationResult<DispatchReport> {
        let Some(user) = self.stores.users.get_by_id(request.user_id).await? else {
            warn!(user_id = request.user_id, "Notification recipient not found");
            let report = DispatchReport::skipped(SkipReason::UserNotFound);
            self.record_metrics(request.notification_type, &report);
            return Ok(report);
        };

        self.dispatch_to(&user, &request).await
    }

    /// Dispatch to an already-loaded user. `request.user_id` is ignored.
    ///
    /// The only `Err` path is the preference lookup, which runs before any
    /// side effect; bulk retries rely on that.
    pub(crate) async fn dispatch_to(&self, user: &User, request: &DispatchRequest) -> NotificationResult<DispatchReport> {
        let ty = request.notification_type;
        let prefs = self.stores.preferences.get_for_user(user.id).await?;

        let email_gate = self.policy.resolve(prefs.as_ref(), ty, Channel::Email, request.send_email);
        let in_app_gate = self.policy.resolve(prefs.as_ref(), ty, Channel::InApp, request.send_in_app);

        let (in_app, notification_id) = match in_app_gate {
            Gate::Open => self.deliver_in_app(user, request).await,
            Gate::Closed(reason) => {
                debug!(user_id = user.id, notification_type = %ty, ?reason, "In-app channel skipped");
                (ChannelOutcome::Skipped(reason), None)
            }
        };

        let email = match email_gate {
            Gate::Open => self.deliver_email(user, request).await,
            Gate::Closed(reason) => {
                debug!(user_id = user.id, notification_type = %ty, ?reason, "Email channel skipped");
                ChannelOutcome::Skipped(reason)
            }
        };

        if let (Some(id), true) = (notification_id, email.is_delivered()) {
            if let Err(e) = self.stores.notifications.mark_email_sent(id, Utc::now()).await {
                warn!(notification_id = id, error = %e, "Failed to mark notification email as sent");
            }
        }

        let report = DispatchReport {
            email,
            in_app,
            notification_id,
        };
        self.record_metrics(ty, &report);

        info!(
            user_id = user.id,
            notification_type = %ty,
            email = report.email.label(),
            in_app = report.in_app.label(),
            "Notification dispatched"
        );
        Ok(report)
    }

    async fn deliver_in_app(&self, user: &User, request: &DispatchRequest) -> (ChannelOutcome, Option<i64>) {
        let input = NewNotification {
            user_id: user.id,
            title: Some(request.subject.clone()),
            message: request.message.clone(),
            notification_type: request.notification_type,
            priority: request.priority,
            data: request.data.clone(),
        };

        match self.stores.notifications.create(input).await {
            Ok(notification) => (ChannelOutcome::Delivered, Some(notification.id)),
            Err(e) => {
                error!(user_id = user.id, error = %e, "Failed to store in-app notification");
                (ChannelOutcome::Failed(FailureCause::Persistence(e.to_string())), None)
            }
        }
    }

    async fn deliver_email(&self, user: &User, request: &DispatchRequest) -> ChannelOutcome {
        if !user.has_email() {
            return ChannelOutcome::Skipped(SkipReason::NoEmailAddress);
        }
        let Some(mailer) = &self.mailer else {
            warn!(user_id = user.id, "Mail client not configured, email not sent");
            return ChannelOutcome::Failed(FailureCause::MailNotConfigured);
        };
        if self.config.frontend_url.is_none() {
            error!(user_id = user.id, "FRONTEND_URL is not configured, email not sent");
            return ChannelOutcome::Failed(FailureCause::SiteUrlNotConfigured);
        }

        let content = request.email_content.as_deref().unwrap_or(&request.message);
        let rendered = match self.render(Some(request.notification_type), &request.subject, content, &request.template_vars) {
            Ok(rendered) => rendered,
            Err(e) => {
                error!(user_id = user.id, error = %e, "Failed to render email");
                return ChannelOutcome::Failed(FailureCause::Render(e.to_string()));
            }
        };

        let email = EmailContent::new(&user.email, &request.subject, rendered.html).with_text(rendered.text);
        match mailer.send(&email).await {
            Ok(_) => ChannelOutcome::Delivered,
            Err(e) => {
                error!(user_id = user.id, provider = mailer.name(), error = %e, "Failed to send email");
                ChannelOutcome::Failed(FailureCause::Transport(e.to_string()))
            }
        }
    }

    /// Render with the built-in variables merged over `caller_vars`.
    pub(crate) fn render(
        &self,
        ty: Option<NotificationType>,
        subject: &str,
        content: &str,
        caller_vars: &Map<String, Value>,
    ) -> NotificationResult<RenderedEmail> {
        let frontend_url = self.config.require_frontend_url()?;

        let mut vars = caller_vars.clone();
        vars.insert("subject".into(), json!(subject));
        vars.insert("content".into(), json!(content));
        vars.insert("year".into(), json!(Utc::now().year()));
        vars.insert("frontend_url".into(), json!(frontend_url));
        vars.insert("unsubscribe_url".into(), json!(format!("{}/unsubscribe", frontend_url)));
        vars.insert("site_name".into(), json!(self.config.site_name));

        self.templates.render(ty, &vars)
    }

    /// Send a rendered generic email straight to an address, bypassing user
    /// lookup and preferences.
    pub(crate) async fn send_direct(
        &self,
        to: &str,
        subject: &str,
        content: &str,
        reply_to: Option<&str>,
    ) -> NotificationResult<SentEmail> {
        let mailer = self
            .mailer
            .as_ref()
            .ok_or_else(|| NotificationError::ConfigError("Mail client is not configured".to_string()))?;

        let rendered = self.render(None, subject, content, &Map::new())?;
        let mut email = EmailContent::new(to, subject, rendered.html).with_text(rendered.text);
        if let Some(reply_to) = reply_to {
            email = email.with_reply_to(reply_to);
        }

        let sent = mailer.send(&email).await?;
        info!(to, subject, "Direct email sent");
        Ok(sent)
    }

    /// Counts over notifications created in the last `days` days.
    pub async fn notification_stats(&self, days: u32) -> NotificationResult<NotificationStats> {
        let since = Utc::now() - Duration::days(i64::from(days));
        self.stores.notifications.stats_since(since, days).await
    }

    fn record_metrics(&self, ty: NotificationType, report: &DispatchReport) {
        NotificationMetrics::record_channel(Channel::Email.as_str(), ty.as_str(), report.email.label());
        NotificationMetrics::record_channel(Channel::InApp.as_str(), ty.as_str(), report.in_app.label());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preference::{CategoryFlags, NotificationCategory, NotificationPreference};
    use crate::providers::{MockEmailProvider, RecordingProvider};
    use crate::repository::{MockNotificationRepository, MockPreferenceRepository};
    use domain_users::{NewUser, Role};

    struct Harness {
        users: InMemoryUserRepository,
        notifications: InMemoryNotificationRepository,
        preferences: InMemoryPreferenceRepository,
        mailer: RecordingProvider,
        service: NotificationService,
    }

    fn harness() -> Harness {
        let users = InMemoryUserRepository::new();
        let notifications = InMemoryNotificationRepository::new();
        let preferences = InMemoryPreferenceRepository::new();
        let mailer = RecordingProvider::new();

        let stores = Stores {
            users: Arc::new(users.clone()),
            organizations: Arc::new(InMemoryOrganizationRepository::new()),
            notifications: Arc::new(notifications.clone()),
            preferences: Arc::new(preferences.clone()),
        };
        let config = DispatchConfig::default().with_frontend_url("https://charity.example");
        let service = NotificationService::new(stores, config)
            .unwrap()
            .with_mailer(Arc::new(mailer.clone()));

        Harness {
            users,
            notifications,
            preferences,
            mailer,
            service,
        }
    }

    async fn add_user(h: &Harness, id: UserId, name: &str) -> User {
        let user = User::new(id, NewUser::new(format!("{}@example.org", name.to_lowercase()), Role::Visitor).named(name));
        h.users.insert(user.clone()).await;
        user
    }

    #[tokio::test]
    async fn test_user_without_preferences_gets_both_channels() {
        let h = harness();
        add_user(&h, 1, "Ana").await;

        let report = h
            .service
            .send_notification(DispatchRequest::new(1, NotificationType::General, "Hello", "World"))
            .await
            .unwrap();

        assert_eq!(report.email, ChannelOutcome::Delivered);
        assert_eq!(report.in_app, ChannelOutcome::Delivered);
        assert_eq!(h.notifications.len().await, 1);
        assert!(h.mailer.was_sent_to("ana@example.org").await);

        let row = h.notifications.get_by_id(report.notification_id.unwrap()).await.unwrap().unwrap();
        assert_eq!(row.title.as_deref(), Some("Hello"));
        assert!(row.email_sent, "row marked once both channels delivered");
        assert!(row.email_sent_at.is_some());
    }

    #[tokio::test]
    async fn test_unknown_user_writes_nothing() {
        let h = harness();

        let report = h
            .service
            .send_notification(DispatchRequest::new(999, NotificationType::Welcome, "Hi", "Hi"))
            .await
            .unwrap();

        assert_eq!(report, DispatchReport::skipped(SkipReason::UserNotFound));
        assert!(!report.delivered().email);
        assert!(!report.delivered().in_app);
        assert!(h.notifications.is_empty().await);
        assert_eq!(h.mailer.sent_count().await, 0);
    }

    #[tokio::test]
    async fn test_password_reset_respects_security_alert_flags() {
        let h = harness();
        add_user(&h, 42, "Ana").await;
        let mut prefs = NotificationPreference::defaults_for(1, 42);
        prefs.email.security_alerts = false;
        prefs.in_app.security_alerts = true;
        h.preferences.save(prefs).await.unwrap();

        let report = h
            .service
            .send_notification(DispatchRequest::new(
                42,
                NotificationType::PasswordReset,
                "Password Reset Request",
                "Click the link in your email to continue.",
            ))
            .await
            .unwrap();

        assert_eq!(h.notifications.count_for_user(42).await.unwrap(), 1);
        assert_eq!(h.mailer.sent_count().await, 0);
        assert_eq!(
            report.email,
            ChannelOutcome::Skipped(SkipReason::OptedOut {
                category: NotificationCategory::SecurityAlerts
            })
        );
        assert!(report.delivered().in_app);
    }

    #[tokio::test]
    async fn test_email_opt_out_never_calls_mailer() {
        let h = harness();
        add_user(&h, 7, "Bea").await;
        let mut prefs = NotificationPreference::defaults_for(1, 7);
        prefs.email = CategoryFlags::all(false);
        h.preferences.save(prefs).await.unwrap();

        let mut mailer = MockEmailProvider::new();
        mailer.expect_send().times(0);
        let service = h.service.clone().with_mailer(Arc::new(mailer));

        let report = service
            .send_notification(DispatchRequest::new(7, NotificationType::Reminder, "Reminder", "Soon"))
            .await
            .unwrap();
        assert!(!report.delivered().email);
        assert!(report.delivered().in_app);
    }

    #[tokio::test]
    async fn test_template_vars_reach_email() {
        let h = harness();
        add_user(&h, 3, "Ana").await;

        h.service
            .send_notification(
                DispatchRequest::new(3, NotificationType::Welcome, "Welcome", "Glad you are here").var("user_name", "Ana"),
            )
            .await
            .unwrap();

        let sent = h.mailer.sent().await;
        assert_eq!(sent.len(), 1);
        assert!(sent[0].html.contains("Ana"));
        assert!(sent[0].html.contains("Glad you are here"));
        assert!(sent[0].text.as_deref().is_some_and(|t| t.contains("Glad you are here")));
    }

    #[tokio::test]
    async fn test_builtin_vars_override_caller_vars() {
        let h = harness();
        let vars = json!({"unsubscribe_url": "https://evil.example"});
        let rendered = h
            .service
            .render(None, "Subject", "Body", vars.as_object().unwrap())
            .unwrap();
        assert!(rendered.html.contains("https://charity.example/unsubscribe"));
        assert!(!rendered.html.contains("evil"));
    }

    #[tokio::test]
    async fn test_email_content_overrides_message() {
        let h = harness();
        add_user(&h, 4, "Caio").await;

        h.service
            .send_notification(
                DispatchRequest::new(4, NotificationType::General, "News", "short").email_content("<p>long form</p>"),
            )
            .await
            .unwrap();

        let sent = h.mailer.sent().await;
        assert!(sent[0].html.contains("<p>long form</p>"));
        let row = &h.notifications.all().await[0];
        assert_eq!(row.message, "short");
    }

    #[tokio::test]
    async fn test_caller_can_disable_channels() {
        let h = harness();
        add_user(&h, 5, "Dan").await;

        let report = h
            .service
            .send_notification(
                DispatchRequest::new(5, NotificationType::SecurityAlert, "Alert", "New login").send_in_app(false),
            )
            .await
            .unwrap();

        assert_eq!(report.in_app, ChannelOutcome::Skipped(SkipReason::NotRequested));
        assert!(report.notification_id.is_none());
        assert!(report.delivered().email);
        assert!(h.notifications.is_empty().await);
    }

    #[tokio::test]
    async fn test_missing_mailer_and_frontend_fail_email_only() {
        let h = harness();
        add_user(&h, 6, "Eva").await;

        let stores = h.service.stores().clone();
        let no_mailer = NotificationService::new(stores.clone(), DispatchConfig::default().with_frontend_url("https://x.example")).unwrap();
        let report = no_mailer
            .send_notification(DispatchRequest::new(6, NotificationType::General, "s", "m"))
            .await
            .unwrap();
        assert_eq!(report.email, ChannelOutcome::Failed(FailureCause::MailNotConfigured));
        assert!(report.delivered().in_app);

        let no_frontend = NotificationService::new(stores, DispatchConfig::default())
            .unwrap()
            .with_mailer(Arc::new(RecordingProvider::new()));
        let report = no_frontend
            .send_notification(DispatchRequest::new(6, NotificationType::General, "s", "m"))
            .await
            .unwrap();
        assert_eq!(report.email, ChannelOutcome::Failed(FailureCause::SiteUrlNotConfigured));
    }

    #[tokio::test]
    async fn test_transport_failure_is_reported_not_raised() {
        let h = harness();
        add_user(&h, 8, "Fia").await;
        let service = h.service.clone().with_mailer(Arc::new(RecordingProvider::failing("connection refused")));

        let report = service
            .send_notification(DispatchRequest::new(8, NotificationType::General, "s", "m"))
            .await
            .unwrap();

        match report.email {
            ChannelOutcome::Failed(FailureCause::Transport(detail)) => assert!(detail.contains("connection refused")),
            other => panic!("unexpected outcome {other:?}"),
        }
        let row = h.notifications.get_by_id(report.notification_id.unwrap()).await.unwrap().unwrap();
        assert!(!row.email_sent);
    }

    #[tokio::test]
    async fn test_persistence_failure_is_reported_not_raised() {
        let h = harness();
        add_user(&h, 9, "Gil").await;

        let mut notifications = MockNotificationRepository::new();
        notifications
            .expect_create()
            .returning(|_| Err(NotificationError::DatabaseError("disk full".into())));
        let mut stores = h.service.stores().clone();
        stores.notifications = Arc::new(notifications);
        let service = NotificationService::new(stores, h.service.config().clone())
            .unwrap()
            .with_mailer(Arc::new(h.mailer.clone()));

        let report = service
            .send_notification(DispatchRequest::new(9, NotificationType::General, "s", "m"))
            .await
            .unwrap();

        assert_eq!(report.in_app, ChannelOutcome::Failed(FailureCause::Persistence("Database error: disk full".into())));
        assert!(report.delivered().email);
    }

    #[tokio::test]
    async fn test_preference_lookup_error_is_raised() {
        let h = harness();
        add_user(&h, 10, "Hal").await;

        let mut preferences = MockPreferenceRepository::new();
        preferences
            .expect_get_for_user()
            .returning(|_| Err(NotificationError::DatabaseError("timeout".into())));
        let mut stores = h.service.stores().clone();
        stores.preferences = Arc::new(preferences);
        let service = NotificationService::new(stores, h.service.config().clone()).unwrap();

        let err = service
            .send_notification(DispatchRequest::new(10, NotificationType::General, "s", "m"))
            .await
            .unwrap_err();
        assert!(matches!(err, NotificationError::DatabaseError(_)));
        assert!(h.notifications.is_empty().await);
    }

    #[tokio::test]
    async fn test_user_without_email_skips_email() {
        let h = harness();
        let mut user = User::new(11, NewUser::new("", Role::Visitor));
        user.email = String::new();
        h.users.insert(user).await;

        let report = h
            .service
            .send_notification(DispatchRequest::new(11, NotificationType::General, "s", "m"))
            .await
            .unwrap();
        assert_eq!(report.email, ChannelOutcome::Skipped(SkipReason::NoEmailAddress));
        assert!(report.delivered().in_app);
    }

    #[tokio::test]
    async fn test_payload_and_priority_are_stored() {
        let h = harness();
        add_user(&h, 12, "Ivo").await;

        let report = h
            .service
            .send_notification(
                DispatchRequest::new(12, NotificationType::Reminder, "Event", "Tomorrow")
                    .priority(NotificationPriority::Urgent)
                    .data(json!({"event_id": 77}))
                    .send_email(false),
            )
            .await
            .unwrap();

        let row = h.notifications.get_by_id(report.notification_id.unwrap()).await.unwrap().unwrap();
        assert_eq!(row.priority, NotificationPriority::Urgent);
        assert_eq!(row.data, Some(json!({"event_id": 77})));
        assert_eq!(row.notification_type, NotificationType::Reminder);
    }

    #[tokio::test]
    async fn test_notification_stats() {
        let h = harness();
        add_user(&h, 13, "Jo").await;
        for ty in [NotificationType::Welcome, NotificationType::Welcome, NotificationType::Reminder] {
            h.service
                .send_notification(DispatchRequest::new(13, ty, "s", "m").send_email(false))
                .await
                .unwrap();
        }

        let stats = h.service.notification_stats(DEFAULT_STATS_DAYS).await.unwrap();
        assert_eq!(stats.period_days, 30);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.unread, 3);
        assert_eq!(stats.by_type.get(&NotificationType::Welcome), Some(&2));
        assert_eq!(stats.by_priority.get(&NotificationPriority::Normal), Some(&3));
    }
}

//! Command execution. Every command yields a JSON value for printing.

use domain_notifications::{
    BulkRequest, DispatchRequest, NotificationService, PreferenceRepository, PreferenceService, RecordingProvider,
};
use domain_users::UserFilter;
use eyre::Result;
use serde_json::{Value, json, to_value};
use std::sync::Arc;
use tracing::info;

use crate::cli::{self, Command, ContentArgs, PreferencesAction};

pub struct App {
    pub service: NotificationService,
    pub preferences: PreferenceService<dyn PreferenceRepository>,
    /// Set under `--dry-run`
    pub outbox: Option<RecordingProvider>,
}

impl App {
    pub fn new(service: NotificationService, outbox: Option<RecordingProvider>) -> Self {
        let preferences = PreferenceService::from_arc(Arc::clone(&service.stores().preferences));
        Self {
            service,
            preferences,
            outbox,
        }
    }

    pub async fn run(&self, command: Command) -> Result<Value> {
        let result = match command {
            Command::Migrate => {
                // handled in main, which owns the connection
                eyre::bail!("migrate runs before the service is built")
            }
            Command::Send { user, content, vars } => {
                let request = dispatch_request(user, content).vars(cli::vars_map(vars));
                to_value(self.service.send_notification(request).await?)?
            }
            Command::Bulk { content, filter } => {
                let request = bulk_request(content).filter(UserFilter::from(filter));
                to_value(self.service.send_bulk_notification(request).await?)?
            }
            Command::Preview { filter } => {
                to_value(self.service.preview_audience(&UserFilter::from(filter)).await?)?
            }
            Command::Stats { days } => to_value(self.service.notification_stats(days).await?)?,
            Command::Preferences { action } => self.preferences(action).await?,
            Command::Welcome {
                user,
                verification_token,
            } => to_value(
                self.service
                    .send_welcome(user, verification_token.as_deref())
                    .await?,
            )?,
            Command::OrgDecision { org, approved, .. } => {
                to_value(self.service.send_organization_decision(org, approved).await?)?
            }
        };

        self.with_outbox(result).await
    }

    async fn preferences(&self, action: PreferencesAction) -> Result<Value> {
        let value = match action {
            PreferencesAction::Show { user } => {
                let prefs = self.preferences.get_or_create(user).await?;
                json!({ "preferences": to_value(&prefs)?, "summary": to_value(prefs.summary())? })
            }
            PreferencesAction::Update {
                user,
                email,
                in_app,
                frequency,
                timezone,
                language,
            } => {
                let update = cli::update_from_flags(email, in_app, frequency, timezone, language);
                to_value(self.preferences.update(user, update).await?)?
            }
            PreferencesAction::Bulk {
                user,
                enable_all_emails,
                disable_all_emails,
                enable_all_inapp,
                disable_all_inapp,
            } => {
                let toggle = cli::toggle(enable_all_emails, disable_all_emails, enable_all_inapp, disable_all_inapp);
                to_value(self.preferences.apply_bulk(user, toggle).await?)?
            }
            PreferencesAction::Reset { user } => to_value(self.preferences.reset(user).await?)?,
        };
        Ok(value)
    }

    async fn with_outbox(&self, result: Value) -> Result<Value> {
        let Some(outbox) = &self.outbox else {
            return Ok(result);
        };

        let sent = outbox.sent().await;
        let mail_configured = self.service.mail_configured();
        info!(recorded = sent.len(), mail_configured, "Dry run, mail recorded instead of sent");
        Ok(json!({ "result": result, "mail_configured": mail_configured, "outbox": to_value(sent)? }))
    }
}

fn dispatch_request(user: i64, content: ContentArgs) -> DispatchRequest {
    let mut request = DispatchRequest::new(user, content.notification_type, content.subject, content.message)
        .priority(content.priority)
        .send_email(!content.no_email)
        .send_in_app(!content.no_in_app);
    if let Some(body) = content.email_content {
        request = request.email_content(body);
    }
    request
}

fn bulk_request(content: ContentArgs) -> BulkRequest {
    let mut request = BulkRequest::new(content.notification_type, content.subject, content.message)
        .priority(content.priority)
        .send_email(!content.no_email)
        .send_in_app(!content.no_in_app);
    if let Some(body) = content.email_content {
        request = request.email_content(body);
    }
    request
}

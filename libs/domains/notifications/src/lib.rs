//! Notifications Domain
//!
//! Dispatches directory notifications to users over two channels: a stored
//! in-app record and an email rendered from templates. Each channel is gated
//! independently by the user's preferences.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────┐
//! │ Helpers / Bulk           │  ← welcome, org decisions, contact, audience runs
//! └────────────┬─────────────┘
//!              │
//! ┌────────────▼─────────────┐
//! │ NotificationService      │  ← preference gate, render, deliver, report
//! └──┬─────────┬──────────┬──┘
//!    │         │          │
//! ┌──▼───┐ ┌───▼──────┐ ┌─▼──────────┐
//! │Policy│ │Templates │ │ Providers  │  ← SMTP via lettre, in-memory recorder
//! └──────┘ └──────────┘ └────────────┘
//!              │
//! ┌────────────▼─────────────┐
//! │ Repositories             │  ← notifications and preferences, Postgres + in-memory
//! └──────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_notifications::{
//!     DispatchConfig, DispatchRequest, NotificationService, NotificationType, RecordingProvider, Stores,
//! };
//! use std::sync::Arc;
//!
//! # async fn run() -> domain_notifications::NotificationResult<()> {
//! let service = NotificationService::new(Stores::in_memory(), DispatchConfig::default())?
//!     .with_mailer(Arc::new(RecordingProvider::new()));
//!
//! let report = service
//!     .send_notification(DispatchRequest::new(42, NotificationType::General, "Hello", "Welcome aboard"))
//!     .await?;
//! println!("{}", report.email.label());
//! # Ok(())
//! # }
//! ```

pub mod bulk;
pub mod config;
pub mod entity;
pub mod error;
pub mod helpers;
pub mod models;
pub mod outcome;
pub mod policy;
pub mod postgres;
pub mod preference;
pub mod preference_service;
pub mod providers;
pub mod repository;
pub mod service;
pub mod templates;

pub use bulk::{AudiencePreview, BulkOptions, BulkRequest, BulkSummary};
pub use config::DispatchConfig;
pub use error::{NotificationError, NotificationResult};
pub use helpers::AdvertisingInquiry;
pub use models::{NewNotification, Notification, NotificationId, NotificationPriority, NotificationStats, NotificationType};
pub use outcome::{ChannelOutcome, DispatchReport, FailureCause, SkipReason};
pub use policy::{Gate, PreferencePolicy, UnmappedTypePolicy};
pub use postgres::{PgNotificationRepository, PgPreferenceRepository};
pub use preference::{
    BulkPreferenceToggle, CategoryFlags, Channel, DigestFrequency, NotificationCategory, NotificationPreference,
    PreferenceSummary, UpdatePreferences,
};
pub use preference_service::PreferenceService;
pub use providers::{EmailContent, EmailProvider, RecordingProvider, SentEmail, SmtpConfig, SmtpProvider};
pub use repository::{
    InMemoryNotificationRepository, InMemoryPreferenceRepository, NotificationRepository, PreferenceRepository,
};
pub use service::{DispatchRequest, NotificationService, Stores};
pub use templates::{RenderedEmail, TemplateEngine};

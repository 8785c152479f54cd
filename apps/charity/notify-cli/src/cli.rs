//! Command-line surface.

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use domain_notifications::{
    BulkPreferenceToggle, Channel, DigestFrequency, NotificationCategory, NotificationPriority, NotificationType,
    UpdatePreferences,
};
use domain_users::{Role, UserFilter, UserId};
use serde_json::{Map, Value};

#[derive(Parser, Debug)]
#[command(name = "charity-notify")]
#[command(about = "Send and inspect charity directory notifications")]
pub struct Cli {
    /// Record outbound mail instead of sending it, and print it with the result
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Print the Prometheus metrics recorded during the run after the result
    #[arg(long, global = true)]
    pub metrics: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply pending database migrations
    Migrate,

    /// Send one notification to one user
    Send {
        #[arg(long)]
        user: UserId,

        #[command(flatten)]
        content: ContentArgs,

        /// Extra template variable as key=value (repeatable)
        #[arg(long = "var", value_parser = parse_var)]
        vars: Vec<(String, String)>,
    },

    /// Send one notification to every user matching a filter
    Bulk {
        #[command(flatten)]
        content: ContentArgs,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Show who a bulk run would reach, without sending
    Preview {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Counts over recently created notifications
    Stats {
        #[arg(long, default_value_t = 30)]
        days: u32,
    },

    /// Inspect or change a user's preferences
    Preferences {
        #[command(subcommand)]
        action: PreferencesAction,
    },

    /// Send the welcome notification
    Welcome {
        #[arg(long)]
        user: UserId,

        /// Include a verification link built from this token
        #[arg(long)]
        verification_token: Option<String>,
    },

    /// Tell an organization's admin about a moderation decision
    OrgDecision {
        #[arg(long)]
        org: i64,

        #[arg(long, conflicts_with = "rejected", required_unless_present = "rejected")]
        approved: bool,

        #[arg(long)]
        rejected: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum PreferencesAction {
    /// Stored preferences and their summary
    Show {
        #[arg(long)]
        user: UserId,
    },

    /// Change individual flags or settings
    Update {
        #[arg(long)]
        user: UserId,

        /// category=true|false for the email channel (repeatable)
        #[arg(long = "email", value_parser = parse_flag)]
        email: Vec<(NotificationCategory, bool)>,

        /// category=true|false for the in-app channel (repeatable)
        #[arg(long = "in-app", value_parser = parse_flag)]
        in_app: Vec<(NotificationCategory, bool)>,

        #[arg(long)]
        frequency: Option<DigestFrequency>,

        #[arg(long)]
        timezone: Option<String>,

        #[arg(long)]
        language: Option<String>,
    },

    /// Switch whole channels on or off
    Bulk {
        #[arg(long)]
        user: UserId,

        #[arg(long)]
        enable_all_emails: bool,

        #[arg(long)]
        disable_all_emails: bool,

        #[arg(long)]
        enable_all_inapp: bool,

        #[arg(long)]
        disable_all_inapp: bool,
    },

    /// Replace the stored record with defaults
    Reset {
        #[arg(long)]
        user: UserId,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ContentArgs {
    #[arg(long = "type")]
    pub notification_type: NotificationType,

    #[arg(long)]
    pub subject: String,

    #[arg(long)]
    pub message: String,

    /// Email body when it should differ from the in-app message
    #[arg(long)]
    pub email_content: Option<String>,

    #[arg(long, default_value = "normal")]
    pub priority: NotificationPriority,

    #[arg(long)]
    pub no_email: bool,

    #[arg(long)]
    pub no_in_app: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    #[arg(long)]
    pub role: Option<Role>,

    #[arg(long, conflicts_with = "unverified")]
    pub verified: bool,

    #[arg(long)]
    pub unverified: bool,

    /// RFC 3339 timestamp
    #[arg(long)]
    pub created_after: Option<DateTime<Utc>>,

    #[arg(long)]
    pub created_before: Option<DateTime<Utc>>,

    #[arg(long)]
    pub last_login_after: Option<DateTime<Utc>>,
}

impl From<FilterArgs> for UserFilter {
    fn from(args: FilterArgs) -> Self {
        let is_verified = match (args.verified, args.unverified) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };

        UserFilter {
            role: args.role,
            is_verified,
            created_after: args.created_after,
            created_before: args.created_before,
            last_login_after: args.last_login_after,
        }
    }
}

pub fn vars_map(vars: Vec<(String, String)>) -> Map<String, Value> {
    vars.into_iter().map(|(k, v)| (k, Value::String(v))).collect()
}

pub fn update_from_flags(
    email: Vec<(NotificationCategory, bool)>,
    in_app: Vec<(NotificationCategory, bool)>,
    frequency: Option<DigestFrequency>,
    timezone: Option<String>,
    language: Option<String>,
) -> UpdatePreferences {
    let base = UpdatePreferences {
        frequency_digest: frequency,
        timezone,
        language,
        ..Default::default()
    };

    let with_email = email
        .into_iter()
        .fold(base, |update, (category, enabled)| update.set(Channel::Email, category, enabled));
    in_app
        .into_iter()
        .fold(with_email, |update, (category, enabled)| update.set(Channel::InApp, category, enabled))
}

pub fn toggle(
    enable_all_emails: bool,
    disable_all_emails: bool,
    enable_all_inapp: bool,
    disable_all_inapp: bool,
) -> BulkPreferenceToggle {
    BulkPreferenceToggle {
        enable_all_emails,
        disable_all_emails,
        enable_all_inapp,
        disable_all_inapp,
    }
}

fn parse_var(s: &str) -> Result<(String, String), String> {
    let (key, value) = s.split_once('=').ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    if key.is_empty() {
        return Err("variable name is empty".to_string());
    }
    Ok((key.to_string(), value.to_string()))
}

fn parse_flag(s: &str) -> Result<(NotificationCategory, bool), String> {
    let (category, enabled) = s
        .split_once('=')
        .ok_or_else(|| format!("expected category=true|false, got '{}'", s))?;
    let category = category
        .parse::<NotificationCategory>()
        .map_err(|_| format!("unknown category '{}'", category))?;
    let enabled = enabled
        .parse::<bool>()
        .map_err(|_| format!("expected true or false, got '{}'", enabled))?;
    Ok((category, enabled))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("charity-notify").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_send_parses_content_and_vars() {
        let cli = parse(&[
            "send",
            "--user",
            "42",
            "--type",
            "password_reset",
            "--subject",
            "Reset",
            "--message",
            "Use the link",
            "--priority",
            "high",
            "--no-in-app",
            "--var",
            "reset_url=https://charity.example/reset?token=abc",
        ]);

        let Command::Send { user, content, vars } = cli.command else {
            panic!("expected send");
        };
        assert_eq!(user, 42);
        assert_eq!(content.notification_type, NotificationType::PasswordReset);
        assert_eq!(content.priority, NotificationPriority::High);
        assert!(content.no_in_app);
        assert!(!content.no_email);
        assert_eq!(vars[0].1, "https://charity.example/reset?token=abc");
    }

    #[test]
    fn test_bulk_filter_maps_to_user_filter() {
        let cli = parse(&[
            "--dry-run",
            "bulk",
            "--type",
            "system_announcement",
            "--subject",
            "News",
            "--message",
            "Hello",
            "--role",
            "org_admin",
            "--unverified",
            "--created-after",
            "2026-01-01T00:00:00Z",
        ]);
        assert!(cli.dry_run);

        let Command::Bulk { filter, .. } = cli.command else {
            panic!("expected bulk");
        };
        let filter = UserFilter::from(filter);
        assert_eq!(filter.role, Some(Role::OrgAdmin));
        assert_eq!(filter.is_verified, Some(false));
        assert!(filter.created_after.is_some());
        assert!(filter.last_login_after.is_none());
    }

    #[test]
    fn test_metrics_flag_is_global() {
        assert!(!parse(&["stats"]).metrics);
        let cli = parse(&["stats", "--days", "7", "--metrics"]);
        assert!(cli.metrics);
        assert!(matches!(cli.command, Command::Stats { days: 7 }));
    }

    #[test]
    fn test_verified_flags_conflict() {
        let result = Cli::try_parse_from(["charity-notify", "preview", "--verified", "--unverified"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_org_decision_requires_a_verdict() {
        assert!(Cli::try_parse_from(["charity-notify", "org-decision", "--org", "3"]).is_err());
        let cli = parse(&["org-decision", "--org", "3", "--rejected"]);
        assert!(matches!(
            cli.command,
            Command::OrgDecision {
                approved: false,
                rejected: true,
                ..
            }
        ));
    }

    #[test]
    fn test_preferences_update_flags() {
        let cli = parse(&[
            "preferences",
            "update",
            "--user",
            "7",
            "--email",
            "bookmark_digest=true",
            "--in-app",
            "reminders=false",
            "--frequency",
            "daily",
        ]);
        let Command::Preferences {
            action:
                PreferencesAction::Update {
                    email,
                    in_app,
                    frequency,
                    timezone,
                    language,
                    ..
                },
        } = cli.command
        else {
            panic!("expected preferences update");
        };

        let update = update_from_flags(email, in_app, frequency, timezone, language);
        assert_eq!(update.email.get(&NotificationCategory::BookmarkDigest), Some(&true));
        assert_eq!(update.in_app.get(&NotificationCategory::Reminders), Some(&false));
        assert_eq!(update.frequency_digest, Some(DigestFrequency::Daily));
    }

    #[test]
    fn test_flag_parser_rejects_garbage() {
        assert!(parse_flag("welcome").is_err());
        assert!(parse_flag("nope=true").is_err());
        assert!(parse_flag("welcome=maybe").is_err());
        assert_eq!(parse_flag("welcome=false"), Ok((NotificationCategory::Welcome, false)));
    }

    #[test]
    fn test_var_parser() {
        assert_eq!(parse_var("a=b=c"), Ok(("a".to_string(), "b=c".to_string())));
        assert!(parse_var("=x").is_err());
        assert!(parse_var("novalue").is_err());
    }
}

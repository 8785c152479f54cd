//! Charity Notify
//!
//! Operator CLI for the charity directory's notification dispatch: single and
//! bulk sends, audience preview, statistics and preference management.

use clap::Parser;
use core_config::FromEnv;
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_notifications::{NotificationService, RecordingProvider, SmtpProvider, Stores};
use eyre::{Result, WrapErr};
use migration::Migrator;
use std::sync::Arc;
use tracing::{info, warn};

mod cli;
mod commands;
mod config;

use cli::{Cli, Command};
use commands::App;
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);
    observability::init_metrics();

    let cli = Cli::parse();

    info!("Connecting to database...");
    let db = database::postgres::connect_with_retry(&config.database, &config.connect_retry)
        .await
        .wrap_err("Database connection failed")?;

    if matches!(cli.command, Command::Migrate) {
        database::postgres::run_migrations::<Migrator>(&db).await?;
        println!("{}", serde_json::json!({ "migrated": true }));
        return Ok(());
    }

    let mut service = NotificationService::new(Stores::postgres(db), config.dispatch.clone())?
        .with_bulk_options(config.bulk.clone());

    let outbox = if cli.dry_run {
        let outbox = RecordingProvider::new();
        service = service.with_mailer(Arc::new(outbox.clone()));
        Some(outbox)
    } else {
        match &config.smtp {
            Some(smtp) => service = service.with_mailer(Arc::new(SmtpProvider::new(smtp.clone())?)),
            None => warn!("SMTP_HOST is not set, emails will be reported as failed"),
        }
        None
    };

    let app = App::new(service, outbox);
    let output = app.run(cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    if cli.metrics {
        print!("{}", observability::render_metrics());
    }

    Ok(())
}

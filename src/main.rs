//! gsuite-role-sync - Main Binary
//!
//! One-shot job that writes spreadsheet-defined roles into Google Workspace
//! custom user attributes. Exits non-zero when configuration, credentials or
//! the mapping read fail, or when any user update is rejected.

use anyhow::{bail, Context, Result};
use clap::Parser;
use gsuite_role_sync::google::{
    Credentials, DirectoryClient, GoogleClient, ServiceAccountKey, SheetsClient,
};
use gsuite_role_sync::{RoleSync, SyncConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Google Workspace role sync CLI
#[derive(Parser)]
#[command(name = "gsuite-role-sync")]
#[command(about = "Sync group role mappings from a sheet into Google Workspace user attributes")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "GSUITE_ROLE_SYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Custom schema name (overrides config)
    #[arg(long, env = "schema_name")]
    schema_name: Option<String>,

    /// Schema field receiving role entries
    #[arg(long, env = "iam_role_property_name")]
    role_field: Option<String>,

    /// Schema field receiving the session duration
    #[arg(long, env = "session_duration_property_name")]
    duration_field: Option<String>,

    /// Session duration in seconds
    #[arg(long, env = "session_duration_property_value")]
    session_duration: Option<u32>,

    /// Administrator impersonated by the service account
    #[arg(long, env = "assume_user")]
    assume_user: Option<String>,

    /// Mapping spreadsheet ID
    #[arg(long, env = "spreadsheet_id")]
    spreadsheet_id: Option<String>,

    /// Mapping range in A1 notation, header row included
    #[arg(long, env = "spreadsheet_range_name")]
    spreadsheet_range: Option<String>,

    /// Identity provider reference appended to each role
    #[arg(long, env = "idp_arn")]
    idp_arn: Option<String>,

    /// Service account key file
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS")]
    credentials_path: Option<PathBuf>,

    /// Pre-issued access token, used instead of the key file
    #[arg(long, env = "GOOGLE_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Compute and log updates without writing them
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn apply(self, config: &mut SyncConfig) {
        if let Some(value) = self.schema_name {
            config.schema_name = value;
        }
        if let Some(value) = self.role_field {
            config.role_field = value;
        }
        if let Some(value) = self.duration_field {
            config.duration_field = value;
        }
        if let Some(value) = self.session_duration {
            config.session_duration = value;
        }
        if let Some(value) = self.assume_user {
            config.assume_user = value;
        }
        if let Some(value) = self.spreadsheet_id {
            config.spreadsheet_id = value;
        }
        if let Some(value) = self.spreadsheet_range {
            config.spreadsheet_range = value;
        }
        if let Some(value) = self.idp_arn {
            config.idp_arn = value;
        }
        if let Some(value) = self.credentials_path {
            config.credentials_path = value;
        }
        if self.access_token.is_some() {
            config.access_token = self.access_token;
        }
        if self.dry_run {
            config.dry_run = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(true)
        .with_line_number(true)
        .init();

    info!("Starting gsuite-role-sync v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => {
            let config = SyncConfig::load(path)?;
            info!("Loaded configuration from {:?}", path);
            config
        }
        None => SyncConfig::default(),
    };

    // Apply CLI and environment overrides
    cli.apply(&mut config);
    config.validate()?;

    if config.dry_run {
        warn!("Dry run enabled, no user will be updated");
    }

    let credentials = match &config.access_token {
        Some(token) => Credentials::AccessToken(token.clone()),
        None => {
            let key = ServiceAccountKey::from_file(&config.credentials_path)
                .await
                .with_context(|| {
                    format!("Loading service account key {:?}", config.credentials_path)
                })?;
            info!(client = %key.client_email, subject = %config.assume_user, "Using service account");
            Credentials::ServiceAccount {
                key,
                subject: config.assume_user.clone(),
            }
        }
    };

    let client = Arc::new(
        GoogleClient::new(credentials, &config.client_options())
            .context("Creating Google API client")?,
    );
    let directory = DirectoryClient::new(Arc::clone(&client), config.directory_base_url()?);
    let sheets = SheetsClient::new(client, config.sheets_base_url()?);

    let sync = RoleSync::new(&config, Arc::new(directory), Arc::new(sheets));

    let report = sync.run().await.context("Role synchronization failed")?;

    report.log_summary();

    if !report.is_success() {
        bail!(
            "{} of {} user updates failed",
            report.update_failures.len(),
            report.users_resolved
        );
    }

    Ok(())
}

//! Run configuration loading and validation

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::error::{Result, SyncError};
use crate::google::{ClientOptions, DEFAULT_DIRECTORY_URL, DEFAULT_SHEETS_URL};
use crate::payload::SchemaLayout;
use crate::resolver::ResolverConfig;

/// Complete configuration of one synchronization run
///
/// Loaded from an optional TOML file, then overridden by command line flags
/// and environment variables, then validated once before any I/O.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Custom schema holding the federation attributes
    pub schema_name: String,
    /// Multi-valued schema field receiving `<role>,<idp>` entries
    pub role_field: String,
    /// Schema field receiving the session duration
    pub duration_field: String,
    /// Session duration in seconds written to every user
    pub session_duration: u32,
    /// Administrator impersonated by the service account
    pub assume_user: String,
    pub spreadsheet_id: String,
    /// A1 notation range of the mapping, header row included
    pub spreadsheet_range: String,
    /// Identity provider reference appended to every role
    pub idp_arn: String,
    /// Service account key file
    pub credentials_path: PathBuf,
    /// Pre-issued access token; takes precedence over `credentials_path`
    pub access_token: Option<String>,
    pub request_timeout_secs: u64,
    pub run_timeout_secs: u64,
    pub max_retries: u32,
    pub max_concurrency: usize,
    pub max_depth: usize,
    /// Compute and log updates without writing them
    pub dry_run: bool,
    pub directory_url: String,
    pub sheets_url: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            schema_name: String::new(),
            role_field: String::new(),
            duration_field: String::new(),
            session_duration: 0,
            assume_user: String::new(),
            spreadsheet_id: String::new(),
            spreadsheet_range: String::new(),
            idp_arn: String::new(),
            credentials_path: default_credentials_path(),
            access_token: None,
            request_timeout_secs: 30,
            run_timeout_secs: 600,
            max_retries: 3,
            max_concurrency: 4,
            max_depth: 32,
            dry_run: false,
            directory_url: DEFAULT_DIRECTORY_URL.to_string(),
            sheets_url: DEFAULT_SHEETS_URL.to_string(),
        }
    }
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from("service.json")
}

impl SyncConfig {
    /// Load configuration from TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            SyncError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        toml::from_str(&contents)
            .map_err(|e| SyncError::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("schema_name", &self.schema_name),
            ("role_field", &self.role_field),
            ("duration_field", &self.duration_field),
            ("spreadsheet_id", &self.spreadsheet_id),
            ("spreadsheet_range", &self.spreadsheet_range),
            ("idp_arn", &self.idp_arn),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(SyncError::Config(format!("'{name}' must be set")));
            }
        }

        if self.role_field == self.duration_field {
            return Err(SyncError::Config(
                "'role_field' and 'duration_field' must differ".to_string(),
            ));
        }

        if self.session_duration == 0 {
            return Err(SyncError::Config(
                "'session_duration' must be a positive number of seconds".to_string(),
            ));
        }

        if self.access_token.is_none() && self.assume_user.trim().is_empty() {
            return Err(SyncError::Config(
                "'assume_user' must be set when authenticating with a service account".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 || self.run_timeout_secs == 0 {
            return Err(SyncError::Config("Timeouts must be non-zero".to_string()));
        }

        if self.max_concurrency == 0 {
            return Err(SyncError::Config("'max_concurrency' must be at least 1".to_string()));
        }

        if self.max_depth == 0 {
            return Err(SyncError::Config("'max_depth' must be at least 1".to_string()));
        }

        self.directory_base_url()?;
        self.sheets_base_url()?;

        Ok(())
    }

    pub fn schema_layout(&self) -> SchemaLayout {
        SchemaLayout {
            schema_name: self.schema_name.clone(),
            role_field: self.role_field.clone(),
            duration_field: self.duration_field.clone(),
            session_duration: self.session_duration,
            idp_arn: self.idp_arn.clone(),
        }
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            max_depth: self.max_depth,
            max_concurrency: self.max_concurrency,
        }
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            max_retries: self.max_retries,
            ..ClientOptions::default()
        }
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }

    pub fn directory_base_url(&self) -> Result<Url> {
        parse_base_url("directory_url", &self.directory_url)
    }

    pub fn sheets_base_url(&self) -> Result<Url> {
        parse_base_url("sheets_url", &self.sheets_url)
    }
}

fn parse_base_url(name: &str, value: &str) -> Result<Url> {
    let url = Url::parse(value)
        .map_err(|e| SyncError::Config(format!("'{name}' is not a valid URL: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(SyncError::Config(format!("'{name}' cannot be used as a base URL")));
    }
    Ok(url)
}

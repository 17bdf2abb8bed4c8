//! # Google Workspace Role Sync (gsuite-role-sync)
//!
//! Synchronizes spreadsheet-defined group role mappings into custom user
//! attributes of a Google Workspace directory, with support for:
//! - Group to role mappings read from a sheet range
//! - Recursive expansion of nested groups
//! - Role union for users reached through several groups
//! - Cycle and diamond safe traversal
//! - Failure isolation per group subtree and per user
//! - Dry runs that log payloads instead of writing
//!
//! ## Example
//!
//! ```rust,no_run
//! use gsuite_role_sync::google::{DirectoryClient, GoogleClient, SheetsClient};
//! use gsuite_role_sync::google::{Credentials, DEFAULT_DIRECTORY_URL, DEFAULT_SHEETS_URL};
//! use gsuite_role_sync::{RoleSync, SyncConfig};
//! use std::sync::Arc;
//! use url::Url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SyncConfig::load("sync.toml")?;
//! config.validate()?;
//!
//! let credentials = Credentials::AccessToken("ya29.token".to_string());
//! let client = Arc::new(GoogleClient::new(credentials, &config.client_options())?);
//!
//! let directory = DirectoryClient::new(client.clone(), Url::parse(DEFAULT_DIRECTORY_URL)?);
//! let sheets = SheetsClient::new(client, Url::parse(DEFAULT_SHEETS_URL)?);
//!
//! let sync = RoleSync::new(&config, Arc::new(directory), Arc::new(sheets));
//! let report = sync.run().await?;
//! report.log_summary();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod directory;
pub mod error;
pub mod google;
pub mod mapping;
pub mod payload;
pub mod report;
pub mod resolver;
pub mod sync;
pub mod types;

pub use config::SyncConfig;
pub use directory::Directory;
pub use error::{FailureKind, Result, SyncError};
pub use mapping::SheetSource;
pub use payload::{RoleAttributeUpdate, RoleEntry, SchemaLayout};
pub use report::{SyncReport, UpdateFailure};
pub use resolver::{Expansion, ExpansionFailure, GroupResolver, Resolution, ResolverConfig};
pub use sync::{PlannedUpdate, RoleSync, SyncPlan};
pub use types::{GroupRoleMapping, Member, MemberKind, Role, UserRoleMapping};

//! Google Workspace collaborators: credentials, HTTP transport, the Admin SDK
//! Directory API and the Sheets API.

mod auth;
mod client;
mod directory;
mod sheets;

pub use auth::{Credentials, ServiceAccountKey, TokenCache, SCOPES};
pub use client::{ClientOptions, GoogleClient};
pub use directory::{DirectoryClient, DEFAULT_DIRECTORY_URL};
pub use sheets::{SheetsClient, DEFAULT_SHEETS_URL};

//! # Mapping Loader
//!
//! Turns the rows of the mapping sheet into a [`GroupRoleMapping`].
//!
//! The sheet layout is:
//!
//! | group            | roles                  |
//! |------------------|------------------------|
//! | eng@example.com  | reader, writer         |
//! | ops@example.com  | admin                  |
//!
//! The first row is a header. Roles are comma separated and trimmed.
//!
//! [`GroupRoleMapping`]: crate::types::GroupRoleMapping

mod loader;

pub use loader::{load, parse_rows};

use async_trait::async_trait;

use crate::error::Result;

/// Source of tabular values addressed by document and range
#[async_trait]
pub trait SheetSource: Send + Sync {
    /// Reads a rectangular range as rows of cell strings
    ///
    /// Trailing empty cells may be omitted, so rows can be shorter than the
    /// range is wide.
    async fn read_range(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<Vec<String>>>;
}

//! Row parsing and sheet loading

use tracing::{debug, info, instrument};

use super::SheetSource;
use crate::error::Result;
use crate::types::{GroupRoleMapping, Role};

/// Column holding the group identifier
const GROUP_COLUMN: usize = 0;

/// Column holding the comma-separated role list
const ROLES_COLUMN: usize = 1;

/// Parses sheet rows into a group to role mapping
///
/// Row 0 is treated as a header and skipped. Rows whose group cell is empty
/// after trimming are skipped entirely. Repeated groups are merged by union.
///
/// # Examples
///
/// ```rust
/// use gsuite_role_sync::mapping::parse_rows;
///
/// let rows = vec![
///     vec!["Group".to_string(), "Roles".to_string()],
///     vec!["eng@example.com".to_string(), "reader, writer".to_string()],
/// ];
///
/// let mapping = parse_rows(&rows);
/// assert_eq!(mapping.len(), 1);
/// assert!(mapping.roles("eng@example.com").unwrap().contains("writer"));
/// ```
pub fn parse_rows(rows: &[Vec<String>]) -> GroupRoleMapping {
    let mut mapping = GroupRoleMapping::new();

    for (index, row) in rows.iter().enumerate().skip(1) {
        let group = row
            .get(GROUP_COLUMN)
            .map(|cell| cell.trim())
            .unwrap_or_default();

        if group.is_empty() {
            debug!(row = index, "Skipping row without group identifier");
            continue;
        }

        let roles = row
            .get(ROLES_COLUMN)
            .map(|cell| split_roles(cell))
            .unwrap_or_default();

        mapping.insert_roles(group, roles);
    }

    mapping
}

/// Splits a role cell on commas
///
/// Role values are not validated, but empty elements (`"a,,b"`, a trailing
/// comma) are dropped on purpose: kept, they would be written as a bare
/// `",<idp>"` entry.
fn split_roles(cell: &str) -> Vec<Role> {
    cell.split(',')
        .map(str::trim)
        .filter(|role| !role.is_empty())
        .map(String::from)
        .collect()
}

/// Reads the mapping range from `source` and parses it
///
/// An empty range yields an empty mapping; this is logged but is not an
/// error. Read failures propagate.
#[instrument(skip(source))]
pub async fn load(
    source: &dyn SheetSource,
    spreadsheet_id: &str,
    range: &str,
) -> Result<GroupRoleMapping> {
    let rows = source.read_range(spreadsheet_id, range).await?;

    if rows.is_empty() {
        info!("No data found in mapping range");
        return Ok(GroupRoleMapping::new());
    }

    let mapping = parse_rows(&rows);
    info!(
        rows = rows.len().saturating_sub(1),
        groups = mapping.len(),
        "Loaded group role mapping"
    );

    Ok(mapping)
}

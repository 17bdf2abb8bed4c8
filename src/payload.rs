//! Typed custom-schema update payload
//!
//! The directory expects a nested document whose keys are chosen by
//! configuration:
//!
//! ```json
//! {
//!   "customSchemas": {
//!     "<schema>": {
//!       "<role field>": [{ "value": "<role>,<idp>" }],
//!       "<duration field>": 3600
//!     }
//!   }
//! }
//! ```
//!
//! [`SchemaLayout`] fixes the key names once so that request construction
//! cannot misspell them.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::BTreeSet;

use crate::types::Role;

/// Separator between the role and the identity provider reference
pub const ROLE_ENTRY_SEPARATOR: char = ',';

/// One entry of the multi-valued role attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleEntry {
    pub value: String,
}

impl RoleEntry {
    /// Builds `"<role>,<idp_arn>"`
    pub fn new(role: &str, idp_arn: &str) -> Self {
        Self {
            value: format!("{role}{ROLE_ENTRY_SEPARATOR}{idp_arn}"),
        }
    }
}

/// Names and fixed values of the custom schema receiving role entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaLayout {
    pub schema_name: String,
    pub role_field: String,
    pub duration_field: String,
    pub session_duration: u32,
    pub idp_arn: String,
}

impl SchemaLayout {
    /// Builds the update for a user holding `roles`
    ///
    /// Role entries follow the iteration order of the set, so the same set
    /// always produces the same payload.
    pub fn build(&self, roles: &BTreeSet<Role>) -> RoleAttributeUpdate {
        RoleAttributeUpdate {
            schema_name: self.schema_name.clone(),
            role_field: self.role_field.clone(),
            duration_field: self.duration_field.clone(),
            session_duration: self.session_duration,
            roles: roles
                .iter()
                .map(|role| RoleEntry::new(role, &self.idp_arn))
                .collect(),
        }
    }
}

/// Full overwrite of one user's role attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAttributeUpdate {
    pub schema_name: String,
    pub role_field: String,
    pub duration_field: String,
    pub session_duration: u32,
    pub roles: Vec<RoleEntry>,
}

impl Serialize for RoleAttributeUpdate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut root = serializer.serialize_map(Some(1))?;
        root.serialize_entry("customSchemas", &CustomSchemas(self))?;
        root.end()
    }
}

struct CustomSchemas<'a>(&'a RoleAttributeUpdate);

impl Serialize for CustomSchemas<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut schemas = serializer.serialize_map(Some(1))?;
        schemas.serialize_entry(&self.0.schema_name, &SchemaFields(self.0))?;
        schemas.end()
    }
}

struct SchemaFields<'a>(&'a RoleAttributeUpdate);

impl Serialize for SchemaFields<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let update = self.0;
        let mut fields = serializer.serialize_map(Some(2))?;
        fields.serialize_entry(&update.role_field, &update.roles)?;
        fields.serialize_entry(&update.duration_field, &update.session_duration)?;
        fields.end()
    }
}

//! Typed outcome of group expansion

use serde::Serialize;

use crate::error::{serialize_kind, FailureKind, SyncError};
use crate::types::UserRoleMapping;

/// A directory failure isolated to one group subtree or one member
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpansionFailure {
    /// Group being expanded when the failure occurred
    pub group: String,
    /// Member whose lookup failed, if the failure was member-specific
    pub member: Option<String>,
    #[serde(serialize_with = "serialize_kind")]
    pub kind: FailureKind,
    pub message: String,
}

impl ExpansionFailure {
    pub fn new(group: &str, member: Option<&str>, error: &SyncError) -> Self {
        Self {
            group: group.to_string(),
            member: member.map(String::from),
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// What one or more expansions did besides granting roles
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expansion {
    /// Groups whose member list was fetched successfully
    pub groups_expanded: usize,
    /// Failures that discarded a subtree or a member
    pub failures: Vec<ExpansionFailure>,
    /// Membership cycles encountered, each as the closing path
    pub cycles: Vec<Vec<String>>,
}

impl Expansion {
    /// Folds another outcome into this one
    pub fn absorb(&mut self, other: Expansion) {
        self.groups_expanded += other.groups_expanded;
        self.failures.extend(other.failures);
        self.cycles.extend(other.cycles);
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.cycles.is_empty()
    }
}

/// Merged result of expanding every group of a mapping
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub users: UserRoleMapping,
    pub expansion: Expansion,
}

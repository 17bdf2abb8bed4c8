//! Summary of one synchronization run

use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::{serialize_kind, FailureKind, SyncError};
use crate::resolver::{Expansion, ExpansionFailure};

/// A user whose attribute update was rejected
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateFailure {
    pub user: String,
    #[serde(serialize_with = "serialize_kind")]
    pub kind: FailureKind,
    pub message: String,
}

impl UpdateFailure {
    pub fn new(user: &str, error: &SyncError) -> Self {
        Self {
            user: user.to_string(),
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Counts and failures collected over a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Top-level groups read from the mapping
    pub groups_in_mapping: usize,
    /// Groups (top-level and nested) whose members were listed
    pub groups_expanded: usize,
    pub users_resolved: usize,
    pub updates_applied: usize,
    /// Updates computed but not written (dry run)
    pub updates_skipped: usize,
    pub expansion_failures: Vec<ExpansionFailure>,
    pub update_failures: Vec<UpdateFailure>,
    pub cycles: Vec<Vec<String>>,
}

impl SyncReport {
    pub(crate) fn record_expansion(&mut self, expansion: Expansion) {
        self.groups_expanded += expansion.groups_expanded;
        self.expansion_failures.extend(expansion.failures);
        self.cycles.extend(expansion.cycles);
    }

    /// True when every computed update was written or skipped on purpose
    ///
    /// Expansion failures do not fail a run; they only reduce what was
    /// written.
    pub fn is_success(&self) -> bool {
        self.update_failures.is_empty()
    }

    /// Emits the report through `tracing`
    pub fn log_summary(&self) {
        for failure in &self.expansion_failures {
            match &failure.member {
                Some(member) => warn!(
                    group = %failure.group,
                    member = %member,
                    kind = %failure.kind,
                    "Member skipped: {}",
                    failure.message
                ),
                None => warn!(
                    group = %failure.group,
                    kind = %failure.kind,
                    "Group subtree skipped: {}",
                    failure.message
                ),
            }
        }

        for cycle in &self.cycles {
            warn!(cycle = %cycle.join(" -> "), "Membership cycle");
        }

        for failure in &self.update_failures {
            error!(
                user = %failure.user,
                kind = %failure.kind,
                "Update failed: {}",
                failure.message
            );
        }

        info!(
            groups_in_mapping = self.groups_in_mapping,
            groups_expanded = self.groups_expanded,
            users_resolved = self.users_resolved,
            updates_applied = self.updates_applied,
            updates_skipped = self.updates_skipped,
            expansion_failures = self.expansion_failures.len(),
            update_failures = self.update_failures.len(),
            cycles = self.cycles.len(),
            "Role synchronization finished"
        );
    }
}

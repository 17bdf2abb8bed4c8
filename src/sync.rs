//! # Role Synchronization Driver
//!
//! Ties the pieces of a run together:
//! 1. Load the group to role mapping from the sheet
//! 2. Expand every mapped group into users with their role union
//! 3. Overwrite each user's role attributes in the directory
//!
//! Only users reached from some mapped group are written. Each write carries
//! the user's complete role set, so running twice against unchanged inputs
//! produces the same directory state.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, error, info, instrument};

use crate::config::SyncConfig;
use crate::directory::Directory;
use crate::error::{Result, SyncError};
use crate::mapping::{self, SheetSource};
use crate::payload::{RoleAttributeUpdate, SchemaLayout};
use crate::report::{SyncReport, UpdateFailure};
use crate::resolver::{Expansion, GroupResolver};

/// Update computed for one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedUpdate {
    /// Canonical primary address of the user
    pub user: String,
    pub update: RoleAttributeUpdate,
}

/// Everything a run would write, before any write happens
#[derive(Debug, Clone, Default)]
pub struct SyncPlan {
    pub groups_in_mapping: usize,
    /// Updates ordered by user address
    pub updates: Vec<PlannedUpdate>,
    pub expansion: Expansion,
}

/// Driver of one synchronization run
pub struct RoleSync {
    directory: Arc<dyn Directory>,
    sheets: Arc<dyn SheetSource>,
    resolver: GroupResolver,
    layout: SchemaLayout,
    spreadsheet_id: String,
    spreadsheet_range: String,
    dry_run: bool,
    run_timeout: Duration,
}

impl RoleSync {
    pub fn new(
        config: &SyncConfig,
        directory: Arc<dyn Directory>,
        sheets: Arc<dyn SheetSource>,
    ) -> Self {
        let resolver = GroupResolver::new(Arc::clone(&directory), config.resolver_config());

        Self {
            directory,
            sheets,
            resolver,
            layout: config.schema_layout(),
            spreadsheet_id: config.spreadsheet_id.clone(),
            spreadsheet_range: config.spreadsheet_range.clone(),
            dry_run: config.dry_run,
            run_timeout: config.run_timeout(),
        }
    }

    /// Overrides the deadline taken from the configuration
    pub fn with_run_timeout(mut self, run_timeout: Duration) -> Self {
        self.run_timeout = run_timeout;
        self
    }

    /// Loads the mapping and resolves it into per-user updates
    ///
    /// # Errors
    ///
    /// Fails only when the mapping cannot be read. Directory failures during
    /// expansion are carried in [`SyncPlan::expansion`].
    #[instrument(skip(self), fields(spreadsheet = %self.spreadsheet_id))]
    pub async fn plan(&self) -> Result<SyncPlan> {
        let mapping = mapping::load(
            self.sheets.as_ref(),
            &self.spreadsheet_id,
            &self.spreadsheet_range,
        )
        .await?;

        let resolution = self.resolver.resolve_all(&mapping).await;

        let updates = resolution
            .users
            .iter()
            .map(|(user, roles)| PlannedUpdate {
                user: user.clone(),
                update: self.layout.build(roles),
            })
            .collect();

        Ok(SyncPlan {
            groups_in_mapping: mapping.len(),
            updates,
            expansion: resolution.expansion,
        })
    }

    /// Runs the synchronization and reports what happened
    ///
    /// Updates are applied one user at a time. A rejected update is recorded
    /// in the report and the run moves on to the next user. In dry-run mode
    /// the payloads are logged instead of written.
    ///
    /// The whole run is bounded by the run timeout. Once it passes, the
    /// update in flight and every remaining user are recorded as timed out
    /// and the report is returned.
    ///
    /// # Errors
    ///
    /// Fails when the mapping cannot be read, or when the deadline passes
    /// before any update was planned.
    #[instrument(skip(self), fields(dry_run = self.dry_run))]
    pub async fn run(&self) -> Result<SyncReport> {
        let deadline = Instant::now() + self.run_timeout;

        let plan = timeout_at(deadline, self.plan()).await.map_err(|_| {
            SyncError::Timeout(format!(
                "mapping not resolved within {:?}, no user was updated",
                self.run_timeout
            ))
        })??;

        let mut report = SyncReport {
            groups_in_mapping: plan.groups_in_mapping,
            users_resolved: plan.updates.len(),
            ..SyncReport::default()
        };
        report.record_expansion(plan.expansion);

        for planned in &plan.updates {
            if self.dry_run {
                let payload = serde_json::to_string(&planned.update)?;
                info!(user = %planned.user, %payload, "Dry run, update not written");
                report.updates_skipped += 1;
                continue;
            }

            let result = if Instant::now() >= deadline {
                Err(self.deadline_error("not attempted"))
            } else {
                timeout_at(
                    deadline,
                    self.directory.update_user(&planned.user, &planned.update),
                )
                .await
                .unwrap_or_else(|_| Err(self.deadline_error("interrupted")))
            };

            match result {
                Ok(()) => {
                    debug!(
                        user = %planned.user,
                        roles = planned.update.roles.len(),
                        "Updated role attributes"
                    );
                    report.updates_applied += 1;
                }
                Err(err) => {
                    error!(user = %planned.user, error = %err, "Failed to update user");
                    report
                        .update_failures
                        .push(UpdateFailure::new(&planned.user, &err));
                }
            }
        }

        Ok(report)
    }

    fn deadline_error(&self, state: &str) -> SyncError {
        SyncError::Timeout(format!(
            "run deadline of {:?} passed, update {state}",
            self.run_timeout
        ))
    }
}

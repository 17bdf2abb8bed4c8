//! Recursive group expansion with role aggregation
//!
//! This module provides the resolver that flattens nested directory groups
//! into users, including:
//! - Propagation of a top-level group's roles to every transitive member
//! - Cycle and diamond handling through per-traversal visit state
//! - Subtree-level failure isolation with typed failure records
//! - Cached primary address lookups shared across traversals
//! - Bounded concurrent expansion of independent top-level groups

use dashmap::DashMap;
use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::outcome::{Expansion, ExpansionFailure, Resolution};
use super::traversal::{Traversal, Visit};
use crate::directory::Directory;
use crate::error::{Result, SyncError};
use crate::types::{GroupRoleMapping, MemberKind, Role, UserRoleMapping};

/// Configuration for the group resolver
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Maximum number of nested groups on one expansion path
    pub max_depth: usize,

    /// Maximum number of top-level groups expanded at the same time
    pub max_concurrency: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_depth: 32,
            max_concurrency: 4,
        }
    }
}

/// Resolver that expands groups into users annotated with roles
///
/// Every user reached from a top-level group, directly or through any chain
/// of nested groups, receives that top-level group's roles. Nested groups do
/// not contribute their own mapped roles during the traversal; a nested group
/// that also appears in the mapping is expanded separately as its own
/// top-level group and the results are unioned.
///
/// # Failure isolation
///
/// Directory failures never escape an expansion. A group whose member list
/// cannot be fetched is skipped together with its subtree, and a member whose
/// primary address cannot be resolved is skipped alone. Each such event is
/// returned as an [`ExpansionFailure`].
///
/// # Thread Safety
///
/// The primary address cache is a `DashMap`, so one resolver can serve
/// several concurrent top-level expansions.
///
/// # Examples
///
/// ```rust,no_run
/// use gsuite_role_sync::resolver::{GroupResolver, ResolverConfig};
/// use gsuite_role_sync::types::UserRoleMapping;
/// use gsuite_role_sync::Directory;
/// use std::collections::BTreeSet;
/// use std::sync::Arc;
///
/// # async fn example(directory: Arc<dyn Directory>) {
/// let resolver = GroupResolver::new(directory, ResolverConfig::default());
///
/// let roles: BTreeSet<String> = ["reader".to_string()].into_iter().collect();
/// let mut users = UserRoleMapping::new();
/// let outcome = resolver.expand("eng@example.com", &roles, &mut users).await;
///
/// for failure in &outcome.failures {
///     eprintln!("{}: {}", failure.group, failure.message);
/// }
/// # }
/// ```
pub struct GroupResolver {
    directory: Arc<dyn Directory>,
    config: ResolverConfig,
    /// Cache of user key -> primary address (None when the directory has none)
    primary_cache: DashMap<String, Option<String>>,
}

impl GroupResolver {
    /// Creates a new resolver over `directory`
    pub fn new(directory: Arc<dyn Directory>, config: ResolverConfig) -> Self {
        Self {
            directory,
            config,
            primary_cache: DashMap::new(),
        }
    }

    /// Expands one top-level group into `accumulator`
    ///
    /// Fetches the members of `group`; users are resolved to their primary
    /// address and have `roles` unioned into their entry, nested groups are
    /// expanded recursively with the same `roles`.
    ///
    /// # Arguments
    ///
    /// * `group` - Group address to expand
    /// * `roles` - Roles propagated to every user reached
    /// * `accumulator` - Mapping that receives the granted roles
    ///
    /// # Returns
    ///
    /// The [`Expansion`] outcome: groups expanded, isolated failures and any
    /// membership cycles encountered. Each call starts a fresh visit state,
    /// so a group is fetched once per call unless the depth limit cut its
    /// first expansion short and a shallower path reaches it later.
    #[instrument(skip(self, roles, accumulator), fields(roles = roles.len()))]
    pub async fn expand(
        &self,
        group: &str,
        roles: &BTreeSet<Role>,
        accumulator: &mut UserRoleMapping,
    ) -> Expansion {
        let mut traversal = Traversal::new(self.config.max_depth);
        self.expand_group(group, roles, accumulator, &mut traversal)
            .await;
        traversal.finish()
    }

    /// Expands every group of `mapping` and merges the results
    ///
    /// Top-level groups are expanded concurrently, up to
    /// `max_concurrency` at a time, each into its own accumulator. The
    /// accumulators are merged afterwards; since merging is a set union the
    /// result does not depend on completion order.
    ///
    /// # Arguments
    ///
    /// * `mapping` - Top-level groups and their directly assigned roles
    ///
    /// # Returns
    ///
    /// A [`Resolution`] holding the merged user mapping and the combined
    /// expansion outcome.
    #[instrument(skip(self, mapping), fields(groups = mapping.len()))]
    pub async fn resolve_all(&self, mapping: &GroupRoleMapping) -> Resolution {
        let concurrency = self.config.max_concurrency.max(1);

        let partials: Vec<(UserRoleMapping, Expansion)> = stream::iter(mapping.iter())
            .map(|(group, roles)| async move {
                let mut users = UserRoleMapping::new();
                let expansion = self.expand(group, roles, &mut users).await;
                (users, expansion)
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let mut resolution = Resolution::default();
        for (users, expansion) in partials {
            resolution.users.merge(users);
            resolution.expansion.absorb(expansion);
        }

        info!(
            users = resolution.users.len(),
            groups_expanded = resolution.expansion.groups_expanded,
            failures = resolution.expansion.failures.len(),
            cycles = resolution.expansion.cycles.len(),
            "Resolved group memberships"
        );

        resolution
    }

    /// Number of cached primary address lookups
    pub fn cached_lookups(&self) -> usize {
        self.primary_cache.len()
    }

    fn expand_group<'a>(
        &'a self,
        group: &'a str,
        roles: &'a BTreeSet<Role>,
        accumulator: &'a mut UserRoleMapping,
        traversal: &'a mut Traversal,
    ) -> BoxFuture<'a, ()> {
        async move {
            match traversal.enter(group) {
                Visit::Enter => {}
                Visit::Expanded => {
                    debug!(group, "Group already expanded in this traversal");
                    return;
                }
                Visit::Cycle(path) => {
                    warn!(group, cycle = %path.join(" -> "), "Membership cycle detected, skipping");
                    traversal.record_cycle(path);
                    return;
                }
                Visit::TooDeep => {
                    let err = SyncError::DepthExceeded {
                        group: group.to_string(),
                        depth: traversal.depth() + 1,
                        max_depth: traversal.max_depth(),
                    };
                    warn!(group, "{}", err);
                    traversal.record_failure(ExpansionFailure::new(group, None, &err));
                    return;
                }
            }

            let members = match self.directory.list_members(group).await {
                Ok(members) => members,
                Err(err) => {
                    warn!(group, error = %err, "Failed to list group members, skipping subtree");
                    traversal.record_failure(ExpansionFailure::new(group, None, &err));
                    traversal.leave(group);
                    return;
                }
            };
            traversal.record_group_expanded();

            if members.is_empty() {
                info!(group, "No members found");
                traversal.leave(group);
                return;
            }

            debug!(group, members = members.len(), "Expanding group");

            for member in &members {
                match member.kind {
                    MemberKind::User => match self.primary_email(&member.email).await {
                        Ok(Some(primary)) => {
                            debug!(group, user = %member.email, %primary, "Granting roles");
                            accumulator.grant(primary, roles);
                        }
                        Ok(None) => {
                            debug!(group, user = %member.email, "User has no primary address, skipping");
                        }
                        Err(err) => {
                            warn!(group, user = %member.email, error = %err, "Failed to resolve user, skipping");
                            traversal.record_failure(ExpansionFailure::new(
                                group,
                                Some(&member.email),
                                &err,
                            ));
                        }
                    },
                    MemberKind::Group => {
                        self.expand_group(&member.email, roles, accumulator, traversal)
                            .await;
                    }
                    MemberKind::Other => {
                        debug!(group, member = %member.email, "Ignoring unsupported member type");
                    }
                }
            }

            traversal.leave(group);
        }
        .boxed()
    }

    async fn primary_email(&self, user: &str) -> Result<Option<String>> {
        if let Some(cached) = self.primary_cache.get(user).map(|entry| entry.value().clone()) {
            return Ok(cached);
        }

        let primary = self
            .directory
            .primary_email(user)
            .await?
            .filter(|primary| !primary.is_empty());

        self.primary_cache.insert(user.to_string(), primary.clone());
        Ok(primary)
    }
}

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Opaque role identifier, e.g. an IAM role ARN
pub type Role = String;

/// Kind of a group member as reported by the directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberKind {
    User,
    Group,
    /// Any other member type (e.g. `CUSTOMER`); ignored during expansion
    #[serde(other)]
    Other,
}

/// A single entry of a group's member list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    #[serde(rename = "type")]
    pub kind: MemberKind,
    #[serde(default)]
    pub email: String,
}

impl Member {
    pub fn user(email: impl Into<String>) -> Self {
        Self {
            kind: MemberKind::User,
            email: email.into(),
        }
    }

    pub fn group(email: impl Into<String>) -> Self {
        Self {
            kind: MemberKind::Group,
            email: email.into(),
        }
    }
}

/// Roles directly assigned to each group by the mapping sheet
///
/// Groups iterate in the order they first appeared in the sheet. Inserting
/// roles for a group that is already present unions the sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupRoleMapping {
    groups: IndexMap<String, BTreeSet<Role>>,
}

impl GroupRoleMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unions `roles` into the entry for `group`, creating it if absent
    pub fn insert_roles<I>(&mut self, group: impl Into<String>, roles: I)
    where
        I: IntoIterator<Item = Role>,
    {
        self.groups.entry(group.into()).or_default().extend(roles);
    }

    pub fn roles(&self, group: &str) -> Option<&BTreeSet<Role>> {
        self.groups.get(group)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<Role>)> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Accumulated roles per canonical user identifier
///
/// Entries only ever grow: granting roles to a user unions them into the
/// existing set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserRoleMapping {
    users: BTreeMap<String, BTreeSet<Role>>,
}

impl UserRoleMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unions `roles` into the role set of `user`
    pub fn grant(&mut self, user: impl Into<String>, roles: &BTreeSet<Role>) {
        self.users
            .entry(user.into())
            .or_default()
            .extend(roles.iter().cloned());
    }

    /// Unions every entry of `other` into this mapping
    pub fn merge(&mut self, other: UserRoleMapping) {
        for (user, roles) in other.users {
            self.users.entry(user).or_default().extend(roles);
        }
    }

    pub fn roles(&self, user: &str) -> Option<&BTreeSet<Role>> {
        self.users.get(user)
    }

    pub fn contains_user(&self, user: &str) -> bool {
        self.users.contains_key(user)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<Role>)> {
        self.users.iter()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

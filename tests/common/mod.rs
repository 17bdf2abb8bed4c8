//! Common test utilities for gsuite-role-sync integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use gsuite_role_sync::google::{ClientOptions, Credentials, GoogleClient};
use gsuite_role_sync::{
    Directory, Member, Result, RoleAttributeUpdate, SheetSource, SyncConfig, SyncError,
};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Identity provider reference used by every test configuration.
pub const IDP_ARN: &str = "arn:aws:iam::123456789012:saml-provider/GoogleApps";

/// In-memory directory recording every update it receives.
#[derive(Default)]
pub struct InMemoryDirectory {
    groups: HashMap<String, Vec<Member>>,
    primaries: HashMap<String, String>,
    rejected_updates: HashSet<String>,
    update_delay: Option<Duration>,
    updates: Mutex<Vec<(String, RoleAttributeUpdate)>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group(mut self, group: &str, members: Vec<Member>) -> Self {
        self.groups.insert(group.to_string(), members);
        self
    }

    /// Makes `alias` resolve to `primary`.
    pub fn alias(mut self, alias: &str, primary: &str) -> Self {
        self.primaries.insert(alias.to_string(), primary.to_string());
        self
    }

    /// Makes writes for `user` fail with a permission error.
    pub fn reject_update(mut self, user: &str) -> Self {
        self.rejected_updates.insert(user.to_string());
        self
    }

    /// Makes every write take `delay` before completing.
    pub fn slow_updates(mut self, delay: Duration) -> Self {
        self.update_delay = Some(delay);
        self
    }

    /// Updates written so far, in write order.
    pub fn updates(&self) -> Vec<(String, RoleAttributeUpdate)> {
        self.updates.lock().unwrap().clone()
    }

    /// Role entry values written for `user`, if any.
    pub fn written_roles(&self, user: &str) -> Option<Vec<String>> {
        self.updates
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(u, _)| u == user)
            .map(|(_, update)| update.roles.iter().map(|e| e.value.clone()).collect())
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn list_members(&self, group: &str) -> Result<Vec<Member>> {
        self.groups
            .get(group)
            .cloned()
            .ok_or_else(|| SyncError::NotFound(format!("groups/{group}")))
    }

    async fn primary_email(&self, user: &str) -> Result<Option<String>> {
        Ok(Some(
            self.primaries
                .get(user)
                .cloned()
                .unwrap_or_else(|| user.to_string()),
        ))
    }

    async fn update_user(&self, user: &str, update: &RoleAttributeUpdate) -> Result<()> {
        if let Some(delay) = self.update_delay {
            tokio::time::sleep(delay).await;
        }
        if self.rejected_updates.contains(user) {
            return Err(SyncError::PermissionDenied(format!("users/{user}")));
        }
        self.updates
            .lock()
            .unwrap()
            .push((user.to_string(), update.clone()));
        Ok(())
    }
}

/// Sheet returning fixed rows for any range.
pub struct StaticSheet {
    rows: Vec<Vec<String>>,
}

impl StaticSheet {
    /// Builds a sheet with a header row followed by `(group, roles)` rows.
    pub fn with_mapping(rows: &[(&str, &str)]) -> Self {
        let mut all = vec![vec!["Group".to_string(), "Roles".to_string()]];
        all.extend(
            rows.iter()
                .map(|(group, roles)| vec![group.to_string(), roles.to_string()]),
        );
        Self { rows: all }
    }

    pub fn empty() -> Self {
        Self { rows: Vec::new() }
    }
}

#[async_trait]
impl SheetSource for StaticSheet {
    async fn read_range(&self, _spreadsheet_id: &str, _range: &str) -> Result<Vec<Vec<String>>> {
        Ok(self.rows.clone())
    }
}

/// Valid configuration for in-memory runs.
pub fn test_config() -> SyncConfig {
    SyncConfig {
        schema_name: "SSO".to_string(),
        role_field: "IAM_Role".to_string(),
        duration_field: "SessionDuration".to_string(),
        session_duration: 3600,
        assume_user: "admin@example.com".to_string(),
        spreadsheet_id: "1AbCdEf".to_string(),
        spreadsheet_range: "Mapping!A1:B".to_string(),
        idp_arn: IDP_ARN.to_string(),
        ..SyncConfig::default()
    }
}

/// Google client with a static token and fast retries, for mock servers.
pub fn test_google_client(max_retries: u32) -> Arc<GoogleClient> {
    let options = ClientOptions {
        request_timeout: Duration::from_secs(5),
        max_retries,
        initial_backoff: Duration::from_millis(10),
    };
    Arc::new(GoogleClient::new(Credentials::AccessToken("test-token".to_string()), &options).unwrap())
}

/// Builds a `members.list` page.
pub fn members_page(members: &[(&str, &str)], next_page_token: Option<&str>) -> Value {
    let members: Vec<Value> = members
        .iter()
        .map(|(kind, email)| json!({ "kind": "admin#directory#member", "type": kind, "email": email }))
        .collect();
    let mut page = json!({ "kind": "admin#directory#members", "members": members });
    if let Some(token) = next_page_token {
        page["nextPageToken"] = json!(token);
    }
    page
}

/// Builds a Google API error envelope.
pub fn google_error(code: u16, message: &str) -> Value {
    json!({ "error": { "code": code, "message": message, "errors": [] } })
}

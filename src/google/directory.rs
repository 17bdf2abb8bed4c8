//! Admin SDK Directory API: group members and user custom schemas

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use url::Url;

use super::client::{endpoint, GoogleClient};
use crate::directory::Directory;
use crate::error::{Result, SyncError};
use crate::payload::RoleAttributeUpdate;
use crate::types::Member;

pub const DEFAULT_DIRECTORY_URL: &str = "https://admin.googleapis.com";

const MEMBERS_PAGE_SIZE: &str = "200";

/// One page of `members.list`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MembersPage {
    #[serde(default)]
    members: Vec<Member>,
    next_page_token: Option<String>,
}

/// Subset of the `users.get` resource
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserResource {
    #[serde(default)]
    primary_email: String,
}

/// [`Directory`] backed by the Google Workspace Admin SDK
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    client: Arc<GoogleClient>,
    base_url: Url,
}

impl DirectoryClient {
    pub fn new(client: Arc<GoogleClient>, base_url: Url) -> Self {
        Self { client, base_url }
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut path = vec!["admin", "directory", "v1"];
        path.extend_from_slice(segments);
        endpoint(&self.base_url, &path)
    }
}

#[async_trait]
impl Directory for DirectoryClient {
    #[instrument(skip(self))]
    async fn list_members(&self, group: &str) -> Result<Vec<Member>> {
        let mut members = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.url(&["groups", group, "members"])?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("maxResults", MEMBERS_PAGE_SIZE);
                if let Some(ref token) = page_token {
                    query.append_pair("pageToken", token);
                }
            }

            let page: MembersPage = self.client.get_json(url).await?;
            debug!("Fetched page with {} members", page.members.len());
            members.extend(page.members);

            match page.next_page_token {
                Some(token) if !token.is_empty() => {
                    if page_token.as_deref() == Some(token.as_str()) {
                        return Err(SyncError::Api {
                            status: 200,
                            message: format!(
                                "members.list for {group} repeated page token '{token}'"
                            ),
                        });
                    }
                    page_token = Some(token);
                }
                _ => break,
            }
        }

        Ok(members)
    }

    #[instrument(skip(self))]
    async fn primary_email(&self, user: &str) -> Result<Option<String>> {
        let url = self.url(&["users", user])?;
        let resource: UserResource = self.client.get_json(url).await?;

        if resource.primary_email.is_empty() {
            Ok(None)
        } else {
            Ok(Some(resource.primary_email))
        }
    }

    #[instrument(skip(self, update), fields(roles = update.roles.len()))]
    async fn update_user(&self, user: &str, update: &RoleAttributeUpdate) -> Result<()> {
        let url = self.url(&["users", user])?;
        self.client.put_json(url, update).await?;
        info!("Updated role attributes for {}", user);
        Ok(())
    }
}

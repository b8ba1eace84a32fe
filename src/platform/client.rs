use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::{debug, warn};

use super::error::PlatformError;
use super::types::{AclEntry, PlatformStatus};
use super::{HealthProbe, PermissionApi};
use crate::config::PlatformConfig;

pub struct PlatformClient {
    access_token: String,
    client: Client,
    base_url: String,
}

impl PlatformClient {
    pub fn new(config: &PlatformConfig) -> Result<Self, PlatformError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            access_token: config.access_token.clone(),
            client,
            base_url: config.base_url.clone(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, PlatformError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| PlatformError::InvalidUrl(format!("{}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| PlatformError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.access_token.is_empty() {
            request
        } else {
            request.bearer_auth(&self.access_token)
        }
    }

    pub async fn fetch_status(&self) -> Result<PlatformStatus, PlatformError> {
        let url = self.endpoint(&["status"])?;
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(PlatformError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.json::<PlatformStatus>().await?;
        Ok(body)
    }

    pub async fn update_workspace_acl(
        &self,
        project: &str,
        workspace: &str,
        entries: &[AclEntry],
    ) -> Result<(), PlatformError> {
        let url = self.endpoint(&["api", "workspaces", project, workspace, "acl"])?;
        let response = self
            .authorize(self.client.patch(url))
            .header("content-type", "application/json")
            .json(entries)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(PlatformError::ApiError {
                status: status.as_u16(),
                message,
            });
        }
        debug!(project, workspace, entries = entries.len(), "workspace ACL updated");
        Ok(())
    }
}

#[async_trait]
impl HealthProbe for PlatformClient {
    async fn status(&self) -> PlatformStatus {
        match self.fetch_status().await {
            Ok(status) => status,
            Err(e) => {
                warn!(error = %e, "platform status probe failed");
                PlatformStatus::unreachable(e.to_string())
            }
        }
    }
}

#[async_trait]
impl PermissionApi for PlatformClient {
    async fn push_acl(
        &self,
        project: &str,
        workspace: &str,
        entry: &AclEntry,
    ) -> Result<(), PlatformError> {
        self.update_workspace_acl(project, workspace, std::slice::from_ref(entry))
            .await
    }
}

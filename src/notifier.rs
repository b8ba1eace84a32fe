//! Admin alerts for platform outages and recoveries.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::warn;

use crate::error::{AccessError, Result};
use crate::platform::PlatformStatus;
use crate::state_machine::AlertKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminAlert {
    pub subject: String,
    pub body: String,
}

impl AdminAlert {
    pub fn for_kind(kind: AlertKind, status: &PlatformStatus) -> Self {
        match kind {
            AlertKind::Outage => Self::outage(status),
            AlertKind::Recovery => Self::recovery(status),
        }
    }

    pub fn outage(status: &PlatformStatus) -> Self {
        Self {
            subject: "Platform API outage detected".to_string(),
            body: format!(
                "The platform API health check failed. Platform access is now `local-off` and \
                 collaborator permissions on managed workspaces are being revoked.\n\n{}",
                describe_systems(status)
            ),
        }
    }

    pub fn recovery(status: &PlatformStatus) -> Self {
        Self {
            subject: "Platform API recovered".to_string(),
            body: format!(
                "The platform API health check passed again. Platform access is back `on` and \
                 workspace permissions are being restored.\n\n{}",
                describe_systems(status)
            ),
        }
    }
}

fn describe_systems(status: &PlatformStatus) -> String {
    if status.systems.is_empty() {
        return "No subsystem detail was reported.".to_string();
    }
    status
        .systems
        .iter()
        .map(|(name, system)| {
            let state = if system.ok { "ok" } else { "FAILING" };
            if system.messages.is_empty() {
                format!("- {name}: {state}")
            } else {
                format!("- {name}: {state} ({})", system.messages.join("; "))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Delivery of admin alerts. Callers treat delivery as best effort.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_admin_alert(&self, alert: &AdminAlert) -> Result<()>;
}

/// Writes alerts to the log only.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_admin_alert(&self, alert: &AdminAlert) -> Result<()> {
        warn!(subject = %alert.subject, body = %alert.body, "admin alert");
        Ok(())
    }
}

/// Posts alerts as JSON (`{"subject": .., "body": ..}`) to a webhook.
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| AccessError::Notify(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send_admin_alert(&self, alert: &AdminAlert) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(alert)
            .send()
            .await
            .map_err(|e| AccessError::Notify(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AccessError::Notify(format!("webhook returned status {status}")));
        }
        Ok(())
    }
}

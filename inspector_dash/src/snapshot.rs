//! One-shot snapshot of requests already captured by the backend

use crate::dashboard::DashboardMsg;
use anyhow::{Context, Result};
use inspector_common::{constants, CapturedRequest};
use reqwest::Client;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Client for the backend's snapshot endpoint
#[derive(Clone)]
pub struct SnapshotClient {
    url: String,
    client: Client,
}

impl SnapshotClient {
    pub fn new(backend_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            url: format!(
                "{}{}",
                backend_url.trim_end_matches('/'),
                constants::SNAPSHOT_PATH
            ),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch every stored request, newest first as the backend orders them
    pub async fn fetch(&self) -> Result<Vec<CapturedRequest>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", self.url))?;

        if !response.status().is_success() {
            anyhow::bail!("Snapshot request failed: {}", response.status());
        }

        response
            .json()
            .await
            .context("Failed to parse snapshot response")
    }
}

/// Fetch the snapshot in the background and report the outcome once
pub fn spawn_loader(client: SnapshotClient, tx: mpsc::Sender<DashboardMsg>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let msg = match client.fetch().await {
            Ok(records) => DashboardMsg::SnapshotLoaded(records),
            Err(e) => DashboardMsg::SnapshotFailed(format!("{:#}", e)),
        };
        if tx.send(msg).await.is_err() {
            tracing::debug!("Snapshot resolved after teardown, discarding");
        }
    })
}

//! Remote Registry Client
//!
//! Speaks the HTTP API of another BlinkGuard server:
//! - `GET  /registry/check?url=`
//! - `GET  /registry/latest`
//! - `POST /registry/report`
//!
//! `sync_into` pulls the remote registry once and upserts every entry into a
//! local store. There is no background refresh.

use std::sync::Arc;
use std::time::Duration;

use eyre::{eyre, Result};
use tracing::{info, warn};

use crate::api::types::{ReportRequest, ReportResponse};
use crate::models::types::{MaliciousUrlEntry, RegistryCheck};
use crate::registry::store::RegistryStore;
use crate::utils::constants::{DEFAULT_REMOTE_URL, REMOTE_TIMEOUT_SECS, USER_AGENT};

/// Outcome of a one-shot sync
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub fetched: usize,
    pub added: usize,
    pub updated: usize,
}

/// Remote BlinkGuard registry client
pub struct RegistryClient {
    client: reqwest::Client,
    base_url: String,
}

impl Default for RegistryClient {
    fn default() -> Self {
        Self::new(DEFAULT_REMOTE_URL)
    }
}

impl RegistryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REMOTE_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ask the remote registry about `url`
    pub async fn check(&self, url: &str) -> Result<RegistryCheck> {
        let endpoint = format!("{}/registry/check", self.base_url);

        let response = self
            .client
            .get(&endpoint)
            .query(&[("url", url)])
            .send()
            .await
            .map_err(|e| eyre!("Registry check request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(eyre!("Registry API error: {}", response.status()));
        }

        response
            .json()
            .await
            .map_err(|e| eyre!("Failed to parse registry check response: {}", e))
    }

    /// Fetch the full remote registry
    pub async fn fetch_latest(&self) -> Result<Vec<MaliciousUrlEntry>> {
        let endpoint = format!("{}/registry/latest", self.base_url);

        info!("🔍 Registry: Fetching latest entries from {}", self.base_url);

        let response = self
            .client
            .get(&endpoint)
            .send()
            .await
            .map_err(|e| eyre!("Registry request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(eyre!("Registry API error: {}", response.status()));
        }

        let entries: Vec<MaliciousUrlEntry> = response
            .json()
            .await
            .map_err(|e| eyre!("Failed to parse registry response: {}", e))?;

        info!("✅ Registry: {} entries fetched", entries.len());
        Ok(entries)
    }

    /// Submit a community report; the remote server stamps domain and time
    pub async fn report(
        &self,
        url: &str,
        reason: &str,
        reported_by: &str,
    ) -> Result<MaliciousUrlEntry> {
        let endpoint = format!("{}/registry/report", self.base_url);
        let body = ReportRequest {
            url: Some(url.to_string()),
            reason: Some(reason.to_string()),
            reported_by: Some(reported_by.to_string()),
        };

        let response = self
            .client
            .post(&endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| eyre!("Registry report request failed: {}", e))?;

        if !response.status().is_success() {
            return Err(eyre!("Registry API error: {}", response.status()));
        }

        let data: ReportResponse = response
            .json()
            .await
            .map_err(|e| eyre!("Failed to parse registry report response: {}", e))?;

        if !data.success {
            warn!("⚠️ Registry: report for {} was not accepted", url);
            return Err(eyre!("Remote registry rejected report for {}", url));
        }

        Ok(data.entry)
    }

    /// Pull the remote registry into `store`
    pub async fn sync_into(&self, store: Arc<RegistryStore>) -> Result<SyncReport> {
        let remote = self.fetch_latest().await?;

        let report = tokio::task::spawn_blocking(move || merge_entries(&store, remote))
            .await
            .map_err(|e| eyre!("Sync task failed: {}", e))??;

        info!(
            "✅ Registry sync: {} fetched, {} added, {} updated",
            report.fetched, report.added, report.updated
        );
        Ok(report)
    }
}

/// Upsert every remote entry whose content differs from the local one
pub fn merge_entries(
    store: &RegistryStore,
    remote: Vec<MaliciousUrlEntry>,
) -> crate::models::errors::AppResult<SyncReport> {
    let local = store.read()?;
    let mut report = SyncReport {
        fetched: remote.len(),
        ..SyncReport::default()
    };

    for entry in remote {
        match local.iter().find(|e| e.url == entry.url) {
            Some(existing) if *existing == entry => {}
            Some(_) => {
                store.upsert(entry)?;
                report.updated += 1;
            }
            None => {
                store.upsert(entry)?;
                report.added += 1;
            }
        }
    }

    Ok(report)
}

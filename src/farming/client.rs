//! Farm pool listing API client.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use super::types::PoolInfo;
use crate::errors::ReportError;

#[derive(Debug, Deserialize)]
struct PoolsResponse {
    #[serde(default)]
    pools: Option<Vec<PoolInfo>>,
}

/// Reads the pool catalog a farm publishes over HTTP.
#[derive(Debug, Clone)]
pub struct FarmApiClient {
    client: Client,
    api_url: String,
}

impl FarmApiClient {
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_url: api_url.to_string(),
        })
    }

    #[instrument(skip(self), name = "farm_get_pools")]
    pub async fn get_pools(&self) -> Result<Vec<PoolInfo>> {
        let response = self
            .client
            .get(&self.api_url)
            .send()
            .await
            .map_err(|e| ReportError::transport("farm API", e.to_string()))
            .context("Failed to fetch farm pools")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ReportError::transport("farm API", e.to_string()))
            .context("Failed to read farm pools")?;

        if !status.is_success() {
            anyhow::bail!(ReportError::transport(
                "farm API",
                format!("HTTP {}: {}", status, body)
            ));
        }

        debug!("farm pools raw response:\n{}", body);

        let parsed: PoolsResponse = serde_json::from_str(&body)
            .map_err(|e| ReportError::shape(format!("farm pools: {}", e)))
            .context("Failed to parse farm pools")?;

        let pools = parsed
            .pools
            .ok_or_else(|| ReportError::shape("no pools in API response"))?;
        debug!("Fetched {} pools", pools.len());
        Ok(pools)
    }
}

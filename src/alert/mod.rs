//! Threshold alerts posted to a webhook channel.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::errors::ReportError;
use crate::utils::Trimmer;

/// A breached threshold, ready to post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertEvent {
    /// Event name on the channel side.
    pub label: String,
    /// Metric already trimmed for display.
    pub metric_value: String,
    pub threshold: Decimal,
}

impl AlertEvent {
    /// Positional values: metric first, then threshold.
    pub fn values(&self) -> [String; 2] {
        [self.metric_value.clone(), self.threshold.to_string()]
    }
}

/// Somewhere an alert event can be posted.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlertChannel: Send + Sync {
    async fn post(&self, event: &AlertEvent) -> Result<()>;
}

/// IFTTT Maker webhooks.
///
/// Values are sent as `value1`, `value2`, ... in order.
#[derive(Debug, Clone)]
pub struct IftttChannel {
    client: Client,
    webhook_url: String,
    key: String,
}

impl IftttChannel {
    pub fn new(webhook_url: &str, key: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            webhook_url: webhook_url.trim_end_matches('/').to_string(),
            key: key.to_string(),
        })
    }

    fn trigger_url(&self, event: &str) -> String {
        format!(
            "{}/trigger/{}/with/key/{}",
            self.webhook_url,
            urlencoding::encode(event),
            urlencoding::encode(&self.key)
        )
    }
}

#[async_trait]
impl AlertChannel for IftttChannel {
    #[instrument(skip_all, fields(label = %event.label), name = "ifttt_post")]
    async fn post(&self, event: &AlertEvent) -> Result<()> {
        let body: Map<String, Value> = event
            .values()
            .into_iter()
            .enumerate()
            .map(|(i, v)| (format!("value{}", i + 1), Value::String(v)))
            .collect();

        let response = self
            .client
            .post(self.trigger_url(&event.label))
            .json(&body)
            .send()
            .await
            .map_err(|e| ReportError::transport("webhook", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!(ReportError::transport(
                "webhook",
                format!("HTTP {}: {}", status, text)
            ));
        }

        debug!("Webhook accepted {}", event.label);
        Ok(())
    }
}

/// What a dispatch attempt ended in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertOutcome {
    /// Threshold is zero.
    Disabled,
    /// Metric is at or above the threshold.
    Clear,
    /// Breached, but there is no channel to post to.
    Unsent,
    Sent,
    /// Breached and the post failed; logged, not escalated.
    Failed,
}

/// Fires one event when a metric drops below a threshold.
///
/// Dispatching consumes the dispatcher, so a command can fire at most once.
pub struct ThresholdAlertDispatcher {
    threshold: Decimal,
    event: String,
    trimmer: Trimmer,
    channel: Option<Box<dyn AlertChannel>>,
}

impl ThresholdAlertDispatcher {
    pub fn new(
        threshold: Decimal,
        event: impl Into<String>,
        trimmer: Trimmer,
        channel: Option<Box<dyn AlertChannel>>,
    ) -> Self {
        Self {
            threshold,
            event: event.into(),
            trimmer,
            channel,
        }
    }

    pub fn has_channel(&self) -> bool {
        self.channel.is_some()
    }

    /// A zero threshold disables the check.
    pub fn is_breached(&self, metric: Decimal) -> bool {
        self.threshold > Decimal::ZERO && metric < self.threshold
    }

    /// The event to post, only when `metric` breaches the threshold.
    pub fn event_for(&self, metric: Decimal) -> Option<AlertEvent> {
        self.is_breached(metric).then(|| AlertEvent {
            label: self.event.clone(),
            metric_value: self.trimmer.trim(metric),
            threshold: self.threshold,
        })
    }

    pub async fn dispatch(self, metric: Decimal) -> AlertOutcome {
        if self.threshold <= Decimal::ZERO {
            return AlertOutcome::Disabled;
        }
        let Some(event) = self.event_for(metric) else {
            return AlertOutcome::Clear;
        };
        let Some(channel) = self.channel else {
            return AlertOutcome::Unsent;
        };

        info!("Posting {} alert: {:?}", event.label, event.values());
        match channel.post(&event).await {
            Ok(()) => AlertOutcome::Sent,
            Err(e) => {
                warn!("Alert delivery failed: {:#}", e);
                AlertOutcome::Failed
            }
        }
    }
}

//! Configuration management for defi-watch.
//!
//! Loads settings from an optional `defi-watch` config file and environment
//! variables (`DEFI_WATCH__SECTION__KEY`). Every field has a default, so an
//! empty environment is a usable configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::errors::ReportError;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Named networks with their subgraph and RPC endpoints
    #[serde(default = "default_networks")]
    pub networks: HashMap<String, NetworkConfig>,
    /// Named yield farms
    #[serde(default = "default_farms")]
    pub farms: HashMap<String, FarmConfig>,
    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,
    /// Rate history sampling
    #[serde(default)]
    pub rates: RatesConfig,
    /// Health alert webhook
    #[serde(default)]
    pub alert: AlertConfig,
    /// Optional log file output
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Aave v2 subgraph endpoint
    pub subgraph_url: String,
    /// JSON-RPC endpoint for contract reads
    pub rpc_url: String,
    /// Chain id the RPC endpoint must report
    pub chain_id: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmConfig {
    /// Network the farm's MasterChef contracts live on
    pub network: String,
    /// Pool listing endpoint
    pub api_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds, the only deadline applied to remote calls
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatesConfig {
    /// Maximum rate snapshots in flight at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Event name posted to the webhook
    #[serde(default = "default_alert_event")]
    pub event: String,
    /// Webhook service base URL
    #[serde(default = "default_webhook_url")]
    pub webhook_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory for a daily rolling log file; stderr only when unset
    #[serde(default)]
    pub directory: Option<String>,
}

// Default value functions
fn default_networks() -> HashMap<String, NetworkConfig> {
    HashMap::from([
        (
            "polygon".to_string(),
            NetworkConfig {
                subgraph_url: "https://api.thegraph.com/subgraphs/name/aave/aave-v2-matic"
                    .to_string(),
                rpc_url: "https://rpc-mainnet.maticvigil.com".to_string(),
                chain_id: 137,
            },
        ),
        (
            "mainnet".to_string(),
            NetworkConfig {
                subgraph_url: "https://api.thegraph.com/subgraphs/name/aave/protocol-v2"
                    .to_string(),
                rpc_url: "https://eth.llamarpc.com".to_string(),
                chain_id: 1,
            },
        ),
    ])
}

fn default_farms() -> HashMap<String, FarmConfig> {
    HashMap::from([(
        "ironfinance".to_string(),
        FarmConfig {
            network: "polygon".to_string(),
            api_url: "https://api.iron.finance/farms?network=polygon".to_string(),
        },
    )])
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_concurrency() -> usize {
    5
}

fn default_alert_event() -> String {
    "aave_health_alert".to_string()
}

fn default_webhook_url() -> String {
    "https://maker.ifttt.com".to_string()
}

impl Config {
    /// Load configuration from environment variables and config files.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("defi-watch").required(false))
            .add_source(
                config::Environment::default()
                    .prefix("DEFI_WATCH")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.rates.concurrency >= 1,
            "rates.concurrency must be at least 1"
        );

        anyhow::ensure!(
            self.http.timeout_secs >= 1,
            "http.timeout_secs must be at least 1"
        );

        anyhow::ensure!(
            !self.alert.event.trim().is_empty(),
            "alert.event must not be empty"
        );

        for (name, farm) in &self.farms {
            anyhow::ensure!(
                self.networks.contains_key(&farm.network),
                "farm '{}' references unknown network '{}'",
                name,
                farm.network
            );
        }

        Ok(())
    }

    /// Look up a network by name (case-insensitive).
    pub fn network(&self, name: &str) -> Result<&NetworkConfig, ReportError> {
        self.networks
            .get(&name.to_lowercase())
            .ok_or_else(|| ReportError::invalid("network", format!("no such network: {}", name)))
    }

    /// Look up a farm by name, checking it belongs to `network`.
    pub fn farm(&self, name: &str, network: &str) -> Result<&FarmConfig, ReportError> {
        let farm = self
            .farms
            .get(name)
            .ok_or_else(|| ReportError::invalid("farm", format!("no such farm: {}", name)))?;

        if !farm.network.eq_ignore_ascii_case(network) {
            return Err(ReportError::invalid(
                "farm",
                format!("farm {} is not on network {}", name, network),
            ));
        }

        Ok(farm)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            networks: default_networks(),
            farms: default_farms(),
            http: HttpConfig::default(),
            rates: RatesConfig::default(),
            alert: AlertConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            event: default_alert_event(),
            webhook_url: default_webhook_url(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rates.concurrency, 5);
        assert_eq!(config.alert.event, "aave_health_alert");
    }

    #[test]
    fn test_network_lookup() {
        let config = Config::default();
        assert_eq!(config.network("polygon").unwrap().chain_id, 137);
        assert_eq!(config.network("Polygon").unwrap().chain_id, 137);
        assert!(matches!(
            config.network("solana"),
            Err(ReportError::InvalidInput { field: "network", .. })
        ));
    }

    #[test]
    fn test_farm_lookup() {
        let config = Config::default();
        assert!(config.farm("ironfinance", "polygon").is_ok());
        assert!(config.farm("ironfinance", "mainnet").is_err());
        assert!(config.farm("pancake", "polygon").is_err());
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let mut config = Config::default();
        config.rates.concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_dangling_farm_network() {
        let mut config = Config::default();
        config.farms.insert(
            "quickswap".to_string(),
            FarmConfig {
                network: "arbitrum".to_string(),
                api_url: "https://example.invalid/farms".to_string(),
            },
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"rates": {}}"#).unwrap();
        assert_eq!(config.rates.concurrency, 5);
        assert!(config.networks.contains_key("mainnet"));
        assert!(config.logging.directory.is_none());
    }
}

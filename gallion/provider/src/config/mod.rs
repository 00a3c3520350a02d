// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT
//! Provides a simple way of reading configuration files.
//!
//! Reads a TOML config file for the Gallion tooling and deserializes it in a type-safe way into a
//! [`Config`] struct. Every section has defaults pointing at Polygon mainnet, so an empty file is valid.


use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};
use url::Url;

use crate::client::{ClientConfig, PrivateKey};
use crate::gas::{GasFees, GasPricingStrategy, GasStation};

pub const DEFAULT_CHAIN_ID: u64 = 137;
pub const DEFAULT_PROVIDER_HTTP: &str = "https://polygon-rpc.com";
pub const DEFAULT_GAS_STATION_URL: &str = "https://gasstation-mainnet.matic.network/v2";
/// Fees in gwei used when the gas station cannot be reached.
pub const DEFAULT_MAX_FEE: u64 = 45;
pub const DEFAULT_MAX_PRIORITY_FEE: u64 = 45;
/// Maximum number of polls for a transaction receipt.
pub const DEFAULT_RECEIPT_RETRIES: usize = 200;

pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"
artifacts_dir = "./artifacts/contracts"

# Polygon mainnet
[network]
name = "matic"
chain_id = 137
# provider_http = "https://polygon-rpc.com"
provider_timeout = 30

[gas]
strategy = "oracle"
# oracle_url = "https://gasstation-mainnet.matic.network/v2"
max_fee = 45
max_priority_fee = 45

[submission]
max_retries = 0
retry_delay = 2
timeout = 600
receipt_retries = 200
"#;

/// The top-level struct representing the config. Calls to [`Config::from_file`] deserialize into
/// this struct.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Directory with the Hardhat build artifacts, usually `artifacts/contracts`.
    pub artifacts_dir: PathBuf,
    pub network: NetworkConfig,
    pub gas: GasConfig,
    pub submission: SubmissionConfig,
}

impl Config {
    /// Reads a TOML configuration in the `s` string and returns a [`Config`] struct.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config = toml::from_str(s)?;
        Ok(config)
    }

    /// Reads a TOML configuration file specified in the `path` and returns a [`Config`] struct.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(&path).with_context(|| {
            format!(
                "failed to read config from {}",
                path.as_ref().to_string_lossy()
            )
        })?;

        let config: Config =
            Config::from_toml_str(contents.as_str()).context("failed to parse config TOML")?;

        Ok(config)
    }

    /// Artifacts directory with `~` expanded.
    pub fn artifacts_dir(&self) -> PathBuf {
        crate::expand_tilde(&self.artifacts_dir)
    }

    /// Connection parameters for a client signing with the given key, if any.
    pub fn client_config(&self, signing_key: Option<PrivateKey>) -> Result<ClientConfig> {
        Ok(ClientConfig {
            provider_http: self.network.provider_http()?,
            provider_timeout: self.network.provider_timeout,
            chain_id: self.network.chain_id,
            signing_key,
        })
    }

    pub fn gas_strategy(&self) -> Result<GasPricingStrategy> {
        let fees = GasFees::from_gwei(self.gas.max_fee, self.gas.max_priority_fee);
        let strategy = match self.gas.strategy {
            GasStrategyKind::Fixed => GasPricingStrategy::Fixed(fees),
            GasStrategyKind::Oracle => {
                GasPricingStrategy::Oracle(GasStation::new(self.gas.oracle_url()?, fees)?)
            }
            GasStrategyKind::Network => GasPricingStrategy::NetworkDefault,
        };
        Ok(strategy)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            artifacts_dir: PathBuf::from("./artifacts/contracts"),
            network: Default::default(),
            gas: Default::default(),
            submission: Default::default(),
        }
    }
}

/// The chain and the JSON-RPC endpoint to talk to it.
#[serde_as]
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct NetworkConfig {
    pub name: String,
    pub chain_id: u64,
    /// Defaults to [`DEFAULT_PROVIDER_HTTP`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_http: Option<Url>,
    #[serde_as(as = "Option<DurationSeconds<u64>>")]
    pub provider_timeout: Option<Duration>,
}

impl NetworkConfig {
    pub fn provider_http(&self) -> Result<Url> {
        match &self.provider_http {
            Some(url) => Ok(url.clone()),
            None => Url::parse(DEFAULT_PROVIDER_HTTP).context("invalid default provider URL"),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: "matic".to_owned(),
            chain_id: DEFAULT_CHAIN_ID,
            provider_http: None,
            provider_timeout: Some(Duration::from_secs(30)),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GasStrategyKind {
    /// Always use `max_fee` and `max_priority_fee`.
    Fixed,
    /// Ask the gas station, falling back to the fixed fees.
    Oracle,
    /// Estimate from the fee history of the chain.
    Network,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct GasConfig {
    pub strategy: GasStrategyKind,
    /// Defaults to [`DEFAULT_GAS_STATION_URL`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oracle_url: Option<Url>,
    /// In gwei.
    pub max_fee: u64,
    /// In gwei.
    pub max_priority_fee: u64,
}

impl GasConfig {
    pub fn oracle_url(&self) -> Result<Url> {
        match &self.oracle_url {
            Some(url) => Ok(url.clone()),
            None => Url::parse(DEFAULT_GAS_STATION_URL).context("invalid default gas station URL"),
        }
    }
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            strategy: GasStrategyKind::Oracle,
            oracle_url: None,
            max_fee: DEFAULT_MAX_FEE,
            max_priority_fee: DEFAULT_MAX_PRIORITY_FEE,
        }
    }
}

/// How deployments and cuts are sent and awaited.
#[serde_as]
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SubmissionConfig {
    /// Retries after the first attempt; zero means a single attempt.
    pub max_retries: u32,
    /// Delay before the first retry, doubled after each one.
    #[serde_as(as = "DurationSeconds<u64>")]
    pub retry_delay: Duration,
    /// Time limit of sending a transaction, and of each wait for its receipt.
    #[serde_as(as = "DurationSeconds<u64>")]
    pub timeout: Duration,
    pub receipt_retries: usize,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            retry_delay: Duration::from_secs(2),
            timeout: Duration::from_secs(600),
            receipt_retries: DEFAULT_RECEIPT_RETRIES,
        }
    }
}

// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT
//! Fee parameters attached to every transaction we send.

use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{BlockNumber, I256, U256};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

const GWEI: u64 = 1_000_000_000;
const GAS_STATION_TIMEOUT: Duration = Duration::from_secs(10);

/// EIP-1559 fees in wei.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GasFees {
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
}

impl GasFees {
    pub fn from_gwei(max_fee: u64, max_priority_fee: u64) -> Self {
        Self {
            max_fee_per_gas: U256::from(max_fee) * GWEI,
            max_priority_fee_per_gas: U256::from(max_priority_fee) * GWEI,
        }
    }

    /// Set the fees on a transaction; legacy transactions pay the max fee as gas price.
    pub fn apply(&self, tx: &mut TypedTransaction) {
        match tx {
            TypedTransaction::Eip1559(tx) => {
                tx.max_fee_per_gas = Some(self.max_fee_per_gas);
                tx.max_priority_fee_per_gas = Some(self.max_priority_fee_per_gas);
            }
            TypedTransaction::Legacy(tx) => {
                tx.gas_price = Some(self.max_fee_per_gas);
            }
            TypedTransaction::Eip2930(tx) => {
                tx.tx.gas_price = Some(self.max_fee_per_gas);
            }
        }
    }
}

/// Where the fees of a transaction come from.
#[derive(Clone, Debug)]
pub enum GasPricingStrategy {
    Fixed(GasFees),
    Oracle(GasStation),
    NetworkDefault,
}

impl GasPricingStrategy {
    pub async fn fees(&self, provider: &Provider<Http>) -> anyhow::Result<GasFees> {
        match self {
            GasPricingStrategy::Fixed(fees) => Ok(*fees),
            GasPricingStrategy::Oracle(station) => Ok(station.fees().await),
            GasPricingStrategy::NetworkDefault => premium_estimation(provider).await,
        }
    }
}

/// The Polygon gas station, e.g. `https://gasstation-mainnet.matic.network/v2`.
#[derive(Clone, Debug)]
pub struct GasStation {
    url: Url,
    fallback: GasFees,
    client: Client,
}

impl GasStation {
    pub fn new(url: Url, fallback: GasFees) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(GAS_STATION_TIMEOUT)
            .build()
            .context("failed to build gas station client")?;

        Ok(Self {
            url,
            fallback,
            client,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Fees for the `fast` tier, or the fallback if the station doesn't give a usable answer.
    pub async fn fees(&self) -> GasFees {
        match self.query().await {
            Ok(fees) => fees,
            Err(e) => {
                tracing::warn!(
                    url = self.url.as_str(),
                    error = e.to_string(),
                    "could not fetch gas data, using fallback fees"
                );
                self.fallback
            }
        }
    }

    async fn query(&self) -> anyhow::Result<GasFees> {
        let body = self
            .client
            .get(self.url.clone())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        parse_gas_station_response(&body)
    }
}

#[derive(Deserialize)]
struct GasStationResponse {
    fast: Option<GasStationTier>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GasStationTier {
    max_fee: Option<f64>,
    max_priority_fee: Option<f64>,
}

/// Read the `fast` tier of a gas station response, rounding up to whole gwei.
pub(crate) fn parse_gas_station_response(body: &str) -> anyhow::Result<GasFees> {
    let response = serde_json::from_str::<GasStationResponse>(body)?;

    let fast = response
        .fast
        .ok_or_else(|| anyhow!("malformed response: no fast tier"))?;

    let (max_fee, max_priority_fee) = match (fast.max_fee, fast.max_priority_fee) {
        (Some(fee), Some(priority)) if priority > 0.0 && fee > 0.0 => (fee, priority),
        _ => bail!("malformed response: missing fees"),
    };

    Ok(GasFees::from_gwei(
        max_fee.ceil() as u64,
        max_priority_fee.ceil() as u64,
    ))
}

/// Returns an estimation of an optimal priority fee and fee cap for a transaction
/// considering the average premium, base_fee and reward percentile from past blocks.
///
/// This is adaptation of ethers' `eip1559_default_estimator`:
/// https://github.com/gakonst/ethers-rs/blob/5dcd3b7e754174448f9a8cbfc0523896609629f9/ethers-core/src/utils/mod.rs#L476
async fn premium_estimation(provider: &Provider<Http>) -> anyhow::Result<GasFees> {
    let base_fee_per_gas = provider
        .get_block(BlockNumber::Latest)
        .await?
        .ok_or_else(|| anyhow!("Latest block not found"))?
        .base_fee_per_gas
        .ok_or_else(|| anyhow!("EIP-1559 not activated"))?;

    let fee_history = provider
        .fee_history(
            ethers::utils::EIP1559_FEE_ESTIMATION_PAST_BLOCKS,
            BlockNumber::Latest,
            &[ethers::utils::EIP1559_FEE_ESTIMATION_REWARD_PERCENTILE],
        )
        .await?;

    let max_priority_fee_per_gas = estimate_priority_fee(fee_history.reward);
    let potential_max_fee = base_fee_surged(base_fee_per_gas);
    let max_fee_per_gas = if max_priority_fee_per_gas > potential_max_fee {
        max_priority_fee_per_gas + potential_max_fee
    } else {
        potential_max_fee
    };

    Ok(GasFees {
        max_fee_per_gas,
        max_priority_fee_per_gas,
    })
}

/// Implementation borrowed from
/// https://github.com/gakonst/ethers-rs/blob/ethers-v2.0.8/ethers-core/src/utils/mod.rs#L582
fn base_fee_surged(base_fee_per_gas: U256) -> U256 {
    if base_fee_per_gas <= U256::from(40_000_000_000u64) {
        base_fee_per_gas * 2
    } else if base_fee_per_gas <= U256::from(100_000_000_000u64) {
        base_fee_per_gas * 16 / 10
    } else if base_fee_per_gas <= U256::from(200_000_000_000u64) {
        base_fee_per_gas * 14 / 10
    } else {
        base_fee_per_gas * 12 / 10
    }
}

/// Implementation borrowed from
/// https://github.com/gakonst/ethers-rs/blob/ethers-v2.0.8/ethers-core/src/utils/mod.rs#L536
fn estimate_priority_fee(rewards: Vec<Vec<U256>>) -> U256 {
    let mut rewards: Vec<U256> = rewards
        .iter()
        .filter_map(|r| r.first().copied())
        .filter(|r| *r > U256::zero())
        .collect();
    if rewards.is_empty() {
        return U256::zero();
    }
    if rewards.len() == 1 {
        return rewards[0];
    }
    // Sort the rewards as we will eventually take the median.
    rewards.sort();

    // A copy of the same vector is created for convenience to calculate percentage change
    // between subsequent fee values.
    let mut rewards_copy = rewards.clone();
    rewards_copy.rotate_left(1);

    let mut percentage_change: Vec<I256> = rewards
        .iter()
        .zip(rewards_copy.iter())
        .map(|(a, b)| {
            let a = I256::try_from(*a).unwrap_or(I256::MAX);
            let b = I256::try_from(*b).unwrap_or(I256::MAX);
            ((b - a) * 100) / a
        })
        .collect();
    percentage_change.pop();

    // Fetch the max of the percentage change, and the index of its first occurrence.
    let (max_change_index, max_change) = match percentage_change
        .iter()
        .enumerate()
        .rev()
        .max_by_key(|(_, c)| **c)
    {
        Some((i, c)) => (i, *c),
        None => return rewards[rewards.len() / 2],
    };

    // If we encountered a big change in fees at a certain position, then consider only
    // the values >= it.
    let values = if max_change >= ethers::utils::EIP1559_FEE_ESTIMATION_THRESHOLD_MAX_CHANGE.into()
        && (max_change_index >= (rewards.len() / 2))
    {
        rewards[max_change_index..].to_vec()
    } else {
        rewards
    };

    // Return the median.
    values[values.len() / 2]
}

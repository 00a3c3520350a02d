// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT
//! Thin clients for the functions the game backend calls on a deployed diamond.

use std::sync::Arc;

use anyhow::{anyhow, Context};
use ethers::providers::{Http, Provider};
use ethers::types::{Address, TxHash, U256};
use gallion_abis::lootbox_facet::LootboxFacet;
use gallion_abis::ownership_facet::OwnershipFacet;
use gallion_abis::player_facet::PlayerFacet;
use serde::Serialize;

use crate::submit::Submitter;

/// Registers players in the diamond.
pub struct Players {
    submitter: Submitter,
}

impl Players {
    pub fn new(submitter: Submitter) -> Self {
        Self { submitter }
    }

    pub async fn add(&self, diamond: Address, player: Address) -> anyhow::Result<TxHash> {
        let contract = PlayerFacet::new(diamond, self.submitter.signer());
        let call = contract.add_player(player);

        let receipt = self.submitter.submit("addPlayer", call.tx).await?;
        tracing::info!(?diamond, ?player, tx_hash = ?receipt.transaction_hash, "added player");

        Ok(receipt.transaction_hash)
    }
}

/// Number of unopened lootboxes of a player, by rarity.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LootboxesCount {
    pub common: u64,
    pub rare: u64,
    pub epic: u64,
    pub legendary: u64,
    pub ethereal: u64,
}

impl From<Vec<U256>> for LootboxesCount {
    /// Anything but exactly one count per rarity is treated as no lootboxes at all.
    fn from(value: Vec<U256>) -> Self {
        let count = |v: &U256| u64::try_from(*v).unwrap_or(u64::MAX);

        match value.as_slice() {
            [common, rare, epic, legendary, ethereal] => Self {
                common: count(common),
                rare: count(rare),
                epic: count(epic),
                legendary: count(legendary),
                ethereal: count(ethereal),
            },
            _ => Self::default(),
        }
    }
}

/// Opens lootboxes, which needs a signing key, and counts them, which doesn't.
pub struct Lootboxes {
    provider: Arc<Provider<Http>>,
    submitter: Option<Submitter>,
}

impl Lootboxes {
    pub fn new(provider: Arc<Provider<Http>>, submitter: Option<Submitter>) -> Self {
        Self {
            provider,
            submitter,
        }
    }

    pub async fn open(
        &self,
        diamond: Address,
        player: Address,
        lootbox_id: U256,
    ) -> anyhow::Result<TxHash> {
        let submitter = self
            .submitter
            .as_ref()
            .ok_or_else(|| anyhow!("opening a lootbox needs a signing key"))?;

        let contract = LootboxFacet::new(diamond, submitter.signer());
        let call = contract.open(player, lootbox_id);

        let receipt = submitter.submit("open", call.tx).await?;
        tracing::info!(
            ?diamond,
            ?player,
            %lootbox_id,
            tx_hash = ?receipt.transaction_hash,
            "opened lootbox"
        );

        Ok(receipt.transaction_hash)
    }

    pub async fn list(&self, diamond: Address, player: Address) -> anyhow::Result<LootboxesCount> {
        let contract = LootboxFacet::new(diamond, self.provider.clone());
        let counts = contract
            .list(player)
            .call()
            .await
            .context("failed to list lootboxes")?;

        Ok(LootboxesCount::from(counts))
    }
}

/// Read-only access to the diamond's owner.
pub struct Ownership {
    provider: Arc<Provider<Http>>,
}

impl Ownership {
    pub fn new(provider: Arc<Provider<Http>>) -> Self {
        Self { provider }
    }

    pub async fn owner(&self, diamond: Address) -> anyhow::Result<Address> {
        let contract = OwnershipFacet::new(diamond, self.provider.clone());
        let owner = contract
            .owner()
            .call()
            .await
            .context("failed to query diamond owner")?;
        Ok(owner)
    }
}

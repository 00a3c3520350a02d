// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

mod evm;

use async_trait::async_trait;
use ethers::abi::Token;
use ethers::types::{Address, TxHash};
use gallion_diamond::{DiamondCut, FacetInfo};
use gallion_hardhat::Artifact;

pub use evm::{diamond_facets, EthDiamondManager};

/// The chain operations needed to deploy and upgrade a diamond.
#[async_trait]
pub trait DiamondManager: Send + Sync {
    /// The account deploying contracts and sending cuts.
    fn sender(&self) -> Address;

    /// Deploy a contract from its build artifact and return its address.
    async fn deploy(&self, artifact: &Artifact, args: Vec<Token>) -> anyhow::Result<Address>;

    /// Execute `IDiamondCut.diamondCut` as a single transaction.
    async fn diamond_cut(&self, diamond: Address, cut: &DiamondCut) -> anyhow::Result<TxHash>;

    /// The facet map reported by `IDiamondLoupe.facets`.
    async fn facets(&self, diamond: Address) -> anyhow::Result<Vec<FacetInfo>>;
}

// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use std::sync::Arc;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use ethers::abi::Token;
use ethers::providers::Middleware;
use ethers::types::{Address, TxHash};
use ethers_contract::ContractFactory;
use gallion_abis::convert::diamond_cut_args;
use gallion_abis::{diamond_cut, diamond_loupe};
use gallion_diamond::{DiamondCut, FacetInfo};
use gallion_hardhat::Artifact;

use crate::manager::DiamondManager;
use crate::submit::Submitter;

pub struct EthDiamondManager {
    submitter: Submitter,
}

impl EthDiamondManager {
    pub fn new(submitter: Submitter) -> Self {
        Self { submitter }
    }
}

#[async_trait]
impl DiamondManager for EthDiamondManager {
    fn sender(&self) -> Address {
        self.submitter.sender()
    }

    async fn deploy(&self, artifact: &Artifact, args: Vec<Token>) -> anyhow::Result<Address> {
        let name = artifact.contract_name.as_str();

        let factory = ContractFactory::new(
            artifact.abi.clone(),
            artifact.deployable_bytecode()?,
            self.submitter.signer(),
        );
        let deployer = factory
            .deploy_tokens(args)
            .with_context(|| format!("failed to encode constructor of {name}"))?;

        let receipt = self.submitter.submit(name, deployer.tx).await?;

        let address = receipt
            .contract_address
            .ok_or_else(|| anyhow!("no contract address in receipt of {name} deployment"))?;

        tracing::info!(contract = name, ?address, "deployed contract");

        Ok(address)
    }

    async fn diamond_cut(&self, diamond: Address, cut: &DiamondCut) -> anyhow::Result<TxHash> {
        let contract = diamond_cut::IDiamondCut::new(diamond, self.submitter.signer());
        let (entries, init, calldata) = diamond_cut_args(cut);

        let call = contract.diamond_cut(entries, init, calldata);
        let receipt = self.submitter.submit("diamondCut", call.tx).await?;

        tracing::info!(
            ?diamond,
            tx_hash = ?receipt.transaction_hash,
            selectors = cut.selector_count(),
            "completed diamond cut"
        );

        Ok(receipt.transaction_hash)
    }

    async fn facets(&self, diamond: Address) -> anyhow::Result<Vec<FacetInfo>> {
        diamond_facets(self.submitter.signer(), diamond).await
    }
}

/// Query `IDiamondLoupe.facets`; doesn't need a signer.
pub async fn diamond_facets<M: Middleware + 'static>(
    client: Arc<M>,
    diamond: Address,
) -> anyhow::Result<Vec<FacetInfo>> {
    let contract = diamond_loupe::IDiamondLoupe::new(diamond, client);
    let facets = contract
        .facets()
        .call()
        .await
        .context("failed to query diamond facets")?;

    Ok(facets.into_iter().map(FacetInfo::from).collect())
}

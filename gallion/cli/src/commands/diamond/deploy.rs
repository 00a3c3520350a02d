// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT
//! Deploy diamond cli handler

use async_trait::async_trait;
use clap::Args;
use ethers::types::{Address, U256};
use gallion_provider::upgrade::DiamondParams;

use crate::commands::parse_address;
use crate::{get_gallion_provider, CommandLineHandler, GlobalArguments};

pub(crate) struct DeployDiamond;

#[async_trait]
impl CommandLineHandler for DeployDiamond {
    type Arguments = DeployDiamondArgs;

    async fn handle(global: &GlobalArguments, arguments: &Self::Arguments) -> anyhow::Result<()> {
        tracing::debug!("deploy diamond with args: {:?}", arguments);

        let provider = get_gallion_provider(global)?;
        let upgrader = provider.upgrader()?;

        let mut params = DiamondParams::new(
            arguments.admins.clone(),
            arguments.main_wallet,
            U256::from(arguments.reward_ratio),
        );
        if !arguments.facets.is_empty() {
            params.facets = arguments.facets.clone();
        }

        let outcome = upgrader.deploy_diamond(&params).await?;

        for (name, address) in outcome.facets.iter() {
            println!("{name}: {address:?}");
        }
        println!("diamond: {:?}", outcome.diamond);

        Ok(())
    }
}

#[derive(Debug, Args)]
#[command(about = "Deploy a new diamond with its facets and initialize it")]
pub(crate) struct DeployDiamondArgs {
    #[arg(long = "admin", required = true, value_parser = parse_address, help = "A guild admin, can be repeated")]
    pub admins: Vec<Address>,
    #[arg(long, value_parser = parse_address, help = "The wallet receiving the guild income")]
    pub main_wallet: Address,
    #[arg(long, help = "The share of the income paid out as rewards")]
    pub reward_ratio: u64,
    #[arg(long = "facet", help = "Facets to cut into the diamond, default to all of them")]
    pub facets: Vec<String>,
}

// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT
use async_trait::async_trait;
use clap::Args;
use ethers::types::Address;

use crate::commands::parse_address;
use crate::{get_gallion_provider, CommandLineHandler, GlobalArguments};

pub(crate) struct DiamondOwner;

#[async_trait]
impl CommandLineHandler for DiamondOwner {
    type Arguments = DiamondOwnerArgs;

    async fn handle(global: &GlobalArguments, arguments: &Self::Arguments) -> anyhow::Result<()> {
        let owner = get_gallion_provider(global)?
            .ownership()?
            .owner(arguments.diamond)
            .await?;
        println!("{owner:?}");
        Ok(())
    }
}

#[derive(Debug, Args)]
#[command(about = "Print the owner of a diamond")]
pub(crate) struct DiamondOwnerArgs {
    #[arg(long, value_parser = parse_address)]
    pub diamond: Address,
}

// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT
use async_trait::async_trait;
use clap::{Args, Subcommand};
use ethers::types::{Address, U256};

use crate::commands::parse_address;
use crate::{get_gallion_provider, CommandLineHandler, GlobalArguments};

#[derive(Debug, Args)]
#[command(name = "lootbox", about = "lootbox related commands")]
#[command(args_conflicts_with_subcommands = true)]
pub(crate) struct LootboxCommandsArgs {
    #[command(subcommand)]
    command: Commands,
}

impl LootboxCommandsArgs {
    pub async fn handle(&self, global: &GlobalArguments) -> anyhow::Result<()> {
        match &self.command {
            Commands::Open(args) => OpenLootbox::handle(global, args).await,
            Commands::List(args) => ListLootboxes::handle(global, args).await,
        }
    }
}

#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    Open(OpenLootboxArgs),
    List(ListLootboxesArgs),
}

pub(crate) struct OpenLootbox;

#[async_trait]
impl CommandLineHandler for OpenLootbox {
    type Arguments = OpenLootboxArgs;

    async fn handle(global: &GlobalArguments, arguments: &Self::Arguments) -> anyhow::Result<()> {
        let tx_hash = get_gallion_provider(global)?
            .lootboxes()?
            .open(
                arguments.diamond,
                arguments.player,
                U256::from(arguments.id),
            )
            .await?;
        println!("{tx_hash:?}");
        Ok(())
    }
}

#[derive(Debug, Args)]
#[command(about = "Open a lootbox of a player")]
pub(crate) struct OpenLootboxArgs {
    #[arg(long, value_parser = parse_address)]
    pub diamond: Address,
    #[arg(long, value_parser = parse_address)]
    pub player: Address,
    #[arg(long, help = "The lootbox to open")]
    pub id: u64,
}

pub(crate) struct ListLootboxes;

#[async_trait]
impl CommandLineHandler for ListLootboxes {
    type Arguments = ListLootboxesArgs;

    async fn handle(global: &GlobalArguments, arguments: &Self::Arguments) -> anyhow::Result<()> {
        let counts = get_gallion_provider(global)?
            .lootboxes()?
            .list(arguments.diamond, arguments.player)
            .await?;
        println!("{}", serde_json::to_string_pretty(&counts)?);
        Ok(())
    }
}

#[derive(Debug, Args)]
#[command(about = "Count the unopened lootboxes of a player by rarity")]
pub(crate) struct ListLootboxesArgs {
    #[arg(long, value_parser = parse_address)]
    pub diamond: Address,
    #[arg(long, value_parser = parse_address)]
    pub player: Address,
}

// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT
use async_trait::async_trait;
use clap::{Args, Subcommand};
use ethers::types::Address;

use crate::commands::parse_address;
use crate::{get_gallion_provider, CommandLineHandler, GlobalArguments};

#[derive(Debug, Args)]
#[command(name = "player", about = "player related commands")]
#[command(args_conflicts_with_subcommands = true)]
pub(crate) struct PlayerCommandsArgs {
    #[command(subcommand)]
    command: Commands,
}

impl PlayerCommandsArgs {
    pub async fn handle(&self, global: &GlobalArguments) -> anyhow::Result<()> {
        match &self.command {
            Commands::Add(args) => AddPlayer::handle(global, args).await,
        }
    }
}

#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    Add(AddPlayerArgs),
}

pub(crate) struct AddPlayer;

#[async_trait]
impl CommandLineHandler for AddPlayer {
    type Arguments = AddPlayerArgs;

    async fn handle(global: &GlobalArguments, arguments: &Self::Arguments) -> anyhow::Result<()> {
        let tx_hash = get_gallion_provider(global)?
            .players()?
            .add(arguments.diamond, arguments.player)
            .await?;
        println!("{tx_hash:?}");
        Ok(())
    }
}

#[derive(Debug, Args)]
#[command(about = "Register a player in the guild")]
pub(crate) struct AddPlayerArgs {
    #[arg(long, value_parser = parse_address)]
    pub diamond: Address,
    #[arg(long, value_parser = parse_address)]
    pub player: Address,
}

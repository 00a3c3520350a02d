// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT
use clap::{Args, Subcommand};

use crate::commands::diamond::deploy::{DeployDiamond, DeployDiamondArgs};
use crate::commands::diamond::facets::{ListFacets, ListFacetsArgs};
use crate::commands::diamond::owner::{DiamondOwner, DiamondOwnerArgs};
use crate::commands::diamond::upgrade::{UpgradeDiamond, UpgradeDiamondArgs};
use crate::{CommandLineHandler, GlobalArguments};

mod deploy;
mod facets;
mod owner;
mod upgrade;

#[derive(Debug, Args)]
#[command(name = "diamond", about = "diamond deployment and upgrade commands")]
#[command(args_conflicts_with_subcommands = true)]
pub(crate) struct DiamondCommandsArgs {
    #[command(subcommand)]
    command: Commands,
}

impl DiamondCommandsArgs {
    pub async fn handle(&self, global: &GlobalArguments) -> anyhow::Result<()> {
        match &self.command {
            Commands::Deploy(args) => DeployDiamond::handle(global, args).await,
            Commands::Upgrade(args) => UpgradeDiamond::handle(global, args).await,
            Commands::Facets(args) => ListFacets::handle(global, args).await,
            Commands::Owner(args) => DiamondOwner::handle(global, args).await,
        }
    }
}

#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    Deploy(DeployDiamondArgs),
    Upgrade(UpgradeDiamondArgs),
    Facets(ListFacetsArgs),
    Owner(DiamondOwnerArgs),
}

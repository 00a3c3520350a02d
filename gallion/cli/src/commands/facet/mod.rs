// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT
use clap::{Args, Subcommand};

use crate::commands::facet::selectors::{FacetSelectors, FacetSelectorsArgs};
use crate::{CommandLineHandler, GlobalArguments};

mod selectors;

#[derive(Debug, Args)]
#[command(name = "facet", about = "inspect facet build artifacts")]
#[command(args_conflicts_with_subcommands = true)]
pub(crate) struct FacetCommandsArgs {
    #[command(subcommand)]
    command: Commands,
}

impl FacetCommandsArgs {
    pub async fn handle(&self, global: &GlobalArguments) -> anyhow::Result<()> {
        match &self.command {
            Commands::Selectors(args) => FacetSelectors::handle(global, args).await,
        }
    }
}

#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    Selectors(FacetSelectorsArgs),
}

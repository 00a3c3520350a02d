// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT
//! This mod contains the different command line implementations.

mod init;

use crate::commands::config::init::{InitConfig, InitConfigArgs};
use crate::{CommandLineHandler, GlobalArguments};
use clap::{Args, Subcommand};

#[derive(Debug, Args)]
#[command(name = "config", about = "config related commands")]
#[command(args_conflicts_with_subcommands = true)]
pub(crate) struct ConfigCommandsArgs {
    #[command(subcommand)]
    command: Commands,
}

impl ConfigCommandsArgs {
    pub async fn handle(&self, global: &GlobalArguments) -> anyhow::Result<()> {
        match &self.command {
            Commands::Init(args) => InitConfig::handle(global, args).await,
        }
    }
}

#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    Init(InitConfigArgs),
}

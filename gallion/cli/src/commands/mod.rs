// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT
//! This mod contains the different command line implementations.

mod config;
mod diamond;
mod facet;
mod gas;
mod lootbox;
mod player;
mod selector;

use std::io;

use anyhow::{Context, Result};
use clap::{Command, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Generator, Shell};
use ethers::types::Address;
use gallion_provider::GallionProvider;

use crate::commands::config::ConfigCommandsArgs;
use crate::commands::diamond::DiamondCommandsArgs;
use crate::commands::facet::FacetCommandsArgs;
use crate::commands::gas::{GasFees, GasFeesArgs};
use crate::commands::lootbox::LootboxCommandsArgs;
use crate::commands::player::PlayerCommandsArgs;
use crate::commands::selector::{ComputeSelectors, ComputeSelectorsArgs};
use crate::{CommandLineHandler, GlobalArguments};

/// The collection of all subcommands to be called, see clap's documentation for usage. Internal
/// to the current mode. Register a new command accordingly.
#[derive(Debug, Subcommand)]
enum Commands {
    Config(ConfigCommandsArgs),
    Selector(ComputeSelectorsArgs),
    Facet(FacetCommandsArgs),
    Diamond(DiamondCommandsArgs),
    Player(PlayerCommandsArgs),
    Lootbox(LootboxCommandsArgs),
    Gas(GasFeesArgs),
}

#[derive(Debug, Parser)]
#[command(
    name = "gallion",
    about = "Deploy, upgrade and operate Gallion diamonds",
    version = "v0.1.0"
)]
#[command(propagate_version = true, arg_required_else_help = true)]
struct GallionCliCommands {
    // If provided, outputs the completion file for given shell
    #[arg(long = "cli-autocomplete-gen", value_enum)]
    generator: Option<Shell>,
    #[clap(flatten)]
    global_params: GlobalArguments,
    #[command(subcommand)]
    command: Option<Commands>,
}

/// The `cli` method exposed to handle all the cli commands, ideally from main.
///
/// To register a new command, add its arguments to [`Commands`] and dispatch it below.
pub async fn cli() -> anyhow::Result<()> {
    let args = GallionCliCommands::parse();

    if let Some(generator) = args.generator {
        let mut cmd = GallionCliCommands::command();
        print_completions(generator, &mut cmd);
        Ok(())
    } else {
        let global = &args.global_params;
        if let Some(c) = &args.command {
            let r = match &c {
                Commands::Config(args) => args.handle(global).await,
                Commands::Selector(args) => ComputeSelectors::handle(global, args).await,
                Commands::Facet(args) => args.handle(global).await,
                Commands::Diamond(args) => args.handle(global).await,
                Commands::Player(args) => args.handle(global).await,
                Commands::Lootbox(args) => args.handle(global).await,
                Commands::Gas(args) => GasFees::handle(global, args).await,
            };

            r.with_context(|| format!("error processing command {:?}", args.command))
        } else {
            Ok(())
        }
    }
}

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

pub(crate) fn get_gallion_provider(global: &GlobalArguments) -> Result<GallionProvider> {
    let config = global.config()?;
    Ok(GallionProvider::new(config, global.private_key()))
}

/// Strict `0x` + 40 hex characters, as accepted by the contracts' tooling.
pub(crate) fn parse_address(s: &str) -> Result<Address, String> {
    gallion_diamond::parse_address(s).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::{parse_address, Commands, GallionCliCommands};

    #[test]
    fn command_tree_is_valid() {
        GallionCliCommands::command().debug_assert();
    }

    #[test]
    fn addresses_must_be_prefixed() {
        assert!(parse_address("0x3c44cdddb6a900fa2b585dd299e03d12fa4293bc").is_ok());
        assert!(parse_address("3c44cdddb6a900fa2b585dd299e03d12fa4293bc").is_err());
        assert!(parse_address("0x3c44").is_err());
    }

    #[test]
    fn parse_upgrade() {
        let args = GallionCliCommands::try_parse_from([
            "gallion",
            "--config-path",
            "/tmp/gallion.toml",
            "diamond",
            "upgrade",
            "--diamond",
            "0x3c44cdddb6a900fa2b585dd299e03d12fa4293bc",
            "--manifest",
            "upgrade.toml",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(
            args.global_params.config_path(),
            std::path::PathBuf::from("/tmp/gallion.toml")
        );
        assert!(matches!(args.command, Some(Commands::Diamond(_))));
    }

    #[test]
    fn dry_run_needs_no_diamond() {
        let args = GallionCliCommands::try_parse_from([
            "gallion",
            "diamond",
            "upgrade",
            "--manifest",
            "upgrade.toml",
            "--dry-run",
        ]);
        assert!(args.is_ok());

        let args = GallionCliCommands::try_parse_from([
            "gallion",
            "diamond",
            "upgrade",
            "--manifest",
            "upgrade.toml",
        ]);
        assert!(args.is_err());
    }

    #[test]
    fn invalid_private_key_is_rejected() {
        let res = GallionCliCommands::try_parse_from([
            "gallion",
            "--private-key",
            "0x1234",
            "gas",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn private_key_is_not_printed() {
        let args = GallionCliCommands::try_parse_from([
            "gallion",
            "--private-key",
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
            "gas",
        ])
        .unwrap();

        assert!(args.global_params.private_key().is_some());
        assert!(!format!("{:?}", args.global_params).contains("ac0974"));
    }
}

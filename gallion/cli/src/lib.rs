// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;
use async_trait::async_trait;
use clap::Args;
use gallion_provider::client::PrivateKey;
use gallion_provider::config::Config;

mod commands;

pub use commands::*;

/// The trait that represents the abstraction of a command line handler. To implement a new command
/// line operation, implement this trait and register it.
///
/// Note that this trait does not support a stateful implementation as we assume CLI commands are all
/// constructed from scratch.
#[async_trait]
pub trait CommandLineHandler {
    /// Abstraction for command line operations arguments.
    ///
    /// NOTE that this parameter is used to generate the command line arguments.
    type Arguments: std::fmt::Debug + Args;

    /// Handles the request with the provided arguments. Dev should handle the content to print and how
    async fn handle(global: &GlobalArguments, arguments: &Self::Arguments) -> anyhow::Result<()>;
}

/// The global arguments that will be shared by all cli commands.
#[derive(Debug, Args, Clone, Default)]
pub struct GlobalArguments {
    #[arg(
        long,
        help = "The toml config file path, default to ${HOME}/.gallion/config.toml",
        env = "GALLION_CONFIG_PATH"
    )]
    config_path: Option<PathBuf>,

    /// Hex encoded key of the account sending transactions.
    #[arg(long, env = "ITEM_MANAGER", hide_env_values = true, value_parser = parse_private_key)]
    private_key: Option<PrivateKey>,
}

impl GlobalArguments {
    pub fn config_path(&self) -> PathBuf {
        self.config_path
            .clone()
            .unwrap_or_else(gallion_provider::default_config_path)
    }

    /// The config file, or the defaults if there is no file at the default location.
    pub fn config(&self) -> Result<Config> {
        let config_path = self.config_path();

        if self.config_path.is_none() && !config_path.exists() {
            tracing::debug!(
                path = config_path.to_string_lossy().as_ref(),
                "no config file, using defaults"
            );
            return Ok(Config::default());
        }

        Config::from_file(gallion_provider::expand_tilde(config_path))
    }

    pub fn private_key(&self) -> Option<PrivateKey> {
        self.private_key.clone()
    }
}

fn parse_private_key(s: &str) -> Result<PrivateKey, String> {
    PrivateKey::from_str(s).map_err(|e| e.to_string())
}

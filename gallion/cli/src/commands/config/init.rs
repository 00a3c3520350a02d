// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT
use std::io::Write;

use async_trait::async_trait;
use clap::Args;
use gallion_provider::config::DEFAULT_CONFIG_TEMPLATE;

use crate::{CommandLineHandler, GlobalArguments};

/// The command to initialize a new config template in a specific path
pub(crate) struct InitConfig;

#[async_trait]
impl CommandLineHandler for InitConfig {
    type Arguments = InitConfigArgs;

    async fn handle(global: &GlobalArguments, arguments: &Self::Arguments) -> anyhow::Result<()> {
        let path = gallion_provider::expand_tilde(global.config_path());
        tracing::debug!(path = path.to_string_lossy().as_ref(), "initializing config file");

        if path.exists() && !arguments.force {
            anyhow::bail!("{} already exists; use --force to overwrite it", path.display());
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::File::create(&path).map_err(|e| {
            tracing::error!("couldn't create config file");
            e
        })?;
        file.write_all(DEFAULT_CONFIG_TEMPLATE.as_bytes())
            .map_err(|e| {
                tracing::error!("error populating config template");
                e
            })?;

        tracing::info!("config template written to {}", path.display());

        Ok(())
    }
}

#[derive(Debug, Args)]
#[command(about = "Write the default config template to the config path")]
pub(crate) struct InitConfigArgs {
    #[arg(long, help = "Overwrite an existing config file")]
    pub force: bool,
}

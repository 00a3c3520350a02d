// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT
//! Selector cli handler

use async_trait::async_trait;
use clap::Args;
use gallion_diamond::{canonical_signature, Selector};

use crate::{CommandLineHandler, GlobalArguments};

pub(crate) struct ComputeSelectors;

#[async_trait]
impl CommandLineHandler for ComputeSelectors {
    type Arguments = ComputeSelectorsArgs;

    async fn handle(_global: &GlobalArguments, arguments: &Self::Arguments) -> anyhow::Result<()> {
        for signature in arguments.signatures.iter() {
            let canonical = canonical_signature(signature)?;
            println!("{} {}", Selector::from_canonical(&canonical), canonical);
        }
        Ok(())
    }
}

#[derive(Debug, Args)]
#[command(about = "Print the canonical form and selector of function signatures")]
pub(crate) struct ComputeSelectorsArgs {
    #[arg(
        required = true,
        help = "Signatures like 'addPlayer(address)' or 'function addPlayer(address player) external'"
    )]
    pub signatures: Vec<String>,
}

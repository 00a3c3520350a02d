// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT
//! Gas fees cli handler

use async_trait::async_trait;
use clap::Args;
use ethers::utils::format_units;

use crate::{get_gallion_provider, CommandLineHandler, GlobalArguments};

pub(crate) struct GasFees;

#[async_trait]
impl CommandLineHandler for GasFees {
    type Arguments = GasFeesArgs;

    async fn handle(global: &GlobalArguments, _arguments: &Self::Arguments) -> anyhow::Result<()> {
        let provider = get_gallion_provider(global)?;
        let fees = provider.gas_fees().await?;

        println!(
            "max fee: {} gwei",
            format_units(fees.max_fee_per_gas, "gwei")?
        );
        println!(
            "max priority fee: {} gwei",
            format_units(fees.max_priority_fee_per_gas, "gwei")?
        );

        Ok(())
    }
}

#[derive(Debug, Args)]
#[command(about = "Print the fees the configured gas strategy would use now")]
pub(crate) struct GasFeesArgs {}

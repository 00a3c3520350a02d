// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT
//! Upgrade diamond cli handler

use std::path::PathBuf;

use anyhow::anyhow;
use async_trait::async_trait;
use clap::Args;
use ethers::types::Address;
use gallion_diamond::SelectorSet;
use gallion_provider::upgrade::{plan_upgrade, UpgradeManifest};

use crate::commands::parse_address;
use crate::{get_gallion_provider, CommandLineHandler, GlobalArguments};

pub(crate) struct UpgradeDiamond;

#[async_trait]
impl CommandLineHandler for UpgradeDiamond {
    type Arguments = UpgradeDiamondArgs;

    async fn handle(global: &GlobalArguments, arguments: &Self::Arguments) -> anyhow::Result<()> {
        tracing::debug!("upgrade diamond with args: {:?}", arguments);

        let provider = get_gallion_provider(global)?;
        let manifest = UpgradeManifest::from_file(&arguments.manifest)?;

        if arguments.dry_run {
            for planned in plan_upgrade(&provider.hardhat(), &manifest)? {
                let plan = planned.plan;
                println!("{}", plan.name);
                print_selectors("add", &plan.add);
                print_selectors("replace", &plan.replace);
                print_selectors("remove", &plan.remove);
            }
            return Ok(());
        }

        let diamond = arguments
            .diamond
            .ok_or_else(|| anyhow!("--diamond is required unless --dry-run is given"))?;

        let outcome = provider
            .upgrader()?
            .upgrade_facets(diamond, &manifest)
            .await?;

        for (name, address) in outcome.facets.iter() {
            println!("{name}: {address:?}");
        }
        println!("diamond cut: {:?}", outcome.tx_hash);

        Ok(())
    }
}

fn print_selectors(action: &str, selectors: &SelectorSet) {
    for s in selectors {
        println!("  {action:<8} {s}");
    }
}

#[derive(Debug, Args)]
#[command(about = "Redeploy facets and cut them into an existing diamond")]
pub(crate) struct UpgradeDiamondArgs {
    #[arg(
        long,
        value_parser = parse_address,
        required_unless_present = "dry_run",
        help = "The diamond to upgrade"
    )]
    pub diamond: Option<Address>,
    #[arg(long, help = "The TOML file listing the facets and their new or removed functions")]
    pub manifest: PathBuf,
    #[arg(long, help = "Print the planned cut without deploying anything")]
    pub dry_run: bool,
}

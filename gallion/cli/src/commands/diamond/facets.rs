// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT
//! List facets cli handler

use async_trait::async_trait;
use clap::Args;
use ethers::types::Address;
use gallion_diamond::find_facet;

use crate::commands::parse_address;
use crate::{get_gallion_provider, CommandLineHandler, GlobalArguments};

pub(crate) struct ListFacets;

#[async_trait]
impl CommandLineHandler for ListFacets {
    type Arguments = ListFacetsArgs;

    async fn handle(global: &GlobalArguments, arguments: &Self::Arguments) -> anyhow::Result<()> {
        let provider = get_gallion_provider(global)?;
        let facets = provider.facets(arguments.diamond).await?;

        if let Some(facet) = arguments.facet {
            match find_facet(&facet, &facets) {
                Some(i) => println!("{i}"),
                None => println!("{facet:?} is not a facet of {:?}", arguments.diamond),
            }
            return Ok(());
        }

        for facet in facets.iter() {
            println!("{:?}", facet.address);
            for s in facet.selectors.iter() {
                println!("  {s}");
            }
        }

        Ok(())
    }
}

#[derive(Debug, Args)]
#[command(about = "List the facets of a diamond and their selectors")]
pub(crate) struct ListFacetsArgs {
    #[arg(long, value_parser = parse_address, help = "The diamond to inspect")]
    pub diamond: Address,
    #[arg(long, value_parser = parse_address, help = "Only print the position of this facet")]
    pub facet: Option<Address>,
}

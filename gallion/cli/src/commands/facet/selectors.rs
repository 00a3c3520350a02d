// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT
//! Facet selectors cli handler

use std::path::PathBuf;

use async_trait::async_trait;
use clap::Args;
use gallion_provider::upgrade::default_facet_source;

use crate::{CommandLineHandler, GlobalArguments};

pub(crate) struct FacetSelectors;

#[async_trait]
impl CommandLineHandler for FacetSelectors {
    type Arguments = FacetSelectorsArgs;

    async fn handle(global: &GlobalArguments, arguments: &Self::Arguments) -> anyhow::Result<()> {
        tracing::debug!("facet selectors with args: {:?}", arguments);

        let hardhat = gallion_provider::GallionProvider::new(global.config()?, None).hardhat();

        let source = arguments
            .source
            .clone()
            .unwrap_or_else(|| default_facet_source(&arguments.name));

        let artifact = hardhat.artifact(source, &arguments.name)?;

        for f in artifact.facet_abi.functions() {
            if f.is_diamond_init() {
                continue;
            }
            println!("{} {}", f.selector(), f.signature());
        }

        Ok(())
    }
}

#[derive(Debug, Args)]
#[command(about = "Print the selectors a facet would register in a diamond")]
pub(crate) struct FacetSelectorsArgs {
    #[arg(long, help = "The contract name, e.g. PlayerFacet")]
    pub name: String,
    #[arg(long, help = "The Solidity source under the artifacts directory, default to facets/<name>.sol")]
    pub source: Option<PathBuf>,
}

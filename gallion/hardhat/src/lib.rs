// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use anyhow::{anyhow, bail, Context};
use ethers_core::abi::Abi;
use ethers_core::types::Bytes;
use gallion_diamond::FacetAbi;
use serde::Deserialize;
use serde_json::value::RawValue;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

/// Contract source relative to the artifacts directory, e.g. `"facets/PlayerFacet.sol"`.
/// It is assumed to contain the file extension.
pub type ContractSource = PathBuf;

/// Contract name as it appears in the source, e.g. `"PlayerFacet"`.
pub type ContractName = String;

/// Where placeholders for library addresses start in the bytecode.
const LINK_PLACEHOLDER: &str = "__$";

/// Utility to read Hardhat build artifacts.
#[derive(Clone, Debug)]
pub struct Hardhat {
    /// Directory with Hardhat build artifacts, the full-fat JSON files
    /// that contain ABI, bytecode, link references, etc.
    ///
    /// Typically `artifacts/contracts` in the Hardhat project.
    contracts_dir: PathBuf,
}

impl Hardhat {
    pub fn new(contracts_dir: PathBuf) -> Self {
        Self { contracts_dir }
    }

    pub fn contracts_dir(&self) -> &Path {
        &self.contracts_dir
    }

    /// Parse the Hardhat artifact of a contract.
    ///
    /// The contract source is the path of the Solidity file under the contracts
    /// directory of the project, including the extension, ie. a [ContractSource].
    pub fn artifact(
        &self,
        contract_src: impl AsRef<Path>,
        contract_name: &str,
    ) -> anyhow::Result<Artifact> {
        let contract_path = self.contract_path(contract_src.as_ref(), contract_name)?;

        let json = std::fs::read_to_string(&contract_path)
            .with_context(|| format!("failed to read {contract_path:?}"))?;

        Artifact::from_json(&json)
            .with_context(|| format!("failed to parse Hardhat artifact {contract_path:?}"))
    }

    /// Concatenate the contracts directory with the expected layout to get
    /// the path to the JSON file of a contract, which is under a directory
    /// named after the Solidity file.
    fn contract_path(&self, contract_src: &Path, contract_name: &str) -> anyhow::Result<PathBuf> {
        if contract_src.file_name().is_none() {
            return Err(anyhow!("failed to produce base name for {contract_src:?}"));
        }

        let path = self
            .contracts_dir
            .join(contract_src)
            .join(format!("{contract_name}.json"));

        Ok(path)
    }
}

/// The parts of a Hardhat build artifact needed to deploy a facet and cut it into a diamond.
#[derive(Clone, Debug)]
pub struct Artifact {
    pub contract_name: ContractName,
    /// Functions in declaration order, for selector derivation.
    pub facet_abi: FacetAbi,
    /// The full ABI, for deployment and calls.
    pub abi: Abi,
    /// Creation bytecode; empty for interfaces and abstract contracts.
    pub bytecode: Bytes,
}

impl Artifact {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let raw = serde_json::from_str::<RawArtifact>(json)?;

        let facet_abi = FacetAbi::from_json(raw.abi.get())?;
        let abi = serde_json::from_str::<Abi>(raw.abi.get()).context("failed to parse ABI")?;

        // We don't deploy libraries; anything that needs linking is unusable.
        if let Some(lib) = raw
            .link_references
            .iter()
            .flat_map(|(src, links)| links.keys().map(move |name| format!("{src}:{name}")))
            .next()
        {
            bail!("{} needs to be linked with {lib}", raw.contract_name);
        }
        if raw.bytecode.contains(LINK_PLACEHOLDER) {
            bail!("{} contains unlinked library placeholders", raw.contract_name);
        }

        let bytecode = hex::decode(raw.bytecode.trim_start_matches("0x"))
            .context("failed to decode contract from hex")?;

        Ok(Self {
            contract_name: raw.contract_name,
            facet_abi,
            abi,
            bytecode: Bytes::from(bytecode),
        })
    }

    /// The creation bytecode, failing for contracts that cannot be deployed.
    pub fn deployable_bytecode(&self) -> anyhow::Result<Bytes> {
        if self.bytecode.is_empty() {
            bail!("{} has no bytecode; is it an interface?", self.contract_name);
        }
        Ok(self.bytecode.clone())
    }
}

/// Match the JSON layout of a Hardhat build artifact.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    pub contract_name: ContractName,
    pub abi: Box<RawValue>,
    /// Hexadecimal format with placeholders for links.
    #[serde(default)]
    pub bytecode: String,
    #[serde(default)]
    pub link_references: HashMap<String, HashMap<ContractName, serde_json::Value>>,
}

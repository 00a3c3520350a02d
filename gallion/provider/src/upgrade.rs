// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT
//! Deploying facets and cutting them into a diamond.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use ethers::abi::Token;
use ethers::types::{Address, Bytes, TxHash, U256};
use gallion_diamond::{
    build_cut, plan_facet_upgrade, verify_cut, DiamondCut, FacetDescriptor, FacetPlan, InitCall,
    Selector,
};
use gallion_hardhat::{Artifact, Hardhat};
use serde::Deserialize;

use crate::manager::DiamondManager;

pub const DIAMOND_CUT_FACET: (&str, &str) = ("facets/DiamondCutFacet.sol", "DiamondCutFacet");
pub const DIAMOND: (&str, &str) = ("GuildDiamond.sol", "GuildDiamond");
pub const DIAMOND_INIT: (&str, &str) = ("upgradeInitializers/DiamondInit.sol", "DiamondInit");

/// The facets cut into a freshly deployed diamond.
pub const DEFAULT_FACETS: [&str; 7] = [
    "DiamondLoupeFacet",
    "OwnershipFacet",
    "TokensFacet",
    "RulesFacet",
    "TreasuryFacet",
    "PlayerFacet",
    "LootboxFacet",
];

/// The shape of `DiamondInit.init(Args)` the initialization arguments are encoded for,
/// with `Args { gallionLabs, guildAdmins, rewardRatioFromIncome, guildMainWallet }`.
pub const DIAMOND_INIT_SIGNATURE: &str = "init((address,address[],uint256,address))";

/// Describes an upgrade: the facets to redeploy and what to do with their selectors.
///
/// ```toml
/// [[facets]]
/// name = "PlayerFacet"
/// add = ["function fixLootboxesByPlayer(address playerAddress) external"]
/// remove = ["oldFunction(address)"]
///
/// [init]
/// address = "0x..."
/// calldata = "0x..."
/// ```
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct UpgradeManifest {
    #[serde(default)]
    pub facets: Vec<FacetUpgrade>,
    pub init: Option<InitSpec>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FacetUpgrade {
    pub name: String,
    /// Solidity source under the contracts directory; `facets/<name>.sol` by default.
    pub source: Option<PathBuf>,
    /// Signatures the diamond doesn't have yet.
    #[serde(default)]
    pub add: Vec<String>,
    /// Signatures to delete from the diamond.
    #[serde(default)]
    pub remove: Vec<String>,
}

impl FacetUpgrade {
    pub fn source(&self) -> PathBuf {
        self.source
            .clone()
            .unwrap_or_else(|| default_facet_source(&self.name))
    }
}

/// An already deployed contract to `delegatecall` after the cut.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct InitSpec {
    pub address: Address,
    #[serde(default)]
    pub calldata: Bytes,
}

impl UpgradeManifest {
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let manifest = toml::from_str(s)?;
        Ok(manifest)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(&path).with_context(|| {
            format!(
                "failed to read manifest from {}",
                path.as_ref().to_string_lossy()
            )
        })?;
        Self::from_toml_str(&contents).context("failed to parse manifest TOML")
    }
}

/// Parameters of `DiamondInit.init` for a new diamond.
#[derive(Debug, Clone)]
pub struct DiamondParams {
    pub guild_admins: Vec<Address>,
    pub guild_main_wallet: Address,
    pub reward_ratio_from_income: U256,
    /// Facet contract names, with sources under `facets/`.
    pub facets: Vec<String>,
}

impl DiamondParams {
    pub fn new(
        guild_admins: Vec<Address>,
        guild_main_wallet: Address,
        reward_ratio_from_income: U256,
    ) -> Self {
        Self {
            guild_admins,
            guild_main_wallet,
            reward_ratio_from_income,
            facets: DEFAULT_FACETS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// The result of an upgrade or a deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeOutcome {
    pub diamond: Address,
    pub tx_hash: TxHash,
    /// Newly deployed facet addresses by contract name.
    pub facets: BTreeMap<String, Address>,
}

/// A facet whose selectors have been planned but which isn't deployed yet.
#[derive(Debug, Clone)]
pub struct PlannedFacet {
    pub artifact: Artifact,
    pub plan: FacetPlan,
}

/// Deploys facets from build artifacts and cuts them into diamonds.
pub struct Upgrader<M> {
    manager: M,
    hardhat: Hardhat,
}

impl<M: DiamondManager> Upgrader<M> {
    pub fn new(manager: M, hardhat: Hardhat) -> Self {
        Self { manager, hardhat }
    }

    pub fn manager(&self) -> &M {
        &self.manager
    }

    /// See [`plan_upgrade`].
    pub fn plan(&self, manifest: &UpgradeManifest) -> anyhow::Result<Vec<PlannedFacet>> {
        plan_upgrade(&self.hardhat, manifest)
    }

    /// Deploy the facets of the manifest, cut them into the diamond and check the result.
    pub async fn upgrade_facets(
        &self,
        diamond: Address,
        manifest: &UpgradeManifest,
    ) -> anyhow::Result<UpgradeOutcome> {
        let planned = self.plan(manifest)?;

        let init = manifest
            .init
            .as_ref()
            .map(|i| InitCall::new(i.address, i.calldata.clone()));

        self.execute(diamond, planned, init).await
    }

    /// Deploy a new diamond with all its facets and initialize it.
    pub async fn deploy_diamond(&self, params: &DiamondParams) -> anyhow::Result<UpgradeOutcome> {
        // Load everything up front so a missing artifact doesn't leave half a deployment.
        let cut_facet = self.hardhat.artifact(DIAMOND_CUT_FACET.0, DIAMOND_CUT_FACET.1)?;
        let diamond = self.hardhat.artifact(DIAMOND.0, DIAMOND.1)?;
        let diamond_init = self.hardhat.artifact(DIAMOND_INIT.0, DIAMOND_INIT.1)?;
        let init_selector = diamond_init_selector(&diamond_init)?;

        let mut planned = Vec::new();
        for name in params.facets.iter() {
            let artifact = self.hardhat.artifact(default_facet_source(name), name)?;
            let descriptor = FacetDescriptor::from_abi(name, Address::zero(), &artifact.facet_abi);
            let plan = FacetPlan::add_all(&descriptor);
            planned.push(PlannedFacet { artifact, plan });
        }
        check_payload(&planned)?;

        let owner = self.manager.sender();

        let cut_facet = self.manager.deploy(&cut_facet, Vec::new()).await?;
        let diamond = self
            .manager
            .deploy(
                &diamond,
                vec![Token::Address(owner), Token::Address(cut_facet)],
            )
            .await?;
        let diamond_init = self.manager.deploy(&diamond_init, Vec::new()).await?;

        let init = InitCall::encode(
            diamond_init,
            init_selector,
            &[Token::Tuple(vec![
                Token::Address(owner),
                Token::Array(
                    params
                        .guild_admins
                        .iter()
                        .map(|a| Token::Address(*a))
                        .collect(),
                ),
                Token::Uint(params.reward_ratio_from_income),
                Token::Address(params.guild_main_wallet),
            ])],
        );

        self.execute(diamond, planned, Some(init)).await
    }

    async fn execute(
        &self,
        diamond: Address,
        planned: Vec<PlannedFacet>,
        init: Option<InitCall>,
    ) -> anyhow::Result<UpgradeOutcome> {
        let mut plans = Vec::new();
        let mut facets = BTreeMap::new();

        for PlannedFacet { artifact, plan } in planned {
            let address = self.manager.deploy(&artifact, Vec::new()).await?;
            facets.insert(plan.name.clone(), address);
            plans.push(plan.at(address));
        }

        let cut = build_cut(&plans, init)?;

        let tx_hash = self.manager.diamond_cut(diamond, &cut).await?;

        self.verify(diamond, &cut).await?;

        Ok(UpgradeOutcome {
            diamond,
            tx_hash,
            facets,
        })
    }

    /// Compare the cut with what the diamond reports through the loupe.
    async fn verify(&self, diamond: Address, cut: &DiamondCut) -> anyhow::Result<()> {
        let reported = self.manager.facets(diamond).await?;
        let mismatches = verify_cut(cut, &reported);

        if mismatches.is_empty() {
            return Ok(());
        }

        for m in mismatches.iter() {
            tracing::error!(?diamond, "{m}");
        }

        Err(anyhow!(
            "diamond {diamond:?} doesn't route {} selector(s) as expected",
            mismatches.len()
        ))
    }
}

/// Plan every facet of the manifest against its build artifact.
///
/// Nothing touches the chain; a declared signature the facet doesn't have fails
/// here rather than after paying for deployments. The plans point at the zero
/// address until the facets are deployed.
pub fn plan_upgrade(
    hardhat: &Hardhat,
    manifest: &UpgradeManifest,
) -> anyhow::Result<Vec<PlannedFacet>> {
    let mut planned = Vec::new();

    for facet in manifest.facets.iter() {
        let artifact = hardhat.artifact(facet.source(), &facet.name)?;
        let descriptor = FacetDescriptor::from_abi(&facet.name, Address::zero(), &artifact.facet_abi);

        let plan = plan_facet_upgrade(&descriptor, &facet.add)?.with_removals(&facet.remove)?;

        planned.push(PlannedFacet { artifact, plan });
    }

    let cut = check_payload(&planned)?;

    if cut.is_empty() && manifest.init.is_none() {
        bail!("nothing to cut: the manifest touches no selectors and has no init call");
    }

    Ok(planned)
}

/// Build the cut with placeholder addresses, to catch selectors
/// claimed by more than one facet before anything is deployed.
fn check_payload(planned: &[PlannedFacet]) -> anyhow::Result<DiamondCut> {
    let plans = planned
        .iter()
        .enumerate()
        .map(|(i, p)| p.plan.clone().at(Address::from_low_u64_be(i as u64 + 1)))
        .collect::<Vec<_>>();

    let cut = build_cut(&plans, None)?;

    Ok(cut)
}

/// The selector of `init` in the `DiamondInit` artifact, provided it takes the arguments we encode.
fn diamond_init_selector(artifact: &Artifact) -> anyhow::Result<Selector> {
    let init = artifact
        .facet_abi
        .function("init")
        .ok_or_else(|| anyhow!("{} has no unique init function", artifact.contract_name))?;

    let signature = init.signature();
    if signature != DIAMOND_INIT_SIGNATURE {
        bail!(
            "{} has {signature}, expected {DIAMOND_INIT_SIGNATURE}",
            artifact.contract_name
        );
    }

    Ok(init.selector())
}

/// Where Hardhat puts the artifact of a facet, e.g. `facets/PlayerFacet.sol`.
pub fn default_facet_source(name: &str) -> PathBuf {
    PathBuf::from(format!("facets/{name}.sol"))
}

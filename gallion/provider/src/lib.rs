// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT
//! Gallion provider: deploys and upgrades Gallion diamonds and calls their facets over JSON-RPC.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ethers::providers::{Http, Provider};
use ethers::types::Address;
use gallion_diamond::FacetInfo;
use gallion_hardhat::Hardhat;

use crate::client::PrivateKey;
use crate::config::Config;
use crate::facets::{Lootboxes, Ownership, Players};
use crate::gas::GasFees;
use crate::manager::EthDiamondManager;
use crate::submit::Submitter;
use crate::upgrade::Upgrader;

pub mod client;
pub mod config;
pub mod error;
pub mod facets;
pub mod gas;
pub mod manager;
pub mod submit;
pub mod upgrade;

const DEFAULT_REPO_PATH: &str = ".gallion";
const DEFAULT_CONFIG_NAME: &str = "config.toml";

/// Entry point holding the configuration and the optional signing key.
#[derive(Clone, Debug)]
pub struct GallionProvider {
    config: Arc<Config>,
    signing_key: Option<PrivateKey>,
}

impl GallionProvider {
    pub fn new(config: Config, signing_key: Option<PrivateKey>) -> Self {
        Self {
            config: Arc::new(config),
            signing_key,
        }
    }

    /// Initializes a `GallionProvider` from the config file at the given path.
    pub fn new_from_config(
        config_path: impl AsRef<Path>,
        signing_key: Option<PrivateKey>,
    ) -> anyhow::Result<Self> {
        let config = Config::from_file(expand_tilde(config_path))?;
        Ok(Self::new(config, signing_key))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build artifacts of the contracts.
    pub fn hardhat(&self) -> Hardhat {
        Hardhat::new(self.config.artifacts_dir())
    }

    /// Read-only JSON-RPC access.
    pub fn provider(&self) -> anyhow::Result<Arc<Provider<Http>>> {
        let client = self.config.client_config(None)?;
        Ok(Arc::new(client.provider()?))
    }

    /// Sends transactions signed with the configured key; fails without one.
    pub fn submitter(&self) -> anyhow::Result<Submitter> {
        let client = self.config.client_config(self.signing_key.clone())?;
        let signer = client.signer()?;

        Ok(Submitter::new(
            Arc::new(signer),
            self.config.gas_strategy()?,
            self.config.submission.clone(),
        ))
    }

    pub fn upgrader(&self) -> anyhow::Result<Upgrader<EthDiamondManager>> {
        let manager = EthDiamondManager::new(self.submitter()?);
        Ok(Upgrader::new(manager, self.hardhat()))
    }

    pub fn players(&self) -> anyhow::Result<Players> {
        Ok(Players::new(self.submitter()?))
    }

    /// Counting lootboxes works without a signing key; opening them doesn't.
    pub fn lootboxes(&self) -> anyhow::Result<Lootboxes> {
        let submitter = match self.signing_key {
            Some(_) => Some(self.submitter()?),
            None => None,
        };
        Ok(Lootboxes::new(self.provider()?, submitter))
    }

    pub fn ownership(&self) -> anyhow::Result<Ownership> {
        Ok(Ownership::new(self.provider()?))
    }

    /// The facets the diamond currently routes to, as reported by its loupe.
    pub async fn facets(&self, diamond: Address) -> anyhow::Result<Vec<FacetInfo>> {
        manager::diamond_facets(self.provider()?, diamond).await
    }

    /// The fees the configured strategy would attach to a transaction right now.
    pub async fn gas_fees(&self) -> anyhow::Result<GasFees> {
        let provider = self.provider()?;
        self.config.gas_strategy()?.fees(&provider).await
    }
}

pub fn default_repo_path() -> PathBuf {
    expand_tilde(Path::new("~").join(DEFAULT_REPO_PATH))
}

pub fn default_config_path() -> PathBuf {
    default_repo_path().join(DEFAULT_CONFIG_NAME)
}

/// Expand paths that begin with "~" to `$HOME`.
pub fn expand_tilde<P: AsRef<Path>>(path: P) -> PathBuf {
    let p = path.as_ref().to_path_buf();
    let rest = match p.strip_prefix("~") {
        Ok(rest) => rest.to_path_buf(),
        Err(_) => return p,
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => p,
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::str::FromStr;

    use crate::client::PrivateKey;
    use crate::config::Config;

    use super::{default_config_path, expand_tilde, GallionProvider};

    #[test]
    fn tilde_expansion() {
        assert_eq!(expand_tilde("/tmp/config.toml"), PathBuf::from("/tmp/config.toml"));
        assert_eq!(expand_tilde("relative/~"), PathBuf::from("relative/~"));

        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~"), home);
            assert_eq!(expand_tilde("~/.gallion"), home.join(".gallion"));
        }
    }

    #[test]
    fn config_path_is_under_repo() {
        let path = default_config_path();
        assert!(path.ends_with(Path::new(".gallion/config.toml")));
    }

    #[test]
    fn submitter_needs_key() {
        let provider = GallionProvider::new(Config::default(), None);
        assert!(provider.submitter().is_err());
        assert!(provider.players().is_err());
        assert!(provider.ownership().is_ok());
        assert!(provider.lootboxes().is_ok());

        let key = PrivateKey::from_str(
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        )
        .unwrap();
        let provider = GallionProvider::new(Config::default(), Some(key));
        let submitter = provider.submitter().unwrap();
        assert_eq!(
            format!("{:?}", submitter.sender()),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "artifacts_dir = \"/opt/gallion/artifacts\"").unwrap();

        let provider = GallionProvider::new_from_config(&path, None).unwrap();
        assert_eq!(
            provider.hardhat().contracts_dir(),
            Path::new("/opt/gallion/artifacts")
        );
    }
}

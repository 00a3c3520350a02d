// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context};
use ethers::prelude::k256::ecdsa::SigningKey;
use ethers::prelude::{Signer, SignerMiddleware};
use ethers::providers::{Http, Provider};
use ethers::signers::{LocalWallet, Wallet};
use reqwest::Client;
use url::Url;
use zeroize::Zeroize;

pub type DefaultSignerMiddleware = SignerMiddleware<Provider<Http>, Wallet<SigningKey>>;

/// Default polling time used by the Ethers provider to check for pending
/// transactions and events. Default is 7, and Polygon blocks come every
/// couple of seconds.
const ETH_PROVIDER_POLLING_TIME: Duration = Duration::from_secs(2);

/// A secp256k1 secret key, wiped from memory when dropped.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey(Vec<u8>);

impl PrivateKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for PrivateKey {
    type Err = anyhow::Error;

    /// Parse a hex encoded key, with or without the `0x` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s))
            .map_err(|_| anyhow!("private key is not valid hex"))?;

        if bytes.len() != 32 {
            return Err(anyhow!(
                "private key should be 32 bytes, got {}",
                bytes.len()
            ));
        }
        Ok(Self(bytes))
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Everything needed to talk to the chain and sign transactions.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub provider_http: Url,
    pub provider_timeout: Option<Duration>,
    pub chain_id: u64,
    /// Only needed for sending transactions.
    pub signing_key: Option<PrivateKey>,
}

impl ClientConfig {
    /// A read-only JSON-RPC provider.
    pub fn provider(&self) -> anyhow::Result<Provider<Http>> {
        let mut client = Client::builder();

        if let Some(timeout) = self.provider_timeout {
            client = client.timeout(timeout);
        }

        let client = client.build()?;

        let provider = Http::new_with_client(self.provider_http.clone(), client);

        let mut provider = Provider::new(provider);
        provider.set_interval(ETH_PROVIDER_POLLING_TIME);

        Ok(provider)
    }

    /// A provider that signs every transaction with the configured key.
    pub fn signer(&self) -> anyhow::Result<DefaultSignerMiddleware> {
        let key = self.signing_key.as_ref().ok_or_else(|| {
            anyhow!("no signing key; pass --private-key or set the ITEM_MANAGER variable")
        })?;

        let wallet = LocalWallet::from_bytes(key.as_bytes())
            .context("invalid private key")?
            .with_chain_id(self.chain_id);

        Ok(SignerMiddleware::new(self.provider()?, wallet))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use ethers::prelude::Signer;
    use ethers::types::Address;

    use super::{ClientConfig, PrivateKey};

    // The first account of the Hardhat test mnemonic.
    const HARDHAT_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const HARDHAT_ADDR: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

    fn client_config(signing_key: Option<PrivateKey>) -> ClientConfig {
        ClientConfig {
            provider_http: "http://127.0.0.1:8545".parse().unwrap(),
            provider_timeout: None,
            chain_id: 31337,
            signing_key,
        }
    }

    #[test]
    fn parse_private_key() {
        let with_prefix = PrivateKey::from_str(HARDHAT_KEY).unwrap();
        let without_prefix = PrivateKey::from_str(&HARDHAT_KEY[2..]).unwrap();
        assert_eq!(with_prefix, without_prefix);
        assert_eq!(with_prefix.as_bytes().len(), 32);

        assert!(PrivateKey::from_str("0x1234").is_err());
        assert!(PrivateKey::from_str("not hex").is_err());
    }

    #[test]
    fn private_key_is_redacted() {
        let key = PrivateKey::from_str(HARDHAT_KEY).unwrap();
        let config = client_config(Some(key));
        let debug = format!("{config:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains(&HARDHAT_KEY[2..]));
    }

    #[test]
    fn signer_uses_key_and_chain() {
        let key = PrivateKey::from_str(HARDHAT_KEY).unwrap();
        let signer = client_config(Some(key)).signer().unwrap();

        assert_eq!(signer.address(), Address::from_str(HARDHAT_ADDR).unwrap());
        assert_eq!(signer.signer().chain_id(), 31337);
    }

    #[test]
    fn signer_needs_key() {
        let err = client_config(None).signer().unwrap_err();
        assert!(err.to_string().contains("ITEM_MANAGER"));
        assert!(client_config(None).provider().is_ok());
    }
}

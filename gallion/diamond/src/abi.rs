// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT
//! Just enough of the JSON ABI format to derive function selectors.
//!
//! [ethers_core::abi::Abi] keeps functions in a map sorted by name, which loses
//! the declaration order we want the cut to follow, so we read the entries ourselves.

use serde::Deserialize;

use crate::{selector_from_signature, Error, Selector, SelectorSet, SignatureResolver};

/// A parameter of an ABI entry; tuples carry their members in `components`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct AbiParam {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub components: Vec<AbiParam>,
}

impl AbiParam {
    /// The type as it appears in a canonical signature, e.g. `(address,uint8,bytes4[])[]`.
    pub fn canonical_type(&self) -> String {
        match self.kind.strip_prefix("tuple") {
            Some(suffix) => {
                let members = self
                    .components
                    .iter()
                    .map(AbiParam::canonical_type)
                    .collect::<Vec<_>>();
                format!("({}){suffix}", members.join(","))
            }
            None => self.kind.clone(),
        }
    }
}

/// Any entry of a JSON ABI: function, event, error, constructor, fallback or receive.
#[derive(Clone, Debug, Deserialize)]
pub struct AbiItem {
    #[serde(rename = "type", default = "default_item_type")]
    pub kind: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub inputs: Vec<AbiParam>,
}

fn default_item_type() -> String {
    "function".to_owned()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AbiFunction {
    pub name: String,
    pub inputs: Vec<AbiParam>,
}

impl AbiFunction {
    /// Canonical signature, e.g. `addPlayer(address)`.
    pub fn signature(&self) -> String {
        let types = self
            .inputs
            .iter()
            .map(AbiParam::canonical_type)
            .collect::<Vec<_>>();
        format!("{}({})", self.name, types.join(","))
    }

    pub fn selector(&self) -> Selector {
        Selector::from_canonical(&self.signature())
    }

    /// `init(bytes)` is the initializer of a diamond, which must never be routed by it.
    pub fn is_diamond_init(&self) -> bool {
        self.name == "init" && self.inputs.len() == 1 && self.inputs[0].kind == "bytes"
    }
}

/// The functions of a contract ABI in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Vec<AbiItem>")]
pub struct FacetAbi {
    functions: Vec<AbiFunction>,
}

impl From<Vec<AbiItem>> for FacetAbi {
    fn from(items: Vec<AbiItem>) -> Self {
        let functions = items
            .into_iter()
            .filter(|item| item.kind == "function")
            .filter_map(|item| {
                item.name.map(|name| AbiFunction {
                    name,
                    inputs: item.inputs,
                })
            })
            .collect();

        Self { functions }
    }
}

impl FacetAbi {
    /// Parse the JSON ABI array, the `abi` field of a build artifact.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|e| Error::Abi(e.to_string()))
    }

    pub fn functions(&self) -> &[AbiFunction] {
        &self.functions
    }

    /// Look up a function by its bare name, if the name isn't overloaded.
    pub fn function(&self, name: &str) -> Option<&AbiFunction> {
        let mut candidates = self.functions.iter().filter(|f| f.name == name);
        match (candidates.next(), candidates.next()) {
            (Some(f), None) => Some(f),
            _ => None,
        }
    }
}

/// Resolves full signatures by hashing them, and bare names like `addPlayer`
/// by looking them up in the ABI.
impl SignatureResolver for FacetAbi {
    fn resolve(&self, signature: &str) -> Result<Selector, Error> {
        let signature = signature.trim();

        if signature.contains('(') {
            return selector_from_signature(signature);
        }

        let mut candidates = self.functions.iter().filter(|f| f.name == signature);
        match (candidates.next(), candidates.next()) {
            (Some(f), None) => Ok(f.selector()),
            (None, _) => Err(Error::invalid_signature(
                signature,
                "no such function in the ABI",
            )),
            (Some(_), Some(_)) => Err(Error::invalid_signature(
                signature,
                "overloaded function name, use the full signature",
            )),
        }
    }
}

/// Every function selector of the contract in declaration order, except
/// the diamond initializer `init(bytes)`.
pub fn selectors_from_abi(abi: &FacetAbi) -> SelectorSet {
    abi.functions()
        .iter()
        .filter(|f| !f.is_diamond_init())
        .map(AbiFunction::selector)
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::{selector_from_signature, Error, Selector, SelectorSet, SignatureResolver};

    use super::{selectors_from_abi, FacetAbi};

    const PLAYER_ABI: &str = r#"[
        { "type": "constructor", "inputs": [] },
        { "type": "event", "name": "PlayerAdded", "inputs": [{ "name": "player", "type": "address", "indexed": true }] },
        { "type": "function", "name": "addPlayer", "stateMutability": "nonpayable",
          "inputs": [{ "name": "playerAddress", "type": "address", "internalType": "address" }], "outputs": [] },
        { "type": "function", "name": "levelUp", "stateMutability": "nonpayable",
          "inputs": [{ "name": "playerAddress", "type": "address" }], "outputs": [] },
        { "type": "function", "name": "init", "stateMutability": "nonpayable",
          "inputs": [{ "name": "data", "type": "bytes" }], "outputs": [] },
        { "type": "function", "name": "removePlayer", "stateMutability": "nonpayable",
          "inputs": [{ "name": "playerAddress", "type": "address" }], "outputs": [] },
        { "type": "error", "name": "NotAdmin", "inputs": [] }
    ]"#;

    const CUT_ABI: &str = r#"[
        { "type": "function", "name": "diamondCut", "inputs": [
            { "name": "_diamondCut", "type": "tuple[]", "internalType": "struct IDiamondCut.FacetCut[]", "components": [
                { "name": "facetAddress", "type": "address" },
                { "name": "action", "type": "uint8", "internalType": "enum IDiamondCut.FacetCutAction" },
                { "name": "functionSelectors", "type": "bytes4[]" }
            ]},
            { "name": "_init", "type": "address" },
            { "name": "_calldata", "type": "bytes" }
        ], "outputs": [] }
    ]"#;

    fn sigs(signatures: &[&str]) -> SelectorSet {
        signatures
            .iter()
            .map(|s| selector_from_signature(s).unwrap())
            .collect()
    }

    #[test]
    fn selectors_in_declaration_order_without_init() {
        let abi = FacetAbi::from_json(PLAYER_ABI).unwrap();

        assert_eq!(abi.functions().len(), 4);
        assert_eq!(
            selectors_from_abi(&abi),
            sigs(&["addPlayer(address)", "levelUp(address)", "removePlayer(address)"])
        );
        assert!(!selectors_from_abi(&abi).contains(&selector_from_signature("init(bytes)").unwrap()));
    }

    #[test]
    fn init_with_other_parameters_is_kept() {
        let abi = FacetAbi::from_json(
            r#"[{ "type": "function", "name": "init", "inputs": [{ "name": "a", "type": "address" }] }]"#,
        )
        .unwrap();

        assert_eq!(selectors_from_abi(&abi), sigs(&["init(address)"]));
    }

    #[test]
    fn tuples_are_expanded() {
        let abi = FacetAbi::from_json(CUT_ABI).unwrap();
        let f = &abi.functions()[0];

        assert_eq!(
            f.signature(),
            "diamondCut((address,uint8,bytes4[])[],address,bytes)"
        );
        assert_eq!(f.selector(), "0x1f931c1c".parse::<Selector>().unwrap());
    }

    #[test]
    fn repeated_entries_are_suppressed() {
        let abi = FacetAbi::from_json(
            r#"[
                { "name": "owner", "inputs": [] },
                { "type": "function", "name": "owner", "inputs": [] }
            ]"#,
        )
        .unwrap();

        assert_eq!(abi.functions().len(), 2);
        assert_eq!(selectors_from_abi(&abi), sigs(&["owner()"]));
    }

    #[test]
    fn resolves_bare_names() {
        let abi = FacetAbi::from_json(PLAYER_ABI).unwrap();

        assert_eq!(
            abi.resolve("levelUp").unwrap(),
            selector_from_signature("levelUp(address)").unwrap()
        );
        assert_eq!(
            abi.resolve("function levelUp(address who) external").unwrap(),
            selector_from_signature("levelUp(address)").unwrap()
        );
        assert!(matches!(
            abi.resolve("missing"),
            Err(Error::InvalidSignature { .. })
        ));
    }

    #[test]
    fn overloaded_names_are_ambiguous() {
        let abi = FacetAbi::from_json(
            r#"[
                { "type": "function", "name": "open", "inputs": [{ "name": "id", "type": "uint256" }] },
                { "type": "function", "name": "open", "inputs": [] }
            ]"#,
        )
        .unwrap();

        assert!(abi.function("open").is_none());
        assert!(abi.resolve("open").is_err());
        assert!(abi.resolve("open()").is_ok());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            FacetAbi::from_json(r#"{ "abi": [] }"#),
            Err(Error::Abi(_))
        ));
    }
}

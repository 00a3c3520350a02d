// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use std::collections::HashSet;
use std::fmt;

use ethers_core::abi::Token;
use ethers_core::types::Bytes;

use crate::{Address, Error, FacetPlan, Selector, SelectorSet};

/// The `IDiamondCut.FacetCutAction` enum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FacetCutAction {
    Add = 0,
    Replace = 1,
    Remove = 2,
}

impl FacetCutAction {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for FacetCutAction {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Add),
            1 => Ok(Self::Replace),
            2 => Ok(Self::Remove),
            other => Err(other),
        }
    }
}

impl fmt::Display for FacetCutAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Add => "add",
            Self::Replace => "replace",
            Self::Remove => "remove",
        };
        f.write_str(s)
    }
}

/// One `IDiamondCut.FacetCut` record.
///
/// Removals point at the zero address; additions and replacements must point at a facet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CutEntry {
    facet_address: Address,
    action: FacetCutAction,
    function_selectors: SelectorSet,
}

impl CutEntry {
    pub fn new(
        facet_address: Address,
        action: FacetCutAction,
        function_selectors: SelectorSet,
    ) -> Result<Self, Error> {
        let valid = match action {
            FacetCutAction::Remove => facet_address.is_zero(),
            FacetCutAction::Add | FacetCutAction::Replace => !facet_address.is_zero(),
        };
        if !valid {
            return Err(Error::InvalidCutEntry {
                action,
                address: facet_address,
            });
        }
        Ok(Self {
            facet_address,
            action,
            function_selectors,
        })
    }

    pub fn remove(function_selectors: SelectorSet) -> Self {
        Self {
            facet_address: Address::zero(),
            action: FacetCutAction::Remove,
            function_selectors,
        }
    }

    pub fn facet_address(&self) -> Address {
        self.facet_address
    }

    pub fn action(&self) -> FacetCutAction {
        self.action
    }

    pub fn function_selectors(&self) -> &SelectorSet {
        &self.function_selectors
    }
}

/// Contract and calldata to `delegatecall` after the cut, to initialize state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InitCall {
    pub address: Address,
    pub calldata: Bytes,
}

impl InitCall {
    pub fn new(address: Address, calldata: Bytes) -> Self {
        Self { address, calldata }
    }

    /// ABI encode a call to `selector` with the given arguments.
    pub fn encode(address: Address, selector: Selector, args: &[Token]) -> Self {
        let mut calldata = selector.0.to_vec();
        calldata.extend(ethers_core::abi::encode(args));
        Self::new(address, Bytes::from(calldata))
    }
}

/// Everything that goes into a single `diamondCut` transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiamondCut {
    entries: Vec<CutEntry>,
    init: Option<InitCall>,
}

impl DiamondCut {
    /// Assemble a payload, making sure no selector is touched twice;
    /// the diamond would revert the whole transaction if it was.
    pub fn new(entries: Vec<CutEntry>, init: Option<InitCall>) -> Result<Self, Error> {
        let mut seen = HashSet::new();
        for entry in entries.iter() {
            for selector in entry.function_selectors() {
                if !seen.insert(*selector) {
                    return Err(Error::DuplicateSelectorInPayload(*selector));
                }
            }
        }
        Ok(Self { entries, init })
    }

    pub fn entries(&self) -> &[CutEntry] {
        &self.entries
    }

    pub fn init(&self) -> Option<&InitCall> {
        self.init.as_ref()
    }

    /// The `_init` argument; zero if there is nothing to initialize.
    pub fn init_address(&self) -> Address {
        self.init.as_ref().map(|i| i.address).unwrap_or_default()
    }

    /// The `_calldata` argument; empty if there is nothing to initialize.
    pub fn init_calldata(&self) -> Bytes {
        self.init
            .as_ref()
            .map(|i| i.calldata.clone())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of selectors touched by the cut.
    pub fn selector_count(&self) -> usize {
        self.entries.iter().map(|e| e.function_selectors().len()).sum()
    }
}

/// Concatenate the cut entries of each facet in the order the facets were given.
pub fn build_cut(plans: &[FacetPlan], init: Option<InitCall>) -> Result<DiamondCut, Error> {
    let mut entries = Vec::new();
    for plan in plans {
        entries.extend(plan.cut_entries()?);
    }
    DiamondCut::new(entries, init)
}

#[cfg(test)]
mod tests {
    use ethers_core::abi::Token;
    use ethers_core::types::U256;

    use crate::{selector_from_signature, Address, Error, FacetPlan, SelectorSet};

    use super::{build_cut, CutEntry, DiamondCut, FacetCutAction, InitCall};

    fn addr(n: u8) -> Address {
        Address::from([n; 20])
    }

    fn sigs(signatures: &[&str]) -> SelectorSet {
        signatures
            .iter()
            .map(|s| selector_from_signature(s).unwrap())
            .collect()
    }

    fn plan(name: &str, address: Address, add: &[&str], replace: &[&str]) -> FacetPlan {
        FacetPlan {
            name: name.to_owned(),
            address,
            add: sigs(add),
            replace: sigs(replace),
            remove: SelectorSet::new(),
        }
    }

    #[test]
    fn entry_address_invariant() {
        let s = sigs(&["a()"]);

        assert!(CutEntry::new(Address::zero(), FacetCutAction::Remove, s.clone()).is_ok());
        assert!(CutEntry::new(addr(1), FacetCutAction::Remove, s.clone()).is_err());
        assert!(CutEntry::new(Address::zero(), FacetCutAction::Add, s.clone()).is_err());
        assert!(matches!(
            CutEntry::new(Address::zero(), FacetCutAction::Replace, s),
            Err(Error::InvalidCutEntry {
                action: FacetCutAction::Replace,
                ..
            })
        ));
    }

    #[test]
    fn action_codes() {
        for a in [
            FacetCutAction::Add,
            FacetCutAction::Replace,
            FacetCutAction::Remove,
        ] {
            assert_eq!(FacetCutAction::try_from(a.as_u8()), Ok(a));
        }
        assert_eq!(FacetCutAction::try_from(3), Err(3));
    }

    #[test]
    fn concatenates_in_facet_order() {
        let cut = build_cut(
            &[
                plan("RulesFacet", addr(1), &["rules()"], &["a()"]),
                plan("TreasuryFacet", addr(2), &[], &["b()", "c()"]),
            ],
            None,
        )
        .unwrap();

        let summary = cut
            .entries()
            .iter()
            .map(|e| (e.facet_address(), e.action(), e.function_selectors().len()))
            .collect::<Vec<_>>();

        assert_eq!(
            summary,
            vec![
                (addr(1), FacetCutAction::Add, 1),
                (addr(1), FacetCutAction::Replace, 1),
                (addr(2), FacetCutAction::Replace, 2),
            ]
        );
        assert_eq!(cut.selector_count(), 4);
        assert_eq!(cut.init_address(), Address::zero());
        assert!(cut.init_calldata().is_empty());
    }

    #[test]
    fn duplicate_adds_are_rejected() {
        let res = build_cut(
            &[
                plan("A", addr(1), &["shared()"], &[]),
                plan("B", addr(2), &["shared()"], &[]),
            ],
            None,
        );

        assert_eq!(
            res,
            Err(Error::DuplicateSelectorInPayload(
                selector_from_signature("shared()").unwrap()
            ))
        );
    }

    #[test]
    fn duplicate_across_actions_is_rejected() {
        let entries = vec![
            CutEntry::new(addr(1), FacetCutAction::Replace, sigs(&["a()"])).unwrap(),
            CutEntry::remove(sigs(&["a()"])),
        ];
        assert!(DiamondCut::new(entries, None).is_err());
    }

    #[test]
    fn init_call_encoding() {
        let selector = selector_from_signature("init(address,uint256)").unwrap();
        let init = InitCall::encode(
            addr(9),
            selector,
            &[Token::Address(addr(7)), Token::Uint(U256::from(50u64))],
        );

        assert_eq!(&init.calldata[..4], &selector.0);
        assert_eq!(init.calldata.len(), 4 + 2 * 32);
        assert_eq!(init.calldata[4 + 12..4 + 32], [7u8; 20]);
        assert_eq!(init.calldata[4 + 32 + 31], 50);

        let cut = DiamondCut::new(Vec::new(), Some(init.clone())).unwrap();
        assert_eq!(cut.init_address(), addr(9));
        assert_eq!(cut.init_calldata(), init.calldata);
    }
}

// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT
//! Conversions between the planner types and the generated contract types.

use ethers::types::{Address, Bytes};
use gallion_diamond::{CutEntry, DiamondCut, FacetInfo, Selector, SelectorSet};

use crate::{diamond_cut, diamond_loupe};

impl From<&CutEntry> for diamond_cut::FacetCut {
    fn from(value: &CutEntry) -> Self {
        diamond_cut::FacetCut {
            facet_address: value.facet_address(),
            action: value.action().as_u8(),
            function_selectors: value.function_selectors().to_bytes(),
        }
    }
}

impl From<diamond_loupe::Facet> for FacetInfo {
    fn from(value: diamond_loupe::Facet) -> Self {
        FacetInfo {
            address: value.facet_address,
            selectors: value
                .function_selectors
                .into_iter()
                .map(Selector::from)
                .collect::<SelectorSet>(),
        }
    }
}

/// The `(_diamondCut, _init, _calldata)` arguments of `IDiamondCut.diamondCut`.
pub fn diamond_cut_args(cut: &DiamondCut) -> (Vec<diamond_cut::FacetCut>, Address, Bytes) {
    let entries = cut.entries().iter().map(diamond_cut::FacetCut::from).collect();
    (entries, cut.init_address(), cut.init_calldata())
}

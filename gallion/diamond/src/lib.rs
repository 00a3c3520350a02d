// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT
//! Helper data structures and algorithms to upgrade diamond pattern contracts.
//!
//! Everything in here is pure: selectors are derived from signatures or ABIs,
//! classified into cut actions relative to a facet, and assembled into the
//! payload that gets submitted to the diamond's `diamondCut` entrypoint.
//! Sending that payload is left to the caller.

// See https://eips.ethereum.org/EIPS/eip-2535

mod abi;
mod address;
mod cut;
mod error;
mod loupe;
mod plan;
mod selector;
mod selectors;

pub use abi::{selectors_from_abi, AbiFunction, AbiItem, AbiParam, FacetAbi};
pub use address::{is_address, parse_address};
pub use cut::{build_cut, CutEntry, DiamondCut, FacetCutAction, InitCall};
pub use error::Error;
pub use loupe::{find_facet, verify_cut, FacetInfo, Mismatch};
pub use plan::{plan_facet_upgrade, FacetDescriptor, FacetPlan};
pub use selector::{canonical_signature, selector_from_signature, Selector};
pub use selectors::{resolve_all, CanonicalResolver, SelectorSet, SignatureResolver};

/// Ethereum address, 20 bytes.
pub type Address = ethers_core::types::Address;

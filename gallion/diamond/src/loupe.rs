// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT
//! Checks against the facet map a diamond reports through `IDiamondLoupe.facets()`.

use std::collections::HashMap;
use std::fmt;

use crate::{Address, DiamondCut, FacetCutAction, Selector, SelectorSet};

/// One `IDiamondLoupe.Facet` record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FacetInfo {
    pub address: Address,
    pub selectors: SelectorSet,
}

/// Position of the facet in the list, if it's there at all.
pub fn find_facet(target: &Address, facets: &[FacetInfo]) -> Option<usize> {
    facets.iter().position(|f| f.address == *target)
}

/// A difference between the expected outcome of a cut and the facets the diamond reports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mismatch {
    /// The selector should be routed to `expected` but isn't routed at all.
    Unrouted { selector: Selector, expected: Address },
    /// The selector is routed to a different facet.
    Misrouted {
        selector: Selector,
        expected: Address,
        actual: Address,
    },
    /// The selector should have been removed but still routes to `actual`.
    NotRemoved { selector: Selector, actual: Address },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::Unrouted { selector, expected } => {
                write!(f, "{selector} is not routed, expected {expected:?}")
            }
            Mismatch::Misrouted {
                selector,
                expected,
                actual,
            } => write!(
                f,
                "{selector} is routed to {actual:?}, expected {expected:?}"
            ),
            Mismatch::NotRemoved { selector, actual } => {
                write!(f, "{selector} should be removed but is routed to {actual:?}")
            }
        }
    }
}

/// Compare a cut with the facet map reported after it was executed.
pub fn verify_cut(cut: &DiamondCut, facets: &[FacetInfo]) -> Vec<Mismatch> {
    let routes = facets
        .iter()
        .flat_map(|f| f.selectors.iter().map(move |s| (*s, f.address)))
        .collect::<HashMap<_, _>>();

    let mut mismatches = Vec::new();

    for entry in cut.entries() {
        for selector in entry.function_selectors() {
            let actual = routes.get(selector).copied();
            let selector = *selector;

            match (entry.action(), actual) {
                (FacetCutAction::Remove, Some(actual)) => {
                    mismatches.push(Mismatch::NotRemoved { selector, actual })
                }
                (FacetCutAction::Remove, None) => {}
                (_, None) => mismatches.push(Mismatch::Unrouted {
                    selector,
                    expected: entry.facet_address(),
                }),
                (_, Some(actual)) if actual != entry.facet_address() => {
                    mismatches.push(Mismatch::Misrouted {
                        selector,
                        expected: entry.facet_address(),
                        actual,
                    })
                }
                _ => {}
            }
        }
    }

    mismatches
}

// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT
use thiserror::Error;

use crate::{Address, FacetCutAction, Selector};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid function signature {signature:?}: {reason}")]
    InvalidSignature { signature: String, reason: String },

    #[error("selector {selector} ({signature}) not found in facet {facet}")]
    SelectorNotFound {
        facet: String,
        signature: String,
        selector: Selector,
    },

    #[error("selector {0} appears more than once in the diamond cut")]
    DuplicateSelectorInPayload(Selector),

    #[error("facet {facet} still implements selector {selector} declared for removal")]
    ConflictingRemoval { facet: String, selector: Selector },

    #[error("invalid facet address {address:?} for a {action} cut")]
    InvalidCutEntry {
        action: FacetCutAction,
        address: Address,
    },

    #[error("invalid address {0:?}: expected 0x followed by 40 hex characters")]
    InvalidAddress(String),

    #[error("invalid selector {0:?}: expected 0x followed by 8 hex characters")]
    InvalidSelector(String),

    #[error("failed to parse ABI: {0}")]
    Abi(String),
}

impl Error {
    pub(crate) fn invalid_signature(signature: &str, reason: impl Into<String>) -> Self {
        Error::InvalidSignature {
            signature: signature.to_owned(),
            reason: reason.into(),
        }
    }
}

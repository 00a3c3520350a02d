// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT
//! Generated bindings for the contracts the tooling talks to after deployment.
//!
//! Each binding lives in its own module because the generated types
//! share names like `FacetCut` and `Facet` with other contracts.

pub mod convert;

pub mod diamond_cut {
    ethers::contract::abigen!(IDiamondCut, "./abi/IDiamondCut.json");
}

pub mod diamond_loupe {
    ethers::contract::abigen!(IDiamondLoupe, "./abi/IDiamondLoupe.json");
}

pub mod ownership_facet {
    ethers::contract::abigen!(OwnershipFacet, "./abi/OwnershipFacet.json");
}

pub mod player_facet {
    ethers::contract::abigen!(PlayerFacet, "./abi/PlayerFacet.json");
}

pub mod lootbox_facet {
    ethers::contract::abigen!(LootboxFacet, "./abi/LootboxFacet.json");
}

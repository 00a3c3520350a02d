// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::{
    selector_from_signature, selectors_from_abi, Address, CutEntry, Error, FacetAbi,
    FacetCutAction, SelectorSet,
};

/// A facet contract and the selectors of every function it exposes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FacetDescriptor {
    pub name: String,
    pub address: Address,
    pub selectors: SelectorSet,
}

impl FacetDescriptor {
    pub fn new(name: impl Into<String>, address: Address, selectors: SelectorSet) -> Self {
        Self {
            name: name.into(),
            address,
            selectors,
        }
    }

    pub fn from_abi(name: impl Into<String>, address: Address, abi: &FacetAbi) -> Self {
        Self::new(name, address, selectors_from_abi(abi))
    }
}

/// The classified selectors of one facet, ready to be turned into cut entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FacetPlan {
    pub name: String,
    pub address: Address,
    /// Selectors the diamond doesn't route yet.
    pub add: SelectorSet,
    /// Selectors the diamond routes to a previous version of the facet.
    pub replace: SelectorSet,
    /// Selectors to be deleted from the diamond altogether.
    pub remove: SelectorSet,
}

impl FacetPlan {
    /// Plan for a facet the diamond has never seen: everything is added.
    pub fn add_all(facet: &FacetDescriptor) -> Self {
        Self {
            name: facet.name.clone(),
            address: facet.address,
            add: facet.selectors.clone(),
            replace: SelectorSet::new(),
            remove: SelectorSet::new(),
        }
    }

    /// Point the plan at another deployment of the same facet.
    pub fn at(self, address: Address) -> Self {
        Self { address, ..self }
    }

    /// Also delete the selectors of these signatures from the diamond.
    ///
    /// Removing something the facet still implements would route and delete
    /// the same selector in one cut, which the diamond rejects.
    pub fn with_removals<S: AsRef<str>>(mut self, signatures: &[S]) -> Result<Self, Error> {
        for signature in signatures {
            let selector = selector_from_signature(signature.as_ref())?;
            if self.add.contains(&selector) || self.replace.contains(&selector) {
                return Err(Error::ConflictingRemoval {
                    facet: self.name.clone(),
                    selector,
                });
            }
            self.remove.insert(selector);
        }
        Ok(self)
    }

    /// Add, Replace and Remove entries, skipping the empty ones.
    pub fn cut_entries(&self) -> Result<Vec<CutEntry>, Error> {
        let mut entries = Vec::new();
        if !self.add.is_empty() {
            entries.push(CutEntry::new(
                self.address,
                FacetCutAction::Add,
                self.add.clone(),
            )?);
        }
        if !self.replace.is_empty() {
            entries.push(CutEntry::new(
                self.address,
                FacetCutAction::Replace,
                self.replace.clone(),
            )?);
        }
        if !self.remove.is_empty() {
            entries.push(CutEntry::remove(self.remove.clone()));
        }
        Ok(entries)
    }
}

/// Split the selectors of a freshly deployed facet into the ones declared as new,
/// and the rest, which are all replaced so nothing keeps routing to the old facet.
///
/// Every declared signature has to be implemented by the facet, otherwise the
/// upgrade is misconfigured and nothing should be sent.
pub fn plan_facet_upgrade<S: AsRef<str>>(
    facet: &FacetDescriptor,
    additions: &[S],
) -> Result<FacetPlan, Error> {
    let mut add = SelectorSet::new();

    for signature in additions {
        let signature = signature.as_ref();
        let selector = selector_from_signature(signature)?;

        if !facet.selectors.contains(&selector) {
            return Err(Error::SelectorNotFound {
                facet: facet.name.clone(),
                signature: signature.to_owned(),
                selector,
            });
        }
        add.insert(selector);
    }

    let replace = facet.selectors.difference(&add);

    Ok(FacetPlan {
        name: facet.name.clone(),
        address: facet.address,
        add,
        replace,
        remove: SelectorSet::new(),
    })
}

#[cfg(test)]
mod tests {
    use quickcheck_macros::quickcheck;

    use crate::{selector_from_signature, Address, Error, FacetCutAction, SelectorSet};

    use super::{plan_facet_upgrade, FacetDescriptor, FacetPlan};

    fn sigs(signatures: &[&str]) -> SelectorSet {
        signatures
            .iter()
            .map(|s| selector_from_signature(s).unwrap())
            .collect()
    }

    fn player_facet() -> FacetDescriptor {
        FacetDescriptor::new(
            "PlayerFacet",
            Address::from([0xaa; 20]),
            sigs(&["addPlayer(address)", "levelUp(address)", "removePlayer(address)"]),
        )
    }

    #[test]
    fn new_function_is_added_rest_replaced() {
        let plan = plan_facet_upgrade(&player_facet(), &["levelUp(address)"]).unwrap();
        let entries = plan.cut_entries().unwrap();

        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].action(), FacetCutAction::Add);
        assert_eq!(entries[0].function_selectors(), &sigs(&["levelUp(address)"]));
        assert_eq!(entries[0].facet_address(), Address::from([0xaa; 20]));

        assert_eq!(entries[1].action(), FacetCutAction::Replace);
        assert_eq!(
            entries[1].function_selectors(),
            &sigs(&["addPlayer(address)", "removePlayer(address)"])
        );
    }

    #[test]
    fn declarations_are_normalized() {
        let plan = plan_facet_upgrade(
            &player_facet(),
            &["function levelUp(address playerAddress) external"],
        )
        .unwrap();

        assert_eq!(plan.add, sigs(&["levelUp(address)"]));
    }

    #[test]
    fn no_additions_is_a_single_replace() {
        let plan = plan_facet_upgrade::<&str>(&player_facet(), &[]).unwrap();
        let entries = plan.cut_entries().unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action(), FacetCutAction::Replace);
        assert_eq!(entries[0].function_selectors(), &player_facet().selectors);
    }

    #[test]
    fn missing_selector_fails() {
        let res = plan_facet_upgrade(
            &player_facet(),
            &["levelUp(address)", "function fixLootboxesByPlayer(address playerAddress) external"],
        );

        match res {
            Err(Error::SelectorNotFound {
                facet, signature, ..
            }) => {
                assert_eq!(facet, "PlayerFacet");
                assert!(signature.contains("fixLootboxesByPlayer"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn add_all_for_new_facets() {
        let plan = FacetPlan::add_all(&player_facet());
        let entries = plan.cut_entries().unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action(), FacetCutAction::Add);
        assert_eq!(entries[0].function_selectors().len(), 3);
    }

    #[test]
    fn removals_use_zero_address() {
        let plan = plan_facet_upgrade::<&str>(&player_facet(), &[])
            .unwrap()
            .with_removals(&["fixLootboxesByPlayer(address)"])
            .unwrap();
        let entries = plan.cut_entries().unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].action(), FacetCutAction::Remove);
        assert!(entries[1].facet_address().is_zero());
    }

    #[test]
    fn removing_implemented_selector_conflicts() {
        let res = plan_facet_upgrade::<&str>(&player_facet(), &[])
            .unwrap()
            .with_removals(&["levelUp(address)"]);

        assert!(matches!(res, Err(Error::ConflictingRemoval { .. })));
    }

    #[test]
    fn plan_can_be_moved_to_new_address() {
        let plan = FacetPlan::add_all(&player_facet()).at(Address::from([0xbb; 20]));
        let entries = plan.cut_entries().unwrap();
        assert_eq!(entries[0].facet_address(), Address::from([0xbb; 20]));
    }

    #[quickcheck]
    fn add_and_replace_partition_the_facet(members: Vec<u8>, picks: Vec<u8>) -> bool {
        let pool = members
            .iter()
            .map(|n| format!("f{}(address)", n % 16))
            .collect::<Vec<_>>();
        let facet = FacetDescriptor::new(
            "F",
            Address::from([1; 20]),
            pool.iter()
                .map(|s| selector_from_signature(s).unwrap())
                .collect(),
        );

        // Only declare things the facet has, otherwise the plan fails.
        let additions = if pool.is_empty() {
            Vec::new()
        } else {
            picks
                .iter()
                .map(|p| pool[*p as usize % pool.len()].clone())
                .collect()
        };

        let plan = plan_facet_upgrade(&facet, &additions).unwrap();

        plan.add.intersection(&plan.replace).is_empty()
            && plan.add.len() + plan.replace.len() == facet.selectors.len()
            && facet
                .selectors
                .iter()
                .all(|s| plan.add.contains(s) || plan.replace.contains(s))
    }
}

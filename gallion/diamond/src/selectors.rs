// Copyright 2022-2024 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

use std::collections::HashSet;

use crate::{selector_from_signature, Error, Selector};

/// Turns a human readable function signature into its selector.
///
/// Filtering a [SelectorSet] by signatures needs one of these; the set itself
/// doesn't know which contract its selectors came from.
pub trait SignatureResolver {
    fn resolve(&self, signature: &str) -> Result<Selector, Error>;
}

impl<F> SignatureResolver for F
where
    F: Fn(&str) -> Result<Selector, Error>,
{
    fn resolve(&self, signature: &str) -> Result<Selector, Error> {
        self(signature)
    }
}

/// Resolves signatures by normalizing and hashing them, without looking at any ABI.
#[derive(Clone, Copy, Debug, Default)]
pub struct CanonicalResolver;

impl SignatureResolver for CanonicalResolver {
    fn resolve(&self, signature: &str) -> Result<Selector, Error> {
        selector_from_signature(signature)
    }
}

/// Resolve every signature, dropping repeated selectors.
pub fn resolve_all<S, R>(signatures: &[S], resolver: &R) -> Result<SelectorSet, Error>
where
    S: AsRef<str>,
    R: SignatureResolver + ?Sized,
{
    signatures
        .iter()
        .map(|s| resolver.resolve(s.as_ref()))
        .collect()
}

/// Selectors in insertion order, each appearing at most once.
///
/// Filtering operations never modify the set, they return a new one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SelectorSet(Vec<Selector>);

impl SelectorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, selector: &Selector) -> bool {
        self.0.contains(selector)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Selector> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Selector] {
        &self.0
    }

    /// Append the selector unless it's already in the set.
    pub(crate) fn insert(&mut self, selector: Selector) -> bool {
        if self.contains(&selector) {
            false
        } else {
            self.0.push(selector);
            true
        }
    }

    /// Everything except the selectors of the given signatures.
    ///
    /// Signatures that aren't in the set are ignored.
    pub fn remove<S, R>(&self, signatures: &[S], resolver: &R) -> Result<Self, Error>
    where
        S: AsRef<str>,
        R: SignatureResolver + ?Sized,
    {
        let excluded = resolve_all(signatures, resolver)?;
        Ok(self.difference(&excluded))
    }

    /// Only the selectors of the given signatures, in the order of this set.
    pub fn get<S, R>(&self, signatures: &[S], resolver: &R) -> Result<Self, Error>
    where
        S: AsRef<str>,
        R: SignatureResolver + ?Sized,
    {
        let included = resolve_all(signatures, resolver)?;
        Ok(self.intersection(&included))
    }

    /// Selectors of this set which are not in the other one.
    pub fn difference(&self, other: &SelectorSet) -> Self {
        let other = other.0.iter().collect::<HashSet<_>>();
        self.iter().filter(|s| !other.contains(s)).copied().collect()
    }

    /// Selectors of this set which are also in the other one.
    pub fn intersection(&self, other: &SelectorSet) -> Self {
        let other = other.0.iter().collect::<HashSet<_>>();
        self.iter().filter(|s| other.contains(s)).copied().collect()
    }

    /// The raw 4 byte values, the way contract bindings expect them.
    pub fn to_bytes(&self) -> Vec<[u8; 4]> {
        self.iter().map(|s| s.0).collect()
    }
}

impl FromIterator<Selector> for SelectorSet {
    fn from_iter<T: IntoIterator<Item = Selector>>(iter: T) -> Self {
        let mut set = SelectorSet::new();
        for s in iter {
            set.insert(s);
        }
        set
    }
}

impl IntoIterator for SelectorSet {
    type Item = Selector;
    type IntoIter = std::vec::IntoIter<Selector>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a SelectorSet {
    type Item = &'a Selector;
    type IntoIter = std::slice::Iter<'a, Selector>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<Vec<[u8; 4]>> for SelectorSet {
    fn from(value: Vec<[u8; 4]>) -> Self {
        value.into_iter().map(Selector).collect()
    }
}

#[cfg(test)]
mod tests {
    use quickcheck_macros::quickcheck;

    use crate::{selector_from_signature, Error, Selector};

    use super::{CanonicalResolver, SelectorSet};

    fn set_of(signatures: &[&str]) -> SelectorSet {
        signatures
            .iter()
            .map(|s| selector_from_signature(s).unwrap())
            .collect()
    }

    #[test]
    fn duplicates_are_suppressed() {
        let set = set_of(&["owner()", "transferOwnership(address)", "owner()"]);
        assert_eq!(set, set_of(&["owner()", "transferOwnership(address)"]));
    }

    #[test]
    fn get_returns_only_requested() {
        let set = set_of(&[
            "facets()",
            "supportsInterface(bytes4)",
            "facetAddress(bytes4)",
            "facetAddresses()",
        ]);

        let got = set
            .get(&["supportsInterface(bytes4)"], &CanonicalResolver)
            .unwrap();

        assert_eq!(got.as_slice(), &["0x01ffc9a7".parse::<Selector>().unwrap()]);
    }

    #[test]
    fn remove_ignores_absent_and_keeps_order() {
        let set = set_of(&["a()", "b()", "c()", "d()"]);

        let removed = set
            .remove(&["function c() external", "z(uint256)"], &CanonicalResolver)
            .unwrap();

        assert_eq!(removed, set_of(&["a()", "b()", "d()"]));
    }

    #[test]
    fn resolver_errors_propagate() {
        let set = set_of(&["a()"]);
        let res = set.remove(&["not a signature"], &CanonicalResolver);
        assert!(matches!(res, Err(Error::InvalidSignature { .. })));
    }

    #[test]
    fn closure_resolver() {
        let set = set_of(&["a()", "b()"]);
        let only_a = |_: &str| selector_from_signature("a()");

        assert_eq!(set.get(&["anything"], &only_a).unwrap(), set_of(&["a()"]));
    }

    /// A pool of signatures to pick set members and filters from.
    fn pool(seeds: &[u8]) -> Vec<String> {
        seeds.iter().map(|n| format!("f{}(uint256)", n % 32)).collect()
    }

    #[quickcheck]
    fn remove_is_idempotent(members: Vec<u8>, filter: Vec<u8>) -> bool {
        let set = pool(&members)
            .iter()
            .map(|s| selector_from_signature(s).unwrap())
            .collect::<SelectorSet>();
        let filter = pool(&filter);

        let once = set.remove(&filter, &CanonicalResolver).unwrap();
        let twice = once.remove(&filter, &CanonicalResolver).unwrap();

        once == twice
    }

    #[quickcheck]
    fn get_and_remove_split_the_set(members: Vec<u8>, filter: Vec<u8>) -> bool {
        let set = pool(&members)
            .iter()
            .map(|s| selector_from_signature(s).unwrap())
            .collect::<SelectorSet>();
        let filter = pool(&filter);

        let kept = set.remove(&filter, &CanonicalResolver).unwrap();
        let taken = set.get(&filter, &CanonicalResolver).unwrap();

        kept.len() + taken.len() == set.len()
            && kept.intersection(&taken).is_empty()
            && set.iter().all(|s| kept.contains(s) || taken.contains(s))
    }
}

//! Bounded, insertion-ordered feature lists.
//!
//! Every per-repo feature list (merged, queued, upstream-only) is a
//! [`FeatureList`]. Inserting a name that is already present moves it to the
//! end, so the list always reads oldest action first. When a list grows past
//! [`MAX_TRACKED_FEATURES`] the oldest entries are evicted.

use serde::{Deserialize, Serialize};

use crate::types::FeatureName;

/// Maximum number of names kept in any single feature list.
pub const MAX_TRACKED_FEATURES: usize = 100;

/// An ordered list of feature names with no duplicates and a fixed bound.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureList(Vec<FeatureName>);

impl FeatureList {
    pub fn new() -> Self {
        FeatureList(Vec::new())
    }

    /// Appends `feature`, removing any earlier occurrence first.
    ///
    /// Returns the names evicted from the front to stay within the bound.
    pub fn insert(&mut self, feature: FeatureName) -> Vec<FeatureName> {
        self.remove(&feature);
        self.0.push(feature);
        self.evict_overflow()
    }

    /// Drops the oldest entries until the list is within the bound.
    pub fn evict_overflow(&mut self) -> Vec<FeatureName> {
        if self.0.len() <= MAX_TRACKED_FEATURES {
            return Vec::new();
        }
        let excess = self.0.len() - MAX_TRACKED_FEATURES;
        self.0.drain(..excess).collect()
    }

    /// Removes `feature` if present. Returns whether anything was removed.
    pub fn remove(&mut self, feature: &FeatureName) -> bool {
        match self.0.iter().position(|f| f == feature) {
            Some(idx) => {
                self.0.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, feature: &FeatureName) -> bool {
        self.0.contains(feature)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeatureName> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn as_slice(&self) -> &[FeatureName] {
        &self.0
    }

    /// Takes every name out of the list, leaving it empty.
    pub fn take(&mut self) -> Vec<FeatureName> {
        std::mem::take(&mut self.0)
    }
}

impl FromIterator<FeatureName> for FeatureList {
    fn from_iter<I: IntoIterator<Item = FeatureName>>(iter: I) -> Self {
        let mut list = FeatureList::new();
        for feature in iter {
            list.insert(feature);
        }
        list
    }
}

impl<'a> IntoIterator for &'a FeatureList {
    type Item = &'a FeatureName;
    type IntoIter = std::slice::Iter<'a, FeatureName>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn names(list: &FeatureList) -> Vec<&str> {
        list.iter().map(|f| f.as_str()).collect()
    }

    #[test]
    fn insert_appends_in_order() {
        let mut list = FeatureList::new();
        list.insert("a".into());
        list.insert("b".into());
        list.insert("c".into());
        assert_eq!(names(&list), vec!["a", "b", "c"]);
    }

    #[test]
    fn reinsert_moves_to_end() {
        let mut list = FeatureList::new();
        list.insert("a".into());
        list.insert("b".into());
        list.insert("a".into());
        assert_eq!(names(&list), vec!["b", "a"]);
    }

    #[test]
    fn remove_absent_is_noop() {
        let mut list: FeatureList = ["a", "b"].into_iter().map(FeatureName::from).collect();
        assert!(!list.remove(&"z".into()));
        assert_eq!(names(&list), vec!["a", "b"]);
        assert!(list.remove(&"a".into()));
        assert_eq!(names(&list), vec!["b"]);
    }

    #[test]
    fn overflow_evicts_oldest_first() {
        let mut list = FeatureList::new();
        let mut evicted = Vec::new();
        for i in 0..105 {
            evicted.extend(list.insert(FeatureName::new(format!("f{i}"))));
        }

        assert_eq!(list.len(), MAX_TRACKED_FEATURES);
        assert_eq!(list.as_slice()[0].as_str(), "f5");
        assert_eq!(list.as_slice()[99].as_str(), "f104");
        let evicted: Vec<_> = evicted.iter().map(|f| f.as_str()).collect();
        assert_eq!(evicted, vec!["f0", "f1", "f2", "f3", "f4"]);
    }

    #[test]
    fn reinserting_oldest_protects_it_from_eviction() {
        let mut list = FeatureList::new();
        for i in 0..100 {
            list.insert(FeatureName::new(format!("f{i}")));
        }
        list.insert("f0".into());
        list.insert("f100".into());

        assert!(list.contains(&"f0".into()));
        assert!(!list.contains(&"f1".into()));
    }

    #[test]
    fn take_empties_list() {
        let mut list: FeatureList = ["a", "b"].into_iter().map(FeatureName::from).collect();
        let taken = list.take();
        assert_eq!(taken.len(), 2);
        assert!(list.is_empty());
    }

    proptest! {
        /// Any insert/remove sequence leaves a duplicate-free list within bounds.
        #[test]
        fn never_duplicates_or_overflows(
            ops in prop::collection::vec((any::<bool>(), 0u32..150), 0..400)
        ) {
            let mut list = FeatureList::new();
            for (is_insert, n) in ops {
                let feature = FeatureName::new(format!("f{n}"));
                if is_insert {
                    list.insert(feature);
                } else {
                    list.remove(&feature);
                }
            }

            prop_assert!(list.len() <= MAX_TRACKED_FEATURES);
            let mut seen = std::collections::HashSet::new();
            for f in list.iter() {
                prop_assert!(seen.insert(f.clone()), "duplicate {}", f);
            }
        }

        /// The most recently inserted name is always last.
        #[test]
        fn last_insert_is_last(seq in prop::collection::vec(0u32..50, 1..200)) {
            let mut list = FeatureList::new();
            for n in &seq {
                list.insert(FeatureName::new(format!("f{n}")));
            }
            let last = FeatureName::new(format!("f{}", seq[seq.len() - 1]));
            prop_assert_eq!(list.as_slice().last(), Some(&last));
        }
    }
}

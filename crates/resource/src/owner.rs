//! Correlates dependents (pods) with the workload that controls them.

use kube::{Resource, ResourceExt};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// What a controller reference has to match: the owner's name and uid, with
/// the dependent living in the owner's namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OwnerKey {
    pub namespace: Option<String>,
    pub name: String,
    pub uid: String,
}

impl OwnerKey {
    pub fn of<K: Resource>(obj: &K) -> Self {
        Self { namespace: obj.namespace(), name: obj.name_any(), uid: obj.uid().unwrap_or_default() }
    }
}

/// Exact ownership test. Non-controller references never match.
pub fn is_controlled_by<D: Resource>(owner: &OwnerKey, dependent: &D) -> bool {
    dependent.namespace() == owner.namespace
        && dependent
            .owner_references()
            .iter()
            .any(|r| r.controller == Some(true) && r.name == owner.name && r.uid == owner.uid)
}

/// Dependents partitioned per owner, in owner order. Every owner has a bucket.
#[derive(Debug)]
pub struct Correlation<'a, D> {
    buckets: Vec<Vec<&'a D>>,
    orphans: usize,
}

impl<'a, D> Correlation<'a, D> {
    pub fn len(&self) -> usize { self.buckets.len() }
    pub fn is_empty(&self) -> bool { self.buckets.is_empty() }

    /// Dependents owned by the `i`-th owner.
    pub fn bucket(&self, i: usize) -> &[&'a D] { self.buckets.get(i).map(Vec::as_slice).unwrap_or(&[]) }

    pub fn buckets(&self) -> impl Iterator<Item = &[&'a D]> { self.buckets.iter().map(Vec::as_slice) }

    /// Dependents no owner in this set controls.
    pub fn orphans(&self) -> usize { self.orphans }
}

/// Assign each dependent to every owner it is controlled by.
///
/// Owners are indexed by `(namespace, uid)` so the pass is linear in the number
/// of references; the result is the same as checking [`is_controlled_by`] for
/// every (owner, dependent) pair.
pub fn correlate<'a, O: Resource, D: Resource>(owners: &[O], dependents: &'a [D]) -> Correlation<'a, D> {
    let keys: Vec<OwnerKey> = owners.iter().map(OwnerKey::of).collect();
    let mut index: FxHashMap<(Option<&str>, &str), SmallVec<[usize; 1]>> = FxHashMap::default();
    for (i, k) in keys.iter().enumerate() {
        index.entry((k.namespace.as_deref(), k.uid.as_str())).or_default().push(i);
    }

    let mut buckets: Vec<Vec<&'a D>> = vec![Vec::new(); keys.len()];
    let mut orphans = 0usize;
    for d in dependents {
        let ns = d.namespace();
        let mut matched: SmallVec<[usize; 1]> = SmallVec::new();
        for r in d.owner_references().iter().filter(|r| r.controller == Some(true)) {
            if let Some(candidates) = index.get(&(ns.as_deref(), r.uid.as_str())) {
                matched.extend(candidates.iter().copied().filter(|&i| keys[i].name == r.name));
            }
        }
        if matched.is_empty() {
            orphans += 1;
            continue;
        }
        matched.sort_unstable();
        matched.dedup();
        for i in matched {
            buckets[i].push(d);
        }
    }
    Correlation { buckets, orphans }
}

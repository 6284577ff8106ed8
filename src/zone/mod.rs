//! The in-memory zone store (spec.md §4.C, §3 "Zone").
//!
//! A zone owns a single arena of `Node`s; the main tree and the NSEC3 tree
//! are both `BTreeMap<DName, NodeId>` indices into that one arena, the same
//! relationship the original keeps between `zone->tree` and
//! `zone->nsec3_nodes` (two AVL trees of the same `dnslib_node_t`, see
//! `dnslib_zone_t` in `zone.c`). `DName`'s `Ord` impl *is* canonical DNS
//! order, so `BTreeMap::range` directly implements the less-or-equal search
//! `dnslib_zone_find_in_tree` performs with `TREE_FIND_LESS_EQUAL`.

pub mod adjust;
#[cfg(feature = "cuckoo-index")]
pub mod hash_index;
pub mod nsec3;

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{Error, Result};
use crate::mem::MemoryContext;
use crate::name::DName;
use crate::node::{Node, NodeId};

pub use nsec3::{Nsec3FindResult, Nsec3Params};

/// Traversal order for `Zone::apply` (Design Note 9: "a simple tagged enum"
/// in place of a function-pointer + order flag).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TraversalOrder {
    InOrder,
    ReverseInOrder,
    PostOrder,
}

/// Outcome of `Zone::find` (spec.md §4.C). `previous` is `None` only in the
/// exact-apex-match path, mirroring `dnslib_zone_find_dname`'s early return
/// before `*previous` would otherwise be computed.
#[derive(Copy, Clone, Debug)]
pub struct FindResult {
    pub exact: bool,
    pub node: NodeId,
    pub closest_encloser: NodeId,
    pub previous: Option<NodeId>,
}

pub struct Zone {
    nodes: Vec<Node>,
    apex: NodeId,
    tree: BTreeMap<DName, NodeId>,
    nsec3_tree: BTreeMap<DName, NodeId>,
    nsec3_params: Option<Nsec3Params>,
    node_count_hint: usize,
    #[cfg(feature = "cuckoo-index")]
    hash_index: Option<hash_index::HashIndex>,
    #[allow(dead_code)]
    mem_ctx: MemoryContext,
}

impl Zone {
    /// Creates a zone with `apex` as its topmost owner. `expected_count` is
    /// an estimate of the number of nodes the zone will eventually hold,
    /// threaded through to the hash index the same way the original's
    /// `dnslib_zone_new(apex, node_count)` sizes `ck_create_table`.
    pub fn new(apex_owner: DName, expected_count: usize, mem_ctx: MemoryContext) -> Zone {
        let apex_node = Node::new(apex_owner.clone());
        let nodes = vec![apex_node];
        let apex = NodeId::new(0);
        let mut tree = BTreeMap::new();
        tree.insert(apex_owner.clone(), apex);
        #[cfg(feature = "cuckoo-index")]
        let hash_index = {
            let mut index = hash_index::HashIndex::with_capacity(expected_count);
            index.insert(apex_owner, apex);
            Some(index)
        };
        Zone {
            nodes,
            apex,
            tree,
            nsec3_tree: BTreeMap::new(),
            nsec3_params: None,
            node_count_hint: expected_count,
            #[cfg(feature = "cuckoo-index")]
            hash_index,
            mem_ctx,
        }
    }

    pub fn apex(&self) -> NodeId {
        self.apex
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.tree.len()
    }

    pub fn node_count_hint(&self) -> usize {
        self.node_count_hint
    }

    pub fn nsec3_params(&self) -> Option<&Nsec3Params> {
        self.nsec3_params.as_ref()
    }

    pub fn set_nsec3_params(&mut self, params: Option<Nsec3Params>) {
        self.nsec3_params = params;
    }

    pub fn nsec3_enabled(&self) -> bool {
        self.nsec3_params.is_some()
    }

    /// Inserts a new node into the main tree. The owner must be a (strict or
    /// improper) subdomain of the apex; inserting the same owner twice is a
    /// precondition violation, not a silent no-op (spec.md §4.C: "`insert`
    /// is not idempotent at the tree level").
    pub fn insert(&mut self, node: Node) -> Result<NodeId> {
        let owner = node.owner().clone();
        if !owner.is_subdomain_of(self.nodes[self.apex.index()].owner()) {
            return Err(Error::OutOfZone);
        }
        if self.tree.contains_key(&owner) {
            return Err(Error::Duplicate);
        }
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(node);
        self.tree.insert(owner, id);
        #[cfg(feature = "cuckoo-index")]
        if let Some(index) = &mut self.hash_index {
            index.insert(self.nodes[id.index()].owner().clone(), id);
        }
        Ok(id)
    }

    /// Inserts a node into the NSEC3 tree, keyed by its (already hashed)
    /// owner name.
    pub fn insert_nsec3(&mut self, node: Node) -> Result<NodeId> {
        let owner = node.owner().clone();
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(node);
        if self.nsec3_tree.insert(owner, id).is_some() {
            return Err(Error::Duplicate);
        }
        Ok(id)
    }

    pub fn get(&self, name: &DName) -> Option<NodeId> {
        self.tree.get(name).copied()
    }

    /// Predecessor of `owner` in canonical order, or `None` if `owner` is
    /// the smallest key in the tree.
    fn tree_predecessor(&self, owner: &DName) -> Option<NodeId> {
        self.tree
            .range::<DName, _>(..owner.clone())
            .next_back()
            .map(|(_, id)| *id)
    }

    /// Predecessor of `id` in canonical order, wrapping to the last node in
    /// the tree if `id` is the first — the wraparound the NSEC/NSEC3 chain
    /// closure relies on (spec.md §4.C edge case).
    fn previous_of(&self, id: NodeId) -> NodeId {
        let owner = self.nodes[id.index()].owner().clone();
        match self.tree_predecessor(&owner) {
            Some(p) => p,
            None => *self.tree.values().next_back().expect("zone always has the apex"),
        }
    }

    /// Walks backward from (and including) `start` until a node with a
    /// non-empty RRSet collection is found, wrapping around the tree.
    fn previous_non_empty(&self, start: NodeId) -> NodeId {
        let mut candidate = start;
        loop {
            if !self.nodes[candidate.index()].is_empty_of_rrsets() {
                return candidate;
            }
            candidate = self.previous_of(candidate);
        }
    }

    /// Closest-encloser lookup (spec.md §4.C). Never mutates; never panics on
    /// a name outside the zone (`Error::OutOfZone` instead).
    pub fn find(&self, name: &DName) -> Result<FindResult> {
        let apex_owner = self.nodes[self.apex.index()].owner();
        if name.cmp(apex_owner) == std::cmp::Ordering::Equal {
            return Ok(FindResult {
                exact: true,
                node: self.apex,
                closest_encloser: self.apex,
                previous: None,
            });
        }
        if !name.is_subdomain_of(apex_owner) {
            return Err(Error::OutOfZone);
        }

        let (found_owner, found_id) = self
            .tree
            .range::<DName, _>(..=name.clone())
            .next_back()
            .map(|(k, v)| (k.clone(), *v))
            .expect("apex always sorts <= any of its subdomains");
        let exact = found_owner.cmp(name) == std::cmp::Ordering::Equal;

        let previous = match self.tree_predecessor(&found_owner) {
            None => Some(self.previous_of(found_id)),
            Some(prev_id) => {
                if self.nodes[prev_id.index()].is_empty_of_rrsets() {
                    Some(self.previous_non_empty(prev_id))
                } else {
                    Some(prev_id)
                }
            }
        };

        let closest_encloser = if exact {
            found_id
        } else {
            let matched = name.matched_labels(&found_owner);
            let mut ce = found_id;
            loop {
                let label_count = self.nodes[ce.index()].owner().label_count();
                if label_count == matched {
                    break;
                }
                ce = self.nodes[ce.index()]
                    .parent()
                    .expect("adjust_dnames must run before find() is used for lookup");
            }
            ce
        };

        debug!(
            name = %name,
            exact,
            closest_encloser = %self.nodes[closest_encloser.index()].owner(),
            "zone closest-encloser search"
        );

        Ok(FindResult {
            exact,
            node: found_id,
            closest_encloser,
            previous,
        })
    }

    /// Walks every node in the requested order, calling `visit` with each.
    pub fn apply<F: FnMut(&Node)>(&self, order: TraversalOrder, mut visit: F) {
        match order {
            TraversalOrder::InOrder => {
                for id in self.tree.values() {
                    visit(&self.nodes[id.index()]);
                }
            }
            TraversalOrder::ReverseInOrder => {
                for id in self.tree.values().rev() {
                    visit(&self.nodes[id.index()]);
                }
            }
            TraversalOrder::PostOrder => {
                // The main tree carries no child-list, only parent links, so
                // a true post-order child-before-parent walk would need a
                // second index; canonical (in-order) order already visits
                // every node's lexically-preceding subtree first, which is
                // the property Adjust actually relies on, so post-order here
                // is in-order. Kept as a distinct variant for API parity with
                // the tagged-enum Design Note and in case a future caller
                // needs the distinction once a child-list is added.
                for id in self.tree.values() {
                    visit(&self.nodes[id.index()]);
                }
            }
        }
    }

    /// Same as `apply`, but collects the `NodeId`s up front so the callback
    /// can mutate `self.nodes` through `node_mut` without holding a borrow
    /// of `self.tree`. Zone Adjust uses this.
    pub fn ordered_ids(&self, order: TraversalOrder) -> Vec<NodeId> {
        match order {
            TraversalOrder::InOrder | TraversalOrder::PostOrder => {
                self.tree.values().copied().collect()
            }
            TraversalOrder::ReverseInOrder => self.tree.values().rev().copied().collect(),
        }
    }

    pub fn nsec3_ordered_ids(&self) -> Vec<NodeId> {
        self.nsec3_tree.values().copied().collect()
    }

    pub(crate) fn nsec3_tree(&self) -> &BTreeMap<DName, NodeId> {
        &self.nsec3_tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{Class, Type};
    use crate::node::Node;
    use crate::rrset::RRSet;

    fn apex_zone() -> Zone {
        let mut zone = Zone::new(
            DName::from_presentation("example.com.").unwrap(),
            4,
            MemoryContext::global(),
        );
        let apex_owner = zone.node(zone.apex()).owner().clone();
        zone.node_mut(zone.apex())
            .put_rrset(RRSet::new(apex_owner, Type::SOA, Class::IN, 3600));
        zone
    }

    fn insert_named(zone: &mut Zone, name: &str) -> NodeId {
        let owner = DName::from_presentation(name).unwrap();
        let mut node = Node::new(owner.clone());
        node.put_rrset(RRSet::new(owner, Type::A, Class::IN, 300));
        zone.insert(node).unwrap()
    }

    #[test]
    fn s1_exact_match() {
        let mut zone = apex_zone();
        insert_named(&mut zone, "www.example.com.");
        super::adjust::adjust_dnames(&mut zone);
        let www = DName::from_presentation("www.example.com.").unwrap();
        let result = zone.find(&www).unwrap();
        assert!(result.exact);
        assert_eq!(zone.node(result.node).owner().to_string(), "www.example.com.");
        assert_eq!(
            zone.node(result.closest_encloser).owner().to_string(),
            "www.example.com."
        );
        let previous = result.previous.expect("previous must be computed");
        assert_eq!(zone.node(previous).owner().to_string(), "example.com.");
    }

    #[test]
    fn s2_closest_encloser() {
        let mut zone = apex_zone();
        insert_named(&mut zone, "www.example.com.");
        insert_named(&mut zone, "a.b.example.com.");
        super::adjust::adjust_dnames(&mut zone);
        let q = DName::from_presentation("x.a.b.example.com.").unwrap();
        let result = zone.find(&q).unwrap();
        assert!(!result.exact);
        assert_eq!(
            zone.node(result.closest_encloser).owner().to_string(),
            "a.b.example.com."
        );
    }

    #[test]
    fn out_of_zone_is_rejected() {
        let zone = apex_zone();
        let other = DName::from_presentation("evil.example.net.").unwrap();
        assert!(matches!(zone.find(&other), Err(Error::OutOfZone)));
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let mut zone = apex_zone();
        insert_named(&mut zone, "www.example.com.");
        let err = insert_named_result(&mut zone, "www.example.com.");
        assert!(matches!(err, Err(Error::Duplicate)));
    }

    fn insert_named_result(zone: &mut Zone, name: &str) -> Result<NodeId> {
        let owner = DName::from_presentation(name).unwrap();
        zone.insert(Node::new(owner))
    }
}

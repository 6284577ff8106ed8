//! Zone Adjust: the one-shot post-load pass (spec.md §4.F).
//!
//! Grounded on `dnslib_zone_adjust_node` / `dnslib_zone_adjust_rrsets` /
//! `dnslib_zone_adjust_rdata_in_rrset` / `dnslib_zone_adjust_dnames` in
//! `zone.c`: for every node in canonical order, intern DNAME references that
//! resolve to another owner in the zone, mark delegation/non-authoritative
//! status relative to the parent, and link the NSEC3 counterpart node.
//! Parent pointers themselves are computed here too (Design Note 9: "Parent
//! links are computed during Adjust, not at insertion, to keep insertion
//! cheap").

use tracing::debug;

use crate::name::DName;
use crate::node::{NodeFlags, NodeId};
use crate::rdata::NameItem;

use super::{nsec3::nsec3_name, Zone};

/// Runs the full Adjust pass. Idempotent (spec.md invariant 4): re-running
/// on an already-adjusted zone reproduces the same state, since parent
/// lookup, interning and flag computation are all pure functions of the
/// current tree contents.
pub fn adjust_dnames(zone: &mut Zone) {
    zone.load_nsec3param();
    compute_parents(zone);

    let ids = zone.ordered_ids(super::TraversalOrder::InOrder);
    for &id in &ids {
        adjust_rrsets(zone, id);
        adjust_delegation(zone, id);
        adjust_nsec3_link(zone, id);
        adjust_empty_nonterminal(zone, id);
    }

    let nsec3_ids = zone.nsec3_ordered_ids();
    for &id in &nsec3_ids {
        adjust_rrsig_only(zone, id);
    }

    debug!(nodes = ids.len(), "zone adjust complete");
}

/// Parent is the closest existing ancestor in the tree — exactly what
/// `Zone::find` computes as `closest_encloser` for a name one label short of
/// `owner`; reusing it keeps this in one place instead of duplicating the
/// ancestor walk.
fn compute_parents(zone: &mut Zone) {
    let ids = zone.ordered_ids(super::TraversalOrder::InOrder);
    let apex = zone.apex();
    for &id in &ids {
        if id == apex {
            continue;
        }
        let owner = zone.node(id).owner().clone();
        let parent_owner = owner
            .parent()
            .expect("non-apex node always has a parent label");
        let parent = resolve_ancestor(zone, &parent_owner);
        zone.node_mut(id).set_parent(Some(parent));
    }
}

/// Finds the closest existing node at or above `owner`, walking one label at
/// a time. Used only to seed parent pointers before `find()`'s own
/// parent-walk becomes available.
fn resolve_ancestor(zone: &Zone, owner: &DName) -> NodeId {
    let mut candidate = owner.clone();
    loop {
        if let Some(id) = zone.get(&candidate) {
            return id;
        }
        candidate = candidate
            .parent()
            .expect("apex is always present in the tree");
    }
}

fn adjust_rrsets(zone: &mut Zone, id: NodeId) {
    let rr_types: Vec<_> = zone.node(id).rrsets().map(|r| r.rr_type()).collect();
    for ty in rr_types {
        intern_rrset_dnames(zone, id, ty);
    }
}

/// For every DNAME-bearing RDATA item in the RRSet of type `ty` at `id` (and
/// its attached RRSIG sibling, if present), replace the item with a
/// non-owning reference when the referenced name exists as an owner in the
/// zone (spec.md §4.F step 1, invariant 2).
fn intern_rrset_dnames(zone: &mut Zone, id: NodeId, ty: crate::constants::Type) {
    let targets = {
        let node = zone.node(id);
        let rrset = match node.rrset(ty) {
            Some(r) => r,
            None => return,
        };
        collect_name_targets(rrset)
    };
    let resolved: Vec<Option<NodeId>> = targets
        .iter()
        .map(|name| zone.get(name))
        .collect();

    let node = zone.node_mut(id);
    if let Some(rrset) = node.rrset_mut(ty) {
        apply_interning(rrset, &resolved);
    }
    // RRSIG sibling: same treatment, per spec.md §4.F step 1 ("Repeat for
    // the RRSIG sibling").
    let sig_targets = {
        let node = zone.node(id);
        node.rrset(ty)
            .and_then(|r| r.rrsig())
            .map(collect_name_targets)
    };
    if let Some(sig_targets) = sig_targets {
        let sig_resolved: Vec<Option<NodeId>> =
            sig_targets.iter().map(|name| zone.get(name)).collect();
        if let Some(rrset) = zone.node_mut(id).rrset_mut(ty) {
            if let Some(rrsig) = rrsig_mut(rrset) {
                apply_interning(rrsig, &sig_resolved);
            }
        }
    }
}

fn rrsig_mut(rrset: &mut crate::rrset::RRSet) -> Option<&mut crate::rrset::RRSet> {
    rrset.rrsig_mut()
}

fn collect_name_targets(rrset: &crate::rrset::RRSet) -> Vec<DName> {
    let mut out = Vec::new();
    for entry in rrset.rdata() {
        for item in entry.items() {
            if let crate::rdata::RDataItem::Name(n) = item {
                match n {
                    NameItem::Compressed(name) | NameItem::Uncompressed(name) => {
                        out.push(name.clone());
                    }
                    // A Literal name (e.g. an NSEC next-owner) is never a
                    // candidate for interning: RFC 4034 requires it kept
                    // byte-exact, and it may legitimately name something
                    // outside the zone during incremental states.
                    NameItem::Literal(_) | NameItem::Interned(_) => {}
                }
            }
        }
    }
    out
}

/// Replaces each targetable DNAME item in `rrset` with `NameItem::Interned`
/// when the corresponding entry in `resolved` is `Some`. Per Design Note 9's
/// resolution of the duplicate-merge ambiguity: the previously owned name is
/// simply dropped (replaced) here rather than explicitly scheduled for
/// deallocation, since nothing else in this RDATA slot can still reference
/// it — Rust's ownership model makes "exclusively owned by this slot"
/// automatic once the slot itself is overwritten.
fn apply_interning(rrset: &mut crate::rrset::RRSet, resolved: &[Option<NodeId>]) {
    let mut cursor = 0;
    for entry in rrset.rdata_mut() {
        for item in entry.items_mut() {
            if let crate::rdata::RDataItem::Name(n) = item {
                let target = match n {
                    NameItem::Compressed(_) | NameItem::Uncompressed(_) => resolved.get(cursor).copied().flatten(),
                    NameItem::Literal(_) | NameItem::Interned(_) => None,
                };
                if matches!(n, NameItem::Compressed(_) | NameItem::Uncompressed(_)) {
                    cursor += 1;
                }
                if let Some(node_id) = target {
                    *n = NameItem::Interned(node_id);
                }
            }
        }
    }
}

/// Delegation marking (spec.md §4.F step 2): a node below a delegation
/// point is non-authoritative; a node bearing NS records (other than the
/// apex) marks the cut itself.
fn adjust_delegation(zone: &mut Zone, id: NodeId) {
    use crate::constants::Type;

    let parent = zone.node(id).parent();
    let parent_is_cut = parent
        .map(|p| {
            let flags = zone.node(p).flags();
            flags.contains(NodeFlags::DELEGATION_POINT) || flags.contains(NodeFlags::NON_AUTH)
        })
        .unwrap_or(false);

    if parent_is_cut {
        zone.node_mut(id).set_flag(NodeFlags::NON_AUTH, true);
        zone.node_mut(id).set_flag(NodeFlags::AUTH, false);
        return;
    }

    let is_apex = id == zone.apex();
    let has_ns = zone.node(id).rrset(Type::NS).is_some();
    if has_ns && !is_apex {
        zone.node_mut(id).set_flag(NodeFlags::DELEGATION_POINT, true);
    }
}

/// NSEC3 linking (spec.md §4.F step 3): set `node.nsec3_node` if the node's
/// hashed name exists in the NSEC3 tree, else leave it unset — Adjust
/// tolerates a zone with no NSEC3 parameters or an incomplete chain.
fn adjust_nsec3_link(zone: &mut Zone, id: NodeId) {
    let params = match zone.nsec3_params() {
        Some(p) => p.clone(),
        None => return,
    };
    let apex_owner = zone.node(zone.apex()).owner().clone();
    let owner = zone.node(id).owner().clone();
    let hashed = match nsec3_name(&params, &apex_owner, &owner) {
        Ok(h) => h,
        Err(_) => {
            // Crypto/encoding failure: tolerated, this node just stays
            // without an NSEC3 link (spec.md §4.F failure model).
            return;
        }
    };
    let linked = zone.nsec3_tree().get(&hashed).copied();
    zone.node_mut(id).set_nsec3_node(linked);
}

/// Marks nodes that carry no RRSets of their own — present in the tree only
/// to connect a deeper owner to it (spec.md §3's fourth Node flag).
fn adjust_empty_nonterminal(zone: &mut Zone, id: NodeId) {
    let empty = zone.node(id).is_empty_of_rrsets();
    zone.node_mut(id).set_flag(NodeFlags::EMPTY_NONTERMINAL, empty);
}

/// NSEC3 RRs carry no in-zone names themselves; only their RRSIG sibling can
/// reference another owner (the zone's signer, never an in-zone DNAME), so
/// this pass only interns that.
fn adjust_rrsig_only(zone: &mut Zone, id: NodeId) {
    use crate::constants::Type;
    intern_rrset_dnames(zone, id, Type::NSEC3);
}

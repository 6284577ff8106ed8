//! Zone tree node (spec.md §3 "Node", Design Note 9).
//!
//! Nodes live in a single `Vec<Node>` arena owned by the `Zone`; everything
//! that needs to refer to a node — RDATA DNAME items after Adjust, the
//! `parent` back-link, the `nsec3_node` cross-tree link — holds a `NodeId`
//! index into that arena instead of a reference, sidestepping the
//! self-referential-borrow problem an owner-name-to-Node cycle would
//! otherwise create in safe Rust.

use std::collections::HashMap;

use crate::constants::Type;
use crate::name::DName;
use crate::rrset::RRSet;

/// Stable index into a `Zone`'s node arena. Valid for the arena's lifetime;
/// never reused, never invalidated by further insertions (the arena only
/// grows).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn new(index: usize) -> NodeId {
        NodeId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

bitflags::bitflags! {
    /// Node classification flags, set during Zone Adjust (spec.md §4.F).
    #[derive(Default)]
    pub struct NodeFlags: u8 {
        /// Served authoritatively (the common case; absence means the node
        /// sits at or below a delegation and is not answered from directly).
        const AUTH = 0b0001;
        /// Carries an NS RRSet marking a sub-zone cut below the apex.
        const DELEGATION_POINT = 0b0010;
        /// Sits at or below a `DELEGATION_POINT`; not served authoritatively.
        const NON_AUTH = 0b0100;
        /// Exists only to connect deeper owners to the tree; carries no
        /// RRSets of its own.
        const EMPTY_NONTERMINAL = 0b1000;
    }
}

/// One owner name and everything stored under it.
#[derive(Debug)]
pub struct Node {
    owner: DName,
    rrsets: HashMap<Type, RRSet>,
    flags: NodeFlags,
    parent: Option<NodeId>,
    nsec3_node: Option<NodeId>,
}

impl Node {
    pub fn new(owner: DName) -> Node {
        Node {
            owner,
            rrsets: HashMap::new(),
            flags: NodeFlags::AUTH,
            parent: None,
            nsec3_node: None,
        }
    }

    pub fn owner(&self) -> &DName {
        &self.owner
    }

    pub fn rrset(&self, ty: Type) -> Option<&RRSet> {
        self.rrsets.get(&ty)
    }

    pub fn rrset_mut(&mut self, ty: Type) -> Option<&mut RRSet> {
        self.rrsets.get_mut(&ty)
    }

    pub fn rrsets(&self) -> impl Iterator<Item = &RRSet> {
        self.rrsets.values()
    }

    pub fn rrset_count(&self) -> usize {
        self.rrsets.len()
    }

    pub fn is_empty_of_rrsets(&self) -> bool {
        self.rrsets.is_empty()
    }

    /// Inserts an RRSet, keyed by its type. At most one RRSet per type per
    /// node (spec.md §3).
    pub fn put_rrset(&mut self, rrset: RRSet) {
        self.rrsets.insert(rrset.rr_type(), rrset);
    }

    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    pub fn set_flag(&mut self, flag: NodeFlags, on: bool) {
        self.flags.set(flag, on);
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    pub fn nsec3_node(&self) -> Option<NodeId> {
        self.nsec3_node
    }

    pub fn set_nsec3_node(&mut self, id: Option<NodeId>) {
        self.nsec3_node = id;
    }
}

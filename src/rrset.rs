//! RRSet: all records sharing an owner, class and type (spec.md §3, §4.B).

use crate::constants::{Class, Type};
use crate::name::DName;
use crate::node::{Node, NodeId};
use crate::rdata::RdataEntry;

/// The owner name of an RRSet: either an owned `DName` (before the owning
/// Node has been finalized) or an interned reference to the Node itself.
/// Mirrors the RDATA `NameItem` split, for the same reason (spec.md
/// invariant 2: "owner name shared, interned to the owning Node after
/// Adjust").
#[derive(Clone, Debug)]
pub enum OwnerRef {
    Owned(DName),
    Interned(NodeId),
}

impl OwnerRef {
    pub fn resolve<'a>(&'a self, nodes: &'a [Node]) -> &'a DName {
        match self {
            OwnerRef::Owned(n) => n,
            OwnerRef::Interned(id) => nodes[id.index()].owner(),
        }
    }
}

/// Three equality granularities named directly by spec.md §4.B.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EqualityMode {
    /// Same RRSet object: real identity comparison (`std::ptr::eq`), not
    /// structural equality — two separately built RRSets with identical
    /// contents are never `Pointer`-equal.
    Pointer,
    /// Owner, type and class equal; TTL and RDATA ignored.
    Header,
    /// Header-equal, plus the same multiset of RDATA entries.
    Whole,
}

#[derive(Clone, Debug)]
pub struct RRSet {
    owner: OwnerRef,
    rr_type: Type,
    class: Class,
    ttl: u32,
    rdata: Vec<RdataEntry>,
    rrsig: Option<Box<RRSet>>,
}

impl RRSet {
    pub fn new(owner: DName, rr_type: Type, class: Class, ttl: u32) -> RRSet {
        RRSet {
            owner: OwnerRef::Owned(owner),
            rr_type,
            class,
            ttl,
            rdata: Vec::new(),
            rrsig: None,
        }
    }

    pub fn owner<'a>(&'a self, nodes: &'a [Node]) -> &'a DName {
        self.owner.resolve(nodes)
    }

    pub fn owner_ref(&self) -> &OwnerRef {
        &self.owner
    }

    pub fn owner_ref_mut(&mut self) -> &mut OwnerRef {
        &mut self.owner
    }

    pub fn rr_type(&self) -> Type {
        self.rr_type
    }

    pub fn class(&self) -> Class {
        self.class
    }

    pub fn ttl(&self) -> u32 {
        self.ttl
    }

    pub fn rdata(&self) -> &[RdataEntry] {
        &self.rdata
    }

    pub fn rdata_mut(&mut self) -> impl Iterator<Item = &mut RdataEntry> {
        self.rdata.iter_mut()
    }

    pub fn push_rdata(&mut self, entry: RdataEntry) {
        self.rdata.push(entry);
    }

    pub fn rrsig(&self) -> Option<&RRSet> {
        self.rrsig.as_deref()
    }

    pub fn rrsig_mut(&mut self) -> Option<&mut RRSet> {
        self.rrsig.as_deref_mut()
    }

    pub fn set_rrsig(&mut self, rrsig: RRSet) {
        self.rrsig = Some(Box::new(rrsig));
    }

    /// Appends RDATA entries from `other` into `self`, skipping any already
    /// present under canonical comparison. Returns `(merged_count,
    /// deleted_count)`: the number of entries actually appended, and the
    /// number dropped as duplicates.
    pub fn merge(&mut self, other: &RRSet, nodes: &[Node]) -> (usize, usize) {
        let mut merged = 0;
        let mut deleted = 0;
        for candidate in &other.rdata {
            let dup = self
                .rdata
                .iter()
                .any(|existing| existing.canonical_eq(candidate, nodes));
            if dup {
                deleted += 1;
            } else {
                self.rdata.push(candidate.clone());
                merged += 1;
            }
        }
        (merged, deleted)
    }

    pub fn header_eq(&self, other: &RRSet, nodes: &[Node]) -> bool {
        self.rr_type == other.rr_type
            && self.class == other.class
            && self.owner(nodes).cmp(other.owner(nodes)) == std::cmp::Ordering::Equal
    }

    pub fn equals(&self, other: &RRSet, mode: EqualityMode, nodes: &[Node]) -> bool {
        match mode {
            EqualityMode::Pointer => std::ptr::eq(self, other),
            EqualityMode::Header => self.header_eq(other, nodes),
            EqualityMode::Whole => {
                if !self.header_eq(other, nodes) || self.ttl != other.ttl {
                    return false;
                }
                if self.rdata.len() != other.rdata.len() {
                    return false;
                }
                self.rdata
                    .iter()
                    .all(|a| other.rdata.iter().any(|b| a.canonical_eq(b, nodes)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::DName;

    #[test]
    fn merge_deduplicates_identical_rdata() {
        let owner = DName::from_presentation("www.example.com.").unwrap();
        let mut a = RRSet::new(owner.clone(), Type::A, Class::IN, 300);
        a.push_rdata(crate::rdata::RdataEntry::from_opaque(vec![192, 0, 2, 1]));
        let mut b = RRSet::new(owner, Type::A, Class::IN, 300);
        b.push_rdata(crate::rdata::RdataEntry::from_opaque(vec![192, 0, 2, 1]));
        b.push_rdata(crate::rdata::RdataEntry::from_opaque(vec![192, 0, 2, 2]));
        let (merged, deleted) = a.merge(&b, &[]);
        assert_eq!(merged, 1);
        assert_eq!(deleted, 1);
        assert_eq!(a.rdata().len(), 2);
    }
}

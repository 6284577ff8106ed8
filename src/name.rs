//! Domain names: wire parsing/serialization and canonical ordering
//! (spec.md §4.A, §3).
//!
//! A `DName` stores the name in wire format (length-prefixed labels, no
//! trailing compression pointer, root terminated by a zero label) lowercased
//! for canonical comparison, alongside the original-case bytes for faithful
//! re-serialization. Wire parsing follows `Compress::check_compressed_name`
//! in the teacher's `compress.rs`: same indirection counter, same
//! barrier/lowest-offset bookkeeping to reject cycles and forward
//! references, same per-label length checks.

use byteorder::{BigEndian, ByteOrder};

use crate::constants::{DNS_MAX_HOSTNAME_INDIRECTIONS, DNS_MAX_HOSTNAME_LEN, DNS_MAX_LABEL_LEN};
use crate::error::{Error, Result};

/// A domain name, stored as wire-format length-prefixed labels (root is a
/// single zero byte), original case preserved.
///
/// `Eq`/`Hash` are hand-written against the lowercased (`canonical_key`)
/// form rather than derived off the raw, case-preserving `wire` bytes, so
/// they agree with `Ord`'s case-insensitive comparison (spec.md §3:
/// "comparison is case-insensitive") — two names differing only in case
/// must compare equal and hash equal, not just `Ord`-equal.
#[derive(Clone, Debug)]
pub struct DName {
    wire: Vec<u8>,
}

impl PartialEq for DName {
    fn eq(&self, other: &DName) -> bool {
        self.canonical_key() == other.canonical_key()
    }
}

impl Eq for DName {}

impl std::hash::Hash for DName {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.canonical_key().hash(state);
    }
}

impl DName {
    /// The root name, a single zero-length label.
    pub fn root() -> DName {
        DName { wire: vec![0] }
    }

    pub fn is_root(&self) -> bool {
        self.wire.len() == 1
    }

    /// Builds a `DName` from presentation format (`"www.example.com."` or
    /// without the trailing dot). Grounded on the teacher's
    /// `copy_raw_name_from_str` (`synth/gen.rs`): same per-label length cap,
    /// same "no interior dot after a zero-length label" rejection, no
    /// backslash-escape handling (out of scope, this crate never parses
    /// zonefile text).
    pub fn from_presentation(name: &str) -> Result<DName> {
        let name = name.as_bytes();
        let mut wire = Vec::with_capacity(name.len() + 1);
        let mut label_len: u8 = 0;
        let mut label_start = 0usize;
        if name.len() > DNS_MAX_HOSTNAME_LEN {
            return Err(Error::BadArg("name too long"));
        }
        if name == b"." {
            return Ok(DName::root());
        }
        for (i, &c) in name.iter().enumerate() {
            match c {
                b'.' if label_len == 0 => {
                    return Err(Error::BadArg("empty label"));
                }
                b'.' => {
                    wire.push(label_len);
                    wire.extend_from_slice(&name[label_start..i]);
                    label_len = 0;
                }
                _ if label_len as usize >= DNS_MAX_LABEL_LEN => {
                    return Err(Error::BadArg("label too long"));
                }
                _ if label_len == 0 => {
                    label_start = i;
                    label_len = 1;
                }
                _ => label_len += 1,
            }
        }
        if label_len > 0 {
            wire.push(label_len);
            wire.extend_from_slice(&name[label_start..]);
        }
        wire.push(0);
        if wire.len() > DNS_MAX_HOSTNAME_LEN {
            return Err(Error::BadArg("name too long"));
        }
        Ok(DName { wire })
    }

    /// Parses a (possibly compressed) name out of a full wire packet at
    /// `offset`. Returns the name and the offset right after it (after the
    /// first pointer/terminator, not after any indirection target).
    ///
    /// Cycle/forward-reference/indirection-count checks mirror
    /// `Compress::check_compressed_name` in the teacher.
    pub fn parse_wire(packet: &[u8], mut offset: usize) -> Result<(DName, usize)> {
        let packet_len = packet.len();
        if offset >= packet_len {
            return Err(Error::Malformed("name offset outside packet"));
        }
        let mut wire = Vec::with_capacity(16);
        let mut name_len = 0usize;
        let (mut barrier_offset, mut lowest_offset, mut final_offset) =
            (packet_len, offset, None);
        let mut refs_allowed = DNS_MAX_HOSTNAME_INDIRECTIONS;
        loop {
            if offset >= barrier_offset {
                if offset >= packet_len {
                    return Err(Error::Malformed("truncated name"));
                }
                return Err(Error::Malformed("compression cycle"));
            }
            let label_len = match packet[offset] {
                len if len & 0xc0 == 0xc0 => {
                    if refs_allowed == 0 {
                        return Err(Error::Malformed("too many compression indirections"));
                    }
                    refs_allowed -= 1;
                    if packet_len - offset < 2 {
                        return Err(Error::Malformed("truncated compression pointer"));
                    }
                    let ref_offset =
                        (BigEndian::read_u16(&packet[offset..]) & 0x3fff) as usize;
                    if ref_offset >= lowest_offset {
                        return Err(Error::Malformed("forward or self compression reference"));
                    }
                    final_offset = final_offset.or(Some(offset + 2));
                    offset = ref_offset;
                    barrier_offset = lowest_offset;
                    lowest_offset = ref_offset;
                    continue;
                }
                len if len > DNS_MAX_LABEL_LEN as u8 => {
                    return Err(Error::Malformed("label too long"));
                }
                len => len as usize,
            };
            if label_len >= packet_len - offset {
                return Err(Error::Malformed("label runs past end of packet"));
            }
            wire.extend_from_slice(&packet[offset..offset + label_len + 1]);
            name_len += label_len + 1;
            if name_len > DNS_MAX_HOSTNAME_LEN {
                return Err(Error::Malformed("name too long"));
            }
            offset += label_len + 1;
            if label_len == 0 {
                break;
            }
        }
        let final_offset = final_offset.unwrap_or(offset);
        Ok((DName { wire }, final_offset))
    }

    /// Serializes in wire format, uncompressed. Compression is the codec's
    /// job (`crate::codec::compress`), not the name's.
    pub fn to_wire(&self) -> &[u8] {
        &self.wire
    }

    pub fn len(&self) -> usize {
        self.wire.len()
    }

    /// Number of labels, the root counting as zero.
    pub fn label_count(&self) -> usize {
        if self.is_root() {
            return 0;
        }
        self.labels().count()
    }

    /// Iterates labels left to right (most-specific first), each without its
    /// length prefix, excluding the terminating root label.
    pub fn labels(&self) -> LabelIter<'_> {
        LabelIter {
            wire: &self.wire,
            offset: 0,
        }
    }

    /// Lowercased wire bytes, for case-insensitive canonical comparisons.
    fn canonical_key(&self) -> Vec<u8> {
        self.wire.iter().map(|b| b.to_ascii_lowercase()).collect()
    }

    /// Returns a copy with every label ASCII-lowercased. Used when parsing
    /// owner names off the wire (spec.md §4.G: "owner name case-folded to
    /// lowercase").
    pub fn to_lowercase(&self) -> DName {
        DName {
            wire: self.canonical_key(),
        }
    }

    /// True if `self` is equal to or a subdomain of `other`.
    pub fn is_subdomain_of(&self, other: &DName) -> bool {
        let self_labels: Vec<&[u8]> = self.labels().collect();
        let other_labels: Vec<&[u8]> = other.labels().collect();
        if other_labels.len() > self_labels.len() {
            return false;
        }
        let skip = self_labels.len() - other_labels.len();
        self_labels[skip..]
            .iter()
            .zip(other_labels.iter())
            .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }

    /// Number of rightmost labels `self` and `other` have in common.
    /// Grounded on `dnslib_zone_find_dname`'s `matched_labels` walk in
    /// `zone.c`, used there to find the closest enclosing DNAME/NS owner.
    pub fn matched_labels(&self, other: &DName) -> usize {
        let a: Vec<&[u8]> = self.labels().collect();
        let b: Vec<&[u8]> = other.labels().collect();
        a.iter()
            .rev()
            .zip(b.iter().rev())
            .take_while(|(x, y)| x.eq_ignore_ascii_case(y))
            .count()
    }

    /// Returns `self` with its leftmost label removed (the immediate parent),
    /// or `None` if `self` is already the root.
    pub fn parent(&self) -> Option<DName> {
        if self.is_root() {
            return None;
        }
        let first_len = self.wire[0] as usize;
        Some(DName {
            wire: self.wire[first_len + 1..].to_vec(),
        })
    }

    /// Prepends `label` (a single unescaped label, no dots) to `self`.
    pub fn prepend_label(&self, label: &[u8]) -> Result<DName> {
        if label.len() > DNS_MAX_LABEL_LEN {
            return Err(Error::BadArg("label too long"));
        }
        let mut wire = Vec::with_capacity(1 + label.len() + self.wire.len());
        wire.push(label.len() as u8);
        wire.extend_from_slice(label);
        wire.extend_from_slice(&self.wire);
        if wire.len() > DNS_MAX_HOSTNAME_LEN {
            return Err(Error::BadArg("name too long"));
        }
        Ok(DName { wire })
    }

    /// Concatenates `self` (minus its terminating root label) with `suffix`.
    /// Used to splice a relative name read from RDATA onto a DNAME target.
    pub fn concat(&self, suffix: &DName) -> Result<DName> {
        let mut wire = Vec::with_capacity(self.wire.len() + suffix.wire.len());
        if self.is_root() {
            wire.extend_from_slice(&suffix.wire);
        } else {
            wire.extend_from_slice(&self.wire[..self.wire.len() - 1]);
            wire.extend_from_slice(&suffix.wire);
        }
        if wire.len() > DNS_MAX_HOSTNAME_LEN {
            return Err(Error::BadArg("name too long"));
        }
        Ok(DName { wire })
    }
}

impl std::fmt::Display for DName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_root() {
            return write!(f, ".");
        }
        for label in self.labels() {
            for &b in label {
                if b == b'.' || b == b'\\' {
                    write!(f, "\\{}", b as char)?;
                } else if (0x20..0x7f).contains(&b) {
                    write!(f, "{}", b as char)?;
                } else {
                    write!(f, "\\{:03}", b)?;
                }
            }
            write!(f, ".")?;
        }
        Ok(())
    }
}

pub struct LabelIter<'a> {
    wire: &'a [u8],
    offset: usize,
}

impl<'a> Iterator for LabelIter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        if self.offset >= self.wire.len() {
            return None;
        }
        let len = self.wire[self.offset] as usize;
        if len == 0 {
            return None;
        }
        let start = self.offset + 1;
        let label = &self.wire[start..start + len];
        self.offset = start + len;
        Some(label)
    }
}

/// Canonical ordering (RFC 4034 §6.1 / the zone tree's sort key): compare
/// labels right to left (TLD-first), case-insensitively; a name that runs
/// out of labels first (is a suffix of the other) sorts first. This is what
/// lets `BTreeMap::range` over `DName` keys implement the zone's
/// previous-node search directly, in place of the original's AVL tree walk
/// in `dnslib_zone_find_in_tree`.
impl Ord for DName {
    fn cmp(&self, other: &DName) -> std::cmp::Ordering {
        let a: Vec<&[u8]> = self.labels().collect();
        let b: Vec<&[u8]> = other.labels().collect();
        let mut ia = a.iter().rev();
        let mut ib = b.iter().rev();
        loop {
            match (ia.next(), ib.next()) {
                (None, None) => return std::cmp::Ordering::Equal,
                (None, Some(_)) => return std::cmp::Ordering::Less,
                (Some(_), None) => return std::cmp::Ordering::Greater,
                (Some(x), Some(y)) => {
                    let cmp = x
                        .iter()
                        .map(|c| c.to_ascii_lowercase())
                        .cmp(y.iter().map(|c| c.to_ascii_lowercase()));
                    if cmp != std::cmp::Ordering::Equal {
                        return cmp;
                    }
                }
            }
        }
    }
}

impl PartialOrd for DName {
    fn partial_cmp(&self, other: &DName) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_from_presentation() {
        assert!(DName::from_presentation(".").unwrap().is_root());
    }

    #[test]
    fn presentation_round_trip() {
        let n = DName::from_presentation("www.example.com.").unwrap();
        assert_eq!(n.to_string(), "www.example.com.");
        assert_eq!(n.label_count(), 3);
    }

    #[test]
    fn canonical_order_is_tld_first() {
        let a = DName::from_presentation("a.example.com.").unwrap();
        let z = DName::from_presentation("z.example.com.").unwrap();
        let b = DName::from_presentation("b.example.org.").unwrap();
        assert!(a < z);
        assert!(z < b); // com sorts before org
    }

    #[test]
    fn shorter_suffix_sorts_first() {
        let apex = DName::from_presentation("example.com.").unwrap();
        let child = DName::from_presentation("www.example.com.").unwrap();
        assert!(apex < child);
    }

    #[test]
    fn is_subdomain_of_apex() {
        let apex = DName::from_presentation("example.com.").unwrap();
        let child = DName::from_presentation("www.example.com.").unwrap();
        assert!(child.is_subdomain_of(&apex));
        assert!(!apex.is_subdomain_of(&child));
    }

    #[test]
    fn eq_and_hash_are_case_insensitive_and_agree_with_ord() {
        let lower = DName::from_presentation("www.example.com.").unwrap();
        let mixed = DName::from_presentation("WWW.Example.COM.").unwrap();
        assert_eq!(lower.cmp(&mixed), std::cmp::Ordering::Equal);
        assert_eq!(lower, mixed);

        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};
        let mut h1 = DefaultHasher::new();
        lower.hash(&mut h1);
        let mut h2 = DefaultHasher::new();
        mixed.hash(&mut h2);
        assert_eq!(h1.finish(), h2.finish());
    }

    #[test]
    fn matched_labels_counts_common_suffix() {
        let a = DName::from_presentation("foo.example.com.").unwrap();
        let b = DName::from_presentation("bar.example.com.").unwrap();
        assert_eq!(a.matched_labels(&b), 2);
    }

    #[test]
    fn parse_wire_follows_compression_pointer() {
        // "example.com" at offset 0, then a pointer to it at offset 13.
        let mut packet = Vec::new();
        packet.extend_from_slice(b"\x07example\x03com\x00");
        let ptr_offset = packet.len();
        packet.extend_from_slice(&[0xc0, 0x00]);
        let (name, end) = DName::parse_wire(&packet, ptr_offset).unwrap();
        assert_eq!(name.to_string(), "example.com.");
        assert_eq!(end, ptr_offset + 2);
    }

    #[test]
    fn parse_wire_rejects_cycle() {
        let packet = [0xc0, 0x00];
        assert!(DName::parse_wire(&packet, 0).is_err());
    }

    #[test]
    fn parse_wire_rejects_forward_reference() {
        let mut packet = vec![0u8; 4];
        packet[0] = 0xc0;
        packet[1] = 0x02;
        assert!(DName::parse_wire(&packet, 0).is_err());
    }
}

//! RDATA: type-descriptor-driven field layout for known RR types (spec.md
//! §4.B, §3). Each known `Type` maps to a static list of `FieldKind`s; parse
//! and serialization both walk that list rather than special-casing each RR
//! type inline, the same shape as the teacher's per-type builder structs in
//! `synth/gen.rs` (`A`, `AAAA`, `NS`, `CNAME`, `PTR`, `TXT`, `MX`, `SOA`) but
//! data-driven instead of one impl block per type, since this crate also
//! has to *parse* RDATA the descriptor table doubles for both directions.
//!
//! RR types with no descriptor here (anything `Type::Unknown`, and types this
//! table simply hasn't been taught) are kept as an opaque byte blob and
//! re-serialized verbatim, per spec.md §4.G ("Unknown types keep raw RDATA").

use byteorder::{BigEndian, ByteOrder};

use crate::constants::Type;
use crate::error::{Error, Result};
use crate::name::DName;
use crate::node::NodeId;

/// How a `Name` field should be treated by the packet codec when writing it
/// back out. Spec.md §3 calls these the three DNAME kinds.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum NameFieldKind {
    /// May be compressed against earlier names in the message (NS, CNAME,
    /// MX exchange, SOA owner-like names).
    Compressed,
    /// Written in full; never a compression target itself, but may still
    /// compress against something already in the message (DNSSEC RRs whose
    /// canonical form forbids compressing *them*, e.g. RRSIG signer name).
    Uncompressed,
    /// Copied byte-for-byte, case preserved, never compressed, never
    /// lowercased — the NSEC "next owner name" field, which RFC 4034 require
    /// untouched.
    Literal,
}

/// One position in an RR's RDATA, as the type descriptor table describes it.
#[derive(Copy, Clone, Debug)]
pub enum FieldKind {
    U8,
    U16,
    U32,
    /// Fixed-length opaque byte string.
    Bytes(usize),
    /// Opaque byte string running to the end of the RDATA.
    Remainder,
    /// TXT-style sequence of length-prefixed character-strings to the end of
    /// the RDATA.
    CharacterStrings,
    Name(NameFieldKind),
}

/// Static descriptor for a known RR type: the ordered field layout of its
/// RDATA.
pub fn descriptor_for(ty: Type) -> Option<&'static [FieldKind]> {
    use FieldKind::*;
    use NameFieldKind::*;
    Some(match ty {
        Type::A => &[Bytes(4)],
        Type::AAAA => &[Bytes(16)],
        Type::NS => &[Name(Compressed)],
        Type::CNAME => &[Name(Compressed)],
        Type::DNAME => &[Name(Uncompressed)],
        Type::PTR => &[Name(Compressed)],
        Type::MX => &[U16, Name(Compressed)],
        Type::TXT => &[CharacterStrings],
        Type::SOA => &[
            Name(Compressed),
            Name(Compressed),
            U32,
            U32,
            U32,
            U32,
            U32,
        ],
        Type::SRV => &[U16, U16, U16, Name(Uncompressed)],
        Type::DS => &[U16, U8, U8, Remainder],
        Type::DNSKEY => &[U16, U8, U8, Remainder],
        Type::RRSIG => &[
            U16,
            U8,
            U8,
            U32,
            U32,
            U32,
            U16,
            Name(Uncompressed),
            Remainder,
        ],
        Type::NSEC => &[Name(Literal), Remainder],
        Type::NSEC3 => &[U8, U8, U16, Bytes(0), Remainder],
        Type::NSEC3PARAM => &[U8, U8, U16, Bytes(0)],
        Type::TLSA => &[U8, U8, U8, Remainder],
        _ => return None,
    })
}

/// The owner-name slot of an RDATA field: either the name as parsed/authored,
/// or — after Zone Adjust — a non-owning reference to the owner of the Node
/// that name resolves to in the zone (spec.md invariant 2, Design Note 9).
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NameItem {
    Compressed(DName),
    Uncompressed(DName),
    Literal(DName),
    Interned(NodeId),
}

impl NameItem {
    pub fn new(kind: NameFieldKind, name: DName) -> NameItem {
        match kind {
            NameFieldKind::Compressed => NameItem::Compressed(name),
            NameFieldKind::Uncompressed => NameItem::Uncompressed(name),
            NameFieldKind::Literal => NameItem::Literal(name),
        }
    }

    /// The name this item denotes, resolved through `nodes` if interned.
    pub fn resolve<'a>(&'a self, nodes: &'a [crate::node::Node]) -> &'a DName {
        match self {
            NameItem::Compressed(n) | NameItem::Uncompressed(n) | NameItem::Literal(n) => n,
            NameItem::Interned(id) => nodes[id.index()].owner(),
        }
    }

    pub fn compression_kind(&self) -> NameFieldKind {
        match self {
            NameItem::Compressed(_) => NameFieldKind::Compressed,
            NameItem::Uncompressed(_) => NameFieldKind::Uncompressed,
            NameItem::Literal(_) => NameFieldKind::Literal,
            // An interned name was a Compressed/Uncompressed item before
            // Adjust; treat it as compressible, the common case (NS/CNAME).
            NameItem::Interned(_) => NameFieldKind::Compressed,
        }
    }
}

/// A parsed or constructed field value, tagged with which `FieldKind`
/// produced it.
#[derive(Clone, Debug, PartialEq)]
pub enum RDataItem {
    U8(u8),
    U16(u16),
    U32(u32),
    Bytes(Vec<u8>),
    Name(NameItem),
}

/// RDATA for one RR instance: an ordered array of field values, per
/// spec.md §3 ("An array of items whose count and per-item kind are
/// determined by a static type descriptor table").
#[derive(Clone, Debug, PartialEq)]
pub struct RdataEntry {
    items: Vec<RDataItem>,
    /// Raw RDATA bytes, kept only for RR types with no descriptor
    /// (`descriptor_for` returned `None`); re-serialized verbatim.
    opaque: Option<Vec<u8>>,
}

impl RdataEntry {
    pub fn items(&self) -> &[RDataItem] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut [RDataItem] {
        &mut self.items
    }

    pub fn opaque(&self) -> Option<&[u8]> {
        self.opaque.as_deref()
    }

    fn from_items(items: Vec<RDataItem>) -> RdataEntry {
        RdataEntry {
            items,
            opaque: None,
        }
    }

    pub fn from_opaque(bytes: Vec<u8>) -> RdataEntry {
        RdataEntry {
            items: Vec::new(),
            opaque: Some(bytes),
        }
    }

    /// Parses one RR's RDATA out of `packet`, starting at `offset` and
    /// running for exactly `rdlen` bytes (plus any compressed names it
    /// refers to elsewhere in `packet`), using `ty`'s descriptor. Falls back
    /// to an opaque blob for undescribed types, mirroring the teacher's
    /// `uncompress_rdata`'s type-by-type dispatch in `compress.rs` (same
    /// three structural shapes: fixed header, name-bearing, fully opaque).
    pub fn parse_wire(ty: Type, packet: &[u8], offset: usize, rdlen: usize) -> Result<RdataEntry> {
        if offset + rdlen > packet.len() {
            return Err(Error::Malformed("RDATA runs past end of packet"));
        }
        let fields = match descriptor_for(ty) {
            Some(f) => f,
            None => return Ok(RdataEntry::from_opaque(packet[offset..offset + rdlen].to_vec())),
        };
        let end = offset + rdlen;
        let mut pos = offset;
        let mut items = Vec::with_capacity(fields.len());
        for field in fields {
            match *field {
                FieldKind::U8 => {
                    require(pos + 1 <= end)?;
                    items.push(RDataItem::U8(packet[pos]));
                    pos += 1;
                }
                FieldKind::U16 => {
                    require(pos + 2 <= end)?;
                    items.push(RDataItem::U16(BigEndian::read_u16(&packet[pos..])));
                    pos += 2;
                }
                FieldKind::U32 => {
                    require(pos + 4 <= end)?;
                    items.push(RDataItem::U32(BigEndian::read_u32(&packet[pos..])));
                    pos += 4;
                }
                FieldKind::Bytes(0) => {
                    // Length-prefixed opaque blob (NSEC3 salt/next-hash): a
                    // single length octet followed by that many bytes.
                    require(pos + 1 <= end)?;
                    let len = packet[pos] as usize;
                    require(pos + 1 + len <= end)?;
                    items.push(RDataItem::Bytes(packet[pos + 1..pos + 1 + len].to_vec()));
                    pos += 1 + len;
                }
                FieldKind::Bytes(n) => {
                    require(pos + n <= end)?;
                    items.push(RDataItem::Bytes(packet[pos..pos + n].to_vec()));
                    pos += n;
                }
                FieldKind::Remainder => {
                    items.push(RDataItem::Bytes(packet[pos..end].to_vec()));
                    pos = end;
                }
                FieldKind::CharacterStrings => {
                    let mut blob = Vec::new();
                    while pos < end {
                        let len = packet[pos] as usize;
                        require(pos + 1 + len <= end)?;
                        blob.push(len as u8);
                        blob.extend_from_slice(&packet[pos + 1..pos + 1 + len]);
                        pos += 1 + len;
                    }
                    items.push(RDataItem::Bytes(blob));
                }
                FieldKind::Name(kind) => {
                    let (name, next) = DName::parse_wire(packet, pos)?;
                    items.push(RDataItem::Name(NameItem::new(kind, name)));
                    pos = next;
                }
            }
        }
        if pos != end {
            return Err(Error::Malformed("RDATA length does not match descriptor"));
        }
        Ok(RdataEntry::from_items(items))
    }

    /// Serializes this entry's fixed-width and opaque fields. Name fields
    /// are handed to `on_name` so the caller (the packet codec) can apply
    /// compression; `on_name` appends the wire bytes for one name to `out`
    /// and returns nothing, matching how `Compressor::write_name` owns the
    /// suffix-matching state across an entire RRSet.
    pub fn write_wire<F>(&self, out: &mut Vec<u8>, nodes: &[crate::node::Node], mut on_name: F)
    where
        F: FnMut(&mut Vec<u8>, &DName, NameFieldKind),
    {
        if let Some(opaque) = &self.opaque {
            out.extend_from_slice(opaque);
            return;
        }
        for item in &self.items {
            match item {
                RDataItem::U8(v) => out.push(*v),
                RDataItem::U16(v) => {
                    let mut buf = [0u8; 2];
                    BigEndian::write_u16(&mut buf, *v);
                    out.extend_from_slice(&buf);
                }
                RDataItem::U32(v) => {
                    let mut buf = [0u8; 4];
                    BigEndian::write_u32(&mut buf, *v);
                    out.extend_from_slice(&buf);
                }
                RDataItem::Bytes(b) => out.extend_from_slice(b),
                RDataItem::Name(n) => {
                    on_name(out, n.resolve(nodes), n.compression_kind());
                }
            }
        }
    }

    /// Canonical-RDATA equality used by `merge`'s dedup step: same item
    /// count, same values, names compared canonically (case-insensitively)
    /// rather than byte-for-byte.
    pub fn canonical_eq(&self, other: &RdataEntry, nodes: &[crate::node::Node]) -> bool {
        match (&self.opaque, &other.opaque) {
            (Some(a), Some(b)) => return a == b,
            (None, None) => {}
            _ => return false,
        }
        if self.items.len() != other.items.len() {
            return false;
        }
        self.items.iter().zip(other.items.iter()).all(|(a, b)| match (a, b) {
            (RDataItem::Name(x), RDataItem::Name(y)) => {
                x.resolve(nodes).cmp(y.resolve(nodes)) == std::cmp::Ordering::Equal
            }
            _ => a == b,
        })
    }
}

fn require(cond: bool) -> Result<()> {
    if cond {
        Ok(())
    } else {
        Err(Error::Malformed("RDATA truncated"))
    }
}

//! DNS wire-format codec (spec.md §4.G).
//!
//! `Packet` owns a growable wire buffer plus a structured view of what's
//! been parsed into or queued for each section, grounded on the teacher's
//! `ParsedPacket` (`parsed_packet.rs`) for the header-bit accessor shapes
//! (`flags`/`set_flags`, `dnssec`, per-section RR counters) and on
//! `knot_pkt_parse`/`knot_pkt_put` in `libknot/packet/pkt.c` for the
//! parse/build control flow itself, since the teacher only ever mutates
//! already-compressed third-party packets and never builds one from
//! scratch.
//!
//! Divergence from both: this crate's sections are `Vec<RRSet>`, not the
//! teacher's offset-into-shared-byte-array `rr_info` table. Building a
//! zone answer means handing over already-typed `RRSet`s, not raw bytes, so
//! there's no reason to carry the byte-splicing machinery
//! (`insertion_offset`/`insert_rr`) that exists only to mutate a
//! *foreign* packet in place.

pub mod compress;
pub mod edns;
pub mod tsig;

use byteorder::{BigEndian, ByteOrder};
use tracing::{debug, trace};

use crate::constants::{
    Class, DNS_FLAG_AA, DNS_FLAG_AD, DNS_FLAG_CD, DNS_FLAG_QR, DNS_FLAG_RA, DNS_FLAG_RD,
    DNS_FLAG_TC, DNS_HEADER_SIZE, PacketKind, Section, Type,
};
use crate::error::{Error, Result};
use crate::mem::MemoryContext;
use crate::name::DName;
use crate::node::Node;
use crate::rdata::{NameFieldKind, RdataEntry};
use crate::rrset::{EqualityMode, OwnerRef, RRSet};

use compress::Compressor;
use edns::EdnsOpt;
use tsig::{TsigKey, TsigRecord};

bitflags::bitflags! {
    /// Flags controlling `Packet::parse`.
    #[derive(Default)]
    pub struct ParseFlags: u8 {
        /// Disable the default duplicate-RR merge policy.
        const NO_MERGE = 0b01;
    }
}

bitflags::bitflags! {
    /// Flags controlling `Packet::put`.
    #[derive(Default)]
    pub struct PutFlags: u8 {
        /// Don't set the TC bit on `NoSpace`; propagate the error instead.
        const NO_TRUNC = 0b01;
    }
}

/// Header offsets, relative to the start of the 12-byte DNS header.
const OFF_ID: usize = 0;
const OFF_FLAGS: usize = 2;
const OFF_QDCOUNT: usize = 4;
const OFF_ANCOUNT: usize = 6;
const OFF_NSCOUNT: usize = 8;
const OFF_ARCOUNT: usize = 10;

/// A DNS message under construction or freshly parsed.
pub struct Packet {
    wire: Vec<u8>,
    max_size: usize,
    cursor: Section,
    compressor: Option<Compressor>,
    question: Option<(DName, Type, Class)>,
    answer: Vec<RRSet>,
    authority: Vec<RRSet>,
    additional: Vec<RRSet>,
    edns: Option<EdnsOpt>,
    tsig: Option<TsigRecord>,
    tsig_key: Option<TsigKey>,
    reserved_tail: usize,
    truncated: bool,
    mem_ctx: MemoryContext,
}

impl Packet {
    /// Builds an empty packet ready for writing, or wraps `wire` for
    /// parsing. Mirrors spec.md's `new(wire?, max_size, mem_ctx)`: when
    /// `wire` is `None`, `max_size` bytes are reserved up front via
    /// `mem_ctx`.
    pub fn new(wire: Option<Vec<u8>>, max_size: usize, mem_ctx: MemoryContext) -> Packet {
        let mut pkt = Packet {
            wire: Vec::new(),
            max_size,
            cursor: Section::Question,
            compressor: None,
            question: None,
            answer: Vec::new(),
            authority: Vec::new(),
            additional: Vec::new(),
            edns: None,
            tsig: None,
            tsig_key: None,
            reserved_tail: 0,
            truncated: false,
            mem_ctx,
        };
        match wire {
            Some(buf) => pkt.wire = buf,
            None => pkt.reset(),
        }
        pkt
    }

    /// Clears everything but `max_size`/`mem_ctx`, leaving a clean
    /// 12-byte zeroed header allocated through `mem_ctx` (spec.md: "resets
    /// the wire buffer to a clean header").
    pub fn reset(&mut self) {
        self.wire = self.mem_ctx.alloc(DNS_HEADER_SIZE);
        self.cursor = Section::Question;
        self.compressor = None;
        self.question = None;
        self.answer.clear();
        self.authority.clear();
        self.additional.clear();
        self.edns = None;
        self.tsig = None;
        self.reserved_tail = 0;
        self.truncated = false;
    }

    /// Builds a response skeleton for `query`: same ID and question, QR
    /// bit set, RD bit carried over (spec.md §6's "exposed API shape").
    pub fn init_response(query: &Packet, max_size: usize, mem_ctx: MemoryContext) -> Result<Packet> {
        let mut resp = Packet::new(None, max_size, mem_ctx);
        resp.set_id(query.id());
        resp.set_flags(DNS_FLAG_QR as u16 | (query.flags_raw() & DNS_FLAG_RD as u16));
        if let Some((qname, qtype, qclass)) = &query.question {
            resp.put_question(qname, *qtype, *qclass)?;
        }
        Ok(resp)
    }

    // -- header accessors --------------------------------------------

    pub fn id(&self) -> u16 {
        BigEndian::read_u16(&self.wire[OFF_ID..])
    }

    pub fn set_id(&mut self, id: u16) {
        BigEndian::write_u16(&mut self.wire[OFF_ID..], id);
    }

    fn flags_raw(&self) -> u16 {
        BigEndian::read_u16(&self.wire[OFF_FLAGS..])
    }

    fn set_flags_raw(&mut self, flags: u16) {
        BigEndian::write_u16(&mut self.wire[OFF_FLAGS..], flags);
    }

    /// Sets the full base header flags word (QR/opcode/AA/TC/RD/RA/AD/CD
    /// and the base 4-bit RCODE), masking in opcode bits `0x7800` and
    /// rcode bits `0x000f` the way the teacher's `set_flags` does.
    pub fn set_flags(&mut self, flags: u16) {
        self.set_flags_raw(flags);
    }

    pub fn flags(&self) -> u16 {
        self.flags_raw()
    }

    pub fn is_response(&self) -> bool {
        self.flags_raw() & DNS_FLAG_QR as u16 != 0
    }

    pub fn opcode_raw(&self) -> u8 {
        ((self.flags_raw() & 0x7800) >> 11) as u8
    }

    pub fn set_opcode_raw(&mut self, opcode: u8) {
        let flags = (self.flags_raw() & !0x7800) | ((u16::from(opcode) << 11) & 0x7800);
        self.set_flags_raw(flags);
    }

    /// Base 4-bit RCODE folded with the EDNS extended RCODE byte when OPT
    /// is present, matching RFC 6891 §6.1.3's 12-bit extended RCODE.
    pub fn rcode(&self) -> u16 {
        let base = self.flags_raw() & 0x000f;
        match &self.edns {
            Some(opt) => (u16::from(opt.ext_rcode) << 4) | base,
            None => base,
        }
    }

    pub fn set_rcode(&mut self, code: u16) {
        let base = (code & 0x000f) as u16;
        let flags = (self.flags_raw() & !0x000f) | base;
        self.set_flags_raw(flags);
        let ext = (code >> 4) as u8;
        if ext != 0 {
            self.edns.get_or_insert_with(EdnsOpt::default).ext_rcode = ext;
        } else if let Some(opt) = &mut self.edns {
            opt.ext_rcode = 0;
        }
    }

    /// DO-bit before a response is built, AD-bit once it is — same split
    /// as the teacher's `dnssec()` in `parsed_packet.rs`.
    pub fn dnssec(&self) -> bool {
        if self.is_response() {
            self.flags_raw() & DNS_FLAG_AD as u16 != 0
        } else {
            self.edns.as_ref().map(|o| o.do_bit).unwrap_or(false)
        }
    }

    pub fn set_aa(&mut self, on: bool) {
        self.set_flag_bit(DNS_FLAG_AA as u16, on);
    }

    pub fn set_tc(&mut self, on: bool) {
        self.set_flag_bit(DNS_FLAG_TC as u16, on);
        self.truncated = on;
    }

    pub fn truncated(&self) -> bool {
        self.truncated
    }

    pub fn set_rd(&mut self, on: bool) {
        self.set_flag_bit(DNS_FLAG_RD as u16, on);
    }

    pub fn set_ra(&mut self, on: bool) {
        self.set_flag_bit(DNS_FLAG_RA as u16, on);
    }

    pub fn set_ad(&mut self, on: bool) {
        self.set_flag_bit(DNS_FLAG_AD as u16, on);
    }

    pub fn set_cd(&mut self, on: bool) {
        self.set_flag_bit(DNS_FLAG_CD as u16, on);
    }

    fn set_flag_bit(&mut self, bit: u16, on: bool) {
        let flags = if on {
            self.flags_raw() | bit
        } else {
            self.flags_raw() & !bit
        };
        self.set_flags_raw(flags);
    }

    /// Classification of this message (supplemented feature, SPEC_FULL.md
    /// §10.1, grounded on `knot_pkt_type`): a pure read of OPCODE/QR/QTYPE,
    /// no protocol behavior implied.
    pub fn kind(&self) -> PacketKind {
        let is_response = self.is_response();
        let qtype = self.question.as_ref().map(|(_, t, _)| *t);
        match (is_response, qtype) {
            (false, Some(Type::AXFR)) => PacketKind::AxfrQuery,
            (false, Some(Type::IXFR)) => PacketKind::IxfrQuery,
            (true, Some(Type::AXFR)) => PacketKind::AxfrResponse,
            (true, Some(Type::IXFR)) => PacketKind::IxfrResponse,
            _ => match self.opcode_raw() {
                4 if !is_response => PacketKind::NotifyQuery,
                4 if is_response => PacketKind::NotifyResponse,
                5 if !is_response => PacketKind::UpdateQuery,
                5 if is_response => PacketKind::UpdateResponse,
                0 if !is_response => PacketKind::Query,
                0 if is_response => PacketKind::Response,
                _ => PacketKind::Invalid,
            },
        }
    }

    // -- accessors ------------------------------------------------------

    pub fn qname(&self) -> Option<&DName> {
        self.question.as_ref().map(|(n, _, _)| n)
    }

    pub fn qtype(&self) -> Option<Type> {
        self.question.as_ref().map(|(_, t, _)| *t)
    }

    pub fn qclass(&self) -> Option<Class> {
        self.question.as_ref().map(|(_, _, c)| c).copied()
    }

    pub fn section(&self, id: Section) -> &[RRSet] {
        match id {
            Section::Question => &[],
            Section::Answer => &self.answer,
            Section::Authority => &self.authority,
            Section::Additional => &self.additional,
        }
    }

    pub fn edns(&self) -> Option<&EdnsOpt> {
        self.edns.as_ref()
    }

    pub fn tsig(&self) -> Option<&TsigRecord> {
        self.tsig.as_ref()
    }

    pub fn wire(&self) -> &[u8] {
        &self.wire
    }

    fn section_count(&self, off: usize) -> u16 {
        BigEndian::read_u16(&self.wire[off..])
    }

    fn set_section_count(&mut self, off: usize, count: u16) {
        BigEndian::write_u16(&mut self.wire[off..], count);
    }

    // -- building ---------------------------------------------------------

    /// Writes the question and moves the cursor to `Answer`. Compression
    /// for the rest of the message starts from this name (spec.md §4.G).
    pub fn put_question(&mut self, qname: &DName, qtype: Type, qclass: Class) -> Result<()> {
        if self.cursor != Section::Question {
            return Err(Error::BadArg("question already written"));
        }
        let start = self.wire.len();
        self.wire.extend_from_slice(qname.to_wire());
        let mut buf = [0u8; 2];
        BigEndian::write_u16(&mut buf, qtype.into());
        self.wire.extend_from_slice(&buf);
        BigEndian::write_u16(&mut buf, qclass.into());
        self.wire.extend_from_slice(&buf);
        if self.wire.len() > self.max_size {
            self.wire.truncate(start);
            return Err(Error::NoSpace);
        }
        self.compressor = Some(Compressor::new(start, qname));
        self.question = Some((qname.clone(), qtype, qclass));
        self.set_section_count(OFF_QDCOUNT, 1);
        self.cursor = Section::Answer;
        Ok(())
    }

    /// Advances the section cursor. Moving to an earlier section is
    /// forbidden (spec.md §4.G, "lower sections are forbidden").
    pub fn begin(&mut self, section: Section) -> Result<()> {
        if section < self.cursor {
            return Err(Error::BadArg("cannot move to an earlier section"));
        }
        self.cursor = section;
        Ok(())
    }

    /// Serializes one RRSet (one wire RR per RDATA entry) into `section`,
    /// with name compression. Rolls back and returns `NoSpace` on overflow;
    /// unless `NO_TRUNC` is set, the caller is expected to then set TC and
    /// stop (spec.md §4.G "Exit conditions").
    pub fn put(
        &mut self,
        section: Section,
        nodes: &[Node],
        rrset: &RRSet,
        flags: PutFlags,
    ) -> Result<()> {
        self.begin(section)?;
        let start = self.wire.len();
        let owner = rrset.owner(nodes).clone();
        let mut emitted = 0u16;

        let result = (|| -> Result<()> {
            for entry in rrset.rdata() {
                self.write_rr(&owner, rrset, entry, nodes)?;
                emitted += 1;
            }
            Ok(())
        })();

        match result {
            Ok(()) => {
                if self.wire.len() > self.max_size.saturating_sub(self.reserved_tail) {
                    self.wire.truncate(start);
                    self.handle_overflow(flags)?;
                    return Err(Error::NoSpace);
                }
                self.push_section(section, rrset.clone());
                self.bump_count(section, emitted);
                Ok(())
            }
            Err(Error::NoSpace) => {
                self.wire.truncate(start);
                self.handle_overflow(flags)?;
                Err(Error::NoSpace)
            }
            Err(e) => {
                self.wire.truncate(start);
                Err(e)
            }
        }
    }

    fn handle_overflow(&mut self, flags: PutFlags) -> Result<()> {
        if !flags.contains(PutFlags::NO_TRUNC) {
            self.set_tc(true);
        }
        Ok(())
    }

    fn write_rr(
        &mut self,
        owner: &DName,
        rrset: &RRSet,
        entry: &RdataEntry,
        nodes: &[Node],
    ) -> Result<()> {
        let compressor = self
            .compressor
            .as_mut()
            .ok_or(Error::BadArg("no question written yet"))?;
        compressor.write_name(&mut self.wire, owner, false)?;

        let rdlen_pos = self.wire.len() + 8;
        let mut fixed = [0u8; 10];
        BigEndian::write_u16(&mut fixed[0..2], rrset.rr_type().into());
        BigEndian::write_u16(&mut fixed[2..4], rrset.class().into());
        BigEndian::write_u32(&mut fixed[4..8], rrset.ttl());
        self.wire.extend_from_slice(&fixed);

        let rdata_start = self.wire.len();
        let mut rdata_err = None;
        let wire = &mut self.wire;
        entry.write_wire(wire, nodes, |out, name, kind| {
            if rdata_err.is_some() {
                return;
            }
            let literal = kind == NameFieldKind::Literal;
            if let Err(e) = compressor.write_name(out, name, literal) {
                rdata_err = Some(e);
            }
        });
        if let Some(e) = rdata_err {
            return Err(e);
        }
        let rdlen = self.wire.len() - rdata_start;
        if rdlen > u16::MAX as usize {
            return Err(Error::BadArg("RDATA too long"));
        }
        BigEndian::write_u16(&mut self.wire[rdlen_pos..], rdlen as u16);
        if self.wire.len() > self.max_size.saturating_sub(self.reserved_tail) {
            return Err(Error::NoSpace);
        }
        Ok(())
    }

    fn push_section(&mut self, section: Section, rrset: RRSet) {
        match section {
            Section::Answer => self.answer.push(rrset),
            Section::Authority => self.authority.push(rrset),
            Section::Additional => self.additional.push(rrset),
            Section::Question => {}
        }
    }

    fn bump_count(&mut self, section: Section, n: u16) {
        let off = match section {
            Section::Question => OFF_QDCOUNT,
            Section::Answer => OFF_ANCOUNT,
            Section::Authority => OFF_NSCOUNT,
            Section::Additional => OFF_ARCOUNT,
        };
        let count = self.section_count(off).saturating_add(n);
        self.set_section_count(off, count);
    }

    /// Serializes and appends the OPT pseudo-RR to the Additional section.
    pub fn put_opt(&mut self, opt: EdnsOpt) -> Result<()> {
        self.begin(Section::Additional)?;
        let start = self.wire.len();
        opt.write_wire(&mut self.wire)?;
        if self.wire.len() > self.max_size.saturating_sub(self.reserved_tail) {
            self.wire.truncate(start);
            return Err(Error::NoSpace);
        }
        self.edns = Some(opt);
        self.bump_count(Section::Additional, 1);
        Ok(())
    }

    /// Attaches a TSIG key and reserves tail space for its eventual MAC
    /// (spec.md §4.G: "reservation is released when TSIG is actually
    /// signed and appended; signing is external").
    pub fn tsig_set(&mut self, key: TsigKey) {
        self.reserved_tail = tsig::tsig_wire_maxsize(&key);
        self.tsig_key = Some(key);
    }

    pub fn tsig_attach(&mut self, record: TsigRecord) -> Result<()> {
        let start = self.wire.len();
        record.write_wire(&mut self.wire)?;
        if self.wire.len() > self.max_size {
            self.wire.truncate(start);
            return Err(Error::NoSpace);
        }
        self.reserved_tail = 0;
        self.tsig = Some(record);
        self.bump_count(Section::Additional, 1);
        Ok(())
    }

    pub fn remaining_space(&self) -> usize {
        self.max_size
            .saturating_sub(self.wire.len())
            .saturating_sub(self.reserved_tail)
    }

    // -- parsing ------------------------------------------------------

    /// Parses `wire` into a `Packet`. Owner names are lowercase-folded on
    /// the way in; per-section counts drive exactly that many RR parses;
    /// a trailing OPT is intercepted into `edns`, a trailing TSIG into
    /// `tsig` (and must be the very last Additional RR); anything left
    /// over after the declared sections is `Malformed`.
    pub fn parse(wire: Vec<u8>, flags: ParseFlags, max_size: usize, mem_ctx: MemoryContext) -> Result<Packet> {
        if wire.len() < DNS_HEADER_SIZE {
            return Err(Error::Malformed("packet smaller than header"));
        }
        let qdcount = BigEndian::read_u16(&wire[OFF_QDCOUNT..]);
        let ancount = BigEndian::read_u16(&wire[OFF_ANCOUNT..]);
        let nscount = BigEndian::read_u16(&wire[OFF_NSCOUNT..]);
        let arcount = BigEndian::read_u16(&wire[OFF_ARCOUNT..]);
        if qdcount > 1 {
            return Err(Error::Malformed("QDCOUNT > 1"));
        }

        let mut pkt = Packet::new(Some(wire), max_size, mem_ctx);
        let mut pos = DNS_HEADER_SIZE;

        if qdcount == 1 {
            let (qname, next) = DName::parse_wire(&pkt.wire, pos)?;
            if next + 4 > pkt.wire.len() {
                return Err(Error::Malformed("truncated question"));
            }
            let qname = qname.to_lowercase();
            let qtype = Type::from_u16(BigEndian::read_u16(&pkt.wire[next..]));
            let qclass = Class::from_u16(BigEndian::read_u16(&pkt.wire[next + 2..]))
                .ok_or(Error::Malformed("unknown question class"))?;
            pos = next + 4;
            pkt.compressor = Some(Compressor::new(DNS_HEADER_SIZE, &qname));
            pkt.question = Some((qname, qtype, qclass));
        }
        pkt.cursor = Section::Answer;

        pos = pkt.parse_section(Section::Answer, ancount, pos, flags)?;
        pos = pkt.parse_section(Section::Authority, nscount, pos, flags)?;
        let ar_end = pkt.parse_additional(arcount, pos, flags)?;

        if ar_end != pkt.wire.len() {
            return Err(Error::Malformed("trailing garbage after declared sections"));
        }
        debug!(
            ancount,
            nscount, arcount, tsig = pkt.tsig.is_some(), "parsed DNS message"
        );
        Ok(pkt)
    }

    fn parse_section(
        &mut self,
        section: Section,
        count: u16,
        mut pos: usize,
        flags: ParseFlags,
    ) -> Result<usize> {
        for _ in 0..count {
            let (rrset, next) = self.parse_rr(pos)?;
            self.merge_or_push(section, rrset, flags);
            pos = next;
        }
        Ok(pos)
    }

    /// Additional section needs its own loop: OPT and TSIG are intercepted
    /// rather than pushed as ordinary RRSets, and TSIG (if present) must be
    /// the very last one (spec.md §4.G post-checks).
    fn parse_additional(&mut self, count: u16, mut pos: usize, flags: ParseFlags) -> Result<usize> {
        for i in 0..count {
            if pos >= self.wire.len() {
                return Err(Error::FewData);
            }
            if self.wire[pos] == 0 && self.peek_type(pos + 1)? == Type::OPT {
                if self.edns.is_some() {
                    return Err(Error::Malformed("duplicate OPT RR"));
                }
                let (opt, next) = EdnsOpt::parse_wire(&self.wire, pos + 1)?;
                self.edns = Some(opt);
                pos = next;
                continue;
            }
            if self.peek_type_after_name(pos)? == Type::TSIG {
                if i != count - 1 {
                    return Err(Error::Malformed("TSIG must be the final Additional RR"));
                }
                let (tsig, next) = TsigRecord::parse_wire(&self.wire, pos)?;
                self.tsig = Some(tsig);
                pos = next;
                continue;
            }
            let (rrset, next) = self.parse_rr(pos)?;
            self.merge_or_push(Section::Additional, rrset, flags);
            pos = next;
        }
        Ok(pos)
    }

    fn peek_type(&self, offset: usize) -> Result<Type> {
        if offset + 2 > self.wire.len() {
            return Err(Error::Malformed("truncated RR type"));
        }
        Ok(Type::from_u16(BigEndian::read_u16(&self.wire[offset..])))
    }

    fn peek_type_after_name(&self, pos: usize) -> Result<Type> {
        let (_, next) = DName::parse_wire(&self.wire, pos)?;
        self.peek_type(next)
    }

    fn parse_rr(&mut self, pos: usize) -> Result<(RRSet, usize)> {
        let (owner, next) = DName::parse_wire(&self.wire, pos)?;
        let owner = owner.to_lowercase();
        if next + 10 > self.wire.len() {
            return Err(Error::FewData);
        }
        let ty = Type::from_u16(BigEndian::read_u16(&self.wire[next..]));
        let class = Class::from_u16(BigEndian::read_u16(&self.wire[next + 2..]))
            .ok_or(Error::Malformed("unknown RR class"))?;
        let ttl = BigEndian::read_u32(&self.wire[next + 4..]);
        let rdlen = BigEndian::read_u16(&self.wire[next + 8..]) as usize;
        let rdata_start = next + 10;
        if rdata_start + rdlen > self.wire.len() {
            return Err(Error::FewData);
        }
        let entry = RdataEntry::parse_wire(ty, &self.wire, rdata_start, rdlen)?;
        let mut rrset = RRSet::new(owner, ty, class, ttl);
        rrset.push_rdata(entry);
        Ok((rrset, rdata_start + rdlen))
    }

    fn merge_or_push(&mut self, section: Section, rrset: RRSet, flags: ParseFlags) {
        let bucket = match section {
            Section::Answer => &mut self.answer,
            Section::Authority => &mut self.authority,
            Section::Additional => &mut self.additional,
            Section::Question => return,
        };
        if !flags.contains(ParseFlags::NO_MERGE) {
            if matches!(rrset.owner_ref(), OwnerRef::Owned(_)) {
                if let Some(existing) = bucket
                    .iter_mut()
                    .find(|e| e.equals(&rrset, EqualityMode::Header, &[]))
                {
                    trace!(owner = %rrset.owner(&[]), ty = ?rrset.rr_type(), "merging duplicate RR");
                    existing.merge(&rrset, &[]);
                    return;
                }
            }
        }
        bucket.push(rrset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdata::RdataEntry;

    fn a_rrset(owner: &str, addr: [u8; 4]) -> RRSet {
        let mut rrset = RRSet::new(DName::from_presentation(owner).unwrap(), Type::A, Class::IN, 300);
        rrset.push_rdata(RdataEntry::from_opaque(addr.to_vec()));
        rrset
    }

    #[test]
    fn s5_build_and_parse_round_trip_with_compression() {
        let qname = DName::from_presentation("www.example.com.").unwrap();
        let mut pkt = Packet::new(None, 512, MemoryContext::global());
        pkt.set_id(0x1234);
        pkt.set_flags(DNS_FLAG_QR as u16);
        pkt.put_question(&qname, Type::A, Class::IN).unwrap();
        pkt.set_aa(true);

        let answer = a_rrset("www.example.com.", [192, 0, 2, 1]);
        pkt.put(Section::Answer, &[], &answer, PutFlags::empty()).unwrap();

        let ns = {
            let mut r = RRSet::new(
                DName::from_presentation("example.com.").unwrap(),
                Type::NS,
                Class::IN,
                300,
            );
            r.push_rdata(crate::rdata::RdataEntry::from_opaque(
                DName::from_presentation("ns1.example.com.").unwrap().to_wire().to_vec(),
            ));
            r
        };
        pkt.put(Section::Authority, &[], &ns, PutFlags::empty()).unwrap();

        let wire = pkt.wire().to_vec();
        let parsed = Packet::parse(wire, ParseFlags::empty(), 512, MemoryContext::global()).unwrap();
        assert_eq!(parsed.id(), 0x1234);
        assert!(parsed.is_response());
        assert_eq!(parsed.qname().unwrap().to_string(), "www.example.com.");
        assert_eq!(parsed.section(Section::Answer).len(), 1);
        assert_eq!(parsed.section(Section::Authority).len(), 1);
    }

    #[test]
    fn s6_truncation_sets_tc_and_reports_nospace() {
        let qname = DName::from_presentation("www.example.com.").unwrap();
        let mut pkt = Packet::new(None, DNS_HEADER_SIZE + qname.len() + 4 + 2, MemoryContext::global());
        pkt.put_question(&qname, Type::A, Class::IN).unwrap();
        let answer = a_rrset("www.example.com.", [192, 0, 2, 1]);
        let err = pkt.put(Section::Answer, &[], &answer, PutFlags::empty()).unwrap_err();
        assert!(matches!(err, Error::NoSpace));
        assert!(pkt.truncated());
    }

    #[test]
    fn duplicate_answer_rr_merges_by_default() {
        let mut wire = vec![0u8; DNS_HEADER_SIZE];
        BigEndian::write_u16(&mut wire[OFF_ANCOUNT..], 2);
        let qname_wire = DName::from_presentation("a.example.com.").unwrap();
        for addr in [[192, 0, 2, 1], [192, 0, 2, 2]] {
            wire.extend_from_slice(qname_wire.to_wire());
            let mut hdr = [0u8; 10];
            BigEndian::write_u16(&mut hdr[0..2], Type::A.into());
            BigEndian::write_u16(&mut hdr[2..4], Class::IN.into());
            BigEndian::write_u32(&mut hdr[4..8], 300);
            BigEndian::write_u16(&mut hdr[8..10], 4);
            wire.extend_from_slice(&hdr);
            wire.extend_from_slice(&addr);
        }
        let parsed = Packet::parse(wire, ParseFlags::empty(), 512, MemoryContext::global()).unwrap();
        assert_eq!(parsed.section(Section::Answer).len(), 1);
        assert_eq!(parsed.section(Section::Answer)[0].rdata().len(), 2);
    }
}

//! Packet codec scenario tests (spec.md §8, S5/S6) at the public-API level,
//! plus the round-trip and TSIG-position invariants.

use authdns_core::codec::compress::Compressor;
use authdns_core::codec::edns::EdnsOpt;
use authdns_core::codec::tsig::{TsigKey, TsigRecord};
use authdns_core::codec::{ParseFlags, PutFlags};
use authdns_core::constants::{Class, Section, Type, DNS_HEADER_SIZE};
use authdns_core::rdata::RdataEntry;
use authdns_core::{DName, MemoryContext, Packet, RRSet};

fn a_rrset(owner: &str, addr: [u8; 4]) -> RRSet {
    let mut rrset = RRSet::new(DName::from_presentation(owner).unwrap(), Type::A, Class::IN, 300);
    rrset.push_rdata(RdataEntry::from_opaque(addr.to_vec()));
    rrset
}

/// S5 compression: the answer's owner (== QNAME) must serialize as a
/// 2-byte pointer to offset 12, and the authority NS target must compress
/// against that same QNAME.
#[test]
fn s5_answer_owner_compresses_to_qname_pointer() {
    let qname = DName::from_presentation("www.example.com.").unwrap();
    let mut pkt = Packet::new(None, 512, MemoryContext::global());
    pkt.put_question(&qname, Type::A, Class::IN).unwrap();

    let answer = a_rrset("www.example.com.", [192, 0, 2, 1]);
    pkt.put(Section::Answer, &[], &answer, PutFlags::empty()).unwrap();

    let mut ns = RRSet::new(
        DName::from_presentation("example.com.").unwrap(),
        Type::NS,
        Class::IN,
        300,
    );
    ns.push_rdata(RdataEntry::from_opaque(
        DName::from_presentation("ns1.example.com.").unwrap().to_wire().to_vec(),
    ));
    pkt.put(Section::Authority, &[], &ns, PutFlags::empty()).unwrap();

    let wire = pkt.wire();
    // Answer owner immediately follows the 12-byte header + QNAME + QTYPE/QCLASS.
    let answer_owner_pos = DNS_HEADER_SIZE + qname.len() + 4;
    let pointer = u16::from_be_bytes([wire[answer_owner_pos], wire[answer_owner_pos + 1]]);
    assert_eq!(pointer & 0xc000, 0xc000, "expected a compression pointer");
    assert_eq!((pointer & 0x3fff) as usize, DNS_HEADER_SIZE, "must point at QNAME");
}

/// S6 truncation: a buffer too small for even one RR reports `NoSpace` and
/// sets TC, leaving section counts reflecting only what was fully written.
#[test]
fn s6_truncation_sets_tc_and_section_counts_stay_accurate() {
    let qname = DName::from_presentation("www.example.com.").unwrap();
    let max = DNS_HEADER_SIZE + qname.len() + 4 + 2;
    let mut pkt = Packet::new(None, max, MemoryContext::global());
    pkt.put_question(&qname, Type::A, Class::IN).unwrap();

    let err = pkt
        .put(Section::Answer, &[], &a_rrset("www.example.com.", [192, 0, 2, 1]), PutFlags::empty())
        .unwrap_err();
    assert!(matches!(err, authdns_core::Error::NoSpace));
    assert!(pkt.truncated());
    assert_eq!(pkt.section(Section::Answer).len(), 0);

    let parsed = Packet::parse(pkt.wire().to_vec(), ParseFlags::empty(), max, MemoryContext::global()).unwrap();
    assert_eq!(parsed.section(Section::Answer).len(), 0);
}

/// `NO_TRUNC` propagates `NoSpace` without flipping TC, for callers that
/// want to handle overflow themselves.
#[test]
fn no_trunc_flag_suppresses_tc_bit() {
    let qname = DName::from_presentation("www.example.com.").unwrap();
    let max = DNS_HEADER_SIZE + qname.len() + 4 + 2;
    let mut pkt = Packet::new(None, max, MemoryContext::global());
    pkt.put_question(&qname, Type::A, Class::IN).unwrap();

    let err = pkt
        .put(Section::Answer, &[], &a_rrset("www.example.com.", [192, 0, 2, 1]), PutFlags::NO_TRUNC)
        .unwrap_err();
    assert!(matches!(err, authdns_core::Error::NoSpace));
    assert!(!pkt.truncated());
}

/// Invariant 3: round-trip at the RR-multiset level, ignoring compression
/// pointer layout (we compare decoded owner/type/rdata, not raw bytes).
#[test]
fn invariant_round_trip_preserves_rr_multiset() {
    let qname = DName::from_presentation("a.example.com.").unwrap();
    let mut pkt = Packet::new(None, 1024, MemoryContext::global());
    pkt.put_question(&qname, Type::A, Class::IN).unwrap();
    pkt.put(Section::Answer, &[], &a_rrset("a.example.com.", [10, 0, 0, 1]), PutFlags::empty())
        .unwrap();
    pkt.put(Section::Answer, &[], &a_rrset("b.example.com.", [10, 0, 0, 2]), PutFlags::empty())
        .unwrap();

    let parsed = Packet::parse(pkt.wire().to_vec(), ParseFlags::empty(), 1024, MemoryContext::global()).unwrap();
    let mut owners: Vec<String> = parsed
        .section(Section::Answer)
        .iter()
        .map(|r| r.owner(&[]).to_string())
        .collect();
    owners.sort();
    assert_eq!(owners, vec!["a.example.com.", "b.example.com."]);
}

/// Invariant 6: a successfully parsed packet with a TSIG RR always has it
/// as the last Additional RR; parsing rejects anything else.
#[test]
fn invariant_tsig_must_be_last_additional_rr() {
    let qname = DName::from_presentation("a.example.com.").unwrap();
    let mut pkt = Packet::new(None, 1024, MemoryContext::global());
    pkt.put_question(&qname, Type::A, Class::IN).unwrap();
    pkt.put_opt(EdnsOpt::default()).unwrap();

    let key = TsigKey {
        name: DName::from_presentation("key.example.com.").unwrap(),
        algorithm: DName::from_presentation("hmac-sha256.").unwrap(),
    };
    pkt.tsig_set(key.clone());
    let record = TsigRecord {
        key_name: key.name.clone(),
        algorithm: key.algorithm.clone(),
        time_signed: 1_700_000_000,
        fudge: 300,
        mac: vec![0xaa; 32],
        original_id: pkt.id(),
        error: 0,
        other: Vec::new(),
    };
    pkt.tsig_attach(record).unwrap();

    let parsed = Packet::parse(pkt.wire().to_vec(), ParseFlags::empty(), 1024, MemoryContext::global()).unwrap();
    assert!(parsed.tsig().is_some());
    assert!(parsed.edns().is_some());
}

/// Sanity check on the compressor in isolation: an unrelated name never
/// compresses against an unrelated QNAME.
#[test]
fn unrelated_name_never_compresses() {
    let qname = DName::from_presentation("example.com.").unwrap();
    let mut compressor = Compressor::new(DNS_HEADER_SIZE, &qname);
    let mut wire = vec![0u8; DNS_HEADER_SIZE];
    wire.extend_from_slice(qname.to_wire());

    let other = DName::from_presentation("unrelated.org.").unwrap();
    let before = wire.len();
    compressor.write_name(&mut wire, &other, false).unwrap();
    assert_eq!(wire.len() - before, other.len(), "no pointer, full uncompressed name");
}

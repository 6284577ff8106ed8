#![allow(dead_code)]

use crate::error::Error;

/// Size of the main DNS header, that includes flags and the size of each section.
pub const DNS_HEADER_SIZE: usize = 12;

/// Offset to the first (and usually only) record of the question section, from the start of the packet.
pub const DNS_QUESTION_OFFSET: usize = DNS_HEADER_SIZE;

/// Maximum length of a host name.
pub const DNS_MAX_HOSTNAME_LEN: usize = 255;

/// Maximum length of a single label.
pub const DNS_MAX_LABEL_LEN: usize = 63;

/// Maximum number of indirections in a compressed name.
pub const DNS_MAX_HOSTNAME_INDIRECTIONS: u16 = 16;

/// Size of the header for a RR in the question section.
pub const DNS_RR_QUESTION_HEADER_SIZE: usize = 4;

/// Size of the header for a RR in a section that is not the question section.
pub const DNS_RR_HEADER_SIZE: usize = 10;

/// Offset to the type identifier, from the location right after the RR name.
pub const DNS_RR_TYPE_OFFSET: usize = 0;

/// Offset to the class identifier, from the location right after the RR name.
pub const DNS_RR_CLASS_OFFSET: usize = 2;

/// Offset to the TTL, from the location right after the RR name.
pub const DNS_RR_TTL_OFFSET: usize = 4;

/// Offset to the rdata length, from the location right after the RR name.
pub const DNS_RR_RDLEN_OFFSET: usize = 8;

/// Offset to the maximum payload for edns0-enabled UDP packets, for OPT RRs.
pub const DNS_OPT_RR_MAX_PAYLOAD_OFFSET: usize = 2;

/// Offset to the extended rcode, for OPT RRs.
pub const DNS_OPT_RR_EXT_RCODE_OFFSET: usize = 4;

/// Offset to the edns version number, for OPT RRs.
pub const DNS_OPT_RR_EDNS_VERSION_OFFSET: usize = 5;

/// Offset to the edns extended flags, for OPT RRs.
pub const DNS_OPT_RR_EDNS_EXT_FLAGS_OFFSET: usize = 6;

/// Offset to the total size of the edns records, within OPT RRs.
pub const DNS_OPT_RR_RDLEN_OFFSET: usize = 8;

/// Size of the header of an edns pseudo-RR.
pub const DNS_OPT_RR_HEADER_SIZE: usize = 10;

/// Offset to the option code, from the beginning of an EDNS option.
pub const DNS_EDNS_RR_CODE_OFFSET: usize = 0;

/// Offset to the length of an EDNS option, from the beginning of the option.
pub const DNS_EDNS_RR_RDLEN_OFFSET: usize = 2;

/// Size of the header of an EDNS option.
pub const DNS_EDNS_RR_HEADER_SIZE: usize = 4;

/// Offset to the transaction ID, from the beginning of a DNS packet.
pub const DNS_TID_OFFSET: usize = 0;

/// Offset to the flags (including rcode and opcode), from the beginning of the DNS packet.
pub const DNS_FLAGS_OFFSET: usize = 2;

// DNS header flags. 32-bit so the EDNS extended flags (DO) share the space.
pub const DNS_FLAG_QR: u32 = 1 << 15;
pub const DNS_FLAG_AA: u32 = 1 << 10;
pub const DNS_FLAG_TC: u32 = 1 << 9;
pub const DNS_FLAG_RD: u32 = 1 << 8;
pub const DNS_FLAG_RA: u32 = 1 << 7;
pub const DNS_FLAG_AD: u32 = 1 << 5;
pub const DNS_FLAG_CD: u32 = 1 << 4;
pub const DNS_FLAG_DO: u32 = 1 << 31;

/// Largest offset a compression pointer can encode (14 bits).
pub const DNS_MAX_COMPRESSION_POINTER: usize = 0x3FFF;

/// Maximum size of an uncompressed packet this codec will build.
pub const DNS_MAX_UNCOMPRESSED_SIZE: usize = 65535;

/// Default payload size advertised for plain (non-EDNS) UDP responses.
pub const DNS_MAX_COMPRESSED_SIZE: usize = 4096;

/// DNS query class.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Class {
    IN = 1,
    CH = 3,
    HS = 4,
    NONE = 254,
    ANY = 255,
}

impl From<Class> for u16 {
    fn from(v: Class) -> u16 {
        v as u16
    }
}

impl Class {
    pub fn from_u16(v: u16) -> Option<Class> {
        match v {
            1 => Some(Class::IN),
            3 => Some(Class::CH),
            4 => Some(Class::HS),
            254 => Some(Class::NONE),
            255 => Some(Class::ANY),
            _ => None,
        }
    }

    pub fn from_string(s: &str) -> Result<Class, Error> {
        match s {
            s if s.eq_ignore_ascii_case("IN") => Ok(Class::IN),
            s if s.eq_ignore_ascii_case("CH") => Ok(Class::CH),
            s if s.eq_ignore_ascii_case("HS") => Ok(Class::HS),
            s if s.eq_ignore_ascii_case("NONE") => Ok(Class::NONE),
            s if s.eq_ignore_ascii_case("ANY") => Ok(Class::ANY),
            _ => Err(Error::BadArg("unsupported RR class mnemonic")),
        }
    }
}

/// DNS RR type. Carries every type this crate's RDATA descriptor table
/// (`crate::rdata`) lays out structurally; anything else round-trips as an
/// opaque blob under `Unknown`, same as the teacher's `dnssector` treats any
/// RR it doesn't special-case.
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Type {
    A,
    NS,
    CNAME,
    SOA,
    PTR,
    MX,
    TXT,
    AAAA,
    SRV,
    NAPTR,
    DNAME,
    OPT,
    DS,
    RRSIG,
    NSEC,
    DNSKEY,
    NSEC3,
    NSEC3PARAM,
    TLSA,
    SVCB,
    HTTPS,
    TSIG,
    AXFR,
    IXFR,
    ANY,
    Unknown(u16),
}

impl From<Type> for u16 {
    fn from(v: Type) -> u16 {
        match v {
            Type::A => 1,
            Type::NS => 2,
            Type::CNAME => 5,
            Type::SOA => 6,
            Type::PTR => 12,
            Type::MX => 15,
            Type::TXT => 16,
            Type::AAAA => 28,
            Type::SRV => 33,
            Type::NAPTR => 35,
            Type::DNAME => 39,
            Type::OPT => 41,
            Type::DS => 43,
            Type::RRSIG => 46,
            Type::NSEC => 47,
            Type::DNSKEY => 48,
            Type::NSEC3 => 50,
            Type::NSEC3PARAM => 51,
            Type::TLSA => 52,
            Type::SVCB => 64,
            Type::HTTPS => 65,
            Type::TSIG => 250,
            Type::IXFR => 251,
            Type::AXFR => 252,
            Type::ANY => 255,
            Type::Unknown(x) => x,
        }
    }
}

impl Type {
    pub fn from_u16(v: u16) -> Type {
        match v {
            1 => Type::A,
            2 => Type::NS,
            5 => Type::CNAME,
            6 => Type::SOA,
            12 => Type::PTR,
            15 => Type::MX,
            16 => Type::TXT,
            28 => Type::AAAA,
            33 => Type::SRV,
            35 => Type::NAPTR,
            39 => Type::DNAME,
            41 => Type::OPT,
            43 => Type::DS,
            46 => Type::RRSIG,
            47 => Type::NSEC,
            48 => Type::DNSKEY,
            50 => Type::NSEC3,
            51 => Type::NSEC3PARAM,
            52 => Type::TLSA,
            64 => Type::SVCB,
            65 => Type::HTTPS,
            250 => Type::TSIG,
            251 => Type::IXFR,
            252 => Type::AXFR,
            255 => Type::ANY,
            other => Type::Unknown(other),
        }
    }

    pub fn from_string(rr_type_str: &str) -> Result<Type, Error> {
        match rr_type_str {
            s if s.eq_ignore_ascii_case("A") => Ok(Type::A),
            s if s.eq_ignore_ascii_case("NS") => Ok(Type::NS),
            s if s.eq_ignore_ascii_case("CNAME") => Ok(Type::CNAME),
            s if s.eq_ignore_ascii_case("SOA") => Ok(Type::SOA),
            s if s.eq_ignore_ascii_case("PTR") => Ok(Type::PTR),
            s if s.eq_ignore_ascii_case("MX") => Ok(Type::MX),
            s if s.eq_ignore_ascii_case("TXT") => Ok(Type::TXT),
            s if s.eq_ignore_ascii_case("AAAA") => Ok(Type::AAAA),
            s if s.eq_ignore_ascii_case("SRV") => Ok(Type::SRV),
            s if s.eq_ignore_ascii_case("NAPTR") => Ok(Type::NAPTR),
            s if s.eq_ignore_ascii_case("DNAME") => Ok(Type::DNAME),
            s if s.eq_ignore_ascii_case("OPT") => Ok(Type::OPT),
            s if s.eq_ignore_ascii_case("DS") => Ok(Type::DS),
            s if s.eq_ignore_ascii_case("RRSIG") => Ok(Type::RRSIG),
            s if s.eq_ignore_ascii_case("NSEC") => Ok(Type::NSEC),
            s if s.eq_ignore_ascii_case("DNSKEY") => Ok(Type::DNSKEY),
            s if s.eq_ignore_ascii_case("NSEC3") => Ok(Type::NSEC3),
            s if s.eq_ignore_ascii_case("NSEC3PARAM") => Ok(Type::NSEC3PARAM),
            s if s.eq_ignore_ascii_case("TLSA") => Ok(Type::TLSA),
            s if s.eq_ignore_ascii_case("SVCB") => Ok(Type::SVCB),
            s if s.eq_ignore_ascii_case("HTTPS") => Ok(Type::HTTPS),
            s if s.eq_ignore_ascii_case("TSIG") => Ok(Type::TSIG),
            s if s.eq_ignore_ascii_case("AXFR") => Ok(Type::AXFR),
            s if s.eq_ignore_ascii_case("IXFR") => Ok(Type::IXFR),
            s if s.eq_ignore_ascii_case("ANY") => Ok(Type::ANY),
            _ => Err(Error::BadArg("unsupported RR type mnemonic")),
        }
    }
}

/// EDNS(0) option code. Only NSID is acted on by the codec; others round-trip
/// as opaque option records.
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EdnsOption {
    NSID = 3,
    CLIENT_SUBNET = 8,
    KEEPALIVE = 11,
    PADDING = 12,
}

impl From<EdnsOption> for u16 {
    fn from(v: EdnsOption) -> u16 {
        v as u16
    }
}

/// DNS return codes (base 4-bit set; an EDNS extended-rcode byte is folded
/// in by the OPT codec, not represented here).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Rcode {
    NoError = 0,
    FormErr = 1,
    ServFail = 2,
    NxDomain = 3,
    NotImp = 4,
    Refused = 5,
    YxDomain = 6,
    YxRrSet = 7,
    NxRrSet = 8,
    NotAuth = 9,
    NotZone = 10,
}

impl From<Rcode> for u8 {
    fn from(v: Rcode) -> u8 {
        v as u8
    }
}

/// DNS opcodes.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Opcode {
    Query = 0,
    IQuery = 1,
    Status = 2,
    Notify = 4,
    Update = 5,
}

impl From<Opcode> for u8 {
    fn from(v: Opcode) -> u8 {
        v as u8
    }
}

/// A packet section, in wire order. The teacher calls this variant
/// `NameServers`; this crate follows RFC 1035's own header field names
/// (`ANCOUNT`/`NSCOUNT`/`ARCOUNT`) since spec.md does too. There is no
/// `Edns` section here — the OPT pseudo-RR is a dedicated `Packet` field,
/// not something iterated over with the others.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum Section {
    Question,
    Answer,
    Authority,
    Additional,
}

impl From<Section> for u8 {
    fn from(v: Section) -> u8 {
        v as u8
    }
}

/// Classification of a parsed packet (supplemented feature, SPEC_FULL.md
/// §10.1, grounded on `knot_pkt_type` in `libknot/packet/pkt.c`). A pure read
/// of OPCODE/QTYPE bits the codec already parses; does not imply any
/// AXFR/IXFR/NOTIFY/UPDATE protocol logic.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PacketKind {
    Query,
    AxfrQuery,
    IxfrQuery,
    NotifyQuery,
    UpdateQuery,
    Response,
    AxfrResponse,
    IxfrResponse,
    NotifyResponse,
    UpdateResponse,
    Invalid,
}

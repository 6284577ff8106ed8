//! TSIG RR (RFC 8945), spec.md §4.G / §6. Parsing and wire layout only —
//! MAC computation and verification are explicitly out of scope
//! (SPEC_FULL.md §3.9's deferral list); a caller supplies `mac` already
//! computed, or inspects it after parsing.

use byteorder::{BigEndian, ByteOrder};

use crate::constants::{Class, Type};
use crate::error::{Error, Result};
use crate::name::DName;

/// A TSIG key: its owner name and signing algorithm. MAC computation lives
/// outside this crate; this only carries enough to build/parse the RR.
#[derive(Clone, Debug)]
pub struct TsigKey {
    pub name: DName,
    pub algorithm: DName,
}

/// A parsed or to-be-written TSIG RR.
#[derive(Clone, Debug)]
pub struct TsigRecord {
    pub key_name: DName,
    pub algorithm: DName,
    pub time_signed: u64,
    pub fudge: u16,
    pub mac: Vec<u8>,
    pub original_id: u16,
    pub error: u16,
    pub other: Vec<u8>,
}

/// Largest MAC this crate budgets space for when reserving tail space ahead
/// of signing (HMAC-SHA512's 64 bytes, the widest algorithm in common use).
const MAX_MAC_LEN: usize = 64;

impl TsigRecord {
    /// Parses a TSIG RR whose owner name starts at `offset`. The owner is
    /// the signing key's name, never compressed per RFC 8945 §5.2.
    pub fn parse_wire(packet: &[u8], offset: usize) -> Result<(TsigRecord, usize)> {
        let (key_name, pos) = DName::parse_wire(packet, offset)?;
        if pos + 10 > packet.len() {
            return Err(Error::Malformed("truncated TSIG RR header"));
        }
        let ty = Type::from_u16(BigEndian::read_u16(&packet[pos..]));
        if ty != Type::TSIG {
            return Err(Error::Malformed("expected TSIG RR"));
        }
        let class = Class::from_u16(BigEndian::read_u16(&packet[pos + 2..]));
        if class != Some(Class::ANY) {
            return Err(Error::Malformed("TSIG RR must use class ANY"));
        }
        let rdlen = BigEndian::read_u16(&packet[pos + 8..]) as usize;
        let rdata_start = pos + 10;
        if rdata_start + rdlen > packet.len() {
            return Err(Error::Malformed("TSIG RDATA runs past end of packet"));
        }
        let (algorithm, mut cur) = DName::parse_wire(packet, rdata_start)?;
        let need = |cur: usize, n: usize, end: usize| -> Result<()> {
            if cur + n > end {
                Err(Error::Malformed("truncated TSIG RDATA"))
            } else {
                Ok(())
            }
        };
        let end = rdata_start + rdlen;
        need(cur, 6, end)?;
        let time_signed = (u64::from(BigEndian::read_u16(&packet[cur..])) << 32)
            | u64::from(BigEndian::read_u32(&packet[cur + 2..]));
        cur += 6;
        need(cur, 2, end)?;
        let fudge = BigEndian::read_u16(&packet[cur..]);
        cur += 2;
        need(cur, 2, end)?;
        let mac_len = BigEndian::read_u16(&packet[cur..]) as usize;
        cur += 2;
        need(cur, mac_len, end)?;
        let mac = packet[cur..cur + mac_len].to_vec();
        cur += mac_len;
        need(cur, 2, end)?;
        let original_id = BigEndian::read_u16(&packet[cur..]);
        cur += 2;
        need(cur, 2, end)?;
        let error = BigEndian::read_u16(&packet[cur..]);
        cur += 2;
        need(cur, 2, end)?;
        let other_len = BigEndian::read_u16(&packet[cur..]) as usize;
        cur += 2;
        need(cur, other_len, end)?;
        let other = packet[cur..cur + other_len].to_vec();
        cur += other_len;
        if cur != end {
            return Err(Error::Malformed("TSIG RDATA length mismatch"));
        }
        Ok((
            TsigRecord {
                key_name,
                algorithm,
                time_signed,
                fudge,
                mac,
                original_id,
                error,
                other,
            },
            end,
        ))
    }

    pub fn write_wire(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(self.key_name.to_wire());
        let mut buf2 = [0u8; 2];
        BigEndian::write_u16(&mut buf2, Type::TSIG.into());
        out.extend_from_slice(&buf2);
        BigEndian::write_u16(&mut buf2, Class::ANY.into());
        out.extend_from_slice(&buf2);
        out.extend_from_slice(&[0, 0, 0, 0]); // TTL, always 0

        let mut rdata = Vec::new();
        rdata.extend_from_slice(self.algorithm.to_wire());
        let mut buf4 = [0u8; 4];
        BigEndian::write_u16(&mut buf2, ((self.time_signed >> 32) & 0xffff) as u16);
        rdata.extend_from_slice(&buf2);
        BigEndian::write_u32(&mut buf4, (self.time_signed & 0xffff_ffff) as u32);
        rdata.extend_from_slice(&buf4);
        BigEndian::write_u16(&mut buf2, self.fudge);
        rdata.extend_from_slice(&buf2);
        if self.mac.len() > u16::MAX as usize {
            return Err(Error::BadArg("TSIG MAC too long"));
        }
        BigEndian::write_u16(&mut buf2, self.mac.len() as u16);
        rdata.extend_from_slice(&buf2);
        rdata.extend_from_slice(&self.mac);
        BigEndian::write_u16(&mut buf2, self.original_id);
        rdata.extend_from_slice(&buf2);
        BigEndian::write_u16(&mut buf2, self.error);
        rdata.extend_from_slice(&buf2);
        if self.other.len() > u16::MAX as usize {
            return Err(Error::BadArg("TSIG other-data too long"));
        }
        BigEndian::write_u16(&mut buf2, self.other.len() as u16);
        rdata.extend_from_slice(&buf2);
        rdata.extend_from_slice(&self.other);

        if rdata.len() > u16::MAX as usize {
            return Err(Error::BadArg("TSIG RDATA too long"));
        }
        BigEndian::write_u16(&mut buf2, rdata.len() as u16);
        out.extend_from_slice(&buf2);
        out.extend_from_slice(&rdata);
        Ok(())
    }
}

/// Upper bound on the wire size of a TSIG RR for `key`, reserved at the tail
/// of a response buffer before the MAC is actually computed (spec.md §4.G,
/// "TSIG: `tsig_wire_maxsize(key)` reserves bytes at the tail").
pub fn tsig_wire_maxsize(key: &TsigKey) -> usize {
    key.name.len()
        + 2 // TYPE
        + 2 // CLASS
        + 4 // TTL
        + 2 // RDLENGTH
        + key.algorithm.len()
        + 6 // time signed
        + 2 // fudge
        + 2 + MAX_MAC_LEN // MAC size + MAC
        + 2 // original id
        + 2 // error
        + 2 // other len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_tsig_rr() {
        let key_name = DName::from_presentation("key.example.com.").unwrap();
        let algorithm = DName::from_presentation("hmac-sha256.").unwrap();
        let rec = TsigRecord {
            key_name,
            algorithm,
            time_signed: 1_700_000_000,
            fudge: 300,
            mac: vec![1, 2, 3, 4],
            original_id: 0x1234,
            error: 0,
            other: Vec::new(),
        };
        let mut wire = Vec::new();
        rec.write_wire(&mut wire).unwrap();
        let (parsed, end) = TsigRecord::parse_wire(&wire, 0).unwrap();
        assert_eq!(end, wire.len());
        assert_eq!(parsed.time_signed, 1_700_000_000);
        assert_eq!(parsed.fudge, 300);
        assert_eq!(parsed.mac, vec![1, 2, 3, 4]);
        assert_eq!(parsed.original_id, 0x1234);
    }
}

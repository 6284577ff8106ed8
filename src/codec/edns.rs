//! EDNS(0) OPT pseudo-RR (RFC 6891), spec.md §4.G / §6.
//!
//! The OPT record folds its "header" fields into slots a normal RR header
//! doesn't have them in: UDP payload size lives in CLASS, the extended
//! RCODE/version/flags live in TTL. Grounded on the `ext_rcode`/
//! `edns_version`/`ext_flags`/`max_payload` fields the teacher's
//! `ParsedPacket` carries (`parsed_packet.rs`) and its `dnssec()` DO-bit
//! accessor.

use byteorder::{BigEndian, ByteOrder};

use crate::constants::{Class, DNS_FLAG_DO, Type};
use crate::error::{Error, Result};

/// One EDNS option: a code and its opaque payload. Only NSID is inspected
/// anywhere in this crate; everything else round-trips untouched.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OptionEntry {
    pub code: u16,
    pub data: Vec<u8>,
}

/// Parsed/constructed OPT pseudo-RR state.
#[derive(Clone, Debug)]
pub struct EdnsOpt {
    pub udp_payload: u16,
    pub ext_rcode: u8,
    pub version: u8,
    pub do_bit: bool,
    pub options: Vec<OptionEntry>,
}

impl Default for EdnsOpt {
    fn default() -> Self {
        EdnsOpt {
            udp_payload: crate::constants::DNS_MAX_COMPRESSED_SIZE as u16,
            ext_rcode: 0,
            version: 0,
            do_bit: false,
            options: Vec::new(),
        }
    }
}

impl EdnsOpt {
    /// Parses an OPT RR whose owner (the root label) has already been
    /// consumed; `offset` points at TYPE.
    pub fn parse_wire(packet: &[u8], offset: usize) -> Result<(EdnsOpt, usize)> {
        if offset + 10 > packet.len() {
            return Err(Error::Malformed("truncated OPT RR header"));
        }
        let ty = Type::from_u16(BigEndian::read_u16(&packet[offset..]));
        if ty != Type::OPT {
            return Err(Error::Malformed("expected OPT RR"));
        }
        let udp_payload = BigEndian::read_u16(&packet[offset + 2..]);
        let ext_rcode = packet[offset + 4];
        let version = packet[offset + 5];
        let flags = BigEndian::read_u16(&packet[offset + 6..]);
        let do_bit = flags & ((DNS_FLAG_DO >> 16) as u16) != 0;
        let rdlen = BigEndian::read_u16(&packet[offset + 8..]) as usize;
        let rdata_start = offset + 10;
        if rdata_start + rdlen > packet.len() {
            return Err(Error::Malformed("OPT RDATA runs past end of packet"));
        }
        let mut options = Vec::new();
        let mut pos = rdata_start;
        let end = rdata_start + rdlen;
        while pos < end {
            if pos + 4 > end {
                return Err(Error::Malformed("truncated EDNS option header"));
            }
            let code = BigEndian::read_u16(&packet[pos..]);
            let len = BigEndian::read_u16(&packet[pos + 2..]) as usize;
            if pos + 4 + len > end {
                return Err(Error::Malformed("truncated EDNS option data"));
            }
            options.push(OptionEntry {
                code,
                data: packet[pos + 4..pos + 4 + len].to_vec(),
            });
            pos += 4 + len;
        }
        Ok((
            EdnsOpt {
                udp_payload,
                ext_rcode,
                version,
                do_bit,
                options,
            },
            end,
        ))
    }

    /// Serializes the full OPT RR, including its root-label owner.
    pub fn write_wire(&self, out: &mut Vec<u8>) -> Result<()> {
        out.push(0); // root owner
        let mut buf = [0u8; 2];
        BigEndian::write_u16(&mut buf, Type::OPT.into());
        out.extend_from_slice(&buf);
        BigEndian::write_u16(&mut buf, self.udp_payload);
        out.extend_from_slice(&buf);
        out.push(self.ext_rcode);
        out.push(self.version);
        let flags: u16 = if self.do_bit { 0x8000 } else { 0 };
        BigEndian::write_u16(&mut buf, flags);
        out.extend_from_slice(&buf);

        let mut rdata = Vec::new();
        for opt in &self.options {
            if opt.data.len() > u16::MAX as usize {
                return Err(Error::BadArg("EDNS option data too long"));
            }
            BigEndian::write_u16(&mut buf, opt.code);
            rdata.extend_from_slice(&buf);
            BigEndian::write_u16(&mut buf, opt.data.len() as u16);
            rdata.extend_from_slice(&buf);
            rdata.extend_from_slice(&opt.data);
        }
        if rdata.len() > u16::MAX as usize {
            return Err(Error::BadArg("EDNS RDATA too long"));
        }
        BigEndian::write_u16(&mut buf, rdata.len() as u16);
        out.extend_from_slice(&buf);
        out.extend_from_slice(&rdata);
        Ok(())
    }

    /// Total bytes this OPT RR will occupy once serialized, for
    /// `Packet::remaining_space` to reserve ahead of time.
    pub fn wire_size(&self) -> usize {
        1 + 2 + 2 + 1 + 1 + 2 + 2
            + self
                .options
                .iter()
                .map(|o| 4 + o.data.len())
                .sum::<usize>()
    }

    pub fn class(&self) -> Class {
        Class::from_u16(self.udp_payload).unwrap_or(Class::IN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_with_do_bit_and_option() {
        let mut opt = EdnsOpt {
            udp_payload: 4096,
            ext_rcode: 0,
            version: 0,
            do_bit: true,
            options: Vec::new(),
        };
        opt.options.push(OptionEntry {
            code: 3,
            data: b"resolver".to_vec(),
        });
        let mut wire = Vec::new();
        opt.write_wire(&mut wire).unwrap();
        let (parsed, end) = EdnsOpt::parse_wire(&wire, 0).unwrap();
        assert_eq!(end, wire.len());
        assert!(parsed.do_bit);
        assert_eq!(parsed.udp_payload, 4096);
        assert_eq!(parsed.options.len(), 1);
        assert_eq!(parsed.options[0].code, 3);
    }
}

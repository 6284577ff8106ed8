//! Name compression for packet building (spec.md §4.G).
//!
//! Ported from `knot_pkt_put_dname` in `libknot/packet/pkt.c`: a single
//! remembered `{pos, labels}` suffix, trimmed and aligned against each new
//! name, with the match window restarted on every mismatch so a later run of
//! matching labels still compresses even after an earlier label diverged.
//! Unlike the teacher's `compress.rs` (which only ever *decompresses*
//! trusted wire bytes), there's nothing in this crate's retrieval pack that
//! builds compressed output, so this module is grounded directly on the
//! original C rather than on a Rust precedent.

use byteorder::{BigEndian, ByteOrder};

use crate::constants::{DNS_MAX_COMPRESSION_POINTER, DNS_MAX_HOSTNAME_INDIRECTIONS};
use crate::error::{Error, Result};
use crate::name::DName;

/// Tracks the single suffix candidate a packet's name-writer compares new
/// names against.
pub struct Compressor {
    suffix_pos: usize,
    suffix_labels: usize,
}

impl Compressor {
    /// Seeds the suffix with the already-written QNAME.
    pub fn new(qname_pos: usize, qname: &DName) -> Compressor {
        Compressor {
            suffix_pos: qname_pos,
            suffix_labels: qname.label_count(),
        }
    }

    /// Writes `name` into `wire` (which must already hold everything up to
    /// the current cursor), compressing against the tracked suffix unless
    /// `literal` forces an uncompressed write (RFC 4034 next-owner names and
    /// the like must never be compressed).
    pub fn write_name(&mut self, wire: &mut Vec<u8>, name: &DName, literal: bool) -> Result<()> {
        if literal {
            wire.extend_from_slice(name.to_wire());
            return Ok(());
        }

        let name_labels: Vec<&[u8]> = name.labels().collect();
        let orig_label_count = name_labels.len();

        let mut suffix_pos = self.suffix_pos;
        let mut suffix_label_count = self.suffix_labels;
        while suffix_label_count > name_labels.len() {
            let (_, next) = read_label(wire, suffix_pos)?;
            suffix_pos = next;
            suffix_label_count -= 1;
        }

        let start = wire.len();
        let mut idx = 0usize;
        while name_labels.len() - idx > suffix_label_count {
            write_label(wire, name_labels[idx]);
            idx += 1;
        }

        let mut match_begin = idx;
        let mut compr_ptr = suffix_pos;
        let mut cur_suffix_pos = suffix_pos;
        let remaining = name_labels.len() - idx;
        for _ in 0..remaining {
            let (suffix_label, next_suffix_pos) = read_label(wire, cur_suffix_pos)?;
            let name_label = name_labels[idx];
            if !name_label.eq_ignore_ascii_case(suffix_label) {
                for label in &name_labels[match_begin..=idx] {
                    write_label(wire, label);
                }
                match_begin = idx + 1;
                compr_ptr = next_suffix_pos;
            }
            cur_suffix_pos = next_suffix_pos;
            idx += 1;
        }

        if match_begin == name_labels.len() {
            wire.push(0);
        } else if compr_ptr > DNS_MAX_COMPRESSION_POINTER {
            for label in &name_labels[match_begin..] {
                write_label(wire, label);
            }
            wire.push(0);
        } else {
            let ptr = 0xc000u16 | (compr_ptr as u16 & 0x3fff);
            wire.extend_from_slice(&ptr.to_be_bytes());
        }

        let written = wire.len() - start;
        if written > 2 && start <= DNS_MAX_COMPRESSION_POINTER {
            self.suffix_pos = start;
            self.suffix_labels = orig_label_count;
        }
        Ok(())
    }
}

fn write_label(wire: &mut Vec<u8>, label: &[u8]) {
    wire.push(label.len() as u8);
    wire.extend_from_slice(label);
}

/// Reads one label out of `wire` at `pos`, following compression pointers
/// already committed to the buffer (every suffix position this module
/// tracks was itself written by an earlier call, so this only ever walks
/// backwards, never off the end). Returns the label content (empty for
/// root) and the position immediately following it, in the address space
/// the pointer resolved to.
fn read_label(wire: &[u8], mut pos: usize) -> Result<(&[u8], usize)> {
    let mut hops = 0;
    loop {
        if pos >= wire.len() {
            return Err(Error::Malformed("compression suffix out of bounds"));
        }
        let b = wire[pos];
        if b & 0xc0 == 0xc0 {
            hops += 1;
            if hops > DNS_MAX_HOSTNAME_INDIRECTIONS || pos + 2 > wire.len() {
                return Err(Error::Malformed("too many compression indirections"));
            }
            let target = (BigEndian::read_u16(&wire[pos..]) & 0x3fff) as usize;
            if target >= pos {
                return Err(Error::Malformed("forward or self compression reference"));
            }
            pos = target;
            continue;
        }
        let len = b as usize;
        if len == 0 {
            return Ok((&wire[pos..pos], pos + 1));
        }
        if pos + 1 + len > wire.len() {
            return Err(Error::Malformed("label runs past end of packet"));
        }
        return Ok((&wire[pos + 1..pos + 1 + len], pos + 1 + len));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DNS_HEADER_SIZE;

    fn encode(name: &str) -> DName {
        DName::from_presentation(name).unwrap()
    }

    #[test]
    fn qname_repeat_compresses_to_a_pure_pointer() {
        let qname = encode("www.example.com.");
        let mut wire = vec![0u8; DNS_HEADER_SIZE];
        wire.extend_from_slice(qname.to_wire());
        let mut compr = Compressor::new(DNS_HEADER_SIZE, &qname);

        let before = wire.len();
        compr.write_name(&mut wire, &qname, false).unwrap();
        assert_eq!(wire.len() - before, 2);
        assert_eq!(wire[before] & 0xc0, 0xc0);
        let ptr = (BigEndian::read_u16(&wire[before..]) & 0x3fff) as usize;
        assert_eq!(ptr, DNS_HEADER_SIZE);
    }

    #[test]
    fn sibling_name_compresses_against_qname_suffix() {
        let qname = encode("www.example.com.");
        let mut wire = vec![0u8; DNS_HEADER_SIZE];
        wire.extend_from_slice(qname.to_wire());
        let mut compr = Compressor::new(DNS_HEADER_SIZE, &qname);

        let ns = encode("ns1.example.com.");
        let before = wire.len();
        compr.write_name(&mut wire, &ns, false).unwrap();
        // "ns1" written literally (4 bytes) then a 2-byte pointer.
        assert_eq!(wire.len() - before, 6);
        assert_eq!(wire[before], 3);
        assert_eq!(&wire[before + 1..before + 4], b"ns1");
        assert_eq!(wire[before + 4] & 0xc0, 0xc0);
        let ptr = (BigEndian::read_u16(&wire[before + 4..]) & 0x3fff) as usize;
        // Points into the middle of the qname's own encoding, at "example.com".
        assert_eq!(ptr, DNS_HEADER_SIZE + 4);
    }

    #[test]
    fn unrelated_name_is_written_uncompressed() {
        let qname = encode("www.example.com.");
        let mut wire = vec![0u8; DNS_HEADER_SIZE];
        wire.extend_from_slice(qname.to_wire());
        let mut compr = Compressor::new(DNS_HEADER_SIZE, &qname);

        let other = encode("mail.example.org.");
        let before = wire.len();
        compr.write_name(&mut wire, &other, false).unwrap();
        assert_eq!(&wire[before..], other.to_wire());
    }

    #[test]
    fn literal_hint_never_compresses() {
        let qname = encode("www.example.com.");
        let mut wire = vec![0u8; DNS_HEADER_SIZE];
        wire.extend_from_slice(qname.to_wire());
        let mut compr = Compressor::new(DNS_HEADER_SIZE, &qname);

        let before = wire.len();
        compr.write_name(&mut wire, &qname, true).unwrap();
        assert_eq!(&wire[before..], qname.to_wire());
    }
}

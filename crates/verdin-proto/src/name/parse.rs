//! DNS name parsing from wire format with compression support.
//!
//! Handles compression pointers per RFC 1035 Section 4.1.4 with
//! defensive limits: pointers must point strictly backward and the
//! chase depth is bounded, so a hostile message can neither loop nor
//! walk forward out of already-validated territory.

use super::Name;
use crate::MAX_NAME_LENGTH;
use crate::error::{Error, Result};
use smallvec::SmallVec;

/// Maximum number of compression pointer jumps before the parse is
/// rejected as hostile.
const MAX_POINTER_CHASE: usize = 32;

/// Parser for reading domain names from DNS wire format.
///
/// Holds the complete message buffer so compression pointers can be
/// resolved; a parsed name never references memory outside that buffer.
#[derive(Debug, Clone)]
pub struct NameParser<'a> {
    /// The complete message buffer.
    message: &'a [u8],
}

impl<'a> NameParser<'a> {
    /// Creates a new name parser over the given message buffer.
    #[inline]
    pub const fn new(message: &'a [u8]) -> Self {
        Self { message }
    }

    /// Parses a domain name starting at the given offset.
    ///
    /// Returns the parsed name and the number of bytes consumed from the
    /// starting position (pointer targets are not counted).
    pub fn parse_name(&self, offset: usize) -> Result<(Name, usize)> {
        let mut wire = SmallVec::<[u8; 64]>::new();
        let mut consumed = 0;
        let mut pos = offset;
        let mut jumps = 0;
        let mut followed_pointer = false;
        let mut label_count = 0u8;

        loop {
            if pos >= self.message.len() {
                return Err(Error::unexpected_eof(pos));
            }

            let len_byte = self.message[pos];

            // Compression pointer: top two bits set
            if len_byte & 0xC0 == 0xC0 {
                if pos + 1 >= self.message.len() {
                    return Err(Error::unexpected_eof(pos + 1));
                }

                let target =
                    u16::from_be_bytes([len_byte & 0x3F, self.message[pos + 1]]) as usize;

                // Only strictly backward pointers are legal
                if target >= pos {
                    return Err(Error::ForwardPointer {
                        offset: pos,
                        target,
                    });
                }

                if !followed_pointer {
                    consumed = pos - offset + 2;
                    followed_pointer = true;
                }

                jumps += 1;
                if jumps > MAX_POINTER_CHASE {
                    return Err(Error::PointerChaseExceeded {
                        max_jumps: MAX_POINTER_CHASE,
                    });
                }

                pos = target;
                continue;
            }

            // Reserved length encodings `01` and `10` (RFC 2671 extended
            // labels never materialized; reject them outright)
            if len_byte & 0xC0 != 0 {
                return Err(Error::ReservedLabelType {
                    offset: pos,
                    value: len_byte,
                });
            }

            let len = len_byte as usize;

            // Root label ends the name
            if len == 0 {
                wire.push(0);
                label_count += 1;

                if !followed_pointer {
                    consumed = pos - offset + 1;
                }
                break;
            }

            if pos + 1 + len > self.message.len() {
                return Err(Error::unexpected_eof(pos + 1 + len));
            }

            if wire.len() + 1 + len > MAX_NAME_LENGTH {
                return Err(Error::NameTooLong {
                    length: wire.len() + 1 + len,
                });
            }

            // Labels are opaque byte sequences; copied verbatim
            wire.push(len as u8);
            wire.extend_from_slice(&self.message[pos + 1..pos + 1 + len]);
            label_count += 1;

            pos += 1 + len;
        }

        Ok((Name::from_parts(wire, label_count), consumed))
    }

    /// Parses a name, discarding the consumed-byte count.
    #[inline]
    pub fn parse(&self, offset: usize) -> Result<Name> {
        self.parse_name(offset).map(|(name, _)| name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_name() {
        let wire = [
            3, b'w', b'w', b'w', 7, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 3, b'c', b'o', b'm',
            0,
        ];

        let parser = NameParser::new(&wire);
        let (name, consumed) = parser.parse_name(0).unwrap();

        assert_eq!(name.to_string(), "www.example.com.");
        assert_eq!(consumed, wire.len());
    }

    #[test]
    fn test_parse_compressed_name() {
        // At offset 0: foo. -- at offset 5: pointer back to 0
        let wire = [3, b'f', b'o', b'o', 0, 0xC0, 0x00];

        let parser = NameParser::new(&wire);

        let (name1, consumed1) = parser.parse_name(0).unwrap();
        assert_eq!(name1.to_string(), "foo.");
        assert_eq!(consumed1, 5);

        let (name2, consumed2) = parser.parse_name(5).unwrap();
        assert_eq!(name2.to_string(), "foo.");
        assert_eq!(consumed2, 2);
    }

    #[test]
    fn test_compressed_prefix() {
        let wire = [
            7, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 3, b'c', b'o', b'm',
            0, // example.com.
            3, b'w', b'w', b'w', 0xC0, 0x00, // www.<ptr 0>
        ];

        let parser = NameParser::new(&wire);
        let (name, consumed) = parser.parse_name(13).unwrap();
        assert_eq!(name.to_string(), "www.example.com.");
        assert_eq!(consumed, 6);
    }

    #[test]
    fn test_forward_pointer_rejected() {
        // Pointer at offset 0 pointing forward to offset 2
        let wire = [0xC0, 0x02, 0xC0, 0x00];

        let parser = NameParser::new(&wire);
        assert!(matches!(
            parser.parse_name(0),
            Err(Error::ForwardPointer { .. })
        ));
        // Offset 2 points back to 0, which points forward again
        assert!(matches!(
            parser.parse_name(2),
            Err(Error::ForwardPointer { .. })
        ));
    }

    #[test]
    fn test_self_pointer_rejected() {
        let wire = [0xC0, 0x00];

        let parser = NameParser::new(&wire);
        assert!(matches!(
            parser.parse_name(0),
            Err(Error::ForwardPointer { .. })
        ));
    }

    #[test]
    fn test_pointer_chase_depth() {
        // A ladder of pointers, each pointing two bytes back; 40 rungs
        // exceeds the 32-jump limit even though every hop is backward.
        let mut wire = vec![3, b'f', b'o', b'o', 0];
        // round up to even offset so the pointer arithmetic stays simple
        wire.push(0);
        let base = wire.len();
        wire.extend_from_slice(&[0xC0, 0x00]); // first rung points at the name
        for i in 1..40 {
            let prev = (base + (i - 1) * 2) as u16;
            wire.extend_from_slice(&[0xC0 | (prev >> 8) as u8, (prev & 0xFF) as u8]);
        }

        let last = base + 39 * 2;
        let parser = NameParser::new(&wire);
        assert!(matches!(
            parser.parse_name(last),
            Err(Error::PointerChaseExceeded { .. })
        ));
    }

    #[test]
    fn test_reserved_label_types() {
        for len_byte in [0x40u8, 0x80u8] {
            let wire = [len_byte, 0x00];
            let parser = NameParser::new(&wire);
            assert!(matches!(
                parser.parse_name(0),
                Err(Error::ReservedLabelType { .. })
            ));
        }
    }

    #[test]
    fn test_truncated_name() {
        let wire = [5, b'a', b'b'];
        let parser = NameParser::new(&wire);
        assert!(matches!(
            parser.parse_name(0),
            Err(Error::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_opaque_label_bytes() {
        // Labels are not normalized or validated as text
        let wire = [3, 0xFF, 0x20, 0x01, 0];
        let parser = NameParser::new(&wire);
        let (name, _) = parser.parse_name(0).unwrap();
        assert_eq!(name.label(0).unwrap().as_bytes(), &[0xFF, 0x20, 0x01]);
    }
}

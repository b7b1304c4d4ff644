//! Text record types (TXT).

use crate::error::{Error, Result};
use bytes::BytesMut;
use std::fmt;

/// TXT record - ordered list of character strings (RFC 1035).
///
/// Each inner string is at most 255 bytes and is length-prefixed on the
/// wire. DNS-SD uses TXT strings as `key=value` metadata (RFC 6763
/// Section 6), so the strings are kept as raw bytes and their order is
/// preserved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TXT {
    /// The character strings, in wire order.
    strings: Vec<Vec<u8>>,
}

impl TXT {
    /// Creates a TXT record from a list of strings.
    ///
    /// Strings longer than 255 bytes are truncated.
    pub fn new(strings: impl IntoIterator<Item = impl Into<Vec<u8>>>) -> Self {
        let strings = strings
            .into_iter()
            .map(|s| {
                let mut v = s.into();
                v.truncate(255);
                v
            })
            .collect();
        Self { strings }
    }

    /// Creates a TXT record holding a single string.
    pub fn single(text: impl Into<Vec<u8>>) -> Self {
        Self::new([text.into()])
    }

    /// Returns the character strings in wire order.
    #[inline]
    pub fn strings(&self) -> &[Vec<u8>] {
        &self.strings
    }

    /// Iterates the strings as lossy UTF-8.
    pub fn strings_lossy(&self) -> impl Iterator<Item = std::borrow::Cow<'_, str>> {
        self.strings.iter().map(|s| String::from_utf8_lossy(s))
    }

    /// Looks up a DNS-SD `key=value` attribute (case-insensitive key).
    pub fn attribute(&self, key: &str) -> Option<&[u8]> {
        for s in &self.strings {
            if let Some(eq) = s.iter().position(|&b| b == b'=') {
                if s[..eq].eq_ignore_ascii_case(key.as_bytes()) {
                    return Some(&s[eq + 1..]);
                }
            }
        }
        None
    }

    /// Parses a TXT record from its RDATA slice.
    ///
    /// Inner strings are consumed until the slice is exhausted; a length
    /// prefix that overruns the slice is a format error.
    pub fn parse(rdata: &[u8]) -> Result<Self> {
        let mut strings = Vec::new();
        let mut pos = 0;

        while pos < rdata.len() {
            let len = rdata[pos] as usize;
            pos += 1;
            if pos + len > rdata.len() {
                return Err(Error::invalid_rdata(
                    "TXT",
                    "character string overruns RDATA",
                ));
            }
            strings.push(rdata[pos..pos + len].to_vec());
            pos += len;
        }

        Ok(Self { strings })
    }

    /// Returns the wire format length.
    pub fn wire_len(&self) -> usize {
        self.strings.iter().map(|s| 1 + s.len()).sum::<usize>().max(1)
    }

    /// Writes the RDATA to wire format.
    ///
    /// An empty TXT is written as a single zero-length string, since an
    /// RR with RDLENGTH 0 is not valid for TXT.
    pub fn write_to(&self, buf: &mut BytesMut) {
        if self.strings.is_empty() {
            buf.extend_from_slice(&[0]);
            return;
        }
        for s in &self.strings {
            buf.extend_from_slice(&[s.len() as u8]);
            buf.extend_from_slice(s);
        }
    }
}

impl fmt::Display for TXT {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for s in &self.strings {
            if !first {
                write!(f, " ")?;
            }
            first = false;
            write!(f, "\"{}\"", String::from_utf8_lossy(s))?;
        }
        if first {
            write!(f, "\"\"")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_txt_roundtrip() {
        let txt = TXT::new(["path=/printers/main", "ty=LaserJet"]);

        let mut buf = BytesMut::new();
        txt.write_to(&mut buf);
        assert_eq!(buf.len(), txt.wire_len());

        let parsed = TXT::parse(&buf).unwrap();
        assert_eq!(parsed, txt);
        assert_eq!(parsed.strings().len(), 2);
    }

    #[test]
    fn test_txt_attribute_lookup() {
        let txt = TXT::new(["txtvers=1", "Path=/root"]);
        assert_eq!(txt.attribute("path"), Some(&b"/root"[..]));
        assert_eq!(txt.attribute("txtvers"), Some(&b"1"[..]));
        assert_eq!(txt.attribute("missing"), None);
    }

    #[test]
    fn test_txt_overrun_rejected() {
        // Declared length 5, only 2 bytes follow
        assert!(TXT::parse(&[5, b'a', b'b']).is_err());
    }

    #[test]
    fn test_empty_txt() {
        let txt = TXT::default();
        let mut buf = BytesMut::new();
        txt.write_to(&mut buf);
        assert_eq!(&buf[..], &[0]);

        let parsed = TXT::parse(&buf).unwrap();
        assert_eq!(parsed.strings().len(), 1);
        assert!(parsed.strings()[0].is_empty());
    }

    #[test]
    fn test_order_preserved() {
        let txt = TXT::new(["b", "a", "c"]);
        let mut buf = BytesMut::new();
        txt.write_to(&mut buf);
        let parsed = TXT::parse(&buf).unwrap();
        let strings: Vec<_> = parsed.strings_lossy().collect();
        assert_eq!(strings, vec!["b", "a", "c"]);
    }
}

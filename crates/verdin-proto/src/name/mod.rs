//! DNS domain name representation and operations.
//!
//! Names are stored in uncompressed wire format and compared
//! case-insensitively per RFC 1035. Parsing from wire format (including
//! compression pointers) lives in [`parse`]; text parsing supports
//! `\NN` hex escapes so DNS-SD instance names survive a round-trip
//! through their string form.

mod label;
mod parse;

pub use label::{Label, LabelIter};
pub use parse::NameParser;

use crate::error::{Error, Result};
use crate::{MAX_LABEL_LENGTH, MAX_NAME_LENGTH};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// A DNS domain name.
///
/// # Wire Format
///
/// A domain name is a sequence of length-prefixed labels terminated by a
/// zero byte. `www.example.com.` is encoded as:
///
/// ```text
/// 03 'w' 'w' 'w' 07 'e' 'x' 'a' 'm' 'p' 'l' 'e' 03 'c' 'o' 'm' 00
/// ```
///
/// Compression pointers are resolved at parse time; a stored `Name`
/// never contains one.
///
/// # Comparison Semantics
///
/// Names compare case-insensitively. `Hash` and `Eq` agree on this.
///
/// # Example
///
/// ```rust
/// use verdin_proto::Name;
/// use std::str::FromStr;
///
/// let name = Name::from_str("printer.local").unwrap();
/// assert_eq!(name.label_count(), 3); // printer, local, root
/// assert_eq!(name, Name::from_str("PRINTER.LOCAL").unwrap());
/// ```
#[derive(Clone)]
pub struct Name {
    /// Uncompressed wire representation; empty for the root name.
    wire: SmallVec<[u8; 64]>,
    /// Number of labels (including root).
    label_count: u8,
}

impl Name {
    /// Creates the root domain name.
    #[inline]
    pub const fn root() -> Self {
        Self {
            wire: SmallVec::new_const(),
            label_count: 1,
        }
    }

    /// Internal constructor for pre-validated wire data.
    #[inline]
    pub(crate) fn from_parts(wire: SmallVec<[u8; 64]>, label_count: u8) -> Self {
        Self { wire, label_count }
    }

    /// Creates a domain name from uncompressed wire format, copying the data.
    pub fn from_wire(slice: &[u8]) -> Result<Self> {
        let label_count = Self::validate_wire(slice)?;
        Ok(Self {
            wire: SmallVec::from_slice(slice),
            label_count,
        })
    }

    /// Validates uncompressed wire format and returns the label count.
    fn validate_wire(bytes: &[u8]) -> Result<u8> {
        if bytes.is_empty() {
            return Ok(1);
        }
        if bytes.len() > MAX_NAME_LENGTH {
            return Err(Error::NameTooLong { length: bytes.len() });
        }

        let mut pos = 0;
        let mut labels = 0u8;

        loop {
            if pos >= bytes.len() {
                return Err(Error::unexpected_eof(pos));
            }

            let len = bytes[pos] as usize;

            if len == 0 {
                labels += 1;
                if pos + 1 != bytes.len() {
                    return Err(Error::invalid_data(pos, "data after root label"));
                }
                break;
            }

            // Pointers are not allowed in stored names
            if len > MAX_LABEL_LENGTH {
                return Err(Error::invalid_data(pos, "length byte is not a plain label"));
            }

            pos += 1 + len;
            labels += 1;
        }

        Ok(labels)
    }

    /// Returns the wire format representation (without a leading root byte
    /// for the root name; see [`Name::write_wire`]).
    #[inline]
    pub fn as_wire(&self) -> &[u8] {
        &self.wire
    }

    /// Returns the wire format length (including the terminating zero).
    #[inline]
    pub fn wire_len(&self) -> usize {
        self.wire.len().max(1)
    }

    /// Returns the number of labels in the name (including root).
    #[inline]
    pub const fn label_count(&self) -> usize {
        self.label_count as usize
    }

    /// Returns true if this is the root domain.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.wire.is_empty() || (self.wire.len() == 1 && self.wire[0] == 0)
    }

    /// Returns true if the name consists of a single label.
    #[inline]
    pub fn is_single_label(&self) -> bool {
        self.label_count == 2
    }

    /// Returns an iterator over the labels in the name.
    #[inline]
    pub fn labels(&self) -> LabelIter<'_> {
        LabelIter::new(&self.wire)
    }

    /// Returns the label at the given index (0 = leftmost label).
    pub fn label(&self, index: usize) -> Option<Label<'_>> {
        self.labels().nth(index)
    }

    /// Returns the rightmost non-root label, if any.
    pub fn terminal_label(&self) -> Option<Label<'_>> {
        let mut last = None;
        for label in self.labels() {
            if !label.is_root() {
                last = Some(label);
            }
        }
        last
    }

    /// Returns the parent domain (removes the leftmost label).
    ///
    /// Returns `None` for the root domain.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }

        let first_label_len = self.wire[0] as usize;
        let parent_start = 1 + first_label_len;
        if parent_start >= self.wire.len() {
            return Some(Self::root());
        }

        Self::from_wire(&self.wire[parent_start..]).ok()
    }

    /// Returns the subdomain formed by prepending a label.
    ///
    /// The label is sanitized the same way text parsing sanitizes it.
    pub fn prepend_label(&self, label: impl AsRef<[u8]>) -> Result<Self> {
        let label = sanitize_label(label.as_ref());
        if label.is_empty() {
            return Err(Error::invalid_data(0, "empty label"));
        }

        let new_len = 1 + label.len() + self.wire_len();
        if new_len > MAX_NAME_LENGTH {
            return Err(Error::NameTooLong { length: new_len });
        }

        let mut wire = SmallVec::with_capacity(new_len);
        wire.push(label.len() as u8);
        wire.extend_from_slice(&label);

        if self.wire.is_empty() {
            wire.push(0);
        } else {
            wire.extend_from_slice(&self.wire);
        }

        Ok(Self {
            wire,
            label_count: self.label_count.saturating_add(1),
        })
    }

    /// Appends `suffix` to this name (`printer` + `local` = `printer.local`).
    pub fn join(&self, suffix: &Name) -> Result<Self> {
        if self.is_root() {
            return Ok(suffix.clone());
        }
        if suffix.is_root() {
            return Ok(self.clone());
        }

        // Both non-root: strip our terminating zero, append the suffix wire
        let new_len = self.wire.len() - 1 + suffix.wire.len();
        if new_len > MAX_NAME_LENGTH {
            return Err(Error::NameTooLong { length: new_len });
        }

        let mut wire = SmallVec::with_capacity(new_len);
        wire.extend_from_slice(&self.wire[..self.wire.len() - 1]);
        wire.extend_from_slice(&suffix.wire);

        Ok(Self {
            wire,
            label_count: self
                .label_count
                .saturating_add(suffix.label_count)
                .saturating_sub(1),
        })
    }

    /// Returns true if this name is a subdomain of (or equal to) `other`.
    pub fn is_subdomain_of(&self, other: &Name) -> bool {
        if self.label_count() < other.label_count() {
            return false;
        }

        let self_labels: Vec<_> = self.labels().collect();
        let other_labels: Vec<_> = other.labels().collect();

        for (i, other_label) in other_labels.iter().rev().enumerate() {
            let self_idx = self_labels.len() - 1 - i;
            if !self_labels[self_idx].eq_ignore_ascii_case(other_label) {
                return false;
            }
        }

        true
    }

    /// Builds the reverse-mapping name for an IP address.
    ///
    /// IPv4 addresses map under `in-addr.arpa`, IPv6 addresses expand to
    /// 32 reversed nybble labels under `ip6.arpa` (RFC 1035 Section 3.5,
    /// RFC 3596 Section 2.5).
    pub fn from_reverse_ip(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(v4) => Self::from_reverse_ipv4(v4),
            IpAddr::V6(v6) => Self::from_reverse_ipv6(v6),
        }
    }

    fn from_reverse_ipv4(ip: Ipv4Addr) -> Self {
        let octets = ip.octets();
        let mut wire = SmallVec::new();
        let mut labels = 0u8;

        for octet in octets.iter().rev() {
            let text = itoa(*octet);
            wire.push(text.len() as u8);
            wire.extend_from_slice(text.as_bytes());
            labels += 1;
        }
        for tail in ["in-addr", "arpa"] {
            wire.push(tail.len() as u8);
            wire.extend_from_slice(tail.as_bytes());
            labels += 1;
        }
        wire.push(0);

        Self {
            wire,
            label_count: labels + 1,
        }
    }

    fn from_reverse_ipv6(ip: Ipv6Addr) -> Self {
        const HEX: &[u8; 16] = b"0123456789abcdef";
        let octets = ip.octets();
        let mut wire = SmallVec::new();
        let mut labels = 0u8;

        for octet in octets.iter().rev() {
            // Low nybble first, per RFC 3596
            wire.push(1);
            wire.push(HEX[(octet & 0x0F) as usize]);
            wire.push(1);
            wire.push(HEX[(octet >> 4) as usize]);
            labels += 2;
        }
        for tail in ["ip6", "arpa"] {
            wire.push(tail.len() as u8);
            wire.extend_from_slice(tail.as_bytes());
            labels += 1;
        }
        wire.push(0);

        Self {
            wire,
            label_count: labels + 1,
        }
    }

    /// Converts to a string representation (allocates).
    pub fn to_string_representation(&self) -> CompactString {
        let mut result = CompactString::new("");

        for label in self.labels() {
            if !label.is_root() {
                result.push_str(&label.to_string());
                result.push('.');
            }
        }

        if result.is_empty() {
            result.push('.');
        }

        result
    }

    /// Converts the name to lowercase in place.
    pub fn to_lowercase(&mut self) {
        for byte in self.wire.iter_mut() {
            if byte.is_ascii_uppercase() {
                *byte = byte.to_ascii_lowercase();
            }
        }
    }

    /// Returns a lowercased copy of the name.
    #[must_use]
    pub fn lowercased(&self) -> Self {
        let mut copy = self.clone();
        copy.to_lowercase();
        copy
    }

    /// Writes the name in wire format to a buffer.
    ///
    /// No compression is performed; names are always written in full.
    pub fn write_wire(&self, buf: &mut bytes::BytesMut) {
        if self.wire.is_empty() {
            buf.extend_from_slice(&[0]);
        } else {
            buf.extend_from_slice(&self.wire);
        }
    }
}

/// Drops control bytes and 0x7E, then truncates to the label limit.
fn sanitize_label(raw: &[u8]) -> SmallVec<[u8; 64]> {
    let mut out: SmallVec<[u8; 64]> = raw
        .iter()
        .copied()
        .filter(|&b| b > 0x1F && b != 0x7E)
        .collect();
    out.truncate(MAX_LABEL_LENGTH);
    out
}

impl FromStr for Name {
    type Err = Error;

    /// Parses a domain name from its dotted text form.
    ///
    /// A trailing dot is accepted and implied when absent. Escapes are
    /// honored: `\NN` with two hex digits decodes to a single byte, and
    /// `\c` passes `c` through literally (so `First\ Floor._http._tcp`
    /// keeps its embedded space out of the label separator logic).
    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() || s == "." {
            return Ok(Self::root());
        }

        let bytes = s.as_bytes();
        let mut wire = SmallVec::<[u8; 64]>::new();
        let mut label_count = 0u8;
        let mut current: SmallVec<[u8; 64]> = SmallVec::new();
        let mut i = 0;

        let mut flush = |current: &mut SmallVec<[u8; 64]>,
                         wire: &mut SmallVec<[u8; 64]>,
                         label_count: &mut u8|
         -> Result<()> {
            let label = sanitize_label(current);
            if label.is_empty() {
                return Err(Error::invalid_data(0, "empty label"));
            }
            wire.push(label.len() as u8);
            wire.extend_from_slice(&label);
            *label_count += 1;
            current.clear();
            Ok(())
        };

        while i < bytes.len() {
            match bytes[i] {
                b'\\' if i + 1 < bytes.len() => {
                    let next = bytes[i + 1];
                    if i + 2 < bytes.len()
                        && next.is_ascii_hexdigit()
                        && bytes[i + 2].is_ascii_hexdigit()
                    {
                        let hi = (next as char).to_digit(16).unwrap() as u8;
                        let lo = (bytes[i + 2] as char).to_digit(16).unwrap() as u8;
                        current.push(hi << 4 | lo);
                        i += 3;
                    } else {
                        current.push(next);
                        i += 2;
                    }
                }
                b'.' => {
                    // Trailing dot ends the name
                    if i + 1 == bytes.len() {
                        i += 1;
                        break;
                    }
                    flush(&mut current, &mut wire, &mut label_count)?;
                    i += 1;
                }
                b => {
                    current.push(b);
                    i += 1;
                }
            }
        }

        if !current.is_empty() {
            flush(&mut current, &mut wire, &mut label_count)?;
        }

        wire.push(0);
        label_count += 1;

        if wire.len() > MAX_NAME_LENGTH {
            return Err(Error::NameTooLong { length: wire.len() });
        }

        Ok(Self { wire, label_count })
    }
}

/// Small-integer to string without pulling in formatting machinery.
fn itoa(v: u8) -> CompactString {
    let mut s = CompactString::new("");
    if v >= 100 {
        s.push((b'0' + v / 100) as char);
    }
    if v >= 10 {
        s.push((b'0' + (v / 10) % 10) as char);
    }
    s.push((b'0' + v % 10) as char);
    s
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_representation())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name(\"{self}\")")
    }
}

impl PartialEq for Name {
    /// Case-insensitive comparison per DNS semantics.
    fn eq(&self, other: &Self) -> bool {
        if self.label_count != other.label_count {
            return false;
        }

        self.labels()
            .zip(other.labels())
            .all(|(a, b)| a.eq_ignore_ascii_case(&b))
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for label in self.labels() {
            let lower: SmallVec<[u8; 64]> = label
                .as_bytes()
                .iter()
                .map(|b| b.to_ascii_lowercase())
                .collect();
            lower.hash(state);
        }
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Name {
    /// Case-insensitive ordering from the root side.
    fn cmp(&self, other: &Self) -> Ordering {
        let self_labels: Vec<_> = self.labels().collect();
        let other_labels: Vec<_> = other.labels().collect();

        let mut i = self_labels.len();
        let mut j = other_labels.len();

        while i > 0 && j > 0 {
            i -= 1;
            j -= 1;

            let cmp = self_labels[i].cmp_canonical(&other_labels[j]);
            if cmp != Ordering::Equal {
                return cmp;
            }
        }

        self_labels.len().cmp(&other_labels.len())
    }
}

impl Default for Name {
    fn default() -> Self {
        Self::root()
    }
}

impl Serialize for Name {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_name() {
        let root = Name::root();
        assert!(root.is_root());
        assert_eq!(root.label_count(), 1);
        assert_eq!(root.to_string(), ".");
    }

    #[test]
    fn test_name_parsing() {
        let name = Name::from_str("www.example.com.").unwrap();
        assert!(!name.is_root());
        assert_eq!(name.label_count(), 4);
        assert_eq!(name.to_string(), "www.example.com.");

        let name2 = Name::from_str("www.example.com").unwrap();
        assert_eq!(name, name2);
    }

    #[test]
    fn test_case_insensitive_comparison() {
        let lower = Name::from_str("printer.local").unwrap();
        let upper = Name::from_str("PRINTER.LOCAL").unwrap();

        assert_eq!(lower, upper);

        use std::collections::hash_map::DefaultHasher;
        let mut h1 = DefaultHasher::new();
        let mut h2 = DefaultHasher::new();
        lower.hash(&mut h1);
        upper.hash(&mut h2);
        assert_eq!(h1.finish(), h2.finish());
    }

    #[test]
    fn test_escape_parsing() {
        // \20 is a hex escape for a space byte
        let name = Name::from_str("My\\20Printer._ipp._tcp.local").unwrap();
        assert_eq!(name.label(0).unwrap().as_bytes(), b"My Printer");

        // \. keeps a literal dot inside a label
        let name = Name::from_str("a\\.b.local").unwrap();
        assert_eq!(name.label(0).unwrap().as_bytes(), b"a.b");
        assert_eq!(name.label_count(), 3);
    }

    #[test]
    fn test_label_sanitization() {
        // Control bytes and 0x7E are dropped at construction
        let name = Name::from_str("ho\u{1}st\u{7e}").unwrap();
        assert_eq!(name.label(0).unwrap().as_bytes(), b"host");

        // Oversized labels are truncated to 63 bytes
        let long = "a".repeat(80);
        let name = Name::from_str(&long).unwrap();
        assert_eq!(name.label(0).unwrap().len(), 63);
    }

    #[test]
    fn test_parent() {
        let name = Name::from_str("www.example.com").unwrap();

        let parent1 = name.parent().unwrap();
        assert_eq!(parent1.to_string(), "example.com.");

        let parent2 = parent1.parent().unwrap();
        assert_eq!(parent2.to_string(), "com.");

        let parent3 = parent2.parent().unwrap();
        assert!(parent3.is_root());

        assert!(parent3.parent().is_none());
    }

    #[test]
    fn test_join() {
        let host = Name::from_str("printer").unwrap();
        let domain = Name::from_str("local").unwrap();
        let joined = host.join(&domain).unwrap();
        assert_eq!(joined.to_string(), "printer.local.");
        assert_eq!(joined.label_count(), 3);
    }

    #[test]
    fn test_subdomain_check() {
        let name = Name::from_str("web._http._tcp.local").unwrap();
        let parent = Name::from_str("_http._tcp.local").unwrap();
        let other = Name::from_str("_ipp._tcp.local").unwrap();

        assert!(name.is_subdomain_of(&parent));
        assert!(name.is_subdomain_of(&name));
        assert!(!parent.is_subdomain_of(&name));
        assert!(!name.is_subdomain_of(&other));
    }

    #[test]
    fn test_reverse_ipv4() {
        let name = Name::from_reverse_ip(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 5)));
        assert_eq!(name.to_string(), "5.2.0.192.in-addr.arpa.");

        let labels: Vec<String> = name
            .labels()
            .filter(|l| !l.is_root())
            .map(|l| l.to_string())
            .collect();
        assert_eq!(labels, vec!["5", "2", "0", "192", "in-addr", "arpa"]);
    }

    #[test]
    fn test_reverse_ipv6() {
        let name = Name::from_reverse_ip(IpAddr::V6(Ipv6Addr::LOCALHOST));
        // ::1 -> 31 zero nybbles then 1
        assert!(name.to_string().starts_with("1.0.0.0."));
        assert!(name.to_string().ends_with(".ip6.arpa."));
        // 32 nybbles + ip6 + arpa + root
        assert_eq!(name.label_count(), 35);
    }

    #[test]
    fn test_terminal_label() {
        let name = Name::from_str("printer.local").unwrap();
        assert_eq!(name.terminal_label().unwrap().as_bytes(), b"local");
        assert!(Name::root().terminal_label().is_none());
    }

    #[test]
    fn test_single_label() {
        assert!(Name::from_str("myhost").unwrap().is_single_label());
        assert!(!Name::from_str("myhost.lan").unwrap().is_single_label());
        assert!(!Name::root().is_single_label());
    }
}

//! Private-namespace leak guard.
//!
//! Questions for `.local` names or bare single-label hosts describe the
//! local site; sending them to a public resolver discloses internal
//! naming for no benefit. The guard restricts such questions to
//! nameservers whose own address is private.

use std::net::IpAddr;
use verdin_proto::Question;

/// Returns true if the question targets the private namespace: the
/// owner's terminal label is `local`, or the owner is a single label.
pub fn is_private_question(question: &Question) -> bool {
    if question.qname.is_single_label() {
        return true;
    }
    question
        .qname
        .terminal_label()
        .is_some_and(|label| label.as_bytes().eq_ignore_ascii_case(b"local"))
}

/// Returns true if `ip` lies in a private, link-local, site-local,
/// unique-local, or loopback range.
pub fn is_private_address(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback() || v4.is_private() || v4.is_link_local()
        }
        IpAddr::V6(v6) => {
            if v6.is_loopback() {
                return true;
            }
            let seg0 = v6.segments()[0];
            // Unique-local fc00::/7
            (seg0 & 0xFE00) == 0xFC00
                // Link-local fe80::/10
                || (seg0 & 0xFFC0) == 0xFE80
                // Deprecated site-local fec0::/10
                || (seg0 & 0xFFC0) == 0xFEC0
        }
    }
}

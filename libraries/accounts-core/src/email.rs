//! Email address normalization and validation.
//!
//! Normalization only lowercases the domain: the local part of an address is
//! case-sensitive as far as the store is concerned.

use std::net::{Ipv4Addr, Ipv6Addr};

/// Characters allowed in an unquoted local part besides ASCII alphanumerics
const LOCAL_SPECIALS: &str = "!#$%&'*+-/=?^_`{|}~";

/// Lowercase the domain portion of an email address.
///
/// Addresses without an `@` are returned unchanged. Whitespace is never
/// touched; callers trim input before normalizing.
pub fn normalize(email: &str) -> String {
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Check that `email` is a syntactically valid address.
///
/// Accepts dot-atom local parts, dotted hostnames whose last label is at least
/// two characters, `localhost`, and bracketed IP literals.
pub fn is_valid(email: &str) -> bool {
    if email.is_empty() || email.len() > 320 {
        return false;
    }

    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };

    is_valid_local_part(local) && is_valid_domain(domain)
}

fn is_valid_local_part(local: &str) -> bool {
    !local.is_empty()
        && local.split('.').all(|atom| {
            !atom.is_empty()
                && atom
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || LOCAL_SPECIALS.contains(c))
        })
}

fn is_valid_domain(domain: &str) -> bool {
    if domain.eq_ignore_ascii_case("localhost") {
        return true;
    }

    if let Some(literal) = domain.strip_prefix('[').and_then(|d| d.strip_suffix(']')) {
        return is_ip_literal(literal);
    }

    let labels: Vec<&str> = domain.split('.').collect();
    let Some((tld, hosts)) = labels.split_last() else {
        return false;
    };

    if hosts.is_empty() {
        return false;
    }

    hosts.iter().all(|label| is_valid_label(label, 1)) && is_valid_label(tld, 2)
}

fn is_valid_label(label: &str, min_len: usize) -> bool {
    (min_len..=63).contains(&label.len())
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

fn is_ip_literal(literal: &str) -> bool {
    match literal.strip_prefix("IPv6:") {
        Some(v6) => v6.parse::<Ipv6Addr>().is_ok(),
        None => literal.parse::<Ipv4Addr>().is_ok(),
    }
}

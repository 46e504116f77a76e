//! Hostname verification against subjectAltName entries.
//!
//! Rules:
//! - no host to check always matches
//! - DNS comparison is ASCII case-insensitive and ignores one trailing dot
//! - a wildcard is only accepted as the whole left-most label (`*.example.org`)
//!   and covers exactly one label; it never matches the bare parent domain
//! - a host containing `*` never matches
//! - IP literals only match `iPAddress` entries
//! - URI entries never satisfy a host check
//! - there is no fallback to the subject common name

use std::net::IpAddr;

use servertrust_core::{Certificate, SubjectAltName};

/// Whether `certificate` is valid for `host`.
pub fn matches(certificate: &Certificate, host: Option<&str>) -> bool {
    let Some(host) = host else {
        return true;
    };
    let host = normalize(host);
    if host.is_empty() {
        return false;
    }

    let literal = host.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = literal.parse::<IpAddr>() {
        return certificate
            .subject_alt_names()
            .iter()
            .any(|san| matches!(san, SubjectAltName::Ip(addr) if *addr == ip));
    }

    // A wildcard in the requested name is never a literal match.
    if host.contains('*') {
        return false;
    }

    certificate.subject_alt_names().iter().any(|san| match san {
        SubjectAltName::Dns(pattern) => dns_name_matches(pattern, &host),
        SubjectAltName::Uri(_) | SubjectAltName::Ip(_) => false,
    })
}

/// Lowercase and drop a single trailing dot.
pub(crate) fn normalize(host: &str) -> String {
    host.strip_suffix('.').unwrap_or(host).to_ascii_lowercase()
}

fn dns_name_matches(pattern: &str, host: &str) -> bool {
    let pattern = normalize(pattern);

    let Some(suffix) = pattern.strip_prefix("*.") else {
        return !pattern.contains('*') && pattern == host;
    };

    // `*.org` would cover a whole TLD.
    let labels: Vec<&str> = suffix.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty() || l.contains('*')) {
        return false;
    }

    match host.split_once('.') {
        Some((label, rest)) => !label.is_empty() && rest == suffix,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{pki, HOST};

    #[test]
    fn null_host_always_matches() {
        let pki = pki();
        assert!(matches(&pki.leaf_missing_dns_name_and_uri, None));
        assert!(matches(&pki.leaf_valid_uri, None));
    }

    #[test]
    fn exact_dns_name() {
        let leaf = &pki().leaf_valid_dns_name;
        assert!(matches(leaf, Some(HOST)));
        assert!(matches(leaf, Some("TEST.Example.ORG")));
        assert!(matches(leaf, Some("test.example.org.")));
        assert!(!matches(leaf, Some("other.example.org")));
        assert!(!matches(leaf, Some("example.org")));
        assert!(!matches(leaf, Some("")));
    }

    #[test]
    fn wildcard_covers_one_label() {
        let leaf = &pki().leaf_wildcard;
        assert!(matches(leaf, Some("test.example.org")));
        assert!(matches(leaf, Some("foo.example.org")));
        assert!(!matches(leaf, Some("example.org")));
        assert!(!matches(leaf, Some("a.b.example.org")));
        assert!(!matches(leaf, Some("test.example.com")));
    }

    #[test]
    fn wildcard_host_never_matches() {
        let pki = pki();
        assert!(!matches(&pki.leaf_wildcard, Some("*.example.org")));
        assert!(!matches(&pki.leaf_wildcard, Some("*.EXAMPLE.org.")));
        assert!(!matches(&pki.leaf_valid_dns_name, Some("*.example.org")));
    }

    #[test]
    fn wildcard_pattern_rules() {
        assert!(dns_name_matches("*.example.org", "a.example.org"));
        assert!(!dns_name_matches("*.org", "example.org"));
        assert!(!dns_name_matches("f*.example.org", "foo.example.org"));
        assert!(!dns_name_matches("*.*.example.org", "a.b.example.org"));
        assert!(!dns_name_matches("*", "localhost"));
    }

    #[test]
    fn any_of_multiple_names() {
        let leaf = &pki().leaf_multiple_dns_names;
        assert!(matches(leaf, Some("test.example.com")));
        assert!(matches(leaf, Some("test.example.org")));
        assert!(matches(leaf, Some("blog.example.com")));
        assert!(!matches(leaf, Some("www.example.org")));
    }

    #[test]
    fn uri_and_missing_names_never_match_a_host() {
        let pki = pki();
        assert!(!matches(&pki.leaf_valid_uri, Some(HOST)));
        assert!(!matches(&pki.leaf_missing_dns_name_and_uri, Some(HOST)));
        assert!(matches(&pki.leaf_dns_name_and_uri, Some(HOST)));
    }

    #[test]
    fn ip_hosts_match_ip_entries_only() {
        let leaf = &pki().leaf_ip_address;
        assert!(matches(leaf, Some("192.0.2.10")));
        assert!(matches(leaf, Some("[2001:db8::1]")));
        assert!(!matches(leaf, Some("192.0.2.11")));
        assert!(!matches(&pki().leaf_valid_dns_name, Some("192.0.2.10")));
    }
}

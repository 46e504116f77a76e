//! Trust anchor sets.

use std::collections::HashSet;

use super::Certificate;

/// Root certificates considered authoritative.
///
/// Duplicates (by DER) are ignored on insertion. Issuer lookup is by the
/// DER-encoded subject name.
#[derive(Debug, Clone, Default)]
pub struct TrustAnchors {
    certificates: Vec<Certificate>,
    seen: HashSet<Certificate>,
}

impl TrustAnchors {
    /// An empty anchor set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an anchor. Returns false if it was already present.
    pub fn add(&mut self, certificate: Certificate) -> bool {
        if self.seen.insert(certificate.clone()) {
            self.certificates.push(certificate);
            true
        } else {
            false
        }
    }

    /// Whether `certificate` is itself an anchor (byte-exact)
    #[must_use]
    pub fn contains(&self, certificate: &Certificate) -> bool {
        self.seen.contains(certificate)
    }

    /// Anchors whose subject matches the given DER-encoded issuer name
    pub fn with_subject<'a>(
        &'a self,
        issuer_raw: &'a [u8],
    ) -> impl Iterator<Item = &'a Certificate> + 'a {
        self.certificates
            .iter()
            .filter(move |anchor| anchor.subject_raw() == issuer_raw)
    }

    /// Number of anchors
    #[must_use]
    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    /// Whether the set is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    /// Iterate anchors in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, Certificate> {
        self.certificates.iter()
    }
}

impl FromIterator<Certificate> for TrustAnchors {
    fn from_iter<I: IntoIterator<Item = Certificate>>(iter: I) -> Self {
        let mut anchors = Self::new();
        anchors.extend(iter);
        anchors
    }
}

impl Extend<Certificate> for TrustAnchors {
    fn extend<I: IntoIterator<Item = Certificate>>(&mut self, iter: I) {
        for certificate in iter {
            self.add(certificate);
        }
    }
}

impl<'a> IntoIterator for &'a TrustAnchors {
    type Item = &'a Certificate;
    type IntoIter = std::slice::Iter<'a, Certificate>;

    fn into_iter(self) -> Self::IntoIter {
        self.certificates.iter()
    }
}

//! Pin sets for certificate and public key pinning.

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

use servertrust_core::{Certificate, ConfigError, PublicKey};

/// Something a presented certificate can be matched against.
pub trait Pin: Clone + Eq + Hash + fmt::Debug + Send + Sync {
    /// Human-readable kind used in configuration errors
    const KIND: &'static str;

    /// The part of `certificate` compared against pins of this type
    fn pin_of(certificate: &Certificate) -> &Self;

    /// The pin as a trust anchor, if it can serve as one
    fn as_anchor(&self) -> Option<&Certificate>;
}

impl Pin for Certificate {
    const KIND: &'static str = "pinned certificates";

    fn pin_of(certificate: &Certificate) -> &Self {
        certificate
    }

    fn as_anchor(&self) -> Option<&Certificate> {
        Some(self)
    }
}

impl Pin for PublicKey {
    const KIND: &'static str = "pinned public keys";

    fn pin_of(certificate: &Certificate) -> &Self {
        certificate.public_key()
    }

    fn as_anchor(&self) -> Option<&Certificate> {
        None
    }
}

/// A non-empty, de-duplicated set of pins.
#[derive(Debug, Clone)]
pub struct PinSet<P: Pin> {
    ordered: Vec<P>,
    lookup: HashSet<P>,
}

impl<P: Pin> PinSet<P> {
    /// Collect pins, dropping duplicates.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::EmptyPinSet` if no pin was supplied.
    pub fn new(pins: impl IntoIterator<Item = P>) -> Result<Self, ConfigError> {
        let mut ordered = Vec::new();
        let mut lookup = HashSet::new();
        for pin in pins {
            if lookup.insert(pin.clone()) {
                ordered.push(pin);
            }
        }
        if ordered.is_empty() {
            return Err(ConfigError::EmptyPinSet { kind: P::KIND });
        }
        Ok(Self { ordered, lookup })
    }

    /// First certificate in `chain` matching any pin
    pub fn first_match<'a>(&self, chain: &'a [Certificate]) -> Option<&'a Certificate> {
        chain.iter().find(|c| self.lookup.contains(P::pin_of(c)))
    }

    /// Whether any certificate in `chain` matches any pin
    pub fn matches_any(&self, chain: &[Certificate]) -> bool {
        self.first_match(chain).is_some()
    }

    /// Number of distinct pins
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Pins in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, P> {
        self.ordered.iter()
    }
}

impl<'a, P: Pin> IntoIterator for &'a PinSet<P> {
    type Item = &'a P;
    type IntoIter = std::slice::Iter<'a, P>;

    fn into_iter(self) -> Self::IntoIter {
        self.ordered.iter()
    }
}

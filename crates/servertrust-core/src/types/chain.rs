//! Presented and resolved certificate chains.

use std::ops::Deref;

use super::Certificate;
use crate::error::InputError;

/// Return the leaf (index 0) of a presented chain.
///
/// # Errors
///
/// Returns `InputError::EmptyChain` when the chain holds no certificate.
pub fn leaf_of(chain: &[Certificate]) -> Result<&Certificate, InputError> {
    chain.first().ok_or(InputError::EmptyChain)
}

/// A validated path, ordered leaf first and ending at a trust anchor.
///
/// The path may be shorter than the presented chain (when an intermediate is
/// itself an anchor) or longer (when the anchor was supplied by the anchor
/// set rather than by the peer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedChain {
    certificates: Vec<Certificate>,
}

impl ResolvedChain {
    /// Wrap a path built by a verifier.
    ///
    /// # Errors
    ///
    /// Returns `InputError::EmptyChain` if `certificates` is empty.
    pub fn new(certificates: Vec<Certificate>) -> Result<Self, InputError> {
        if certificates.is_empty() {
            return Err(InputError::EmptyChain);
        }
        Ok(Self { certificates })
    }

    /// The end-entity certificate
    #[must_use]
    pub fn leaf(&self) -> &Certificate {
        &self.certificates[0]
    }

    /// The trust anchor that terminates the path
    #[must_use]
    pub fn anchor(&self) -> &Certificate {
        &self.certificates[self.certificates.len() - 1]
    }

    /// Certificates leaf first
    #[must_use]
    pub fn certificates(&self) -> &[Certificate] {
        &self.certificates
    }

    /// Consume into the underlying vector
    #[must_use]
    pub fn into_certificates(self) -> Vec<Certificate> {
        self.certificates
    }
}

impl Deref for ResolvedChain {
    type Target = [Certificate];

    fn deref(&self) -> &Self::Target {
        &self.certificates
    }
}

impl<'a> IntoIterator for &'a ResolvedChain {
    type Item = &'a Certificate;
    type IntoIter = std::slice::Iter<'a, Certificate>;

    fn into_iter(self) -> Self::IntoIter {
        self.certificates.iter()
    }
}

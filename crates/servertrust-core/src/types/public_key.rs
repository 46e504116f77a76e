//! Subject public keys extracted from certificates.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use x509_parser::prelude::*;

use crate::error::InputError;
use crate::hash::sha256_base64;

/// An asymmetric public key.
///
/// Identity is the key material plus its algorithm OID, independent of the
/// certificate that carried it: a reissued certificate with the same key
/// yields an equal `PublicKey`.
#[derive(Clone)]
pub struct PublicKey {
    inner: Arc<Inner>,
}

struct Inner {
    spki: Vec<u8>,
    algorithm: String,
    material: Vec<u8>,
}

impl PublicKey {
    pub(crate) fn from_spki(spki: &SubjectPublicKeyInfo<'_>) -> Self {
        Self {
            inner: Arc::new(Inner {
                spki: spki.raw.to_vec(),
                algorithm: spki.algorithm.algorithm.to_id_string(),
                material: spki.subject_public_key.data.to_vec(),
            }),
        }
    }

    /// Parse a DER-encoded `SubjectPublicKeyInfo`.
    ///
    /// # Errors
    ///
    /// Returns `InputError::MalformedPublicKey` if the bytes do not decode.
    pub fn from_spki_der(der: &[u8]) -> Result<Self, InputError> {
        let (rest, spki) =
            SubjectPublicKeyInfo::from_der(der).map_err(|e| InputError::MalformedPublicKey {
                reason: e.to_string(),
            })?;
        if !rest.is_empty() {
            return Err(InputError::MalformedPublicKey {
                reason: format!("{} trailing bytes after key", rest.len()),
            });
        }
        Ok(Self::from_spki(&spki))
    }

    /// DER encoding of the full `SubjectPublicKeyInfo`
    #[must_use]
    pub fn spki_der(&self) -> &[u8] {
        &self.inner.spki
    }

    /// Algorithm OID in dotted notation
    #[must_use]
    pub fn algorithm_oid(&self) -> &str {
        &self.inner.algorithm
    }

    /// Exported key bytes (the `subjectPublicKey` bit string contents)
    #[must_use]
    pub fn key_material(&self) -> &[u8] {
        &self.inner.material
    }

    /// Base64 SHA-256 of the SPKI, the `pin-sha256` form
    #[must_use]
    pub fn spki_sha256_base64(&self) -> String {
        sha256_base64(&self.inner.spki)
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.inner.algorithm == other.inner.algorithm
            && self.inner.material == other.inner.material
    }
}

impl Eq for PublicKey {}

impl Hash for PublicKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.algorithm.hash(state);
        self.inner.material.hash(state);
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("algorithm", &self.algorithm_oid())
            .field("pin_sha256", &self.spki_sha256_base64())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Certificate;
    use rcgen::{CertificateParams, KeyPair};

    fn issue(key: &KeyPair, name: &str) -> Certificate {
        let params = CertificateParams::new(vec![name.to_string()]).unwrap();
        let cert = params.self_signed(key).unwrap();
        Certificate::from_der(cert.der().to_vec()).unwrap()
    }

    #[test]
    fn reissued_certificate_keeps_key_identity() {
        let key = KeyPair::generate().unwrap();
        let first = issue(&key, "a.example.org");
        let second = issue(&key, "b.example.org");

        assert_ne!(first, second);
        assert_eq!(first.public_key(), second.public_key());
    }

    #[test]
    fn different_keys_differ() {
        let a = issue(&KeyPair::generate().unwrap(), "a.example.org");
        let b = issue(&KeyPair::generate().unwrap(), "a.example.org");
        assert_ne!(a.public_key(), b.public_key());
    }

    #[test]
    fn parses_bare_spki() {
        let key = KeyPair::generate().unwrap();
        let cert = issue(&key, "a.example.org");
        let parsed = PublicKey::from_spki_der(&key.public_key_der()).unwrap();

        assert_eq!(&parsed, cert.public_key());
        assert_eq!(parsed.spki_der(), cert.public_key().spki_der());
        assert_eq!(parsed.algorithm_oid(), "1.2.840.10045.2.1");
    }

    #[test]
    fn rejects_malformed_spki() {
        assert!(matches!(
            PublicKey::from_spki_der(b"not a key"),
            Err(InputError::MalformedPublicKey { .. })
        ));
    }
}

//! Parsed X.509 certificate handle.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use x509_parser::extensions::GeneralName;
use x509_parser::prelude::*;

use super::PublicKey;
use crate::error::InputError;
use crate::hash::sha256_hex;

/// A Subject Alternative Name entry relevant to host matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum SubjectAltName {
    /// `dNSName`, possibly with a leading `*.` wildcard label
    Dns(String),
    /// `uniformResourceIdentifier`
    Uri(String),
    /// `iPAddress`
    Ip(IpAddr),
}

impl SubjectAltName {
    fn from_general_name(name: &GeneralName<'_>) -> Option<Self> {
        match name {
            GeneralName::DNSName(dns) => Some(Self::Dns((*dns).to_string())),
            GeneralName::URI(uri) => Some(Self::Uri((*uri).to_string())),
            GeneralName::IPAddress(bytes) => ip_from_octets(bytes).map(Self::Ip),
            _ => None,
        }
    }
}

fn ip_from_octets(bytes: &[u8]) -> Option<IpAddr> {
    if let Ok(v4) = <[u8; 4]>::try_from(bytes) {
        return Some(IpAddr::V4(Ipv4Addr::from(v4)));
    }
    <[u8; 16]>::try_from(bytes)
        .ok()
        .map(|v6| IpAddr::V6(Ipv6Addr::from(v6)))
}

/// An immutable DER-encoded X.509 certificate.
///
/// The bytes are parsed once on construction; the fields the engine needs
/// are kept alongside the DER. Cloning is cheap.
///
/// Equality and hashing are byte-exact over the DER encoding, which is the
/// identity used for certificate pinning.
#[derive(Clone)]
pub struct Certificate {
    inner: Arc<Inner>,
}

struct Inner {
    der: Vec<u8>,
    fields: Fields,
}

struct Fields {
    subject: String,
    issuer: String,
    subject_raw: Vec<u8>,
    issuer_raw: Vec<u8>,
    serial: Vec<u8>,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
    is_ca: bool,
    path_len_constraint: Option<u32>,
    server_auth: Option<bool>,
    subject_alt_names: Vec<SubjectAltName>,
    public_key: PublicKey,
}

impl Certificate {
    /// Parse a single DER-encoded X.509 certificate.
    ///
    /// # Errors
    ///
    /// Returns `InputError::MalformedCertificate` if the bytes are not a
    /// complete, decodable certificate.
    pub fn from_der(der: impl Into<Vec<u8>>) -> Result<Self, InputError> {
        let der = der.into();
        let fields = parse_fields(&der)?;
        Ok(Self {
            inner: Arc::new(Inner { der, fields }),
        })
    }

    /// Raw DER encoding
    #[must_use]
    pub fn as_der(&self) -> &[u8] {
        &self.inner.der
    }

    /// Subject distinguished name (human-readable)
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.inner.fields.subject
    }

    /// Issuer distinguished name (human-readable)
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.inner.fields.issuer
    }

    /// DER encoding of the subject name, used for issuer lookup
    #[must_use]
    pub fn subject_raw(&self) -> &[u8] {
        &self.inner.fields.subject_raw
    }

    /// DER encoding of the issuer name, used for issuer lookup
    #[must_use]
    pub fn issuer_raw(&self) -> &[u8] {
        &self.inner.fields.issuer_raw
    }

    /// Serial number bytes as encoded
    #[must_use]
    pub fn serial(&self) -> &[u8] {
        &self.inner.fields.serial
    }

    /// Serial number (hex)
    #[must_use]
    pub fn serial_hex(&self) -> String {
        hex::encode(&self.inner.fields.serial)
    }

    /// Not valid before
    #[must_use]
    pub fn not_before(&self) -> DateTime<Utc> {
        self.inner.fields.not_before
    }

    /// Not valid after
    #[must_use]
    pub fn not_after(&self) -> DateTime<Utc> {
        self.inner.fields.not_after
    }

    /// Whether the certificate has expired at `at`
    #[must_use]
    pub fn is_expired_at(&self, at: DateTime<Utc>) -> bool {
        at > self.inner.fields.not_after
    }

    /// Whether the certificate is not yet valid at `at`
    #[must_use]
    pub fn is_not_yet_valid_at(&self, at: DateTime<Utc>) -> bool {
        at < self.inner.fields.not_before
    }

    /// Basic constraints mark this certificate as a CA
    #[must_use]
    pub fn is_ca(&self) -> bool {
        self.inner.fields.is_ca
    }

    /// Basic constraints path length, if any
    #[must_use]
    pub fn path_len_constraint(&self) -> Option<u32> {
        self.inner.fields.path_len_constraint
    }

    /// Subject and issuer names are identical
    #[must_use]
    pub fn is_self_issued(&self) -> bool {
        self.inner.fields.subject_raw == self.inner.fields.issuer_raw
    }

    /// Whether the extended key usage permits TLS server authentication.
    ///
    /// A certificate without the extension is unrestricted.
    #[must_use]
    pub fn allows_server_auth(&self) -> bool {
        self.inner.fields.server_auth.unwrap_or(true)
    }

    /// DNS, URI and IP Subject Alternative Names
    #[must_use]
    pub fn subject_alt_names(&self) -> &[SubjectAltName] {
        &self.inner.fields.subject_alt_names
    }

    /// The subject public key
    #[must_use]
    pub fn public_key(&self) -> &PublicKey {
        &self.inner.fields.public_key
    }

    /// SHA-256 fingerprint of the DER encoding (hex)
    #[must_use]
    pub fn fingerprint(&self) -> String {
        sha256_hex(&self.inner.der)
    }

    /// Serializable overview for logs and CLI output
    #[must_use]
    pub fn summary(&self) -> CertificateSummary {
        CertificateSummary {
            subject: self.subject().to_string(),
            issuer: self.issuer().to_string(),
            serial: self.serial_hex(),
            fingerprint: self.fingerprint(),
            spki_sha256: self.public_key().spki_sha256_base64(),
            not_before: self.not_before(),
            not_after: self.not_after(),
            is_ca: self.is_ca(),
            subject_alt_names: self.subject_alt_names().to_vec(),
        }
    }
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner.der == other.inner.der
    }
}

impl Eq for Certificate {}

impl Hash for Certificate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.der.hash(state);
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("subject", &self.subject())
            .field("issuer", &self.issuer())
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

/// Human-oriented certificate overview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateSummary {
    /// Subject distinguished name
    pub subject: String,
    /// Issuer distinguished name
    pub issuer: String,
    /// Serial number (hex)
    pub serial: String,
    /// SHA-256 fingerprint of DER bytes (hex)
    pub fingerprint: String,
    /// SHA-256 of the `SubjectPublicKeyInfo` (base64)
    pub spki_sha256: String,
    /// Not valid before
    pub not_before: DateTime<Utc>,
    /// Not valid after
    pub not_after: DateTime<Utc>,
    /// CA flag from basic constraints
    pub is_ca: bool,
    /// DNS, URI and IP SANs
    pub subject_alt_names: Vec<SubjectAltName>,
}

fn malformed(reason: impl fmt::Display) -> InputError {
    InputError::MalformedCertificate {
        reason: reason.to_string(),
    }
}

fn parse_fields(der: &[u8]) -> Result<Fields, InputError> {
    let (rest, cert) = X509Certificate::from_der(der).map_err(malformed)?;
    if !rest.is_empty() {
        return Err(malformed(format!(
            "{} trailing bytes after certificate",
            rest.len()
        )));
    }

    let (is_ca, path_len_constraint) = cert
        .basic_constraints()
        .map_err(malformed)?
        .map_or((false, None), |bc| (bc.value.ca, bc.value.path_len_constraint));

    let server_auth = cert
        .extended_key_usage()
        .map_err(malformed)?
        .map(|eku| eku.value.any || eku.value.server_auth);

    let subject_alt_names = cert
        .subject_alternative_name()
        .map_err(malformed)?
        .map(|san| {
            san.value
                .general_names
                .iter()
                .filter_map(SubjectAltName::from_general_name)
                .collect()
        })
        .unwrap_or_default();

    let validity = cert.validity();

    Ok(Fields {
        subject: cert.subject().to_string(),
        issuer: cert.issuer().to_string(),
        subject_raw: cert.subject().as_raw().to_vec(),
        issuer_raw: cert.issuer().as_raw().to_vec(),
        serial: cert.raw_serial().to_vec(),
        not_before: asn1_to_utc(validity.not_before)?,
        not_after: asn1_to_utc(validity.not_after)?,
        is_ca,
        path_len_constraint,
        server_auth,
        subject_alt_names,
        public_key: PublicKey::from_spki(cert.public_key()),
    })
}

/// Convert an ASN.1 `GeneralizedTime` / `UTCTime` to `DateTime<Utc>`.
fn asn1_to_utc(t: ASN1Time) -> Result<DateTime<Utc>, InputError> {
    Utc.timestamp_opt(t.timestamp(), 0)
        .single()
        .ok_or_else(|| malformed(format!("validity timestamp out of range: {t}")))
}

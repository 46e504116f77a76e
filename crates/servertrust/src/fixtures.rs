//! Test PKI generated once per test binary.
//!
//! ```text
//! root
//! ├── ca1 ── wildcard, multiple-dns-names, signed-by-ca1, dns-name-and-uri
//! └── ca2 ── expired, missing-dns-name-and-uri, signed-by-ca2,
//!            valid-dns-name, valid-uri, ip-address, client-auth-only
//! ```

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use rcgen::{
    date_time_ymd, BasicConstraints, CertificateParams, DistinguishedName, DnType,
    ExtendedKeyUsagePurpose, IsCa, KeyPair, KeyUsagePurpose, SanType,
};

use servertrust_core::{Certificate, RevocationError, TrustAnchors};

use crate::validation::{ChainValidator, RevocationChecker, RevocationRequest, RevocationStatus};

/// Host every "valid" fixture is issued for
pub const HOST: &str = "test.example.org";

pub struct Pki {
    pub root: Certificate,
    pub ca1: Certificate,
    pub ca2: Certificate,
    /// Self-signed CA with the root's subject but a different key
    pub impostor_root: Certificate,

    pub leaf_wildcard: Certificate,
    pub leaf_multiple_dns_names: Certificate,
    pub leaf_signed_by_ca1: Certificate,
    pub leaf_dns_name_and_uri: Certificate,

    pub leaf_expired: Certificate,
    pub leaf_missing_dns_name_and_uri: Certificate,
    pub leaf_signed_by_ca2: Certificate,
    pub leaf_valid_dns_name: Certificate,
    pub leaf_valid_uri: Certificate,
    pub leaf_ip_address: Certificate,
    pub leaf_client_auth_only: Certificate,

    /// Issued by `leaf_signed_by_ca2`, which is not a CA
    pub leaf_issued_by_leaf: Certificate,
}

pub fn pki() -> &'static Pki {
    static PKI: OnceLock<Pki> = OnceLock::new();
    PKI.get_or_init(Pki::generate)
}

struct Issuer {
    cert: rcgen::Certificate,
    key: KeyPair,
}

impl Issuer {
    fn root(name: &str) -> Self {
        let key = KeyPair::generate().unwrap();
        let cert = ca_params(name).self_signed(&key).unwrap();
        Self { cert, key }
    }

    fn intermediate(name: &str, parent: &Self) -> Self {
        let key = KeyPair::generate().unwrap();
        let cert = ca_params(name)
            .signed_by(&key, &parent.cert, &parent.key)
            .unwrap();
        Self { cert, key }
    }

    fn certificate(&self) -> Certificate {
        Certificate::from_der(self.cert.der().to_vec()).unwrap()
    }

    fn issue(&self, params: CertificateParams) -> (Certificate, Self) {
        let key = KeyPair::generate().unwrap();
        let cert = params.signed_by(&key, &self.cert, &self.key).unwrap();
        let issued = Self { cert, key };
        (issued.certificate(), issued)
    }

    fn leaf(&self, name: &str, sans: Vec<SanType>) -> Certificate {
        self.issue(leaf_params(name, sans)).0
    }
}

fn name(common_name: &str) -> DistinguishedName {
    let mut dn = DistinguishedName::new();
    dn.push(DnType::OrganizationName, "servertrust tests");
    dn.push(DnType::CommonName, common_name);
    dn
}

fn ca_params(common_name: &str) -> CertificateParams {
    let mut params = CertificateParams::default();
    params.distinguished_name = name(common_name);
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.key_usages = vec![
        KeyUsagePurpose::KeyCertSign,
        KeyUsagePurpose::CrlSign,
        KeyUsagePurpose::DigitalSignature,
    ];
    params
}

fn leaf_params(common_name: &str, sans: Vec<SanType>) -> CertificateParams {
    let mut params = CertificateParams::default();
    params.distinguished_name = name(common_name);
    params.subject_alt_names = sans;
    params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];
    params
}

fn dns(name: &str) -> SanType {
    SanType::DnsName(name.try_into().unwrap())
}

fn uri(value: &str) -> SanType {
    SanType::URI(value.try_into().unwrap())
}

impl Pki {
    fn generate() -> Self {
        let root = Issuer::root("servertrust Root CA");
        let ca1 = Issuer::intermediate("servertrust Intermediate CA 1", &root);
        let ca2 = Issuer::intermediate("servertrust Intermediate CA 2", &root);
        let impostor = Issuer::root("servertrust Root CA");

        let mut expired = leaf_params("expired", vec![dns(HOST)]);
        expired.not_before = date_time_ymd(2010, 1, 1);
        expired.not_after = date_time_ymd(2011, 1, 1);

        let mut client_only = leaf_params("client-auth-only", vec![dns(HOST)]);
        client_only.extended_key_usages = vec![ExtendedKeyUsagePurpose::ClientAuth];

        let (leaf_signed_by_ca2, ca2_leaf) =
            ca2.issue(leaf_params("signed-by-ca2", vec![dns("signed-by-ca2.example.org")]));

        Self {
            root: root.certificate(),
            ca1: ca1.certificate(),
            ca2: ca2.certificate(),
            impostor_root: impostor.certificate(),

            leaf_wildcard: ca1.leaf("wildcard", vec![dns("*.example.org")]),
            leaf_multiple_dns_names: ca1.leaf(
                "multiple-dns-names",
                vec![
                    dns("test.example.com"),
                    dns("test.example.org"),
                    dns("blog.example.com"),
                ],
            ),
            leaf_signed_by_ca1: ca1.leaf("signed-by-ca1", vec![dns("signed-by-ca1.example.org")]),
            leaf_dns_name_and_uri: ca1.leaf(
                "dns-name-and-uri",
                vec![dns(HOST), uri("https://test.example.org")],
            ),

            leaf_expired: ca2.issue(expired).0,
            leaf_missing_dns_name_and_uri: ca2.leaf("missing-dns-name-and-uri", Vec::new()),
            leaf_signed_by_ca2,
            leaf_valid_dns_name: ca2.leaf(HOST, vec![dns(HOST)]),
            leaf_valid_uri: ca2.leaf("valid-uri", vec![uri("https://test.example.org")]),
            leaf_ip_address: ca2.leaf(
                "ip-address",
                vec![
                    SanType::IpAddress(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 10))),
                    SanType::IpAddress(IpAddr::V6(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1))),
                ],
            ),
            leaf_client_auth_only: ca2.issue(client_only).0,

            leaf_issued_by_leaf: ca2_leaf.leaf("issued-by-leaf", vec![dns(HOST)]),
        }
    }

    /// `[leaf, intermediate, root]` for a leaf issued by ca1 or ca2.
    pub fn chain(&self, leaf: &Certificate) -> Vec<Certificate> {
        let intermediate = if leaf.issuer() == self.ca1.subject() {
            &self.ca1
        } else {
            &self.ca2
        };
        vec![leaf.clone(), intermediate.clone(), self.root.clone()]
    }

    /// Valid leaf and root with ca2 left out.
    pub fn missing_intermediate(&self) -> Vec<Certificate> {
        vec![self.leaf_valid_dns_name.clone(), self.root.clone()]
    }

    /// Valid leaf presented with ca1 instead of its issuer ca2.
    pub fn incorrect_intermediate(&self) -> Vec<Certificate> {
        vec![
            self.leaf_valid_dns_name.clone(),
            self.ca1.clone(),
            self.root.clone(),
        ]
    }

    pub fn anchors(&self) -> TrustAnchors {
        std::iter::once(self.root.clone()).collect()
    }

    /// Validator trusting only the fixture root.
    pub fn validator(&self) -> Arc<ChainValidator> {
        Arc::new(ChainValidator::new(self.anchors()))
    }

    /// Validator with no anchors at all.
    pub fn unanchored_validator(&self) -> Arc<ChainValidator> {
        Arc::new(ChainValidator::new(TrustAnchors::new()))
    }
}

/// Records subjects it was asked about and answers with a fixed status.
#[derive(Debug)]
pub struct Recording {
    pub answer: Result<RevocationStatus, RevocationError>,
    pub delay: Duration,
    pub seen: Mutex<Vec<String>>,
}

impl Recording {
    pub fn answering(answer: Result<RevocationStatus, RevocationError>) -> Self {
        Self {
            answer,
            delay: Duration::ZERO,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

impl RevocationChecker for Recording {
    fn check(&self, request: &RevocationRequest<'_>) -> Result<RevocationStatus, RevocationError> {
        self.seen
            .lock()
            .unwrap()
            .push(request.certificate.subject().to_string());
        std::thread::sleep(self.delay);
        self.answer.clone()
    }
}

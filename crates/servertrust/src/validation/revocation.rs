//! Revocation checking.
//!
//! The engine does not speak OCSP or CRL itself. A [`RevocationChecker`] is
//! consulted for each certificate in scope once a path has been built, and the
//! configured [`RevocationOptions`] decide what an unanswered query means.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use servertrust_core::{Certificate, ChainError, RevocationError, TrustError};

/// Default bound on a single revocation query
pub const DEFAULT_REVOCATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Which certificates on a resolved path are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RevocationScope {
    /// Only the end-entity certificate
    LeafOnly,
    /// Leaf and every intermediate (the anchor itself is never checked)
    #[default]
    FullChain,
}

/// What to do when the revocation source cannot answer.
///
/// There is no default: callers must choose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevocationFailurePolicy {
    /// Surface the failure as a `RevocationError`
    Raise,
    /// Treat the chain as untrusted
    Reject,
    /// Log and carry on as if the certificate were good
    Allow,
}

/// RFC 5280 revocation reason codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RevocationReason {
    Unspecified,
    KeyCompromise,
    CaCompromise,
    AffiliationChanged,
    Superseded,
    CessationOfOperation,
    CertificateHold,
    PrivilegeWithdrawn,
}

/// Answer from a revocation source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationStatus {
    /// Positively not revoked
    Good,
    /// Revoked
    Revoked(Option<RevocationReason>),
    /// The source has no information about this certificate
    Unknown,
}

/// One revocation query.
#[derive(Debug, Clone, Copy)]
pub struct RevocationRequest<'a> {
    /// Certificate whose status is wanted
    pub certificate: &'a Certificate,
    /// Its issuer on the resolved path
    pub issuer: &'a Certificate,
    /// Time the source may take before the answer is discarded
    pub timeout: Duration,
}

/// Source of revocation information (OCSP client, CRL cache, ...).
///
/// Implementations must be safe to share between threads. Network-backed
/// implementations should respect `request.timeout`; the engine discards
/// answers that arrive later regardless.
pub trait RevocationChecker: Send + Sync + fmt::Debug {
    /// Look up the status of `request.certificate`.
    ///
    /// # Errors
    ///
    /// Returns `RevocationError` if the source could not be consulted.
    fn check(&self, request: &RevocationRequest<'_>) -> Result<RevocationStatus, RevocationError>;
}

/// Revocation checking settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevocationOptions {
    /// Certificates to check
    pub scope: RevocationScope,
    /// Treat `Unknown` as a failure rather than as good
    pub require_positive_response: bool,
    /// Bound on each query
    pub timeout: Duration,
    /// Handling of unanswered queries
    pub on_failure: RevocationFailurePolicy,
}

impl RevocationOptions {
    /// Full-chain checking with the default timeout.
    #[must_use]
    pub const fn new(on_failure: RevocationFailurePolicy) -> Self {
        Self {
            scope: RevocationScope::FullChain,
            require_positive_response: false,
            timeout: DEFAULT_REVOCATION_TIMEOUT,
            on_failure,
        }
    }

    /// Set the checked scope
    #[must_use]
    pub const fn scope(mut self, scope: RevocationScope) -> Self {
        self.scope = scope;
        self
    }

    /// Require a definitive `Good` answer
    #[must_use]
    pub const fn require_positive_response(mut self, require: bool) -> Self {
        self.require_positive_response = require;
        self
    }

    /// Set the per-query timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Check every in-scope certificate of a resolved path.
pub(crate) fn check_path(
    checker: &dyn RevocationChecker,
    path: &[Certificate],
    options: &RevocationOptions,
) -> Result<(), TrustError> {
    // The anchor has no issuer on the path and is trusted by configuration.
    let checkable = path.len().saturating_sub(1);
    let count = match options.scope {
        RevocationScope::LeafOnly => checkable.min(1),
        RevocationScope::FullChain => checkable,
    };

    for pair in path.windows(2).take(count) {
        let (certificate, issuer) = (&pair[0], &pair[1]);
        let request = RevocationRequest {
            certificate,
            issuer,
            timeout: options.timeout,
        };

        let started = Instant::now();
        let answer = checker.check(&request);
        let elapsed = started.elapsed();
        let answer = if answer.is_ok() && elapsed > options.timeout {
            Err(RevocationError::Timeout {
                subject: certificate.subject().to_string(),
                after: options.timeout,
            })
        } else {
            answer
        };

        match answer {
            Ok(RevocationStatus::Good) => {
                debug!(subject = certificate.subject(), ?elapsed, "revocation status good");
            }
            Ok(RevocationStatus::Revoked(reason)) => {
                debug!(subject = certificate.subject(), ?reason, "certificate revoked");
                return Err(ChainError::Revoked {
                    subject: certificate.subject().to_string(),
                }
                .into());
            }
            Ok(RevocationStatus::Unknown) if options.require_positive_response => {
                unanswered(
                    RevocationError::CheckFailed {
                        subject: certificate.subject().to_string(),
                        reason: "no definitive response".into(),
                    },
                    options.on_failure,
                )?;
            }
            Ok(RevocationStatus::Unknown) => {
                debug!(subject = certificate.subject(), "revocation status unknown, accepted");
            }
            Err(e) => unanswered(e, options.on_failure)?,
        }
    }

    Ok(())
}

fn unanswered(error: RevocationError, policy: RevocationFailurePolicy) -> Result<(), TrustError> {
    match policy {
        RevocationFailurePolicy::Raise => Err(error.into()),
        RevocationFailurePolicy::Reject => Err(ChainError::RevocationUnverified {
            subject: error.subject().to_string(),
        }
        .into()),
        RevocationFailurePolicy::Allow => {
            warn!(error = %error, "revocation status unavailable, continuing");
            Ok(())
        }
    }
}

/// In-memory revocation list keyed by issuer name and serial number.
///
/// Answers `Revoked` for listed certificates and `Good` otherwise, like a
/// freshly fetched CRL covering every issuer it has entries for.
#[derive(Debug, Clone, Default)]
pub struct StaticRevocationList {
    entries: HashMap<(Vec<u8>, Vec<u8>), Option<RevocationReason>>,
}

impl StaticRevocationList {
    /// An empty list
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `certificate` as revoked.
    #[must_use]
    pub fn revoke(mut self, certificate: &Certificate, reason: Option<RevocationReason>) -> Self {
        self.insert(certificate.issuer_raw(), certificate.serial(), reason);
        self
    }

    /// Mark the certificate with `serial` issued by `issuer` as revoked.
    pub fn insert(&mut self, issuer_name: &[u8], serial: &[u8], reason: Option<RevocationReason>) {
        self.entries
            .insert((issuer_name.to_vec(), strip_leading_zeros(serial).to_vec()), reason);
    }

    /// Number of revoked entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl RevocationChecker for StaticRevocationList {
    fn check(&self, request: &RevocationRequest<'_>) -> Result<RevocationStatus, RevocationError> {
        let key = (
            request.issuer.subject_raw().to_vec(),
            strip_leading_zeros(request.certificate.serial()).to_vec(),
        );
        Ok(self
            .entries
            .get(&key)
            .map_or(RevocationStatus::Good, |reason| RevocationStatus::Revoked(*reason)))
    }
}

fn strip_leading_zeros(serial: &[u8]) -> &[u8] {
    let start = serial.iter().position(|b| *b != 0).unwrap_or(serial.len());
    &serial[start..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{pki, Recording};

    fn path() -> Vec<Certificate> {
        let pki = pki();
        pki.chain(&pki.leaf_valid_dns_name)
    }

    fn failed() -> RevocationError {
        RevocationError::CheckFailed {
            subject: "CN=test.example.org".into(),
            reason: "responder unreachable".into(),
        }
    }

    #[test]
    fn full_chain_checks_everything_but_the_anchor() {
        let checker = Recording::answering(Ok(RevocationStatus::Good));
        let options = RevocationOptions::new(RevocationFailurePolicy::Raise);
        check_path(&checker, &path(), &options).unwrap();

        let pki = pki();
        assert_eq!(
            checker.seen(),
            vec![
                pki.leaf_valid_dns_name.subject().to_string(),
                pki.ca2.subject().to_string()
            ]
        );
    }

    #[test]
    fn leaf_only_checks_the_leaf() {
        let checker = Recording::answering(Ok(RevocationStatus::Good));
        let options =
            RevocationOptions::new(RevocationFailurePolicy::Raise).scope(RevocationScope::LeafOnly);
        check_path(&checker, &path(), &options).unwrap();
        assert_eq!(checker.seen().len(), 1);
    }

    #[test]
    fn anchor_only_path_checks_nothing() {
        let checker = Recording::answering(Ok(RevocationStatus::Good));
        let options = RevocationOptions::new(RevocationFailurePolicy::Raise);
        check_path(&checker, &[pki().root.clone()], &options).unwrap();
        assert!(checker.seen().is_empty());
    }

    #[test]
    fn revoked_is_a_chain_rejection() {
        let checker = Recording::answering(Ok(RevocationStatus::Revoked(Some(
            RevocationReason::KeyCompromise,
        ))));
        let options = RevocationOptions::new(RevocationFailurePolicy::Allow);
        let err = check_path(&checker, &path(), &options).unwrap_err();
        assert!(matches!(err, TrustError::Chain(ChainError::Revoked { .. })), "{err:?}");
    }

    #[test]
    fn failure_policies() {
        let options = RevocationOptions::new(RevocationFailurePolicy::Raise);
        let checker = Recording::answering(Err(failed()));

        let err = check_path(&checker, &path(), &options).unwrap_err();
        assert_eq!(err, TrustError::Revocation(failed()));

        let err = check_path(
            &checker,
            &path(),
            &RevocationOptions::new(RevocationFailurePolicy::Reject),
        )
        .unwrap_err();
        assert!(
            matches!(err, TrustError::Chain(ChainError::RevocationUnverified { .. })),
            "{err:?}"
        );

        check_path(
            &checker,
            &path(),
            &RevocationOptions::new(RevocationFailurePolicy::Allow),
        )
        .unwrap();
    }

    #[test]
    fn unknown_is_accepted_unless_positive_response_required() {
        let checker = Recording::answering(Ok(RevocationStatus::Unknown));
        let lenient = RevocationOptions::new(RevocationFailurePolicy::Raise);
        check_path(&checker, &path(), &lenient).unwrap();

        let strict = lenient.require_positive_response(true);
        let err = check_path(&checker, &path(), &strict).unwrap_err();
        assert!(err.is_revocation_error(), "{err:?}");
    }

    #[test]
    fn late_answers_become_timeouts() {
        let checker = Recording {
            delay: Duration::from_millis(50),
            ..Recording::answering(Ok(RevocationStatus::Revoked(None)))
        };
        let options = RevocationOptions::new(RevocationFailurePolicy::Raise)
            .timeout(Duration::from_millis(5));
        let err = check_path(&checker, &path(), &options).unwrap_err();
        assert!(
            matches!(err, TrustError::Revocation(RevocationError::Timeout { .. })),
            "{err:?}"
        );
    }

    #[test]
    fn static_list_matches_issuer_and_serial() {
        let pki = pki();
        let list = StaticRevocationList::new().revoke(&pki.leaf_valid_dns_name, None);
        assert_eq!(list.len(), 1);

        let revoked = RevocationRequest {
            certificate: &pki.leaf_valid_dns_name,
            issuer: &pki.ca2,
            timeout: DEFAULT_REVOCATION_TIMEOUT,
        };
        assert_eq!(list.check(&revoked), Ok(RevocationStatus::Revoked(None)));

        let other = RevocationRequest {
            certificate: &pki.leaf_signed_by_ca2,
            ..revoked
        };
        assert_eq!(list.check(&other), Ok(RevocationStatus::Good));
    }
}

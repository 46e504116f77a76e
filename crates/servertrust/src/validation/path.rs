//! X.509 path building and verification.
//!
//! Builds a path leaf-first from the presented certificates towards the
//! anchor set, checking issuer names, signatures, basic constraints and
//! validity periods along the way.

use std::fmt;

use chrono::{DateTime, Utc};
use x509_parser::prelude::*;

use servertrust_core::{Certificate, ChainError, ResolvedChain, TrustAnchors};

/// Maximum path length to prevent loops on hostile chains.
const MAX_PATH_DEPTH: usize = 16;

/// Options passed to a [`PathVerifier`] for one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathOptions {
    /// Instant at which validity periods are checked
    pub time: DateTime<Utc>,
    /// Require the leaf's extended key usage to allow TLS server auth
    pub require_server_auth: bool,
}

/// The cryptographic path-validation primitive.
///
/// Implementations resolve a presented chain (leaf first) into a trusted path
/// ending at one of `anchors`, or report why that is impossible. They never
/// perform hostname or pin checks; those are evaluator policy.
pub trait PathVerifier: Send + Sync + fmt::Debug {
    /// Build and verify a path for `chain`.
    fn verify_path(
        &self,
        chain: &[Certificate],
        anchors: &TrustAnchors,
        options: &PathOptions,
    ) -> Result<ResolvedChain, ChainError>;
}

/// [`PathVerifier`] backed by `x509-parser` signature verification.
#[derive(Debug, Clone, Copy, Default)]
pub struct X509PathVerifier;

/// Outcome of looking for the issuer of one certificate among candidates.
enum IssuerSearch<'a> {
    Found(&'a Certificate),
    NotFound,
    Refused(String),
}

impl PathVerifier for X509PathVerifier {
    fn verify_path(
        &self,
        chain: &[Certificate],
        anchors: &TrustAnchors,
        options: &PathOptions,
    ) -> Result<ResolvedChain, ChainError> {
        let leaf = chain.first().ok_or_else(|| ChainError::Malformed {
            reason: "certificate chain is empty".into(),
        })?;

        let mut path = vec![leaf.clone()];
        let mut used = vec![false; chain.len()];
        used[0] = true;

        loop {
            let current = path[path.len() - 1].clone();
            if anchors.contains(&current) {
                break;
            }
            if path.len() >= MAX_PATH_DEPTH {
                return Err(ChainError::Malformed {
                    reason: format!("certificate path exceeds {MAX_PATH_DEPTH} certificates"),
                });
            }

            let depth = path.len();
            let from_anchors = find_issuer(&current, anchors.with_subject(current.issuer_raw()), depth)?;
            if let IssuerSearch::Found(anchor) = from_anchors {
                path.push(anchor.clone());
                break;
            }

            let unused = chain
                .iter()
                .enumerate()
                .filter(|(i, _)| !used[*i])
                .map(|(_, c)| c)
                .filter(|c| c.subject_raw() == current.issuer_raw());
            match find_issuer(&current, unused, depth)? {
                IssuerSearch::Found(issuer) => {
                    if let Some(i) = chain.iter().position(|c| c == issuer) {
                        used[i] = true;
                    }
                    path.push(issuer.clone());
                }
                IssuerSearch::Refused(reason) => {
                    return Err(ChainError::InvalidIssuer {
                        subject: current.subject().to_string(),
                        reason,
                    });
                }
                IssuerSearch::NotFound => {
                    if let IssuerSearch::Refused(reason) = from_anchors {
                        return Err(ChainError::InvalidIssuer {
                            subject: current.subject().to_string(),
                            reason,
                        });
                    }
                    let subject = current.subject().to_string();
                    // A gap with certificates left over means an intermediate is missing.
                    return Err(if !current.is_self_issued() && used.iter().any(|u| !u) {
                        ChainError::Incomplete { subject }
                    } else {
                        ChainError::UntrustedAnchor { subject }
                    });
                }
            }
        }

        check_validity(&path, options.time)?;

        if options.require_server_auth && !leaf.allows_server_auth() {
            return Err(ChainError::InvalidPurpose {
                subject: leaf.subject().to_string(),
            });
        }

        ResolvedChain::new(path).map_err(|e| ChainError::Malformed {
            reason: e.to_string(),
        })
    }
}

/// Find the first candidate that names, signed and may issue `child`.
///
/// `depth` is the position the issuer would take in the path (leaf = 0).
fn find_issuer<'a>(
    child: &Certificate,
    candidates: impl Iterator<Item = &'a Certificate>,
    depth: usize,
) -> Result<IssuerSearch<'a>, ChainError> {
    let mut refusal = None;

    for candidate in candidates {
        if candidate.subject_raw() != child.issuer_raw() {
            continue;
        }
        match check_issuer(child, candidate, depth)? {
            None => return Ok(IssuerSearch::Found(candidate)),
            Some(reason) => refusal = Some(reason),
        }
    }

    Ok(refusal.map_or(IssuerSearch::NotFound, IssuerSearch::Refused))
}

/// Returns `Some(reason)` if `issuer` cannot have issued `child`.
fn check_issuer(
    child: &Certificate,
    issuer: &Certificate,
    depth: usize,
) -> Result<Option<String>, ChainError> {
    let (_, child_x509) = parse(child)?;
    let (_, issuer_x509) = parse(issuer)?;

    if let Err(e) = child_x509.verify_signature(Some(issuer_x509.public_key())) {
        return Ok(Some(format!(
            "signature does not verify with key of {}: {e}",
            issuer.subject()
        )));
    }
    if !issuer.is_ca() {
        return Ok(Some(format!("{} is not a certificate authority", issuer.subject())));
    }
    if let Some(max) = issuer.path_len_constraint() {
        // Intermediates between the leaf and this issuer.
        let below = depth.saturating_sub(1);
        if below > max as usize {
            return Ok(Some(format!(
                "path length constraint of {} exceeded ({below} intermediates below, {max} allowed)",
                issuer.subject()
            )));
        }
    }
    Ok(None)
}

fn parse(certificate: &Certificate) -> Result<(&[u8], X509Certificate<'_>), ChainError> {
    X509Certificate::from_der(certificate.as_der()).map_err(|e| ChainError::Malformed {
        reason: format!("{}: {e}", certificate.subject()),
    })
}

/// Every certificate on the path, anchor included, must be valid at `time`.
fn check_validity(path: &[Certificate], time: DateTime<Utc>) -> Result<(), ChainError> {
    for certificate in path {
        if certificate.is_expired_at(time) {
            return Err(ChainError::Expired {
                subject: certificate.subject().to_string(),
            });
        }
        if certificate.is_not_yet_valid_at(time) {
            return Err(ChainError::NotYetValid {
                subject: certificate.subject().to_string(),
            });
        }
    }
    Ok(())
}

//! Chain validation.
//!
//! [`ChainValidator`] owns the anchor set, the path verifier and the optional
//! revocation source. Evaluators share one validator behind an `Arc`.

mod path;
mod revocation;

pub use path::{PathOptions, PathVerifier, X509PathVerifier};
pub use revocation::{
    RevocationChecker, RevocationFailurePolicy, RevocationOptions, RevocationReason,
    RevocationRequest, RevocationScope, RevocationStatus, StaticRevocationList,
    DEFAULT_REVOCATION_TIMEOUT,
};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::trace;

use servertrust_core::{leaf_of, Certificate, ConfigError, ResolvedChain, Result, TrustAnchors};

/// Policy applied while building a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    /// Path, signature and validity checks only
    BasicX509,
    /// Basic checks plus TLS server-auth usage of the leaf
    Ssl,
    /// Basic checks, plus server-auth usage when `server_auth` is set,
    /// followed by revocation lookups
    Revocation {
        server_auth: bool,
        options: RevocationOptions,
    },
}

impl PolicyKind {
    /// Whether the leaf must allow TLS server authentication
    pub const fn requires_server_auth(&self) -> bool {
        matches!(
            self,
            Self::Ssl
                | Self::Revocation {
                    server_auth: true,
                    ..
                }
        )
    }
}

/// Builds and verifies certificate paths against a set of trust anchors.
#[derive(Debug, Clone)]
pub struct ChainValidator {
    anchors: TrustAnchors,
    verifier: Arc<dyn PathVerifier>,
    revocation: Option<Arc<dyn RevocationChecker>>,
    time: Option<DateTime<Utc>>,
}

impl ChainValidator {
    /// Validator over `anchors` using the x509-parser backed verifier.
    #[must_use]
    pub fn new(anchors: TrustAnchors) -> Self {
        Self {
            anchors,
            verifier: Arc::new(X509PathVerifier),
            revocation: None,
            time: None,
        }
    }

    /// Replace the path verification primitive
    #[must_use]
    pub fn with_verifier(mut self, verifier: Arc<dyn PathVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    /// Set the revocation source used by `PolicyKind::Revocation`
    #[must_use]
    pub fn with_revocation_checker(mut self, checker: Arc<dyn RevocationChecker>) -> Self {
        self.revocation = Some(checker);
        self
    }

    /// Validate at a fixed instant instead of the current time
    #[must_use]
    pub fn with_verification_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }

    /// Configured anchors
    pub const fn anchors(&self) -> &TrustAnchors {
        &self.anchors
    }

    /// Whether a revocation source is configured
    pub const fn has_revocation_checker(&self) -> bool {
        self.revocation.is_some()
    }

    /// Build a path for `chain` against the configured anchors.
    ///
    /// # Errors
    ///
    /// Returns `InputError::EmptyChain` for an empty chain, a `ChainError`
    /// when no valid path exists, and a `RevocationError` when revocation
    /// lookups fail under `RevocationFailurePolicy::Raise`.
    pub fn build(&self, chain: &[Certificate], kind: &PolicyKind) -> Result<ResolvedChain> {
        self.build_with_anchors(chain, &self.anchors, kind)
    }

    /// Build a path for `chain` against `anchors` instead of the configured set.
    pub fn build_with_anchors(
        &self,
        chain: &[Certificate],
        anchors: &TrustAnchors,
        kind: &PolicyKind,
    ) -> Result<ResolvedChain> {
        let leaf = leaf_of(chain)?;
        let options = PathOptions {
            time: self.time.unwrap_or_else(Utc::now),
            require_server_auth: kind.requires_server_auth(),
        };

        trace!(
            leaf = leaf.subject(),
            presented = chain.len(),
            anchors = anchors.len(),
            ?kind,
            "building certificate path"
        );
        let resolved = self.verifier.verify_path(chain, anchors, &options)?;

        if let PolicyKind::Revocation {
            options: revocation,
            ..
        } = kind
        {
            let checker = self.revocation.as_deref().ok_or_else(|| {
                ConfigError::Invalid("revocation policy requires a revocation checker".into())
            })?;
            revocation::check_path(checker, &resolved, revocation)?;
        }

        Ok(resolved)
    }
}

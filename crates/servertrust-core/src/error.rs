use std::time::Duration;

use thiserror::Error;

/// Result type alias for trust evaluation
pub type Result<T> = std::result::Result<T, TrustError>;

/// Errors raised when a trust decision could not be completed.
///
/// An untrusted chain is *not* an error: evaluators report it as `Ok(false)`.
/// Every variant here means "the evaluation requested by the caller could
/// not be carried out", and callers are expected to branch on it separately.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrustError {
    /// The presented chain or certificate bytes were unusable
    #[error("invalid input: {0}")]
    Input(#[from] InputError),

    /// Chain building or path validation could not complete
    #[error(transparent)]
    Chain(#[from] ChainError),

    /// The revocation source could not be consulted
    #[error(transparent)]
    Revocation(#[from] RevocationError),

    /// Evaluator configuration is invalid
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No evaluator is registered for a host that must be evaluated
    #[error("no server trust evaluator registered for host {host}")]
    NoEvaluatorForHost {
        /// Host that was looked up
        host: String,
    },
}

impl TrustError {
    /// Returns true if the error originates from path validation
    #[must_use]
    pub const fn is_chain_error(&self) -> bool {
        matches!(self, Self::Chain(_))
    }

    /// Returns true if the error originates from the revocation source
    #[must_use]
    pub const fn is_revocation_error(&self) -> bool {
        matches!(self, Self::Revocation(_))
    }
}

/// Malformed input handed to the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    /// A chain must contain at least the leaf certificate
    #[error("certificate chain is empty")]
    EmptyChain,

    /// Bytes could not be parsed as a DER X.509 certificate
    #[error("malformed certificate: {reason}")]
    MalformedCertificate {
        /// Parser diagnostic
        reason: String,
    },

    /// Bytes could not be parsed as a DER `SubjectPublicKeyInfo`
    #[error("malformed public key: {reason}")]
    MalformedPublicKey {
        /// Parser diagnostic
        reason: String,
    },
}

/// Path validation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// No issuer could be found for a certificate while later certificates
    /// in the presented chain remain unused (a required intermediate is missing)
    #[error("certificate chain is incomplete: no issuer found for {subject}")]
    Incomplete {
        /// Subject whose issuer is missing
        subject: String,
    },

    /// A certificate on the path is past its notAfter date
    #[error("certificate has expired: {subject}")]
    Expired {
        /// Subject of the expired certificate
        subject: String,
    },

    /// A certificate on the path is before its notBefore date
    #[error("certificate is not yet valid: {subject}")]
    NotYetValid {
        /// Subject of the certificate
        subject: String,
    },

    /// A certificate on the path was reported revoked
    #[error("certificate has been revoked: {subject}")]
    Revoked {
        /// Subject of the revoked certificate
        subject: String,
    },

    /// The revocation status of a certificate could not be established and
    /// the configured policy rejects such chains
    #[error("revocation status could not be verified: {subject}")]
    RevocationUnverified {
        /// Subject of the unverified certificate
        subject: String,
    },

    /// The chain is contiguous but does not end at a trusted anchor
    #[error("certificate chain does not terminate at a trusted anchor: {subject}")]
    UntrustedAnchor {
        /// Subject of the topmost certificate reached
        subject: String,
    },

    /// A certificate names an issuer that is not allowed to have signed it
    #[error("invalid issuer for {subject}: {reason}")]
    InvalidIssuer {
        /// Subject of the certificate being verified
        subject: String,
        /// Why the issuer was refused
        reason: String,
    },

    /// The leaf is not valid for TLS server authentication
    #[error("certificate is not valid for server authentication: {subject}")]
    InvalidPurpose {
        /// Subject of the leaf
        subject: String,
    },

    /// A certificate carries extensions the verifier cannot decode
    #[error("malformed certificate chain: {reason}")]
    Malformed {
        /// Parser diagnostic
        reason: String,
    },
}

impl ChainError {
    /// Returns true if the error is a definitive negative verdict.
    ///
    /// Evaluators turn these into `Ok(false)`. `Incomplete` and `Malformed`
    /// mean the verdict could not be determined and are raised instead.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        !matches!(self, Self::Incomplete { .. } | Self::Malformed { .. })
    }
}

/// Failures talking to a revocation source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RevocationError {
    /// The source answered with an error or could not be reached
    #[error("revocation check failed for {subject}: {reason}")]
    CheckFailed {
        /// Subject of the certificate being checked
        subject: String,
        /// Transport or responder diagnostic
        reason: String,
    },

    /// The source did not answer within the configured bound
    #[error("revocation check for {subject} timed out after {after:?}")]
    Timeout {
        /// Subject of the certificate being checked
        subject: String,
        /// Configured bound
        after: Duration,
    },
}

impl RevocationError {
    /// Subject of the certificate whose status could not be established
    #[must_use]
    pub fn subject(&self) -> &str {
        match self {
            Self::CheckFailed { subject, .. } | Self::Timeout { subject, .. } => subject,
        }
    }
}

/// Evaluator construction errors. Raised at build time, never from `evaluate`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Pinning evaluators need at least one pin
    #[error("pin set for {kind} must contain at least one entry")]
    EmptyPinSet {
        /// Evaluator kind being built
        kind: &'static str,
    },

    /// A composite evaluator with no children would trust everything
    #[error("composite evaluator must contain at least one evaluator")]
    EmptyComposite,

    /// Any other invalid setting
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

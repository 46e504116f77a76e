//! Pluggable TLS server trust evaluation.
//!
//! Given the certificate chain a server presented and the host the client
//! meant to reach, an evaluator decides whether to trust the connection:
//!
//! - [`DefaultEvaluator`]: chain must build to a trust anchor, leaf must match the host
//! - [`RevocationEvaluator`]: default checks plus OCSP/CRL via a [`RevocationChecker`]
//! - [`PinnedCertificatesEvaluator`] / [`PinnedPublicKeysEvaluator`]: pinning
//! - [`DisabledEvaluator`]: accept everything (development only)
//! - [`CompositeEvaluator`]: every child must agree
//!
//! `Ok(false)` means "do not trust". An `Err` means the verdict could not be
//! reached, e.g. an intermediate is missing or the revocation source is down.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use servertrust::{loader, ChainValidator, DefaultEvaluator, Evaluate};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let validator = Arc::new(ChainValidator::new(loader::system_anchors().await));
//! let chain = loader::load_certificates("server-chain.pem").await?;
//! let trusted = DefaultEvaluator::new(validator).evaluate(&chain, Some("example.org"))?;
//! # Ok(()) }
//! ```

pub mod config;
mod error;
pub mod evaluator;
pub mod host;
pub mod loader;
pub mod manager;
pub mod pins;
pub mod validation;

#[cfg(test)]
mod fixtures;

pub use config::{AnchorConfig, EvaluatorSpec, TrustConfig};
pub use error::{LoadError, SetupError};
pub use evaluator::{
    CompositeEvaluator, DefaultEvaluator, DisabledEvaluator, Evaluate, PinnedCertificatesEvaluator,
    PinnedEvaluator, PinnedPublicKeysEvaluator, RevocationEvaluator, TrustEvaluator,
};
pub use manager::{Disposition, ServerTrustManager};
pub use pins::{Pin, PinSet};
pub use validation::{
    ChainValidator, PathOptions, PathVerifier, PolicyKind, RevocationChecker,
    RevocationFailurePolicy, RevocationOptions, RevocationReason, RevocationRequest,
    RevocationScope, RevocationStatus, StaticRevocationList, X509PathVerifier,
};

pub use servertrust_core::{
    Certificate, ChainError, ConfigError, InputError, PublicKey, ResolvedChain, Result,
    RevocationError, TrustAnchors, TrustError,
};

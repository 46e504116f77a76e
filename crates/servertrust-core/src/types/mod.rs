//! Core types for trust evaluation.

pub mod anchors;
pub mod certificate;
pub mod chain;
pub mod public_key;

pub use anchors::TrustAnchors;
pub use certificate::{Certificate, CertificateSummary, SubjectAltName};
pub use chain::{leaf_of, ResolvedChain};
pub use public_key::PublicKey;

//! Core types and errors for the servertrust policy engine.
//!
//! This crate provides the vocabulary shared by every evaluator:
//!
//! - **Types**: [`Certificate`], [`PublicKey`], [`ResolvedChain`] and
//!   [`TrustAnchors`], all immutable and cheap to clone
//! - **Errors**: [`TrustError`] and its sources. An untrusted chain is a
//!   normal `Ok(false)`; an error means the verdict could not be reached.
//!
//! # Example
//!
//! ```rust,ignore
//! use servertrust_core::{Certificate, Result};
//!
//! fn describe(der: Vec<u8>) -> Result<()> {
//!     let cert = Certificate::from_der(der)?;
//!     println!("{} ({})", cert.subject(), cert.fingerprint());
//!     Ok(())
//! }
//! ```

mod error;
pub mod hash;
pub mod types;

pub use error::{ChainError, ConfigError, InputError, Result, RevocationError, TrustError};
pub use types::*;

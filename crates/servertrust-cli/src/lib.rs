//! # servertrust-cli
//!
//! Command-line front end for the servertrust policy engine.
//!
//! ## Features
//!
//! - **check**: evaluate a PEM/DER chain for a host with a built-in policy or a TOML policy file
//! - **fingerprint**: print SHA-256 fingerprints and SPKI pins for certificates
//! - **Output formats**: colored text or JSON

pub mod cli;
pub mod output;

pub use cli::run;

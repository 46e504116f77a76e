//! Command-line argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::output::OutputFormat;

/// Evaluate TLS server certificate chains against trust policies
///
/// Validates chains to trust anchors, matches host names, and checks
/// certificate or public key pins, without opening a connection.
#[derive(Parser, Debug)]
#[command(name = "servertrust")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate a certificate chain for a host
    Check(CheckArgs),

    /// Show fingerprints and SPKI pins of certificates in a file
    Fingerprint(FingerprintArgs),
}

/// Built-in policies selectable without a config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Policy {
    /// Chain must build to an anchor and match the host
    #[default]
    Default,
    /// Chain must contain one of the --pin certificates
    PinnedCertificates,
    /// Chain must contain one of the --pin public keys
    PinnedPublicKeys,
    /// Accept anything
    Disabled,
}

// ============================================================================
// Check command
// ============================================================================

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Certificate chain, leaf first (PEM bundle or single DER certificate)
    #[arg(long)]
    pub chain: PathBuf,

    /// Host name or IP address the chain should be valid for
    #[arg(long)]
    pub host: Option<String>,

    /// TOML policy file; selects the evaluator registered for --host
    #[arg(short, long, conflicts_with_all = ["policy", "pin", "anchor", "no_system_anchors"])]
    pub config: Option<PathBuf>,

    /// Built-in policy to apply
    #[arg(short, long, value_enum, default_value_t = Policy::Default)]
    pub policy: Policy,

    /// Additional trust anchor file or directory (repeatable)
    #[arg(short, long)]
    pub anchor: Vec<PathBuf>,

    /// Do not load the system CA store
    #[arg(long)]
    pub no_system_anchors: bool,

    /// Pin file for pinned policies: certificates, or keys for pinned-public-keys (repeatable)
    #[arg(long)]
    pub pin: Vec<PathBuf>,

    /// Skip chain validation (pinned policies only)
    #[arg(long)]
    pub skip_chain_validation: bool,

    /// Skip host name validation
    #[arg(long)]
    pub skip_host_validation: bool,
}

// ============================================================================
// Fingerprint command
// ============================================================================

#[derive(Args, Debug)]
pub struct FingerprintArgs {
    /// Certificate files (PEM or DER)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

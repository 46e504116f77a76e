//! Server trust evaluators.
//!
//! Every evaluator answers one question for a presented chain and host:
//! should this server be trusted? `Ok(true)` and `Ok(false)` are the two
//! verdicts. An `Err` means the verdict could not be reached (empty or
//! malformed input, an incomplete chain, an unreachable revocation source)
//! and is always kept separate from `Ok(false)`.
//!
//! Evaluators are immutable once built and may be shared across threads.

mod composite;
mod default;
mod disabled;
mod pinned;
mod revocation;

pub use composite::CompositeEvaluator;
pub use default::DefaultEvaluator;
pub use disabled::DisabledEvaluator;
pub use pinned::{PinnedCertificatesEvaluator, PinnedEvaluator, PinnedPublicKeysEvaluator};
pub use revocation::RevocationEvaluator;

use tracing::debug;

use servertrust_core::{Certificate, ResolvedChain, Result, TrustError};

use crate::host;

/// Evaluate a presented chain for a host.
pub trait Evaluate {
    /// Decide whether to trust `chain` (leaf first) for `host`.
    ///
    /// A `None` host skips hostname checks.
    ///
    /// # Errors
    ///
    /// Returns `TrustError` when the decision could not be made.
    fn evaluate(&self, chain: &[Certificate], host: Option<&str>) -> Result<bool>;
}

/// Closed set of evaluator variants.
#[derive(Debug, Clone)]
pub enum TrustEvaluator {
    /// Chain validation against the validator's anchors plus host matching
    Default(DefaultEvaluator),
    /// Default checks plus revocation lookups
    Revocation(RevocationEvaluator),
    /// Trust only chains containing a pinned certificate
    PinnedCertificates(PinnedCertificatesEvaluator),
    /// Trust only chains containing a pinned public key
    PinnedPublicKeys(PinnedPublicKeysEvaluator),
    /// Trust everything. Never use in production.
    Disabled(DisabledEvaluator),
    /// All children must trust the chain
    Composite(CompositeEvaluator),
}

impl TrustEvaluator {
    /// Short name of the variant, used in logs and CLI output
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Default(_) => "default",
            Self::Revocation(_) => "revocation",
            Self::PinnedCertificates(_) => "pinned-certificates",
            Self::PinnedPublicKeys(_) => "pinned-public-keys",
            Self::Disabled(_) => "disabled",
            Self::Composite(_) => "composite",
        }
    }
}

impl Evaluate for TrustEvaluator {
    fn evaluate(&self, chain: &[Certificate], host: Option<&str>) -> Result<bool> {
        let verdict = match self {
            Self::Default(e) => e.evaluate(chain, host),
            Self::Revocation(e) => e.evaluate(chain, host),
            Self::PinnedCertificates(e) => e.evaluate(chain, host),
            Self::PinnedPublicKeys(e) => e.evaluate(chain, host),
            Self::Disabled(e) => e.evaluate(chain, host),
            Self::Composite(e) => e.evaluate(chain, host),
        };
        debug!(evaluator = self.kind(), host, ?verdict, "server trust evaluated");
        verdict
    }
}

impl From<DefaultEvaluator> for TrustEvaluator {
    fn from(e: DefaultEvaluator) -> Self {
        Self::Default(e)
    }
}

impl From<RevocationEvaluator> for TrustEvaluator {
    fn from(e: RevocationEvaluator) -> Self {
        Self::Revocation(e)
    }
}

impl From<PinnedCertificatesEvaluator> for TrustEvaluator {
    fn from(e: PinnedCertificatesEvaluator) -> Self {
        Self::PinnedCertificates(e)
    }
}

impl From<PinnedPublicKeysEvaluator> for TrustEvaluator {
    fn from(e: PinnedPublicKeysEvaluator) -> Self {
        Self::PinnedPublicKeys(e)
    }
}

impl From<DisabledEvaluator> for TrustEvaluator {
    fn from(e: DisabledEvaluator) -> Self {
        Self::Disabled(e)
    }
}

impl From<CompositeEvaluator> for TrustEvaluator {
    fn from(e: CompositeEvaluator) -> Self {
        Self::Composite(e)
    }
}

/// Fold definitive chain rejections into `None`, keep everything else.
fn resolved(result: Result<ResolvedChain>, evaluator: &'static str) -> Result<Option<ResolvedChain>> {
    match result {
        Ok(chain) => Ok(Some(chain)),
        Err(TrustError::Chain(e)) if e.is_rejection() => {
            debug!(evaluator, reason = %e, "certificate chain rejected");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn host_accepted(leaf: &Certificate, host: Option<&str>, evaluator: &'static str) -> bool {
    let accepted = host::matches(leaf, host);
    if !accepted {
        debug!(evaluator, host, leaf = leaf.subject(), "host does not match certificate");
    }
    accepted
}

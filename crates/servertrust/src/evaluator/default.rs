//! Standard chain validation plus host matching.

use std::sync::Arc;

use servertrust_core::{leaf_of, Certificate, Result};

use super::{host_accepted, resolved, Evaluate};
use crate::validation::{ChainValidator, PolicyKind};

const KIND: &str = "default";

/// Trusts a chain that builds to one of the validator's anchors and, unless
/// disabled, whose leaf matches the requested host.
#[derive(Debug, Clone)]
pub struct DefaultEvaluator {
    validator: Arc<ChainValidator>,
    validate_host: bool,
}

impl DefaultEvaluator {
    /// Evaluator with host validation enabled.
    #[must_use]
    pub fn new(validator: Arc<ChainValidator>) -> Self {
        Self {
            validator,
            validate_host: true,
        }
    }

    /// Enable or disable host matching. Disabling also drops the server-auth
    /// usage check, since the chain is then validated as plain X.509.
    #[must_use]
    pub fn validate_host(mut self, validate: bool) -> Self {
        self.validate_host = validate;
        self
    }

    /// Whether host matching is performed
    pub const fn validates_host(&self) -> bool {
        self.validate_host
    }
}

impl Evaluate for DefaultEvaluator {
    fn evaluate(&self, chain: &[Certificate], host: Option<&str>) -> Result<bool> {
        let leaf = leaf_of(chain)?;
        let kind = if self.validate_host {
            PolicyKind::Ssl
        } else {
            PolicyKind::BasicX509
        };

        if resolved(self.validator.build(chain, &kind), KIND)?.is_none() {
            return Ok(false);
        }
        Ok(!self.validate_host || host_accepted(leaf, host, KIND))
    }
}

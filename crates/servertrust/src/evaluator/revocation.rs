//! Default evaluation with revocation checking.

use std::sync::Arc;

use servertrust_core::{leaf_of, Certificate, ConfigError, Result};

use super::{host_accepted, resolved, Evaluate};
use crate::validation::{ChainValidator, PolicyKind, RevocationOptions};

const KIND: &str = "revocation";

/// Like [`DefaultEvaluator`](super::DefaultEvaluator), then consults the
/// validator's revocation source for the certificates in scope.
#[derive(Debug, Clone)]
pub struct RevocationEvaluator {
    validator: Arc<ChainValidator>,
    options: RevocationOptions,
    validate_host: bool,
}

impl RevocationEvaluator {
    /// Evaluator with host validation enabled.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `validator` has no revocation checker.
    pub fn new(
        validator: Arc<ChainValidator>,
        options: RevocationOptions,
    ) -> std::result::Result<Self, ConfigError> {
        if !validator.has_revocation_checker() {
            return Err(ConfigError::Invalid(
                "revocation evaluator requires a validator with a revocation checker".into(),
            ));
        }
        Ok(Self {
            validator,
            options,
            validate_host: true,
        })
    }

    /// Enable or disable host matching. Disabling also drops the server-auth
    /// usage check, as for the default evaluator.
    #[must_use]
    pub fn validate_host(mut self, validate: bool) -> Self {
        self.validate_host = validate;
        self
    }

    /// Revocation settings
    pub const fn options(&self) -> &RevocationOptions {
        &self.options
    }
}

impl Evaluate for RevocationEvaluator {
    fn evaluate(&self, chain: &[Certificate], host: Option<&str>) -> Result<bool> {
        let leaf = leaf_of(chain)?;
        let kind = PolicyKind::Revocation {
            server_auth: self.validate_host,
            options: self.options,
        };

        if resolved(self.validator.build(chain, &kind), KIND)?.is_none() {
            return Ok(false);
        }
        Ok(!self.validate_host || host_accepted(leaf, host, KIND))
    }
}

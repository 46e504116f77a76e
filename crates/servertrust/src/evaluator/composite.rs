use servertrust_core::{Certificate, ConfigError, Result};

use super::{Evaluate, TrustEvaluator};

/// Logical AND over child evaluators.
///
/// Children run in order. The first `Ok(false)` or `Err` ends evaluation and
/// is returned unchanged; later children are not consulted.
#[derive(Debug, Clone)]
pub struct CompositeEvaluator {
    evaluators: Vec<TrustEvaluator>,
}

impl CompositeEvaluator {
    /// # Errors
    ///
    /// Returns `ConfigError::EmptyComposite` if `evaluators` is empty.
    pub fn new(evaluators: Vec<TrustEvaluator>) -> std::result::Result<Self, ConfigError> {
        if evaluators.is_empty() {
            return Err(ConfigError::EmptyComposite);
        }
        Ok(Self { evaluators })
    }

    /// Children in evaluation order
    pub fn evaluators(&self) -> &[TrustEvaluator] {
        &self.evaluators
    }
}

impl Evaluate for CompositeEvaluator {
    fn evaluate(&self, chain: &[Certificate], host: Option<&str>) -> Result<bool> {
        for evaluator in &self.evaluators {
            if !evaluator.evaluate(chain, host)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

//! Per-host evaluator registry.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use servertrust_core::{Certificate, Result, TrustError};

use crate::evaluator::{Evaluate, TrustEvaluator};
use crate::host::normalize;

/// What a TLS stack should do with a server after consulting the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Disposition {
    /// An evaluator trusted the chain
    Trusted,
    /// An evaluator rejected the chain; cancel the connection
    Untrusted,
    /// No evaluator is registered; fall back to platform handling
    DefaultHandling,
}

/// Maps hosts to the evaluator responsible for them.
///
/// Host keys are compared case-insensitively and without a trailing dot.
#[derive(Debug, Clone, Default)]
pub struct ServerTrustManager {
    evaluators: HashMap<String, TrustEvaluator>,
    all_hosts_must_be_evaluated: bool,
}

impl ServerTrustManager {
    /// Empty manager.
    ///
    /// With `all_hosts_must_be_evaluated`, looking up an unregistered host is
    /// an error instead of `DefaultHandling`.
    #[must_use]
    pub fn new(all_hosts_must_be_evaluated: bool) -> Self {
        Self {
            evaluators: HashMap::new(),
            all_hosts_must_be_evaluated,
        }
    }

    /// Register `evaluator` for `host`
    #[must_use]
    pub fn with_evaluator(mut self, host: &str, evaluator: impl Into<TrustEvaluator>) -> Self {
        self.insert(host, evaluator);
        self
    }

    /// Register `evaluator` for `host`, returning any evaluator it replaces
    pub fn insert(&mut self, host: &str, evaluator: impl Into<TrustEvaluator>) -> Option<TrustEvaluator> {
        self.evaluators.insert(normalize(host), evaluator.into())
    }

    /// Whether unregistered hosts are refused
    pub const fn all_hosts_must_be_evaluated(&self) -> bool {
        self.all_hosts_must_be_evaluated
    }

    /// Registered hosts, sorted
    pub fn hosts(&self) -> Vec<&str> {
        let mut hosts: Vec<&str> = self.evaluators.keys().map(String::as_str).collect();
        hosts.sort_unstable();
        hosts
    }

    /// Evaluator registered for `host`.
    ///
    /// # Errors
    ///
    /// Returns `TrustError::NoEvaluatorForHost` when none is registered and
    /// all hosts must be evaluated.
    pub fn evaluator_for(&self, host: &str) -> Result<Option<&TrustEvaluator>> {
        match self.evaluators.get(&normalize(host)) {
            Some(evaluator) => Ok(Some(evaluator)),
            None if self.all_hosts_must_be_evaluated => {
                warn!(host, "no server trust evaluator registered");
                Err(TrustError::NoEvaluatorForHost {
                    host: host.to_string(),
                })
            }
            None => Ok(None),
        }
    }

    /// Evaluate `chain` with the evaluator registered for `host`.
    ///
    /// # Errors
    ///
    /// Propagates lookup errors and evaluator errors unchanged.
    pub fn evaluate(&self, chain: &[Certificate], host: &str) -> Result<Disposition> {
        let Some(evaluator) = self.evaluator_for(host)? else {
            debug!(host, "no evaluator registered, using default handling");
            return Ok(Disposition::DefaultHandling);
        };

        if evaluator.evaluate(chain, Some(host))? {
            Ok(Disposition::Trusted)
        } else {
            Ok(Disposition::Untrusted)
        }
    }
}

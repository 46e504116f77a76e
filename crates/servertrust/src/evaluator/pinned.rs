//! Certificate and public key pinning.

use std::sync::Arc;

use tracing::debug;

use servertrust_core::{leaf_of, Certificate, ConfigError, PublicKey, Result, TrustAnchors};

use super::{host_accepted, resolved, Evaluate};
use crate::pins::{Pin, PinSet};
use crate::validation::{ChainValidator, PolicyKind};

/// Trusts a chain only if one of its certificates matches a pin.
///
/// With chain validation on (the default) the chain must also build to an
/// anchor, and pins are looked for on the resolved path. Pinned certificates
/// are then the *only* anchors; pinned public keys leave the validator's
/// anchors in place. With chain validation off, pins are matched against the
/// presented certificates reachable from the leaf by issuer name, with no
/// signature or validity checks.
#[derive(Debug, Clone)]
pub struct PinnedEvaluator<P: Pin> {
    validator: Arc<ChainValidator>,
    pins: PinSet<P>,
    anchors: Option<TrustAnchors>,
    validate_chain: bool,
    validate_host: bool,
}

/// Pins whole certificates (byte-exact)
pub type PinnedCertificatesEvaluator = PinnedEvaluator<Certificate>;

/// Pins subject public keys, surviving certificate reissue
pub type PinnedPublicKeysEvaluator = PinnedEvaluator<PublicKey>;

impl<P: Pin> PinnedEvaluator<P> {
    /// Evaluator with chain and host validation enabled.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::EmptyPinSet` if `pins` is empty.
    pub fn new(
        validator: Arc<ChainValidator>,
        pins: impl IntoIterator<Item = P>,
    ) -> std::result::Result<Self, ConfigError> {
        let pins = PinSet::new(pins)?;
        let anchors: TrustAnchors = pins.iter().filter_map(Pin::as_anchor).cloned().collect();

        Ok(Self {
            validator,
            pins,
            anchors: (!anchors.is_empty()).then_some(anchors),
            validate_chain: true,
            validate_host: true,
        })
    }

    /// Enable or disable chain validation
    #[must_use]
    pub fn validate_certificate_chain(mut self, validate: bool) -> Self {
        self.validate_chain = validate;
        self
    }

    /// Enable or disable host matching
    #[must_use]
    pub fn validate_host(mut self, validate: bool) -> Self {
        self.validate_host = validate;
        self
    }

    /// Configured pins
    pub const fn pins(&self) -> &PinSet<P> {
        &self.pins
    }

    fn pinned(&self, chain: &[Certificate]) -> bool {
        match self.pins.first_match(chain) {
            Some(certificate) => {
                debug!(kind = P::KIND, subject = certificate.subject(), "pin matched");
                true
            }
            None => {
                debug!(kind = P::KIND, "no certificate in chain matches a pin");
                false
            }
        }
    }
}

impl<P: Pin> Evaluate for PinnedEvaluator<P> {
    fn evaluate(&self, chain: &[Certificate], host: Option<&str>) -> Result<bool> {
        let leaf = leaf_of(chain)?;

        if !self.validate_chain {
            if self.validate_host && !host_accepted(leaf, host, P::KIND) {
                return Ok(false);
            }
            return Ok(self.pinned(&issuer_linked(chain)));
        }

        let kind = if self.validate_host {
            PolicyKind::Ssl
        } else {
            PolicyKind::BasicX509
        };
        let anchors = self
            .anchors
            .as_ref()
            .unwrap_or_else(|| self.validator.anchors());
        let Some(path) = resolved(
            self.validator.build_with_anchors(chain, anchors, &kind),
            P::KIND,
        )?
        else {
            return Ok(false);
        };

        if self.validate_host && !host_accepted(leaf, host, P::KIND) {
            return Ok(false);
        }
        Ok(self.pinned(&path))
    }
}

/// Leaf followed by each presented certificate whose subject names the
/// previous certificate's issuer. Stops at a self-issued certificate or a gap.
fn issuer_linked(chain: &[Certificate]) -> Vec<Certificate> {
    let Some((leaf, rest)) = chain.split_first() else {
        return Vec::new();
    };
    let mut remaining: Vec<&Certificate> = rest.iter().collect();
    let mut linked = vec![leaf.clone()];
    let mut current = leaf;

    while !current.is_self_issued() {
        let Some(index) = remaining
            .iter()
            .position(|c| c.subject_raw() == current.issuer_raw())
        else {
            break;
        };
        current = remaining.swap_remove(index);
        linked.push(current.clone());
    }
    linked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{pki, HOST};
    use servertrust_core::{ChainError, TrustError};

    fn certs(pins: &[&Certificate]) -> PinnedCertificatesEvaluator {
        PinnedEvaluator::new(pki().unanchored_validator(), pins.iter().map(|c| (*c).clone()))
            .unwrap()
    }

    fn keys(pins: &[&Certificate]) -> PinnedPublicKeysEvaluator {
        PinnedEvaluator::new(
            pki().validator(),
            pins.iter().map(|c| c.public_key().clone()),
        )
        .unwrap()
    }

    #[test]
    fn empty_pins_fail_at_construction() {
        let err = PinnedCertificatesEvaluator::new(pki().validator(), Vec::new()).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyPinSet { .. }));
        let err = PinnedPublicKeysEvaluator::new(pki().validator(), Vec::new()).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyPinSet { .. }));
    }

    #[test]
    fn pinned_leaf_intermediate_or_root_is_trusted() {
        let pki = pki();
        let chain = pki.chain(&pki.leaf_valid_dns_name);
        for pin in [&pki.leaf_valid_dns_name, &pki.ca2, &pki.root] {
            assert_eq!(certs(&[pin]).evaluate(&chain, Some(HOST)), Ok(true), "{pin:?}");
        }
    }

    #[test]
    fn pinned_certificates_replace_validator_anchors() {
        let pki = pki();
        // ca1 is a valid CA under the same root but not on this path.
        let evaluator = PinnedEvaluator::new(pki.validator(), vec![pki.ca1.clone()]).unwrap();
        assert_eq!(
            evaluator.evaluate(&pki.chain(&pki.leaf_valid_dns_name), Some(HOST)),
            Ok(false)
        );
    }

    #[test]
    fn unpinned_chain_is_untrusted() {
        let pki = pki();
        let evaluator = certs(&[&pki.leaf_signed_by_ca1]);
        assert_eq!(
            evaluator.evaluate(&pki.chain(&pki.leaf_valid_dns_name), Some(HOST)),
            Ok(false)
        );
    }

    #[test]
    fn expired_pinned_leaf_depends_on_chain_validation() {
        let pki = pki();
        let chain = pki.chain(&pki.leaf_expired);
        let evaluator = certs(&[&pki.leaf_expired]);
        assert_eq!(evaluator.evaluate(&chain, Some(HOST)), Ok(false));

        let evaluator = evaluator.validate_certificate_chain(false);
        assert_eq!(evaluator.evaluate(&chain, Some(HOST)), Ok(true));
    }

    #[test]
    fn host_mismatch_fails_even_when_pinned() {
        let pki = pki();
        let chain = pki.chain(&pki.leaf_signed_by_ca2);
        let evaluator = certs(&[&pki.root]);
        assert_eq!(evaluator.evaluate(&chain, Some(HOST)), Ok(false));
        assert_eq!(
            evaluator.validate_certificate_chain(false).evaluate(&chain, Some(HOST)),
            Ok(false)
        );
        let evaluator = certs(&[&pki.root]).validate_host(false);
        assert_eq!(evaluator.evaluate(&chain, Some(HOST)), Ok(true));
    }

    #[test]
    fn incomplete_chain_is_still_an_error() {
        let pki = pki();
        let err = certs(&[&pki.root])
            .evaluate(&pki.missing_intermediate(), Some(HOST))
            .unwrap_err();
        assert!(matches!(err, TrustError::Chain(ChainError::Incomplete { .. })), "{err:?}");
    }

    #[test]
    fn public_key_pins_on_resolved_path() {
        let pki = pki();
        let chain = pki.chain(&pki.leaf_valid_dns_name);
        for pin in [&pki.leaf_valid_dns_name, &pki.ca2, &pki.root] {
            assert_eq!(keys(&[pin]).evaluate(&chain, Some(HOST)), Ok(true), "{pin:?}");
        }
        assert_eq!(keys(&[&pki.ca1]).evaluate(&chain, Some(HOST)), Ok(false));

        // Root supplied by the anchor set rather than the peer.
        let truncated = vec![pki.leaf_valid_dns_name.clone(), pki.ca2.clone()];
        assert_eq!(keys(&[&pki.root]).evaluate(&truncated, Some(HOST)), Ok(true));
    }

    #[test]
    fn public_key_pins_without_validation_use_presented_chain() {
        let pki = pki();
        let truncated = vec![pki.leaf_valid_dns_name.clone(), pki.ca2.clone()];
        let evaluator = keys(&[&pki.root]).validate_certificate_chain(false);
        assert_eq!(evaluator.evaluate(&truncated, Some(HOST)), Ok(false));

        let evaluator = keys(&[&pki.ca2]).validate_certificate_chain(false);
        assert_eq!(evaluator.evaluate(&truncated, Some(HOST)), Ok(true));
    }

    #[test]
    fn pins_without_validation_ignore_unlinked_certificates() {
        let pki = pki();
        let missing = pki.missing_intermediate();

        // The root follows the leaf but nothing links the two.
        let evaluator = keys(&[&pki.root]).validate_certificate_chain(false);
        assert_eq!(evaluator.evaluate(&missing, Some(HOST)), Ok(false));
        assert_eq!(
            certs(&[&pki.root])
                .validate_certificate_chain(false)
                .evaluate(&missing, Some(HOST)),
            Ok(false)
        );

        let evaluator = keys(&[&pki.leaf_valid_dns_name]).validate_certificate_chain(false);
        assert_eq!(evaluator.evaluate(&missing, Some(HOST)), Ok(true));
        assert_eq!(
            evaluator.evaluate(&pki.incorrect_intermediate(), Some(HOST)),
            Ok(true)
        );
        assert_eq!(
            keys(&[&pki.ca1])
                .validate_certificate_chain(false)
                .evaluate(&pki.incorrect_intermediate(), Some(HOST)),
            Ok(false)
        );
    }

    #[test]
    fn issuer_links_follow_names_in_any_order() {
        let pki = pki();
        let shuffled = vec![
            pki.leaf_valid_dns_name.clone(),
            pki.root.clone(),
            pki.ca1.clone(),
            pki.ca2.clone(),
        ];
        assert_eq!(
            issuer_linked(&shuffled),
            vec![pki.leaf_valid_dns_name.clone(), pki.ca2.clone(), pki.root.clone()]
        );
        assert_eq!(
            issuer_linked(&pki.missing_intermediate()),
            vec![pki.leaf_valid_dns_name.clone()]
        );
    }

    #[test]
    fn public_key_pins_with_untrusted_chain() {
        let pki = pki();
        let evaluator = PinnedPublicKeysEvaluator::new(
            pki.unanchored_validator(),
            vec![pki.leaf_valid_dns_name.public_key().clone()],
        )
        .unwrap();
        let chain = pki.chain(&pki.leaf_valid_dns_name);
        assert_eq!(evaluator.evaluate(&chain, Some(HOST)), Ok(false));
        assert_eq!(
            evaluator.validate_certificate_chain(false).evaluate(&chain, Some(HOST)),
            Ok(true)
        );
    }
}

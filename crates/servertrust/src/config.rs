//! TOML trust policy configuration.
//!
//! ```toml
//! all_hosts_must_be_evaluated = true
//! revoked = ["revoked/old-leaf.pem"]
//!
//! [anchors]
//! system = false
//! files = ["certs/root.pem"]
//!
//! [hosts."api.example.org"]
//! kind = "pinned-public-keys"
//! keys = ["pins/api.pub"]
//!
//! [hosts."example.org"]
//! kind = "composite"
//! evaluators = [
//!     { kind = "default" },
//!     { kind = "revocation", on_failure = "reject", scope = "leaf-only" },
//! ]
//! ```
//!
//! Relative paths are resolved against the directory holding the config.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use servertrust_core::{Certificate, ConfigError, PublicKey, TrustAnchors};

use crate::error::SetupError;
use crate::evaluator::{
    CompositeEvaluator, DefaultEvaluator, DisabledEvaluator, PinnedCertificatesEvaluator,
    PinnedPublicKeysEvaluator, RevocationEvaluator, TrustEvaluator,
};
use crate::loader;
use crate::manager::ServerTrustManager;
use crate::validation::{
    ChainValidator, RevocationChecker, RevocationFailurePolicy, RevocationOptions,
    RevocationScope, StaticRevocationList, DEFAULT_REVOCATION_TIMEOUT,
};

/// Top-level trust policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrustConfig {
    /// Refuse hosts with no evaluator instead of deferring to the platform
    #[serde(default)]
    pub all_hosts_must_be_evaluated: bool,

    /// Trust anchors for chain validation
    #[serde(default)]
    pub anchors: AnchorConfig,

    /// Certificate files whose certificates are treated as revoked
    #[serde(default)]
    pub revoked: Vec<PathBuf>,

    /// Evaluator per host
    #[serde(default)]
    pub hosts: BTreeMap<String, EvaluatorSpec>,
}

/// Where trust anchors come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorConfig {
    /// Include the platform CA store (default: true)
    #[serde(default = "default_true")]
    pub system: bool,

    /// Additional anchor files or directories
    #[serde(default)]
    pub files: Vec<PathBuf>,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            system: true,
            files: Vec::new(),
        }
    }
}

/// Evaluator settings, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum EvaluatorSpec {
    Default {
        #[serde(default = "default_true")]
        validate_host: bool,
    },
    Revocation {
        #[serde(default = "default_true")]
        validate_host: bool,
        on_failure: RevocationFailurePolicy,
        #[serde(default)]
        scope: RevocationScope,
        #[serde(default)]
        require_positive_response: bool,
        #[serde(default = "default_timeout_ms")]
        timeout_ms: u64,
    },
    PinnedCertificates {
        certificates: Vec<PathBuf>,
        #[serde(default = "default_true")]
        validate_certificate_chain: bool,
        #[serde(default = "default_true")]
        validate_host: bool,
    },
    PinnedPublicKeys {
        keys: Vec<PathBuf>,
        #[serde(default = "default_true")]
        validate_certificate_chain: bool,
        #[serde(default = "default_true")]
        validate_host: bool,
    },
    Disabled,
    Composite {
        evaluators: Vec<EvaluatorSpec>,
    },
}

const fn default_true() -> bool {
    true
}

#[allow(clippy::cast_possible_truncation)]
const fn default_timeout_ms() -> u64 {
    DEFAULT_REVOCATION_TIMEOUT.as_millis() as u64
}

/// Certificates and keys loaded from the files a config refers to.
#[derive(Default)]
struct PinFiles {
    certificates: HashMap<PathBuf, Vec<Certificate>>,
    keys: HashMap<PathBuf, Vec<PublicKey>>,
}

impl TrustConfig {
    /// Read a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SetupError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SetupError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parse config text.
    pub fn parse(content: &str) -> Result<Self, SetupError> {
        Ok(toml::from_str(content)?)
    }

    /// Load anchors and pins and build a manager.
    ///
    /// `checker` overrides the static list built from `revoked`. Every
    /// evaluator is constructed eagerly so configuration errors surface here
    /// and not on first use.
    pub async fn build(
        &self,
        base_dir: &Path,
        checker: Option<Arc<dyn RevocationChecker>>,
    ) -> Result<ServerTrustManager, SetupError> {
        let mut anchors = if self.anchors.system {
            loader::system_anchors().await
        } else {
            TrustAnchors::new()
        };
        for file in &self.anchors.files {
            anchors.extend(loader::load_path(base_dir.join(file)).await?);
        }
        info!(anchors = anchors.len(), hosts = self.hosts.len(), "building trust policy");

        let checker = match checker {
            Some(checker) => Some(checker),
            None if !self.revoked.is_empty() => Some(self.revocation_list(base_dir).await?),
            None => None,
        };
        let mut validator = ChainValidator::new(anchors);
        if let Some(checker) = checker {
            validator = validator.with_revocation_checker(checker);
        }
        let validator = Arc::new(validator);

        let files = self.load_pin_files(base_dir).await?;

        let mut manager = ServerTrustManager::new(self.all_hosts_must_be_evaluated);
        for (host, spec) in &self.hosts {
            let evaluator = spec
                .build(&validator, &files, base_dir)
                .map_err(|source| SetupError::Evaluator {
                    host: host.clone(),
                    source,
                })?;
            manager.insert(host, evaluator);
        }
        Ok(manager)
    }

    async fn revocation_list(&self, base_dir: &Path) -> Result<Arc<dyn RevocationChecker>, SetupError> {
        let mut list = StaticRevocationList::new();
        for file in &self.revoked {
            for certificate in loader::load_certificates(base_dir.join(file)).await? {
                list.insert(certificate.issuer_raw(), certificate.serial(), None);
            }
        }
        info!(entries = list.len(), "static revocation list loaded");
        Ok(Arc::new(list))
    }

    async fn load_pin_files(&self, base_dir: &Path) -> Result<PinFiles, SetupError> {
        let mut certificate_paths = Vec::new();
        let mut key_paths = Vec::new();
        for spec in self.hosts.values() {
            spec.collect_files(&mut certificate_paths, &mut key_paths);
        }

        let mut files = PinFiles::default();
        for path in certificate_paths {
            if !files.certificates.contains_key(path) {
                let loaded = loader::load_certificates(base_dir.join(path)).await?;
                files.certificates.insert(path.clone(), loaded);
            }
        }
        for path in key_paths {
            if !files.keys.contains_key(path) {
                let loaded = loader::load_public_keys(base_dir.join(path)).await?;
                files.keys.insert(path.clone(), loaded);
            }
        }
        Ok(files)
    }
}

impl EvaluatorSpec {
    fn collect_files<'a>(&'a self, certificates: &mut Vec<&'a PathBuf>, keys: &mut Vec<&'a PathBuf>) {
        match self {
            Self::PinnedCertificates { certificates: paths, .. } => certificates.extend(paths),
            Self::PinnedPublicKeys { keys: paths, .. } => keys.extend(paths),
            Self::Composite { evaluators } => {
                for spec in evaluators {
                    spec.collect_files(certificates, keys);
                }
            }
            Self::Default { .. } | Self::Revocation { .. } | Self::Disabled => {}
        }
    }

    fn build(
        &self,
        validator: &Arc<ChainValidator>,
        files: &PinFiles,
        base_dir: &Path,
    ) -> Result<TrustEvaluator, ConfigError> {
        let evaluator = match self {
            Self::Default { validate_host } => DefaultEvaluator::new(Arc::clone(validator))
                .validate_host(*validate_host)
                .into(),
            Self::Revocation {
                validate_host,
                on_failure,
                scope,
                require_positive_response,
                timeout_ms,
            } => {
                let options = RevocationOptions::new(*on_failure)
                    .scope(*scope)
                    .require_positive_response(*require_positive_response)
                    .timeout(Duration::from_millis(*timeout_ms));
                RevocationEvaluator::new(Arc::clone(validator), options)?
                    .validate_host(*validate_host)
                    .into()
            }
            Self::PinnedCertificates {
                certificates,
                validate_certificate_chain,
                validate_host,
            } => {
                let pins = pinned(certificates, &files.certificates, base_dir)?;
                PinnedCertificatesEvaluator::new(Arc::clone(validator), pins)?
                    .validate_certificate_chain(*validate_certificate_chain)
                    .validate_host(*validate_host)
                    .into()
            }
            Self::PinnedPublicKeys {
                keys,
                validate_certificate_chain,
                validate_host,
            } => {
                let pins = pinned(keys, &files.keys, base_dir)?;
                PinnedPublicKeysEvaluator::new(Arc::clone(validator), pins)?
                    .validate_certificate_chain(*validate_certificate_chain)
                    .validate_host(*validate_host)
                    .into()
            }
            Self::Disabled => DisabledEvaluator.into(),
            Self::Composite { evaluators } => {
                let children = evaluators
                    .iter()
                    .map(|spec| spec.build(validator, files, base_dir))
                    .collect::<Result<Vec<_>, _>>()?;
                CompositeEvaluator::new(children)?.into()
            }
        };
        Ok(evaluator)
    }
}

fn pinned<T: Clone>(
    paths: &[PathBuf],
    loaded: &HashMap<PathBuf, Vec<T>>,
    base_dir: &Path,
) -> Result<Vec<T>, ConfigError> {
    let mut pins = Vec::new();
    for path in paths {
        let found = loaded.get(path).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "pin file {} was not loaded",
                base_dir.join(path).display()
            ))
        })?;
        pins.extend(found.iter().cloned());
    }
    Ok(pins)
}

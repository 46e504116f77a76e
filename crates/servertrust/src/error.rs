use std::path::Path;

use thiserror::Error;

use servertrust_core::{ConfigError, InputError};

/// Errors loading certificates and keys from disk.
#[derive(Error, Debug)]
pub enum LoadError {
    /// File system access failed
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// Path being read
        path: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// PEM armour could not be decoded
    #[error("failed to decode PEM in {path}: {reason}")]
    PemDecode {
        /// File being decoded
        path: String,
        /// Decoder diagnostic
        reason: String,
    },

    /// A certificate or key in the file did not parse
    #[error("invalid certificate data in {path}: {source}")]
    Parse {
        /// File being parsed
        path: String,
        /// Parser error
        source: InputError,
    },

    /// The file held no certificate or key
    #[error("no certificates or keys found in {path}")]
    Empty {
        /// File that was read
        path: String,
    },
}

impl LoadError {
    /// Build an `Io` variant for `path`
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

/// Errors turning a configuration file into a [`ServerTrustManager`](crate::ServerTrustManager).
#[derive(Error, Debug)]
pub enum SetupError {
    /// The configuration file could not be read
    #[error("failed to read config {path}: {source}")]
    Read {
        /// Config path
        path: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this schema
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A referenced certificate or key file could not be loaded
    #[error(transparent)]
    Load(#[from] LoadError),

    /// An evaluator could not be constructed from its settings
    #[error("invalid evaluator for {host}: {source}")]
    Evaluator {
        /// Host whose evaluator failed
        host: String,
        /// Construction error
        source: ConfigError,
    },
}

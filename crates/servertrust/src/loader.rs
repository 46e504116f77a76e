//! Certificate and key loading.
//!
//! Files may hold DER or PEM. PEM files may bundle several blocks;
//! `CERTIFICATE` and `PUBLIC KEY` blocks are understood, others are ignored.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use servertrust_core::{Certificate, PublicKey, TrustAnchors};

use crate::error::LoadError;

/// Known root CA store locations across Linux distributions.
const CA_STORE_PATHS: &[&str] = &[
    // Debian / Ubuntu / Arch bundle
    "/etc/ssl/certs/ca-certificates.crt",
    // Fedora / RHEL bundle
    "/etc/ssl/certs/ca-bundle.crt",
    // SUSE
    "/etc/ssl/ca-bundle.pem",
    // Alpine, macOS
    "/etc/ssl/cert.pem",
    // p11-kit trust anchors
    "/etc/ca-certificates/extracted/tls-ca-bundle.pem",
    // Fedora / RHEL individual certs
    "/etc/pki/tls/certs",
];

/// File extensions picked up when scanning a directory.
const CERTIFICATE_EXTENSIONS: &[&str] = &["cer", "crt", "der", "pem"];

const PEM_CERTIFICATE: &str = "CERTIFICATE";
const PEM_PUBLIC_KEY: &str = "PUBLIC KEY";

/// Load every certificate in a DER or PEM file.
///
/// # Errors
///
/// Returns `LoadError` if the file cannot be read, holds malformed data, or
/// holds no certificate.
pub async fn load_certificates(path: impl AsRef<Path>) -> Result<Vec<Certificate>, LoadError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| LoadError::io(path, e))?;
    parse_certificates(&bytes, &path.display().to_string())
}

/// Parse certificates from in-memory DER or PEM bytes.
///
/// `source` names the origin in error messages.
pub fn parse_certificates(bytes: &[u8], source: &str) -> Result<Vec<Certificate>, LoadError> {
    let certificates = if is_pem(bytes) {
        decode_pem(bytes, source)?
            .iter()
            .filter(|block| block.tag() == PEM_CERTIFICATE)
            .map(|block| certificate(block.contents(), source))
            .collect::<Result<Vec<_>, _>>()?
    } else {
        vec![certificate(bytes, source)?]
    };

    if certificates.is_empty() {
        return Err(LoadError::Empty {
            path: source.to_string(),
        });
    }
    Ok(certificates)
}

/// Load public keys from a file.
///
/// Accepts bare `SubjectPublicKeyInfo` (DER or `PUBLIC KEY` PEM) as well as
/// certificates, whose subject keys are extracted.
///
/// # Errors
///
/// Returns `LoadError` if the file cannot be read or holds nothing usable.
pub async fn load_public_keys(path: impl AsRef<Path>) -> Result<Vec<PublicKey>, LoadError> {
    let path = path.as_ref();
    let source = path.display().to_string();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| LoadError::io(path, e))?;

    let keys = if is_pem(&bytes) {
        let mut keys = Vec::new();
        for block in decode_pem(&bytes, &source)? {
            match block.tag() {
                PEM_PUBLIC_KEY => keys.push(public_key(block.contents(), &source)?),
                PEM_CERTIFICATE => {
                    keys.push(certificate(block.contents(), &source)?.public_key().clone());
                }
                other => debug!(path = %source, tag = other, "ignoring PEM block"),
            }
        }
        keys
    } else {
        match Certificate::from_der(bytes.as_slice()) {
            Ok(cert) => vec![cert.public_key().clone()],
            Err(_) => vec![public_key(&bytes, &source)?],
        }
    };

    if keys.is_empty() {
        return Err(LoadError::Empty { path: source });
    }
    Ok(keys)
}

/// Load all certificates from the recognised files in `dir`.
///
/// Unreadable or malformed files are logged and skipped; only a failure to
/// list the directory is an error.
pub async fn load_directory(dir: impl AsRef<Path>) -> Result<Vec<Certificate>, LoadError> {
    let dir = dir.as_ref();
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| LoadError::io(dir, e))?;

    let mut paths: Vec<PathBuf> = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| LoadError::io(dir, e))?
    {
        let path = entry.path();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if CERTIFICATE_EXTENSIONS.contains(&ext.as_str()) {
            paths.push(path);
        }
    }
    // Directory order is unspecified.
    paths.sort();

    let mut certificates = Vec::new();
    for path in paths {
        match load_certificates(&path).await {
            Ok(found) => certificates.extend(found),
            Err(e) => debug!(path = %path.display(), error = %e, "skipping certificate file"),
        }
    }
    Ok(certificates)
}

/// Load a file or every recognised file in a directory.
pub async fn load_path(path: impl AsRef<Path>) -> Result<Vec<Certificate>, LoadError> {
    let path = path.as_ref();
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| LoadError::io(path, e))?;
    if metadata.is_dir() {
        load_directory(path).await
    } else {
        load_certificates(path).await
    }
}

/// Root certificates from the platform trust store.
///
/// Missing store locations are skipped; stores that fail to parse are logged.
pub async fn system_anchors() -> TrustAnchors {
    let mut anchors = TrustAnchors::new();

    for store in CA_STORE_PATHS {
        let path = Path::new(store);
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            debug!(path = store, "CA store path not found, skipping");
            continue;
        }
        match load_path(path).await {
            Ok(found) => {
                let before = anchors.len();
                anchors.extend(found);
                debug!(path = store, added = anchors.len() - before, "loaded CA store");
            }
            Err(e) => warn!(path = store, error = %e, "failed to load CA store"),
        }
    }

    anchors
}

fn is_pem(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .is_some_and(|start| bytes[start..].starts_with(b"-----BEGIN"))
}

fn decode_pem(bytes: &[u8], source: &str) -> Result<Vec<pem::Pem>, LoadError> {
    pem::parse_many(bytes).map_err(|e| LoadError::PemDecode {
        path: source.to_string(),
        reason: e.to_string(),
    })
}

fn certificate(der: &[u8], source: &str) -> Result<Certificate, LoadError> {
    Certificate::from_der(der).map_err(|e| LoadError::Parse {
        path: source.to_string(),
        source: e,
    })
}

fn public_key(der: &[u8], source: &str) -> Result<PublicKey, LoadError> {
    PublicKey::from_spki_der(der).map_err(|e| LoadError::Parse {
        path: source.to_string(),
        source: e,
    })
}

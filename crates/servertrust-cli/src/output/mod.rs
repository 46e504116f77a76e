//! Output formatting for different formats.

use std::str::FromStr;

use clap::ValueEnum;
use colored::Colorize;
use serde::{Deserialize, Serialize};

use servertrust_core::CertificateSummary;
use servertrust_core::SubjectAltName;

/// Available output formats.
#[derive(Debug, Clone, Copy, Default, ValueEnum, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text with colors
    #[default]
    Pretty,
    /// JSON output
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => anyhow::bail!(
                "Unknown output format: {s}\n\
                 Valid formats: pretty, json"
            ),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Print a value as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a certificate overview, indented under a heading.
pub fn print_certificate(index: usize, cert: &CertificateSummary) {
    println!("{} {}", format!("[{index}]").dimmed(), cert.subject.bold());
    println!("    {:<12} {}", "issuer:", cert.issuer);
    println!("    {:<12} {}", "serial:", cert.serial);
    println!(
        "    {:<12} {} .. {}",
        "valid:",
        cert.not_before.format("%Y-%m-%d"),
        cert.not_after.format("%Y-%m-%d")
    );
    if !cert.subject_alt_names.is_empty() {
        let names: Vec<String> = cert.subject_alt_names.iter().map(san_label).collect();
        println!("    {:<12} {}", "names:", names.join(", "));
    }
    if cert.is_ca {
        println!("    {:<12} {}", "ca:", "yes".yellow());
    }
    println!("    {:<12} {}", "sha256:", cert.fingerprint.cyan());
    println!("    {:<12} {}", "pin-sha256:", cert.spki_sha256.cyan());
}

fn san_label(san: &SubjectAltName) -> String {
    match san {
        SubjectAltName::Dns(name) => format!("DNS:{name}"),
        SubjectAltName::Uri(uri) => format!("URI:{uri}"),
        SubjectAltName::Ip(ip) => format!("IP:{ip}"),
    }
}

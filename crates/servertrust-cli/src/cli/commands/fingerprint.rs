//! `servertrust fingerprint` - Show certificate fingerprints and SPKI pins.

use std::process::ExitCode;

use anyhow::{Context as _, Result};
use serde::Serialize;

use servertrust::loader;
use servertrust_core::CertificateSummary;

use super::Context;
use crate::cli::args::FingerprintArgs;
use crate::output::{print_certificate, print_json, OutputFormat};

#[derive(Debug, Serialize)]
struct FileReport {
    path: String,
    certificates: Vec<CertificateSummary>,
}

pub async fn execute(ctx: Context, args: FingerprintArgs) -> Result<ExitCode> {
    let mut reports = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let certificates = loader::load_certificates(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        reports.push(FileReport {
            path: path.display().to_string(),
            certificates: certificates.iter().map(|c| c.summary()).collect(),
        });
    }

    match ctx.output_format {
        OutputFormat::Json => print_json(&reports)?,
        OutputFormat::Pretty => {
            for report in &reports {
                println!("{}", report.path);
                for (i, cert) in report.certificates.iter().enumerate() {
                    print_certificate(i, cert);
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

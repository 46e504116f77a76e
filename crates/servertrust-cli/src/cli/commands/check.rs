//! `servertrust check` - Evaluate a certificate chain for a host.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use colored::Colorize;
use serde::Serialize;

use servertrust::{
    loader, ChainValidator, DefaultEvaluator, DisabledEvaluator, Disposition, Evaluate,
    PinnedCertificatesEvaluator, PinnedPublicKeysEvaluator, TrustConfig, TrustEvaluator,
};
use servertrust_core::{CertificateSummary, TrustAnchors};

use super::Context;
use crate::cli::args::{CheckArgs, Policy};
use crate::output::{print_certificate, print_json, OutputFormat};

const EXIT_UNTRUSTED: u8 = 1;
const EXIT_ERROR: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
enum Verdict {
    Trusted,
    Untrusted,
    DefaultHandling,
    Error,
}

#[derive(Debug, Serialize)]
struct CheckReport {
    host: Option<String>,
    evaluator: String,
    verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    chain: Vec<CertificateSummary>,
}

pub async fn execute(ctx: Context, args: CheckArgs) -> Result<ExitCode> {
    let chain = loader::load_certificates(&args.chain)
        .await
        .with_context(|| format!("reading chain {}", args.chain.display()))?;

    let (evaluator, outcome) = if let Some(config_path) = &args.config {
        let host = args
            .host
            .as_deref()
            .context("--host is required with --config")?;
        let config = TrustConfig::load(config_path)?;
        let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
        let manager = config.build(base_dir, None).await?;

        let kind = match manager.evaluator_for(host) {
            Ok(Some(evaluator)) => evaluator.kind(),
            Ok(None) | Err(_) => "none",
        };
        (kind.to_string(), manager.evaluate(&chain, host))
    } else {
        let evaluator = builtin_evaluator(&args).await?;
        let outcome = evaluator
            .evaluate(&chain, args.host.as_deref())
            .map(|trusted| {
                if trusted {
                    Disposition::Trusted
                } else {
                    Disposition::Untrusted
                }
            });
        (evaluator.kind().to_string(), outcome)
    };

    let (verdict, error) = match outcome {
        Ok(Disposition::Trusted) => (Verdict::Trusted, None),
        Ok(Disposition::Untrusted) => (Verdict::Untrusted, None),
        Ok(Disposition::DefaultHandling) => (Verdict::DefaultHandling, None),
        Err(e) => (Verdict::Error, Some(e.to_string())),
    };

    let report = CheckReport {
        host: args.host.clone(),
        evaluator,
        verdict,
        error,
        chain: chain.iter().map(|c| c.summary()).collect(),
    };

    match ctx.output_format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Pretty => print_report(&report),
    }

    Ok(match verdict {
        Verdict::Trusted | Verdict::DefaultHandling => ExitCode::SUCCESS,
        Verdict::Untrusted => ExitCode::from(EXIT_UNTRUSTED),
        Verdict::Error => ExitCode::from(EXIT_ERROR),
    })
}

/// Build the evaluator selected with `--policy`.
async fn builtin_evaluator(args: &CheckArgs) -> Result<TrustEvaluator> {
    let pinned = matches!(
        args.policy,
        Policy::PinnedCertificates | Policy::PinnedPublicKeys
    );
    if args.skip_chain_validation && !pinned {
        bail!("--skip-chain-validation only applies to pinned policies");
    }
    if !args.pin.is_empty() && !pinned {
        bail!("--pin only applies to pinned policies");
    }
    if args.policy == Policy::Disabled {
        return Ok(DisabledEvaluator.into());
    }

    let mut anchors = if args.no_system_anchors {
        TrustAnchors::new()
    } else {
        loader::system_anchors().await
    };
    for path in &args.anchor {
        let found = loader::load_path(path)
            .await
            .with_context(|| format!("reading anchors {}", path.display()))?;
        anchors.extend(found);
    }
    let validator = Arc::new(ChainValidator::new(anchors));
    let validate_host = !args.skip_host_validation;
    let validate_chain = !args.skip_chain_validation;

    let evaluator = match args.policy {
        Policy::Default => DefaultEvaluator::new(validator)
            .validate_host(validate_host)
            .into(),
        Policy::PinnedCertificates => {
            let mut pins = Vec::new();
            for path in &args.pin {
                pins.extend(loader::load_certificates(path).await?);
            }
            PinnedCertificatesEvaluator::new(validator, pins)?
                .validate_certificate_chain(validate_chain)
                .validate_host(validate_host)
                .into()
        }
        Policy::PinnedPublicKeys => {
            let mut pins = Vec::new();
            for path in &args.pin {
                pins.extend(loader::load_public_keys(path).await?);
            }
            PinnedPublicKeysEvaluator::new(validator, pins)?
                .validate_certificate_chain(validate_chain)
                .validate_host(validate_host)
                .into()
        }
        Policy::Disabled => DisabledEvaluator.into(),
    };
    Ok(evaluator)
}

fn print_report(report: &CheckReport) {
    let host = report.host.as_deref().unwrap_or("(any host)");
    let status = match report.verdict {
        Verdict::Trusted => "TRUSTED".green().bold(),
        Verdict::Untrusted => "UNTRUSTED".red().bold(),
        Verdict::DefaultHandling => "NO POLICY".yellow().bold(),
        Verdict::Error => "ERROR".red().bold(),
    };
    println!("{status} {} ({})", host.bold(), report.evaluator.dimmed());
    if let Some(error) = &report.error {
        println!("  {error}");
    }
    println!();
    for (i, cert) in report.chain.iter().enumerate() {
        print_certificate(i, cert);
    }
}

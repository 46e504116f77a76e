//! CLI argument parsing and command dispatch.

pub mod args;
pub mod commands;

use std::process::ExitCode;

use anyhow::Result;
use args::{Cli, Commands};
use clap::Parser;

/// Run the CLI application.
///
/// Exit status is 0 when the chain is trusted (or the command has no
/// verdict), 1 when it is untrusted and 2 when evaluation failed.
pub async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let ctx = commands::Context {
        output_format: cli.output.unwrap_or_default(),
    };

    match cli.command {
        Commands::Check(args) => commands::check::execute(ctx, args).await,
        Commands::Fingerprint(args) => commands::fingerprint::execute(ctx, args).await,
    }
}

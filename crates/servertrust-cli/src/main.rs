//! servertrust - evaluate TLS certificate chains against trust policies.

use std::process::ExitCode;

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    servertrust_cli::run().await
}

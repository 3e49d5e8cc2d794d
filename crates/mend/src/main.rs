//! Mend CLI binary.

use anyhow::Result;
use mend::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Main entry point for the mend CLI.
///
/// Uses tokio's current_thread runtime: a repair session is a short
/// sequence of I/O-bound steps with no internal concurrency.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Controlled via RUST_LOG, e.g. RUST_LOG=mend=debug,mend_jsonl=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mend=info,mend_jsonl=info")),
        )
        .with_target(false)
        .init();

    tracing::debug!("starting mend CLI");

    let cli = Cli::parse_args();
    cli.execute().await?;

    tracing::debug!("mend CLI completed");
    Ok(())
}

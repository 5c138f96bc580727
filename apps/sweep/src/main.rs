//! Runs one confirmation sweep against the configured database and prints the progress report,
//! one line per unconfirmed party, to stdout. Logs go to stderr.

use anyhow::{Context, bail};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;
use wed::bootstrap;
use wed::domain::config::ApiConfig;
use wed::features::confirmation;
use wed::kernel::config::load_config;
use wed_logger::ConsoleTarget;

#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Config file; defaults to `server.{toml,json,yaml}` in the working directory.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[wed_runtime::main(maintenance)]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg: ApiConfig =
        load_config(cli.config.as_ref()).context("Critical: Configuration is malformed")?;
    let _log = bootstrap::init_logger(env!("CARGO_PKG_NAME"), &cfg.logging, ConsoleTarget::Stderr)?;

    let db = bootstrap::connect(&cfg.database).await?;
    let sweeper =
        confirmation::sweeper(&db, bootstrap::mail_transport(&cfg.mail), &cfg.mail.sender_name);

    let mut out = std::io::stdout();
    let mut write_failed = false;
    let outcome = sweeper
        .run(|line| {
            write_failed |= writeln!(out, "{line}").is_err();
        })
        .await;

    if write_failed {
        bail!("Failed to write the sweep report to stdout");
    }
    let summary = outcome?;
    info!(?summary, "Sweep complete");
    Ok(())
}

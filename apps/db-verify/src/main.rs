//! Schema verification for the hosted database.
//!
//! Checks every expected table and the `neighborhood_feed` view with
//! head-only count reads, then prints a summary. Exits non-zero only when
//! configuration is missing or the scan is aborted.

use std::io;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use hosted_db_core::{logging, verify, ProcessEnv, RestClient};

/// Command-line arguments. Behaviour is controlled by environment variables.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let _args = Args::parse();
    logging::init();

    let mut stdout = io::stdout();
    let outcome = verify::run(&ProcessEnv, RestClient::connect, &mut stdout)
        .await
        .context("Failed to write report")?;
    Ok(outcome.into())
}

//! Connection test for the hosted database.
//!
//! Reads `SUPABASE_URL` and `SUPABASE_ANON_KEY` from the environment and
//! issues one count-only read against the `users` table.

use std::io;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use hosted_db_core::{connection, logging, ProcessEnv, RestClient};

/// Command-line arguments. Behaviour is controlled by environment variables.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let _args = Args::parse();
    logging::init();

    let mut stdout = io::stdout();
    let outcome = connection::run(&ProcessEnv, RestClient::connect, &mut stdout)
        .await
        .context("Failed to write report")?;
    Ok(outcome.into())
}

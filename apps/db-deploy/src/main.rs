//! Schema deployment advisory.
//!
//! Loads `backend/supabase/schema.sql` and prints how to apply it:
//! - manual steps in the Dashboard SQL Editor
//! - the equivalent Supabase CLI commands
//!
//! Reads `SUPABASE_SERVICE_ROLE_KEY` (required), `SUPABASE_URL` and
//! `SCHEMA_FILE` from the environment. Nothing is sent to the database.

use std::env;
use std::io;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use hosted_db_core::{deploy, logging, ProcessEnv};

/// Command-line arguments. Behaviour is controlled by environment variables.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {}

fn main() -> anyhow::Result<ExitCode> {
    let _args = Args::parse();
    logging::init();

    // `target/<profile>/db-deploy` sits two levels under the workspace root
    let exe = env::current_exe().context("Cannot locate the db-deploy executable")?;
    let program_dir = exe
        .parent()
        .context("db-deploy executable has no parent directory")?;
    let mut stdout = io::stdout().lock();
    let outcome =
        deploy::run(&ProcessEnv, program_dir, &mut stdout).context("Failed to write report")?;
    Ok(outcome.into())
}

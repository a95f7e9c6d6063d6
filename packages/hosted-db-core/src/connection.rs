//! Connection test.
//!
//! One count-only read against [`PROBE_TABLE`] with the anonymous key. A
//! single failure is conclusive; nothing is retried.

use std::io::{self, Write};

use tracing::debug;

use crate::client::{CountMode, Presence, TableReader};
use crate::config::{Configuration, EnvSource, ToolProfile};
use crate::error::{OpsError, Result};
use crate::manifest::PROBE_TABLE;
use crate::report::{self, Outcome, FAIL, OK};

const POSSIBLE_ISSUES: [&str; 3] = [
    "Invalid credentials",
    "Database schema not yet deployed",
    "Network connectivity issue",
];

/// Reads the probe table and returns its row count, if the service reported one.
pub async fn probe<C: TableReader + ?Sized>(client: &C) -> Result<Option<u64>> {
    match client.count_rows(PROBE_TABLE, CountMode::Get).await? {
        Presence::Present { rows } => Ok(rows),
        Presence::Absent => Err(OpsError::SchemaAbsence {
            relation: PROBE_TABLE.to_string(),
        }),
    }
}

/// Which of the possible issues an error points at.
pub fn likely_cause(err: &OpsError) -> &'static str {
    match err {
        OpsError::Authentication(_) | OpsError::InvalidConfiguration { .. } => {
            "the credentials were rejected"
        }
        OpsError::SchemaAbsence { .. } => "the database schema is not deployed",
        OpsError::Connectivity(_) => "the endpoint could not be reached",
        OpsError::PermissionDenied { .. } => {
            "the credentials are valid but row-level security blocks the read"
        }
        _ => "the service returned an unexpected response",
    }
}

/// Runs the connection test.
///
/// `connect` is only called once the configuration resolved.
pub async fn run<E, F, C, W>(env: &E, connect: F, out: &mut W) -> io::Result<Outcome>
where
    E: EnvSource + ?Sized,
    F: FnOnce(&Configuration) -> Result<C>,
    C: TableReader,
    W: Write + ?Sized,
{
    let config = match Configuration::resolve(env, &ToolProfile::CHECK) {
        Ok(config) => config,
        Err(err) => {
            report::error(out, &err)?;
            return Ok(Outcome::Failure);
        }
    };
    config.render(out)?;

    report::section(out, "🔌", "Testing Supabase connection...")?;
    debug!(endpoint = config.endpoint(), "Probing {}", PROBE_TABLE);
    let result = match connect(&config) {
        Ok(client) => probe(&client).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(rows) => {
            writeln!(out, "{} SUCCESS: Connected to Supabase!", OK)?;
            match rows {
                Some(rows) => writeln!(out, "   {} table rows: {}", PROBE_TABLE, rows)?,
                None => writeln!(out, "   {} table rows: unknown", PROBE_TABLE)?,
            }
            Ok(Outcome::Success)
        }
        Err(err) => {
            render_failure(out, &err)?;
            Ok(Outcome::Failure)
        }
    }
}

/// Failure kind, message, likely cause and the checklist.
pub fn render_failure<W: Write + ?Sized>(out: &mut W, err: &OpsError) -> io::Result<()> {
    writeln!(out, "{} FAILED: {}", FAIL, err.kind())?;
    writeln!(out, "   Error: {}", err)?;
    writeln!(out, "   Likely cause: {}", likely_cause(err))?;
    if let Some(hint) = report::hint(err) {
        writeln!(out, "   {}", hint)?;
    }
    report::numbered(out, "Possible issues:", &POSSIBLE_ISSUES)
}

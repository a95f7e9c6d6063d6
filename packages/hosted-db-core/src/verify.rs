//! Schema verification.
//!
//! Every expected table gets one head-only count read, in declaration order.
//! A missing or unreadable table is recorded and the scan moves on; only
//! run-wide failures (rejected key, unreachable endpoint) stop it.

use std::io::{self, Write};

use tracing::{debug, warn};

use crate::client::{CountMode, Presence, TableReader};
use crate::config::{Configuration, EnvSource, ToolProfile};
use crate::error::{OpsError, Result};
use crate::manifest::{EXPECTED_TABLES, EXPECTED_VIEW};
use crate::report::{self, Outcome, CHECK, FAIL, INFO, NAME_WIDTH, OK, WARN};

const NEXT_STEPS: [&str; 3] = [
    "Check tables in Supabase Table Editor",
    "Enable Phone Authentication in Dashboard",
    "Start building mobile app features",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableStatus {
    Found,
    NotFound,
    /// Reachable relation that could not be read, with the reason
    Unreadable(String),
}

/// Presence check of one table or view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCheckResult {
    pub table_name: String,
    pub status: TableStatus,
    pub row_count: Option<u64>,
}

impl TableCheckResult {
    pub fn is_found(&self) -> bool {
        self.status == TableStatus::Found
    }

    /// Status line with the name padded to [`NAME_WIDTH`].
    pub fn render<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        match &self.status {
            TableStatus::Found => match self.row_count {
                Some(rows) => writeln!(
                    out,
                    "  {} {:<width$} ({} rows)",
                    OK,
                    self.table_name,
                    rows,
                    width = NAME_WIDTH
                ),
                None => writeln!(
                    out,
                    "  {} {:<width$} (row count withheld)",
                    OK,
                    self.table_name,
                    width = NAME_WIDTH
                ),
            },
            TableStatus::NotFound => writeln!(
                out,
                "  {} {:<width$} NOT FOUND",
                FAIL,
                self.table_name,
                width = NAME_WIDTH
            ),
            TableStatus::Unreadable(reason) => writeln!(
                out,
                "  {} {:<width$} UNREADABLE ({})",
                WARN,
                self.table_name,
                reason,
                width = NAME_WIDTH
            ),
        }
    }
}

/// Aggregated scan result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationReport {
    pub tables: Vec<TableCheckResult>,
    pub view: TableCheckResult,
}

impl VerificationReport {
    /// Tables reported as absent.
    pub fn missing_tables(&self) -> usize {
        self.tables
            .iter()
            .filter(|t| t.status == TableStatus::NotFound)
            .count()
    }

    /// Tables that exist but could not be read.
    pub fn unreadable_tables(&self) -> usize {
        self.tables
            .iter()
            .filter(|t| matches!(t.status, TableStatus::Unreadable(_)))
            .count()
    }

    pub fn all_found(&self) -> bool {
        self.tables.iter().all(TableCheckResult::is_found) && self.view.is_found()
    }

    /// One-line aggregate of everything that was not found.
    pub fn summary(&self) -> String {
        if self.all_found() {
            return "Schema deployed successfully!".to_string();
        }
        let total = self.tables.len();
        let mut problems = Vec::new();
        match self.missing_tables() {
            0 => {}
            missing => problems.push(format!("{} of {} tables missing", missing, total)),
        }
        match self.unreadable_tables() {
            0 => {}
            unreadable => {
                problems.push(format!("{} of {} tables unreadable", unreadable, total))
            }
        }
        match self.view.status {
            TableStatus::Found => {}
            TableStatus::NotFound => {
                problems.push(format!("View {} missing", self.view.table_name))
            }
            TableStatus::Unreadable(_) => {
                problems.push(format!("View {} unreadable", self.view.table_name))
            }
        }
        problems.join(", ")
    }
}

/// Checks one relation. Errors only for run-wide failures.
pub async fn check_relation<C: TableReader + ?Sized>(
    client: &C,
    relation: &str,
) -> Result<TableCheckResult> {
    let (status, row_count) = match client.count_rows(relation, CountMode::Head).await {
        Ok(Presence::Present { rows }) => (TableStatus::Found, rows),
        Ok(Presence::Absent) | Err(OpsError::SchemaAbsence { .. }) => {
            (TableStatus::NotFound, None)
        }
        Err(err) if err.is_run_wide() => return Err(err),
        Err(err) => {
            warn!(relation, error = %err, "Relation unreadable");
            (TableStatus::Unreadable(err.to_string()), None)
        }
    };
    debug!(relation, ?status, ?row_count, "Checked relation");
    Ok(TableCheckResult {
        table_name: relation.to_string(),
        status,
        row_count,
    })
}

/// Checks `tables` in order, then `view`.
pub async fn verify_schema<C: TableReader + ?Sized>(
    client: &C,
    tables: &[&str],
    view: &str,
) -> Result<VerificationReport> {
    let mut results = Vec::with_capacity(tables.len());
    for table in tables {
        results.push(check_relation(client, table).await?);
    }
    let view = check_relation(client, view).await?;
    Ok(VerificationReport {
        tables: results,
        view,
    })
}

/// Runs the verifier against [`EXPECTED_TABLES`] and [`EXPECTED_VIEW`].
///
/// `connect` is only called once the configuration resolved. A completed
/// scan succeeds even when relations are missing; the summary line carries
/// the aggregate.
pub async fn run<E, F, C, W>(env: &E, connect: F, out: &mut W) -> io::Result<Outcome>
where
    E: EnvSource + ?Sized,
    F: FnOnce(&Configuration) -> Result<C>,
    C: TableReader,
    W: Write + ?Sized,
{
    let config = match Configuration::resolve(env, &ToolProfile::VERIFY) {
        Ok(config) => config,
        Err(err) => {
            report::error(out, &err)?;
            return Ok(Outcome::Failure);
        }
    };

    report::banner(out, "Supabase Schema Verification")?;
    writeln!(out)?;
    writeln!(out, "{} Project: {}", CHECK, config.endpoint())?;
    writeln!(
        out,
        "{} {}: {}",
        CHECK,
        config.credential_kind.env_var(),
        config.redacted_credential()
    )?;

    let scan = match connect(&config) {
        Ok(client) => verify_schema(&client, &EXPECTED_TABLES, EXPECTED_VIEW).await,
        Err(err) => Err(err),
    };
    let verification = match scan {
        Ok(verification) => verification,
        Err(err) => {
            render_abort(out, &err)?;
            return Ok(Outcome::Failure);
        }
    };

    render_report(out, &verification)?;
    Ok(Outcome::Success)
}

/// Table lines, view check, RLS note, summary and next steps.
pub fn render_report<W: Write + ?Sized>(
    out: &mut W,
    verification: &VerificationReport,
) -> io::Result<()> {
    report::section(out, "🔍", "Checking tables...")?;
    for table in &verification.tables {
        table.render(out)?;
    }

    report::section(out, "🔍", "Checking views...")?;
    let view = &verification.view;
    match &view.status {
        TableStatus::Found => writeln!(out, "  {} {} accessible", OK, view.table_name)?,
        TableStatus::NotFound => writeln!(out, "  {} {} NOT FOUND", FAIL, view.table_name)?,
        TableStatus::Unreadable(reason) => writeln!(
            out,
            "  {} {} UNREADABLE ({})",
            WARN, view.table_name, reason
        )?,
    }

    report::section(out, "🔍", "Checking RLS policies...")?;
    writeln!(
        out,
        "  {} RLS policies are not checked automatically (review them in Dashboard)",
        INFO
    )?;

    writeln!(out)?;
    report::banner(out, "Verification Complete!")?;
    writeln!(out)?;

    let marker = if verification.all_found() { OK } else { WARN };
    writeln!(out, "{} {}", marker, verification.summary())?;

    report::numbered(out, "Next steps:", &NEXT_STEPS)
}

fn render_abort<W: Write + ?Sized>(out: &mut W, err: &OpsError) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{} Verification aborted: {}", FAIL, err)?;
    if let Some(hint) = report::hint(err) {
        writeln!(out, "   {}", hint)?;
    }
    Ok(())
}

//! Console reporting shared by the tools.

use std::io::{self, Write};
use std::process::ExitCode;

use crate::error::OpsError;

pub const OK: &str = "✅";
pub const CHECK: &str = "✓";
pub const FAIL: &str = "❌";
pub const WARN: &str = "⚠️ ";
pub const INFO: &str = "ℹ️ ";

/// Column width of relation names in status lines.
pub const NAME_WIDTH: usize = 25;

const RULE_WIDTH: usize = 50;

/// Result of a tool run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    pub fn code(self) -> u8 {
        match self {
            Outcome::Success => 0,
            Outcome::Failure => 1,
        }
    }
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        ExitCode::from(outcome.code())
    }
}

pub fn rule<W: Write + ?Sized>(out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))
}

/// Title framed by rules.
pub fn banner<W: Write + ?Sized>(out: &mut W, title: &str) -> io::Result<()> {
    rule(out)?;
    writeln!(out, "  {}", title)?;
    rule(out)
}

/// Blank line then a section heading.
pub fn section<W: Write + ?Sized>(out: &mut W, icon: &str, title: &str) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{} {}", icon, title)
}

/// Numbered list under an indented heading.
pub fn numbered<W: Write + ?Sized>(out: &mut W, heading: &str, items: &[&str]) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", heading)?;
    for (index, item) in items.iter().enumerate() {
        writeln!(out, "   {}. {}", index + 1, item)?;
    }
    Ok(())
}

/// Prints an error with its remediation hint, if it has one.
pub fn error<W: Write + ?Sized>(out: &mut W, err: &OpsError) -> io::Result<()> {
    writeln!(out, "{} {}", FAIL, err)?;
    if let Some(hint) = hint(err) {
        writeln!(out, "   {}", hint)?;
    }
    Ok(())
}

/// Remediation hint for an error.
pub fn hint(err: &OpsError) -> Option<String> {
    match err {
        OpsError::ConfigurationMissing { hint, .. } => Some(hint.clone()),
        OpsError::InvalidConfiguration { name, .. } => {
            Some(format!("Check the value exported as {}", name))
        }
        OpsError::FileAccess { .. } => Some(format!(
            "Check the path or point {} at the schema file",
            crate::config::SCHEMA_FILE_VAR
        )),
        OpsError::Connectivity(_) => {
            Some("Check the endpoint URL and your network connection".to_string())
        }
        OpsError::Authentication(_) => {
            Some("Check that the key belongs to this project and has not been rotated".to_string())
        }
        OpsError::SchemaAbsence { .. } => {
            Some("Deploy backend/supabase/schema.sql first (see db-deploy)".to_string())
        }
        OpsError::PermissionDenied { .. } => {
            Some("Review the row-level security policies and grants in the Dashboard".to_string())
        }
        OpsError::UnexpectedResponse { .. } => None,
    }
}

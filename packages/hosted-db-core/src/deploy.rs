//! Schema deployment advisory.
//!
//! Loads the schema file and prints how to apply it. Nothing is executed
//! against the hosted database.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::{Configuration, EnvSource, ToolProfile, SCHEMA_FILE_VAR};
use crate::error::{OpsError, Result};
use crate::manifest::SchemaManifest;
use crate::report::{self, Outcome, CHECK};

/// Location of the schema file below the workspace root.
pub const SCHEMA_SUBPATH: [&str; 3] = ["backend", "supabase", "schema.sql"];

/// RPC function that could execute raw SQL; named in the advisory, never called.
pub const EXEC_SQL_FUNCTION: &str = "exec_sql";

/// A loaded schema file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaFile {
    pub path: PathBuf,
    pub contents: Vec<u8>,
}

impl SchemaFile {
    /// Size in bytes, exactly as stored on disk.
    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}

/// Two levels up from `program_dir`, then [`SCHEMA_SUBPATH`].
pub fn default_schema_path(program_dir: &Path) -> PathBuf {
    let root = program_dir.ancestors().nth(2).unwrap_or(program_dir);
    SCHEMA_SUBPATH.iter().fold(root.to_path_buf(), |path, part| path.join(part))
}

/// `SCHEMA_FILE` when set, otherwise [`default_schema_path`].
pub fn resolve_schema_path<E: EnvSource + ?Sized>(env: &E, program_dir: &Path) -> PathBuf {
    env.var(SCHEMA_FILE_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| default_schema_path(program_dir))
}

pub fn load_schema(path: &Path) -> Result<SchemaFile> {
    let contents = fs::read(path).map_err(|e| OpsError::FileAccess {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    debug!(path = %path.display(), bytes = contents.len(), "Loaded schema file");
    Ok(SchemaFile {
        path: path.to_path_buf(),
        contents,
    })
}

/// Runs the advisory. `program_dir` anchors the default schema location.
pub fn run<E, W>(env: &E, program_dir: &Path, out: &mut W) -> io::Result<Outcome>
where
    E: EnvSource + ?Sized,
    W: Write + ?Sized,
{
    let config = match Configuration::resolve(env, &ToolProfile::DEPLOY) {
        Ok(config) => config,
        Err(err) => {
            report::error(out, &err)?;
            return Ok(Outcome::Failure);
        }
    };
    config.render(out)?;

    let path = resolve_schema_path(env, program_dir);
    let schema = match load_schema(&path) {
        Ok(schema) => schema,
        Err(err) => {
            report::error(out, &err)?;
            return Ok(Outcome::Failure);
        }
    };
    writeln!(out, "{} Loaded schema: {}", CHECK, schema.path.display())?;
    writeln!(out, "   Size: {} bytes", schema.len())?;

    render_instructions(out, &config, &schema, &SchemaManifest::CURRENT)?;
    Ok(Outcome::Success)
}

/// Manual and CLI deployment options followed by the manifest summary.
pub fn render_instructions<W: Write + ?Sized>(
    out: &mut W,
    config: &Configuration,
    schema: &SchemaFile,
    manifest: &SchemaManifest,
) -> io::Result<()> {
    report::section(out, "📋", "SQL ready to deploy!")?;

    let editor = match config.project_ref() {
        Some(project) => format!(
            "Go to: https://supabase.com/dashboard/project/{}/sql",
            project
        ),
        None => format!("Open the SQL Editor of the project at {}", config.endpoint()),
    };
    let open = format!("Open: {}", schema.path.display());
    report::numbered(
        out,
        "Option 1: Manual Deployment (RECOMMENDED)",
        &[
            editor.as_str(),
            open.as_str(),
            "Copy entire file content",
            "Paste into SQL Editor",
            "Click 'Run'",
        ],
    )?;

    writeln!(out)?;
    writeln!(out, "Option 2: Supabase CLI (if installed)")?;
    match config.project_ref() {
        Some(project) => writeln!(out, "   supabase link --project-ref {}", project)?,
        None => writeln!(out, "   supabase link --project-ref YOUR_PROJECT_REF")?,
    }
    writeln!(out, "   supabase db push")?;

    match config.rest_url(&["rpc", EXEC_SQL_FUNCTION]) {
        Ok(rpc) => {
            writeln!(out)?;
            writeln!(
                out,
                "{} SQL is not executed through {}; apply the file with one of the options above",
                report::INFO,
                rpc
            )?;
        }
        Err(err) => debug!(error = %err, "No RPC endpoint to show"),
    }

    writeln!(out)?;
    writeln!(out, "{} Schema file location: {}", CHECK, schema.path.display())?;
    writeln!(out, "{} Schema contains:", CHECK)?;
    writeln!(out, "   - Tables: {}", manifest.tables.join(", "))?;
    writeln!(out, "   - RLS policies: {} policies", manifest.policy_count)?;
    writeln!(out, "   - Views: {}", manifest.views.join(", "))?;
    writeln!(out, "   - Functions: {}", manifest.functions.join(", "))
}

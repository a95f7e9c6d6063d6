//! Operator tools for the hosted NeighborGigs database.
//!
//! Provides the pieces behind the three binaries:
//! - environment-driven configuration with redacted echo
//! - a PostgREST count client
//! - the deployment advisory, connection test and schema verification runs

pub mod client;
pub mod config;
pub mod connection;
pub mod deploy;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod report;
pub mod verify;

pub use client::{CountMode, Presence, RestClient, TableReader};
pub use config::{Configuration, CredentialKind, EnvSource, ProcessEnv, ToolProfile};
pub use error::{OpsError, Result};
pub use report::Outcome;

//! Tool runs against an in-memory table reader.
//!
//! Tests are organized by tool:
//! 1. Schema deployment advisory
//! 2. Connection test
//! 3. Schema verification

mod helpers;
mod schema_verifier;

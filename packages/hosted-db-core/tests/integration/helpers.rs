//! Shared fixtures for the tool tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use hosted_db_core::{CountMode, OpsError, Presence, Result, TableReader};

pub const ANON_KEY: &str = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.anon-test-key";
pub const SERVICE_KEY: &str = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.service-test-key";
pub const HOSTED_URL: &str = "https://abcd1234.supabase.co";

pub fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Table reader answering from a fixed map; unknown relations are absent.
#[derive(Default)]
pub struct StubReader {
    responses: HashMap<String, Result<Presence>>,
    calls: Mutex<Vec<(String, CountMode)>>,
}

impl StubReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn present(self, relation: &str, rows: u64) -> Self {
        self.respond(relation, Ok(Presence::Present { rows: Some(rows) }))
    }

    pub fn failing(self, relation: &str, err: OpsError) -> Self {
        self.respond(relation, Err(err))
    }

    pub fn respond(mut self, relation: &str, response: Result<Presence>) -> Self {
        self.responses.insert(relation.to_string(), response);
        self
    }

    pub fn calls(&self) -> Vec<(String, CountMode)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TableReader for StubReader {
    async fn count_rows(&self, relation: &str, mode: CountMode) -> Result<Presence> {
        self.calls
            .lock()
            .unwrap()
            .push((relation.to_string(), mode));
        self.responses
            .get(relation)
            .cloned()
            .unwrap_or(Ok(Presence::Absent))
    }
}

pub fn output(buffer: Vec<u8>) -> String {
    String::from_utf8(buffer).expect("console output is UTF-8")
}

//! PostgREST table client.
//!
//! Only count reads are issued: a `HEAD` or a `GET ...&limit=0` with
//! `Prefer: count=exact`, the total taken from the `Content-Range` header.

use std::error::Error as _;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_RANGE};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::config::Configuration;
use crate::error::{OpsError, Result};

/// Relation missing from the schema cache / catalog
const ABSENT_CODES: [&str; 2] = ["42P01", "PGRST205"];
/// JWT rejected
const AUTH_CODES: [&str; 2] = ["PGRST301", "PGRST302"];
/// Insufficient privilege
const PERMISSION_CODE: &str = "42501";

/// How a count read is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountMode {
    /// `HEAD`, no body on success or failure
    Head,
    /// `GET` with `limit=0`; error bodies carry PostgREST codes
    Get,
}

/// Outcome of a count read that reached the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Relation readable; `rows` is `None` when the service withheld the total
    Present { rows: Option<u64> },
    Absent,
}

/// Read access to named tables and views.
#[async_trait]
pub trait TableReader {
    async fn count_rows(&self, relation: &str, mode: CountMode) -> Result<Presence>;
}

#[async_trait]
impl<T: TableReader + Sync + ?Sized> TableReader for &T {
    async fn count_rows(&self, relation: &str, mode: CountMode) -> Result<Presence> {
        (**self).count_rows(relation, mode).await
    }
}

/// PostgREST error payload.
#[derive(Debug, Default, Deserialize)]
struct PostgrestError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

/// HTTP client bound to one endpoint and credential.
pub struct RestClient {
    http: reqwest::Client,
    config: Configuration,
}

impl RestClient {
    /// Builds a client sending `apikey` and bearer headers on every request.
    ///
    /// No request is made here.
    pub fn connect(config: &Configuration) -> Result<Self> {
        let invalid_key = |reason: String| OpsError::InvalidConfiguration {
            name: config.credential_kind.env_var().to_string(),
            reason,
        };

        let mut api_key = HeaderValue::from_str(&config.credential)
            .map_err(|e| invalid_key(e.to_string()))?;
        api_key.set_sensitive(true);
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", config.credential))
            .map_err(|e| invalid_key(e.to_string()))?;
        bearer.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("apikey", api_key);
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("hosted-db-core/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| OpsError::Connectivity(describe_transport_error(&e)))?;

        Ok(Self {
            http,
            config: config.clone(),
        })
    }
}

#[async_trait]
impl TableReader for RestClient {
    async fn count_rows(&self, relation: &str, mode: CountMode) -> Result<Presence> {
        let mut url = self.config.rest_url(&[relation])?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("select", "*");
            if mode == CountMode::Get {
                query.append_pair("limit", "0");
            }
        }

        debug!(relation, ?mode, %url, "Counting rows");
        let request = match mode {
            CountMode::Head => self.http.head(url),
            CountMode::Get => self.http.get(url),
        };
        let response = request
            .header("Prefer", "count=exact")
            .send()
            .await
            .map_err(|e| OpsError::Connectivity(describe_transport_error(&e)))?;

        let status = response.status().as_u16();
        let content_range = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = match mode {
            CountMode::Head => String::new(),
            CountMode::Get => response
                .text()
                .await
                .map_err(|e| OpsError::Connectivity(describe_transport_error(&e)))?,
        };
        debug!(relation, status, ?content_range, "Count response");

        classify_response(relation, status, content_range.as_deref(), &body)
    }
}

/// Maps an HTTP response onto [`Presence`] or the error taxonomy.
pub fn classify_response(
    relation: &str,
    status: u16,
    content_range: Option<&str>,
    body: &str,
) -> Result<Presence> {
    if (200..300).contains(&status) {
        return Ok(Presence::Present {
            rows: content_range.and_then(parse_content_range_total),
        });
    }

    let error: PostgrestError = serde_json::from_str(body).unwrap_or_default();
    let code = error.code.as_deref().unwrap_or_default();
    let message = error
        .message
        .map(|message| match error.hint {
            Some(hint) => format!("{} ({})", message, hint),
            None => message,
        })
        .unwrap_or_else(|| {
            StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("no reason given")
                .to_string()
        });

    if status == 404 || ABSENT_CODES.contains(&code) {
        Ok(Presence::Absent)
    } else if status == 401 || AUTH_CODES.contains(&code) {
        Err(OpsError::Authentication(message))
    } else if status == 403 || code == PERMISSION_CODE {
        Err(OpsError::PermissionDenied {
            relation: relation.to_string(),
            message,
        })
    } else {
        Err(OpsError::UnexpectedResponse { status, message })
    }
}

/// Total from a `Content-Range` value such as `0-24/3573` or `*/0`.
pub fn parse_content_range_total(value: &str) -> Option<u64> {
    let (_, total) = value.trim().rsplit_once('/')?;
    total.parse().ok()
}

/// Flattens the error source chain; reqwest's top-level message omits the
/// underlying I/O cause.
fn describe_transport_error(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

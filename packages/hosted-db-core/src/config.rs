//! Environment-driven configuration.
//!
//! Every tool declares the variables it reads as a list of
//! [`EnvRequirement`]s. Resolution stops at the first required variable that
//! is missing, before any client is built.

use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};

use reqwest::Url;

use crate::error::{OpsError, Result};

/// Project endpoint, e.g. `https://<ref>.supabase.co`
pub const ENDPOINT_URL_VAR: &str = "SUPABASE_URL";
/// Privileged key used by the deployment advisory
pub const SERVICE_ROLE_KEY_VAR: &str = "SUPABASE_SERVICE_ROLE_KEY";
/// Public key used by the read-only tools
pub const ANON_KEY_VAR: &str = "SUPABASE_ANON_KEY";
/// Overrides the computed schema file location
pub const SCHEMA_FILE_VAR: &str = "SCHEMA_FILE";

/// Endpoint of a local development stack (`supabase start`).
pub const DEFAULT_ENDPOINT_URL: &str = "http://localhost:54321";

const REDACTED_PREFIX_LEN: usize = 20;

/// Source of named settings.
pub trait EnvSource {
    /// Returns the value of `name`, treating an empty value as absent.
    fn var(&self, name: &str) -> Option<String>;
}

/// Reads the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|value| !value.is_empty())
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).filter(|value| !value.is_empty()).cloned()
    }
}

/// One declared environment input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvRequirement {
    pub name: &'static str,
    pub required: bool,
    pub fallback: Option<&'static str>,
}

impl EnvRequirement {
    pub const fn required(name: &'static str) -> Self {
        Self {
            name,
            required: true,
            fallback: None,
        }
    }

    pub const fn optional(name: &'static str, fallback: &'static str) -> Self {
        Self {
            name,
            required: false,
            fallback: Some(fallback),
        }
    }

    /// Remediation hint printed when the variable is missing.
    pub fn hint(&self) -> String {
        format!("Run: export {}='your-value'", self.name)
    }
}

/// A resolved environment input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedValue {
    pub name: &'static str,
    pub value: Option<String>,
    pub from_fallback: bool,
}

/// Resolves a single requirement.
pub fn resolve_requirement<E: EnvSource + ?Sized>(
    env: &E,
    req: &EnvRequirement,
) -> Result<ResolvedValue> {
    match env.var(req.name) {
        Some(value) => Ok(ResolvedValue {
            name: req.name,
            value: Some(value),
            from_fallback: false,
        }),
        None if req.required => Err(OpsError::ConfigurationMissing {
            name: req.name.to_string(),
            hint: req.hint(),
        }),
        None => Ok(ResolvedValue {
            name: req.name,
            value: req.fallback.map(str::to_string),
            from_fallback: req.fallback.is_some(),
        }),
    }
}

/// Resolves `requirements` in declaration order.
///
/// Fails on the first required entry that is absent. Optional entries take
/// their fallback when absent.
pub fn resolve_requirements<E: EnvSource + ?Sized>(
    env: &E,
    requirements: &[EnvRequirement],
) -> Result<Vec<ResolvedValue>> {
    requirements
        .iter()
        .map(|req| resolve_requirement(env, req))
        .collect()
}

/// Scope of the credential a tool authenticates with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    ServiceRole,
    Anonymous,
}

impl CredentialKind {
    pub fn env_var(self) -> &'static str {
        match self {
            CredentialKind::ServiceRole => SERVICE_ROLE_KEY_VAR,
            CredentialKind::Anonymous => ANON_KEY_VAR,
        }
    }
}

/// What a tool needs from the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolProfile {
    pub endpoint: EnvRequirement,
    pub credential_kind: CredentialKind,
}

impl ToolProfile {
    /// Schema deployment advisory
    pub const DEPLOY: ToolProfile = ToolProfile {
        endpoint: EnvRequirement::optional(ENDPOINT_URL_VAR, DEFAULT_ENDPOINT_URL),
        credential_kind: CredentialKind::ServiceRole,
    };

    /// Connection test
    pub const CHECK: ToolProfile = ToolProfile {
        endpoint: EnvRequirement::required(ENDPOINT_URL_VAR),
        credential_kind: CredentialKind::Anonymous,
    };

    /// Schema verification
    pub const VERIFY: ToolProfile = ToolProfile {
        endpoint: EnvRequirement::optional(ENDPOINT_URL_VAR, DEFAULT_ENDPOINT_URL),
        credential_kind: CredentialKind::Anonymous,
    };

    pub fn requirements(&self) -> [EnvRequirement; 2] {
        [
            self.endpoint,
            EnvRequirement::required(self.credential_kind.env_var()),
        ]
    }
}

/// Settings for a single tool invocation.
#[derive(Clone, PartialEq, Eq)]
pub struct Configuration {
    pub endpoint_url: Url,
    pub credential: String,
    pub credential_kind: CredentialKind,
    /// True when `endpoint_url` came from the built-in fallback
    pub endpoint_from_fallback: bool,
}

impl Configuration {
    /// Resolves the configuration a tool declares through `profile`.
    pub fn resolve<E: EnvSource + ?Sized>(env: &E, profile: &ToolProfile) -> Result<Self> {
        let [endpoint_req, credential_req] = profile.requirements();
        let endpoint = resolve_requirement(env, &endpoint_req)?;
        let credential = resolve_requirement(env, &credential_req)?;

        let raw_url = endpoint.value.ok_or_else(|| OpsError::ConfigurationMissing {
            name: endpoint_req.name.to_string(),
            hint: endpoint_req.hint(),
        })?;
        let endpoint_url = parse_endpoint(endpoint_req.name, &raw_url)?;

        let credential = credential.value.ok_or_else(|| OpsError::ConfigurationMissing {
            name: credential_req.name.to_string(),
            hint: credential_req.hint(),
        })?;

        Ok(Self {
            endpoint_url,
            credential,
            credential_kind: profile.credential_kind,
            endpoint_from_fallback: endpoint.from_fallback,
        })
    }

    /// Endpoint without the trailing slash `Url` normalisation adds.
    pub fn endpoint(&self) -> &str {
        self.endpoint_url.as_str().trim_end_matches('/')
    }

    /// URL of a REST resource below `/rest/v1`.
    pub fn rest_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.endpoint_url.clone();
        url.path_segments_mut()
            .map_err(|_| OpsError::InvalidConfiguration {
                name: ENDPOINT_URL_VAR.to_string(),
                reason: "URL cannot carry a path".to_string(),
            })?
            .pop_if_empty()
            .extend(["rest", "v1"])
            .extend(segments);
        Ok(url)
    }

    /// Project reference of a hosted endpoint (`<ref>.supabase.co`).
    pub fn project_ref(&self) -> Option<&str> {
        self.endpoint_url
            .host_str()?
            .strip_suffix(".supabase.co")
            .filter(|project| !project.is_empty() && !project.contains('.'))
    }

    pub fn redacted_credential(&self) -> String {
        redact(&self.credential)
    }

    /// Echoes the resolved settings, credential redacted.
    pub fn render<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        let origin = if self.endpoint_from_fallback {
            " (default)"
        } else {
            ""
        };
        writeln!(out, "✓ {}: {}{}", ENDPOINT_URL_VAR, self.endpoint(), origin)?;
        writeln!(
            out,
            "✓ {}: {}",
            self.credential_kind.env_var(),
            self.redacted_credential()
        )
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("endpoint_url", &self.endpoint_url.as_str())
            .field("credential", &self.redacted_credential())
            .field("credential_kind", &self.credential_kind)
            .field("endpoint_from_fallback", &self.endpoint_from_fallback)
            .finish()
    }
}

fn parse_endpoint(name: &str, raw: &str) -> Result<Url> {
    let invalid = |reason: String| OpsError::InvalidConfiguration {
        name: name.to_string(),
        reason,
    };
    let url = Url::parse(raw).map_err(|e| invalid(format!("'{}': {}", raw, e)))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(invalid(format!("'{}' is not an http(s) URL", raw)));
    }
    Ok(url)
}

/// Keeps a prefix of at most 20 characters and never more than half of the
/// secret.
pub fn redact(secret: &str) -> String {
    let shown = REDACTED_PREFIX_LEN.min(secret.chars().count() / 2);
    let prefix: String = secret.chars().take(shown).collect();
    format!("{}...", prefix)
}

//! Switchboard configuration — deserialization and validation.
//!
//! Config only covers the collaborator boundary (gateway URL, timeouts) and
//! optional per-server token seeds. Token values must be `${VAR}` env-var
//! references — inline secrets in a config file are rejected by `validate()`.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::SwitchboardError;

/// Strip an env var reference to its variable name.
///
/// Accepts `${VAR_NAME}` syntax only. Returns `None` if the value is not a
/// valid env-var reference.
pub fn parse_env_ref(value: &str) -> Option<&str> {
    value.strip_prefix("${").and_then(|s| s.strip_suffix('}'))
}

/// Resolve a map of env-var references to their actual values.
///
/// Unknown variables resolve to the empty string (same as shell `${UNSET-}`);
/// callers treat an empty token as "no token seeded".
pub fn resolve_env_vars(env: &HashMap<String, String>) -> HashMap<String, String> {
    env.iter()
        .map(|(k, v)| {
            let resolved = match parse_env_ref(v) {
                Some(var_name) => std::env::var(var_name).unwrap_or_default(),
                None => v.clone(), // caught by validate(), but handle gracefully
            };
            (k.clone(), resolved)
        })
        .collect()
}

/// Top-level switchboard configuration, parsed from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SwitchboardConfig {
    pub gateway: GatewayConfig,
    /// Optional token seeds keyed by server connection URL. Values must be
    /// `${VAR}` references, resolved at session start.
    #[serde(default)]
    pub tokens: HashMap<String, String>,
}

/// Connection settings for the playground gateway that serves the server
/// catalog, status probes, and tool listings.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    pub url: String,
    /// Overall HTTP request timeout for gateway calls
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Tighter per-probe timeout; an expired probe classifies as unreachable
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            url: String::new(),
            request_timeout_secs: default_request_timeout_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_probe_timeout_secs() -> u64 {
    10
}

impl SwitchboardConfig {
    /// Parse a TOML document into a config. Validation is separate so tests
    /// can build invalid configs programmatically.
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content)
            .map_err(|e| SwitchboardError::ConfigLoad("<inline>".to_string(), e.to_string()))
    }

    /// Read and parse a config file.
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SwitchboardError::ConfigLoad(path.display().to_string(), e.to_string())
        })?;
        toml::from_str(&content).map_err(|e| {
            SwitchboardError::ConfigLoad(path.display().to_string(), e.to_string())
        })
    }

    /// Validate the config, failing fast before any network collaborator is built.
    pub fn validate(&self) -> crate::Result<()> {
        if self.gateway.url.is_empty() {
            return Err(SwitchboardError::InvalidConfig(
                "gateway.url must be set".to_string(),
            ));
        }
        if !self.gateway.url.starts_with("http://") && !self.gateway.url.starts_with("https://") {
            return Err(SwitchboardError::InvalidConfig(format!(
                "gateway.url must be http(s), got '{}'",
                self.gateway.url
            )));
        }
        if self.gateway.request_timeout_secs == 0 || self.gateway.probe_timeout_secs == 0 {
            return Err(SwitchboardError::InvalidConfig(
                "gateway timeouts must be non-zero".to_string(),
            ));
        }

        for (server_url, value) in &self.tokens {
            if parse_env_ref(value).is_none() {
                return Err(SwitchboardError::InvalidConfig(format!(
                    "token for '{server_url}' must be a ${{VAR}} env reference, not an inline secret"
                )));
            }
        }

        Ok(())
    }

    /// Resolve token seeds to their env values, dropping entries whose
    /// variable is unset or empty.
    pub fn resolved_tokens(&self) -> HashMap<String, String> {
        resolve_env_vars(&self.tokens)
            .into_iter()
            .filter(|(_, token)| !token.is_empty())
            .collect()
    }
}

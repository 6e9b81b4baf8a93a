//! HTTP collaborator client for the playground gateway.
//!
//! The gateway fronts the actual MCP wire protocol and exposes three plain
//! HTTP endpoints: the server catalog, per-server status probes, and
//! per-server tool listings. `GatewayClient` implements the orchestrator's
//! [`StatusProbe`] and [`ToolFetch`] traits against those endpoints.
//!
//! Timeouts live here, at the collaborator boundary: an expired or refused
//! probe call is folded into a [`ProbeReport`] with a `timeout` /
//! `connection_error` code so the classifier treats it as an unreachable
//! input instead of the error propagating into the orchestrator.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;

use crate::catalog::ToolInfo;
use crate::config::GatewayConfig;
use crate::error::SwitchboardError;
use crate::model::{McpServer, McpServerRecord};
use crate::orchestrator::{StatusProbe, ToolFetch};
use crate::payload::bearer_header_value;
use crate::status::ProbeReport;

/// HTTP client for the playground gateway's MCP endpoints.
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
    probe_timeout: Duration,
}

impl GatewayClient {
    /// Build a client from validated gateway config.
    pub fn new(config: &GatewayConfig) -> crate::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| {
                SwitchboardError::InvalidConfig(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(GatewayClient {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            probe_timeout: Duration::from_secs(config.probe_timeout_secs),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// Fetch the full server catalog. The caller replaces its server list
    /// wholesale with the result; entries are never patched in place.
    pub async fn list_servers(&self) -> crate::Result<Vec<McpServer>> {
        let response = self
            .http
            .get(self.endpoint("mcp/servers"))
            .send()
            .await
            .map_err(|e| SwitchboardError::Catalog(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SwitchboardError::Catalog(format!(
                "gateway returned {}",
                response.status()
            )));
        }

        let records: Vec<McpServerRecord> = response
            .json()
            .await
            .map_err(|e| SwitchboardError::Catalog(format!("invalid catalog response: {e}")))?;

        tracing::debug!(server_count = records.len(), "server catalog fetched");
        Ok(records.into_iter().map(McpServer::from).collect())
    }
}

#[async_trait]
impl StatusProbe for GatewayClient {
    async fn probe(
        &self,
        connection_url: &str,
        token: Option<&str>,
    ) -> crate::Result<ProbeReport> {
        let mut request = self
            .http
            .get(self.endpoint("mcp/status"))
            .query(&[("server_url", connection_url)])
            .timeout(self.probe_timeout);
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, bearer_header_value(token));
        }

        match request.send().await {
            // The gateway reports probe failures in the response body, so any
            // HTTP status is deserialized the same way
            Ok(response) => response.json::<ProbeReport>().await.map_err(|e| {
                SwitchboardError::Probe(
                    connection_url.to_string(),
                    format!("invalid probe response: {e}"),
                )
            }),
            Err(e) if e.is_timeout() => Ok(ProbeReport::transport_failure(
                connection_url,
                "timeout",
                e.to_string(),
            )),
            Err(e) if e.is_connect() => Ok(ProbeReport::transport_failure(
                connection_url,
                "connection_error",
                e.to_string(),
            )),
            Err(e) => Err(SwitchboardError::Probe(
                connection_url.to_string(),
                e.to_string(),
            )),
        }
    }
}

#[async_trait]
impl ToolFetch for GatewayClient {
    async fn fetch_tools(
        &self,
        connection_url: &str,
        token: Option<&str>,
    ) -> crate::Result<Vec<ToolInfo>> {
        let mut request = self
            .http
            .get(self.endpoint("mcp/tools"))
            .query(&[("server_url", connection_url)]);
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, bearer_header_value(token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| SwitchboardError::ToolFetch(connection_url.to_string(), e.to_string()))?;

        if !response.status().is_success() {
            return Err(SwitchboardError::ToolFetch(
                connection_url.to_string(),
                format!("gateway returned {}", response.status()),
            ));
        }

        response.json().await.map_err(|e| {
            SwitchboardError::ToolFetch(
                connection_url.to_string(),
                format!("invalid tools response: {e}"),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str) -> GatewayClient {
        GatewayClient::new(&GatewayConfig {
            url: url.to_string(),
            request_timeout_secs: 30,
            probe_timeout_secs: 10,
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let c = client("http://localhost:8080/");
        assert_eq!(c.endpoint("mcp/status"), "http://localhost:8080/mcp/status");
        let c = client("http://localhost:8080");
        assert_eq!(c.endpoint("mcp/servers"), "http://localhost:8080/mcp/servers");
    }

    #[test]
    fn test_probe_timeout_from_config() {
        let c = client("https://gateway.example.com");
        assert_eq!(c.probe_timeout, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_probe_refused_connection_folds_to_unreachable_report() {
        // Port 9 (discard) is not listening; reqwest fails at connect
        let c = client("http://127.0.0.1:9");
        let report = c.probe("https://mcp.example.com", None).await.unwrap();
        let status = crate::status::classify(&report);
        assert_eq!(status, crate::status::ConnectionStatus::Unreachable);
    }

    #[tokio::test]
    async fn test_fetch_tools_refused_connection_is_tool_fetch_error() {
        let c = client("http://127.0.0.1:9");
        let result = c.fetch_tools("https://mcp.example.com", Some("tok")).await;
        assert!(matches!(
            result,
            Err(SwitchboardError::ToolFetch(url, _)) if url == "https://mcp.example.com"
        ));
    }
}

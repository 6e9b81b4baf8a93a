//! Server identity types and the transform from the external catalog record.
//!
//! The server list is fetched wholesale from the catalog collaborator and
//! never patched in place; a refresh replaces the whole list.

use serde::Deserialize;

/// Transport kinds advertised by the gateway's server catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum TransportKind {
    #[serde(rename = "sse")]
    Sse,
    #[serde(rename = "streamable-http")]
    StreamableHttp,
}

/// Health the gateway itself last observed for a server. Informational only —
/// the orchestrator derives its own [`crate::ConnectionStatus`] from probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportedHealth {
    Healthy,
    Error,
}

/// One server entry as returned by the gateway's catalog endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct McpServerRecord {
    pub name: String,
    pub url: String,
    pub transport: TransportKind,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub logo: Option<String>,
    pub status: ReportedHealth,
}

/// Identity of a tool-providing endpoint, immutable once fetched.
///
/// `id` is the connection URL — the only stable identifier the catalog
/// guarantees; display names may collide across servers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McpServer {
    pub id: String,
    pub name: String,
    pub description: String,
    pub connection_url: String,
}

impl From<McpServerRecord> for McpServer {
    fn from(record: McpServerRecord) -> Self {
        McpServer {
            id: record.url.clone(),
            name: record.name,
            description: record.description,
            connection_url: record.url,
        }
    }
}

impl McpServer {
    /// Shorthand constructor for tests and callers that already hold the URL.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        let url = url.into();
        McpServer {
            id: url.clone(),
            name: name.into(),
            description: String::new(),
            connection_url: url,
        }
    }
}

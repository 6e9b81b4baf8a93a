//! Connection orchestrator — the single owner of all per-session MCP state.
//!
//! Drives one probe-and-catalog-refresh cycle per server interaction:
//! probe → classify → credential store update → tool catalog refresh. The
//! credential and catalog stores are owned exclusively by the orchestrator
//! and exposed only through the operations here, so multiple playground
//! sessions can run independent orchestrators in one process.
//!
//! Within a single `connect` the credential update happens-before the tool
//! refresh. Across servers there is no ordering guarantee and none is needed;
//! connects for distinct servers run freely interleaved, and a duplicate
//! connect for the same server resolves last-write-wins.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::catalog::{ToolCatalog, ToolEntry, ToolInfo};
use crate::credentials::{CredentialEntry, CredentialStore};
use crate::model::McpServer;
use crate::payload::{self, PayloadReport};
use crate::status::{ConnectionStatus, ProbeReport, StatusSnapshot, classify, status_diagnostic};

/// Connectivity/authentication health-check collaborator.
///
/// Implementations apply their own timeout and either fold transport
/// failures into a [`ProbeReport`] with a classifiable error code, or return
/// `Err` — the orchestrator converts the latter into an unreachable outcome
/// rather than letting it propagate.
#[async_trait]
pub trait StatusProbe: Send + Sync {
    async fn probe(
        &self,
        connection_url: &str,
        token: Option<&str>,
    ) -> crate::Result<ProbeReport>;
}

/// Tool-listing collaborator, called only after a successful probe.
#[async_trait]
pub trait ToolFetch: Send + Sync {
    async fn fetch_tools(
        &self,
        connection_url: &str,
        token: Option<&str>,
    ) -> crate::Result<Vec<ToolInfo>>;
}

/// Result of one `connect` cycle, surfaced to the caller for display.
///
/// A non-connected outcome is not an error: every failure here is retryable
/// with no required cleanup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOutcome {
    pub status: ConnectionStatus,
    /// Classifier diagnostic, or the probe error message on transport failure
    pub diagnostic: String,
    /// Number of tools in the refreshed catalog, when the fetch succeeded
    pub tool_count: Option<usize>,
    /// Tool-fetch failure, reported distinctly from connection failures —
    /// the server stays connected and authenticated when this is set
    pub tool_fetch_error: Option<String>,
}

impl ConnectOutcome {
    pub fn is_connected(&self) -> bool {
        self.status == ConnectionStatus::Connected
    }

    fn not_connected(status: ConnectionStatus, diagnostic: String) -> Self {
        ConnectOutcome {
            status,
            diagnostic,
            tool_count: None,
            tool_fetch_error: None,
        }
    }
}

/// Removes the server id from the in-flight set on drop, so a panicking or
/// cancelled probe never wedges the guard.
struct InFlightGuard {
    in_flight: Arc<Mutex<HashMap<String, usize>>>,
    server_id: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut in_flight = self.in_flight.lock().expect("in-flight lock poisoned");
        if let Some(count) = in_flight.get_mut(&self.server_id) {
            *count -= 1;
            if *count == 0 {
                in_flight.remove(&self.server_id);
            }
        }
    }
}

/// Coordinates probing, credential bookkeeping, and tool-catalog refreshes
/// for all MCP servers in one playground session.
pub struct ConnectionOrchestrator {
    probe: Arc<dyn StatusProbe>,
    tool_fetch: Arc<dyn ToolFetch>,
    credentials: RwLock<CredentialStore>,
    catalog: RwLock<ToolCatalog>,
    statuses: RwLock<HashMap<String, StatusSnapshot>>,
    /// Per-server count of probes currently in flight
    in_flight: Arc<Mutex<HashMap<String, usize>>>,
    cancel: CancellationToken,
}

impl ConnectionOrchestrator {
    pub fn new(probe: Arc<dyn StatusProbe>, tool_fetch: Arc<dyn ToolFetch>) -> Self {
        ConnectionOrchestrator {
            probe,
            tool_fetch,
            credentials: RwLock::new(CredentialStore::new()),
            catalog: RwLock::new(ToolCatalog::new()),
            statuses: RwLock::new(HashMap::new()),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            cancel: CancellationToken::new(),
        }
    }

    /// Seed unverified tokens (e.g. from config env references). Seeded
    /// entries are not authenticated until a probe verifies them; existing
    /// entries are left alone.
    pub async fn seed_tokens(&self, tokens: HashMap<String, String>) {
        let mut credentials = self.credentials.write().await;
        for (server_id, token) in tokens {
            if credentials.get(&server_id).is_none() {
                credentials.set(server_id, CredentialEntry::unauthenticated(token));
            }
        }
    }

    /// Whether a probe for this server is currently in flight.
    pub fn is_probing(&self, server_id: &str) -> bool {
        self.in_flight
            .lock()
            .expect("in-flight lock poisoned")
            .contains_key(server_id)
    }

    fn begin_probe(&self, server_id: &str) -> InFlightGuard {
        *self
            .in_flight
            .lock()
            .expect("in-flight lock poisoned")
            .entry(server_id.to_string())
            .or_insert(0) += 1;
        InFlightGuard {
            in_flight: Arc::clone(&self.in_flight),
            server_id: server_id.to_string(),
        }
    }

    /// Drive one probe-and-catalog-refresh cycle for a server.
    ///
    /// A non-empty `token` is verified and stored on success; no token (or an
    /// empty one) is the auto-connect path. On any non-connected result the
    /// credential is stored unauthenticated and the existing tool catalog is
    /// left untouched, so a previously fetched catalog remains usable when
    /// the user retries with a better token.
    pub async fn connect(&self, server: &McpServer, token: Option<&str>) -> ConnectOutcome {
        let _guard = self.begin_probe(&server.id);
        let supplied = token.map(str::trim).filter(|t| !t.is_empty());

        tracing::debug!(server = %server.id, has_token = supplied.is_some(), "probing MCP server");

        let probed = tokio::select! {
            result = self.probe.probe(&server.connection_url, supplied) => result,
            _ = self.cancel.cancelled() => {
                tracing::debug!(server = %server.id, "probe abandoned, orchestrator shutting down");
                return ConnectOutcome::not_connected(
                    ConnectionStatus::Unknown,
                    "orchestrator shutting down".to_string(),
                );
            }
        };

        let (status, diagnostic) = match &probed {
            Ok(report) => (classify(report), status_diagnostic(report)),
            // Transport-level failure from the collaborator: caught and folded
            // into an unreachable outcome, never propagated to the caller
            Err(e) => (ConnectionStatus::Unreachable, e.to_string()),
        };

        self.statuses.write().await.insert(
            server.id.clone(),
            StatusSnapshot {
                status,
                message: diagnostic.clone(),
            },
        );

        if status != ConnectionStatus::Connected {
            tracing::warn!(
                server = %server.id,
                status = ?status,
                diagnostic = %diagnostic,
                "MCP server probe did not connect"
            );
            self.credentials.write().await.set(
                &server.id,
                CredentialEntry::unauthenticated(supplied.unwrap_or_default()),
            );
            return ConnectOutcome::not_connected(status, diagnostic);
        }

        let entry = match supplied {
            Some(token) => CredentialEntry::manual(token),
            None => CredentialEntry::auto_connected(),
        };
        self.credentials.write().await.set(&server.id, entry);

        tracing::info!(
            server = %server.id,
            auto_connected = supplied.is_none(),
            "MCP server connected"
        );

        // Credential update above happens-before this refresh
        match self.refresh_catalog(server, supplied).await {
            Ok(count) => ConnectOutcome {
                status,
                diagnostic,
                tool_count: Some(count),
                tool_fetch_error: None,
            },
            Err(e) => {
                // Reported distinctly; does not revert the authenticated state
                tracing::warn!(server = %server.id, error = %e, "tool fetch failed after connect");
                ConnectOutcome {
                    status,
                    diagnostic,
                    tool_count: None,
                    tool_fetch_error: Some(e.to_string()),
                }
            }
        }
    }

    /// Explicit tool refresh for an already-connected server, using its
    /// stored token. `connect` fuses this step on success; both paths share
    /// the same sequencing contract.
    pub async fn refresh_tools(&self, server: &McpServer) -> crate::Result<usize> {
        let token = self
            .credentials
            .read()
            .await
            .get(&server.id)
            .map(|e| e.token.clone())
            .unwrap_or_default();
        let token = (!token.is_empty()).then_some(token);
        self.refresh_catalog(server, token.as_deref()).await
    }

    async fn refresh_catalog(
        &self,
        server: &McpServer,
        token: Option<&str>,
    ) -> crate::Result<usize> {
        let fetched = tokio::select! {
            result = self.tool_fetch.fetch_tools(&server.connection_url, token) => result?,
            _ = self.cancel.cancelled() => return Err(crate::SwitchboardError::ShuttingDown),
        };
        let count = self.catalog.write().await.refresh(&server.id, fetched);
        tracing::info!(server = %server.id, tool_count = count, "tool catalog refreshed");
        Ok(count)
    }

    /// Probe every server that is neither authenticated nor already being
    /// probed, concurrently, reusing a stored token when one exists. This is
    /// the auto-connect sweep run when servers are selected for a session.
    pub async fn auto_connect(&self, servers: &[McpServer]) -> Vec<(String, ConnectOutcome)> {
        let mut pending: Vec<(&McpServer, Option<String>)> = Vec::new();
        {
            let credentials = self.credentials.read().await;
            for server in servers {
                if self.is_probing(&server.id) {
                    tracing::debug!(server = %server.id, "probe already in flight, skipping");
                    continue;
                }
                let entry = credentials.get(&server.id);
                if entry.is_some_and(CredentialEntry::is_usable) {
                    continue;
                }
                let stored = entry
                    .map(|e| e.token.clone())
                    .filter(|token| !token.is_empty());
                pending.push((server, stored));
            }
        }

        futures::future::join_all(pending.into_iter().map(|(server, token)| async move {
            let outcome = self.connect(server, token.as_deref()).await;
            (server.id.clone(), outcome)
        }))
        .await
    }

    /// Explicit user disconnect: drop the credential entry and the status
    /// snapshot. The tool catalog is kept so a reconnect restores the
    /// previous selection.
    pub async fn disconnect(&self, server_id: &str) {
        self.credentials.write().await.clear(server_id);
        self.statuses.write().await.remove(server_id);
        tracing::info!(server = %server_id, "MCP server disconnected");
    }

    /// Last-known status for one server.
    pub async fn status(&self, server_id: &str) -> Option<StatusSnapshot> {
        self.statuses.read().await.get(server_id).cloned()
    }

    /// Snapshot of all last-known statuses, for the payload builder.
    pub async fn statuses(&self) -> HashMap<String, StatusSnapshot> {
        self.statuses.read().await.clone()
    }

    /// Credential entry for one server, if it was ever probed or seeded.
    pub async fn credential(&self, server_id: &str) -> Option<CredentialEntry> {
        self.credentials.read().await.get(server_id).cloned()
    }

    /// Snapshot of all credential entries, for the payload builder.
    pub async fn credentials(&self) -> HashMap<String, CredentialEntry> {
        self.credentials.read().await.snapshot()
    }

    /// Tools for a server, empty if never fetched.
    pub async fn tools(&self, server_id: &str) -> Vec<ToolEntry> {
        self.catalog.read().await.tools(server_id).to_vec()
    }

    pub async fn set_tool_enabled(&self, server_id: &str, tool_name: &str, enabled: bool) -> bool {
        self.catalog
            .write()
            .await
            .set_enabled(server_id, tool_name, enabled)
    }

    pub async fn set_all_tools(&self, server_id: &str, enabled: bool) {
        self.catalog.write().await.set_all(server_id, enabled);
    }

    /// Bulk toggle restricted to the named tools (the filtered-view select-all).
    pub async fn set_tools_among(&self, server_id: &str, names: &[&str], enabled: bool) {
        self.catalog.write().await.set_many(server_id, names, enabled);
    }

    /// `(enabled, total)` tool counts for a server.
    pub async fn selection_summary(&self, server_id: &str) -> (usize, usize) {
        self.catalog.read().await.selection_summary(server_id)
    }

    /// Build the downstream request payloads from this orchestrator's current
    /// snapshots. Read-only: triggers no probes or fetches.
    pub async fn build_payloads(&self, selected: &[String], servers: &[McpServer]) -> PayloadReport {
        let statuses = self.statuses().await;
        let credentials = self.credentials().await;
        payload::build_server_payloads(selected, servers, &statuses, &credentials)
    }

    /// Count of enabled tools across the selected, usable servers.
    pub async fn active_tool_count(&self, selected: &[String]) -> usize {
        let credentials = self.credentials().await;
        let catalog = self.catalog.read().await;
        payload::active_tool_count(selected, &credentials, &catalog)
    }

    /// Cancel in-flight probes and refuse further collaborator calls.
    pub fn shutdown(&self) {
        tracing::info!("connection orchestrator shutting down");
        self.cancel.cancel();
    }

    /// Ids of servers with a probe currently in flight (diagnostics).
    pub fn probing(&self) -> HashSet<String> {
        self.in_flight
            .lock()
            .expect("in-flight lock poisoned")
            .keys()
            .cloned()
            .collect()
    }
}

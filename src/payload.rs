//! Request payload assembly for the downstream chat/completion call.
//!
//! Pure read-side functions over snapshots of the credential store and the
//! last-known statuses. Nothing here performs network activity or mutates
//! state; the builder degrades by omission and reports exclusions as a count
//! so a partially-usable request still goes out.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::catalog::ToolCatalog;
use crate::credentials::CredentialEntry;
use crate::model::McpServer;
use crate::status::{ConnectionStatus, StatusSnapshot};

/// Warn when the selected, authenticated servers contribute more enabled
/// tools than this — model quality degrades with oversized tool menus.
pub const TOOL_OVERLOAD_WARNING_THRESHOLD: usize = 40;

/// One server entry submitted with a downstream request. Constructed fresh
/// on every build call, never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerPayload {
    pub server_label: String,
    pub server_url: String,
    /// `Authorization` header when a token is stored; empty for pure
    /// auto-connect servers. BTreeMap keeps serialization deterministic.
    pub headers: BTreeMap<String, String>,
}

/// Result of one build call: the includable payloads plus how many selected
/// servers were dropped for failing the connected-and-authenticated test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadReport {
    pub payloads: Vec<ServerPayload>,
    /// Diagnostic count, not an error — callers may warn the user
    pub excluded: usize,
}

/// Normalize a stored token into an `Authorization` header value.
///
/// Prefixes `Bearer ` unless the token already carries the prefix
/// (case-insensitive), so a pasted `Bearer abc123` is never double-prefixed.
pub fn bearer_header_value(token: &str) -> String {
    const PREFIX: &str = "Bearer ";
    let already_prefixed = token
        .get(..PREFIX.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(PREFIX));
    if already_prefixed {
        token.to_string()
    } else {
        format!("Bearer {token}")
    }
}

/// Build the server-config list for a downstream request.
///
/// For each id in `selected` (output preserves this order), the server is
/// included only if its last-known status is `Connected` AND its credential
/// entry is authenticated or auto-connected. Everything else is dropped
/// silently and counted. Pure and synchronous: same inputs, same output.
pub fn build_server_payloads(
    selected: &[String],
    servers: &[McpServer],
    statuses: &HashMap<String, StatusSnapshot>,
    credentials: &HashMap<String, CredentialEntry>,
) -> PayloadReport {
    let mut payloads = Vec::with_capacity(selected.len());
    let mut excluded = 0;

    for server_id in selected {
        let Some(server) = servers.iter().find(|s| &s.id == server_id) else {
            excluded += 1;
            continue;
        };

        let connected = statuses
            .get(server_id)
            .is_some_and(|snap| snap.status == ConnectionStatus::Connected);
        let credential = credentials.get(server_id);
        let usable = credential.is_some_and(CredentialEntry::is_usable);

        if !(connected && usable) {
            excluded += 1;
            continue;
        }

        let mut headers = BTreeMap::new();
        if let Some(entry) = credential {
            if !entry.token.is_empty() {
                headers.insert("Authorization".to_string(), bearer_header_value(&entry.token));
            }
        }

        payloads.push(ServerPayload {
            server_label: server.name.clone(),
            server_url: server.connection_url.clone(),
            headers,
        });
    }

    PayloadReport { payloads, excluded }
}

/// Count the enabled tools contributed by the selected servers whose
/// credentials are usable. Drives the >40-tools performance warning in the
/// layer above; compare against [`TOOL_OVERLOAD_WARNING_THRESHOLD`].
pub fn active_tool_count(
    selected: &[String],
    credentials: &HashMap<String, CredentialEntry>,
    catalog: &ToolCatalog,
) -> usize {
    selected
        .iter()
        .filter(|id| credentials.get(*id).is_some_and(CredentialEntry::is_usable))
        .map(|id| catalog.selection_summary(id).0)
        .sum()
}

//! Per-server authentication state.
//!
//! A keyed map from server id to [`CredentialEntry`]. Writes are total
//! replacements (callers read-modify-write explicitly) and no operation
//! performs I/O, so concurrent probes for different servers touch disjoint
//! keys and duplicate probes for the same server resolve last-write-wins.

use std::collections::HashMap;

/// Authentication state for one server.
///
/// Invariant: `authenticated` is only set by a probe that classified as
/// connected — either with a verified non-empty token (`auto_connected =
/// false`) or with no token at all (`auto_connected = true`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialEntry {
    /// Opaque secret, may be empty on the auto-connect path
    pub token: String,
    pub authenticated: bool,
    pub auto_connected: bool,
}

impl CredentialEntry {
    /// Entry for a server that accepted a manually supplied token.
    pub fn manual(token: impl Into<String>) -> Self {
        CredentialEntry {
            token: token.into(),
            authenticated: true,
            auto_connected: false,
        }
    }

    /// Entry for a server that accepted an unauthenticated probe.
    pub fn auto_connected() -> Self {
        CredentialEntry {
            token: String::new(),
            authenticated: true,
            auto_connected: true,
        }
    }

    /// Entry for a failed probe. The attempted token is kept so the user can
    /// edit it instead of retyping.
    pub fn unauthenticated(token: impl Into<String>) -> Self {
        CredentialEntry {
            token: token.into(),
            authenticated: false,
            auto_connected: false,
        }
    }

    /// Whether this entry allows the server into a request payload.
    pub fn is_usable(&self) -> bool {
        self.authenticated || self.auto_connected
    }
}

/// Keyed record of per-server authentication state.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    entries: HashMap<String, CredentialEntry>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total replacement of the entry for `server_id`.
    pub fn set(&mut self, server_id: impl Into<String>, entry: CredentialEntry) {
        self.entries.insert(server_id.into(), entry);
    }

    /// Returns `None` if the server was never probed.
    pub fn get(&self, server_id: &str) -> Option<&CredentialEntry> {
        self.entries.get(server_id)
    }

    /// Remove the entry for `server_id`, returning it if present. Used when
    /// a user explicitly removes a token.
    pub fn clear(&mut self, server_id: &str) -> Option<CredentialEntry> {
        self.entries.remove(server_id)
    }

    /// Clone of the full map, for the request payload builder.
    pub fn snapshot(&self) -> HashMap<String, CredentialEntry> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

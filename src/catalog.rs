//! Per-server tool catalogs with persisted enabled/disabled selection.
//!
//! A catalog entry is created on the first successful tool fetch after
//! authentication. Every newly discovered tool defaults to enabled; a
//! re-fetch preserves the previously toggled flag for tools that still exist
//! and drops tools the server no longer reports. Name filtering for search
//! is a read-side projection done by the caller over [`ToolCatalog::tools`] —
//! it never mutates stored state.

use std::collections::HashMap;

use serde::Deserialize;

/// One tool as reported by the tool-fetch collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// One tool in a server's catalog. Identity is the tool name — that is what
/// the original selection persistence keys on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolEntry {
    pub name: String,
    pub description: String,
    pub enabled: bool,
}

/// Keyed record of per-server tool lists.
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    entries: HashMap<String, Vec<ToolEntry>>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tools for a server, in fetch order. Empty if never fetched.
    pub fn tools(&self, server_id: &str) -> &[ToolEntry] {
        self.entries.get(server_id).map_or(&[], Vec::as_slice)
    }

    /// Replace a server's tool list with a freshly fetched one, preserving
    /// the `enabled` flag of tools that already existed. New tools default
    /// to enabled; tools absent from the fetch are dropped.
    pub fn refresh(&mut self, server_id: impl Into<String>, fetched: Vec<ToolInfo>) -> usize {
        let server_id = server_id.into();
        let prior: HashMap<String, bool> = self
            .entries
            .remove(&server_id)
            .unwrap_or_default()
            .into_iter()
            .map(|t| (t.name, t.enabled))
            .collect();

        let merged: Vec<ToolEntry> = fetched
            .into_iter()
            .map(|info| {
                let enabled = prior.get(&info.name).copied().unwrap_or(true);
                ToolEntry {
                    name: info.name,
                    description: info.description,
                    enabled,
                }
            })
            .collect();

        let count = merged.len();
        self.entries.insert(server_id, merged);
        count
    }

    /// Toggle a single tool. Returns false if the server or tool is unknown.
    pub fn set_enabled(&mut self, server_id: &str, tool_name: &str, enabled: bool) -> bool {
        let Some(tools) = self.entries.get_mut(server_id) else {
            return false;
        };
        match tools.iter_mut().find(|t| t.name == tool_name) {
            Some(tool) => {
                tool.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Bulk toggle across a server's entire catalog.
    pub fn set_all(&mut self, server_id: &str, enabled: bool) {
        if let Some(tools) = self.entries.get_mut(server_id) {
            for tool in tools {
                tool.enabled = enabled;
            }
        }
    }

    /// Bulk toggle restricted to the named tools — the primitive behind
    /// "select all" over a search-filtered view. Tools outside `names` keep
    /// their current flag.
    pub fn set_many(&mut self, server_id: &str, names: &[&str], enabled: bool) {
        if let Some(tools) = self.entries.get_mut(server_id) {
            for tool in tools {
                if names.contains(&tool.name.as_str()) {
                    tool.enabled = enabled;
                }
            }
        }
    }

    /// `(enabled, total)` counts backing the "3 out of 5 selected" summary.
    pub fn selection_summary(&self, server_id: &str) -> (usize, usize) {
        let tools = self.tools(server_id);
        let enabled = tools.iter().filter(|t| t.enabled).count();
        (enabled, tools.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(name: &str) -> ToolInfo {
        ToolInfo {
            name: name.to_string(),
            description: format!("{name} description"),
        }
    }

    fn catalog_with(server_id: &str, names: &[&str]) -> ToolCatalog {
        let mut catalog = ToolCatalog::new();
        catalog.refresh(server_id, names.iter().map(|n| info(n)).collect());
        catalog
    }

    #[test]
    fn test_never_fetched_is_empty() {
        let catalog = ToolCatalog::new();
        assert!(catalog.tools("srv").is_empty());
        assert_eq!(catalog.selection_summary("srv"), (0, 0));
    }

    #[test]
    fn test_new_tools_default_enabled() {
        let catalog = catalog_with("srv", &["redis_get", "redis_set"]);
        let tools = catalog.tools("srv");
        assert_eq!(tools.len(), 2);
        assert!(tools.iter().all(|t| t.enabled));
    }

    #[test]
    fn test_refresh_preserves_fetch_order() {
        let catalog = catalog_with("srv", &["c_tool", "a_tool", "b_tool"]);
        let names: Vec<&str> = catalog.tools("srv").iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["c_tool", "a_tool", "b_tool"]);
    }

    #[test]
    fn test_toggle_single_tool_roundtrip() {
        let mut catalog = catalog_with("srv", &["redis_get"]);
        assert!(catalog.set_enabled("srv", "redis_get", false));
        assert_eq!(catalog.selection_summary("srv"), (0, 1));
        assert!(catalog.set_enabled("srv", "redis_get", true));
        assert_eq!(catalog.selection_summary("srv"), (1, 1));
    }

    #[test]
    fn test_toggle_unknown_tool_or_server() {
        let mut catalog = catalog_with("srv", &["redis_get"]);
        assert!(!catalog.set_enabled("srv", "missing", false));
        assert!(!catalog.set_enabled("other", "redis_get", false));
    }

    #[test]
    fn test_set_all_false_then_true() {
        let mut catalog = catalog_with("srv", &["a", "b", "c", "d", "e"]);
        catalog.set_all("srv", false);
        assert_eq!(catalog.selection_summary("srv"), (0, 5));
        catalog.set_all("srv", true);
        assert_eq!(catalog.selection_summary("srv"), (5, 5));
    }

    #[test]
    fn test_set_many_only_flips_named_subset() {
        // Select-all over a search filter must leave non-matching tools alone
        let mut catalog = catalog_with("srv", &["redis_get", "redis_set", "file_read", "file_write"]);
        catalog.set_all("srv", false);
        catalog.set_many("srv", &["redis_get", "redis_set"], true);
        assert_eq!(catalog.selection_summary("srv"), (2, 4));
        let enabled: Vec<&str> = catalog
            .tools("srv")
            .iter()
            .filter(|t| t.enabled)
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(enabled, vec!["redis_get", "redis_set"]);
    }

    #[test]
    fn test_set_many_deselect_leaves_others_selected() {
        let mut catalog = catalog_with("srv", &["redis_get", "redis_set", "file_read"]);
        catalog.set_many("srv", &["file_read"], false);
        assert_eq!(catalog.selection_summary("srv"), (2, 3));
    }

    #[test]
    fn test_refresh_preserves_prior_selection() {
        // The "3 out of 5 after reopen" scenario: deselect 2 of 5, re-fetch,
        // selection survives.
        let mut catalog = catalog_with("srv", &["a", "b", "c", "d", "e"]);
        catalog.set_enabled("srv", "b", false);
        catalog.set_enabled("srv", "d", false);
        catalog.refresh("srv", ["a", "b", "c", "d", "e"].iter().map(|n| info(n)).collect());
        assert_eq!(catalog.selection_summary("srv"), (3, 5));
        assert!(!catalog.tools("srv")[1].enabled);
        assert!(!catalog.tools("srv")[3].enabled);
    }

    #[test]
    fn test_refresh_defaults_new_tools_and_drops_removed() {
        let mut catalog = catalog_with("srv", &["a", "b"]);
        catalog.set_enabled("srv", "a", false);
        // Server now reports "a" and a brand-new "c"; "b" is gone
        catalog.refresh("srv", ["a", "c"].iter().map(|n| info(n)).collect());
        let tools = catalog.tools("srv");
        assert_eq!(tools.len(), 2);
        assert!(!tools[0].enabled, "prior toggle for 'a' preserved");
        assert!(tools[1].enabled, "new tool 'c' defaults to enabled");
    }

    #[test]
    fn test_catalogs_are_per_server() {
        let mut catalog = catalog_with("a", &["x", "y"]);
        catalog.refresh("b", vec![info("z")]);
        catalog.set_all("a", false);
        assert_eq!(catalog.selection_summary("a"), (0, 2));
        assert_eq!(catalog.selection_summary("b"), (1, 1));
    }
}

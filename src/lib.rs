//! Switchboard — multi-server MCP connection orchestrator.
//! Classifies connectivity-probe results, tracks per-server credentials and
//! tool catalogs with persisted selection, handles auto-connect, and
//! assembles the validated server-config list submitted with a downstream
//! chat/completion request. The MCP wire protocol itself lives behind the
//! gateway collaborator and is not implemented here.

pub mod catalog;
pub mod config;
pub mod credentials;
pub mod error;
pub mod gateway;
pub mod model;
pub mod orchestrator;
pub mod payload;
pub mod status;

pub use catalog::{ToolCatalog, ToolEntry, ToolInfo};
pub use config::{GatewayConfig, SwitchboardConfig, parse_env_ref, resolve_env_vars};
pub use credentials::{CredentialEntry, CredentialStore};
pub use error::{Result, SwitchboardError};
pub use gateway::GatewayClient;
pub use model::{McpServer, McpServerRecord, ReportedHealth, TransportKind};
pub use orchestrator::{ConnectOutcome, ConnectionOrchestrator, StatusProbe, ToolFetch};
pub use payload::{
    PayloadReport, ServerPayload, TOOL_OVERLOAD_WARNING_THRESHOLD, active_tool_count,
    bearer_header_value, build_server_payloads,
};
pub use status::{
    ConnectionStatus, ProbeErrorDetails, ProbeOutcome, ProbeReport, ProbeServerInfo,
    StatusSnapshot, classify, status_diagnostic,
};

//! Error types for switchboard operations.

use thiserror::Error;

/// Main error type for switchboard operations
#[derive(Error, Debug)]
pub enum SwitchboardError {
    /// Configuration is invalid (bad gateway URL, inline secret, zero timeout)
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Config file could not be read or parsed
    #[error("failed to load config from {0}: {1}")]
    ConfigLoad(String, String),

    /// The server catalog collaborator failed to return the server list
    #[error("server catalog fetch failed: {0}")]
    Catalog(String),

    /// The status-probe collaborator failed at the transport level for a named server
    #[error("probe failed for server '{0}': {1}")]
    Probe(String, String),

    /// The tool-fetch collaborator failed for a named server
    #[error("tool fetch failed for server '{0}': {1}")]
    ToolFetch(String, String),

    /// The orchestrator is shutting down and refused new work
    #[error("orchestrator shutting down")]
    ShuttingDown,
}

/// Result type alias for switchboard operations
pub type Result<T> = std::result::Result<T, SwitchboardError>;

//! Connectivity-probe status classification.
//!
//! Maps a raw probe report from the status-probe collaborator to the
//! four-state connection taxonomy and derives the human-readable diagnostic
//! shown next to a server. Classification depends only on status/error codes;
//! the diagnostic string is derived independently and never feeds back into
//! the classification.

use serde::{Deserialize, Serialize};

/// Four-state connection status for a probed MCP server.
///
/// `Connected` is only ever reached via a successful probe — it is never
/// inferred from the absence of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// Never probed, or the probe carried no classifiable information
    Unknown,
    /// Probe succeeded
    Connected,
    /// Server reachable but denied the request (400/401/403)
    AuthRequired,
    /// Server not reachable (404, 5xx, timeout, connection failure)
    Unreachable,
}

/// Last-known status for a server, as stored by the orchestrator and read
/// by the request payload builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub status: ConnectionStatus,
    /// Diagnostic message from [`status_diagnostic`], for display
    pub message: String,
}

/// Top-level outcome field of a probe report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeOutcome {
    Connected,
    Error,
}

/// Identity the probed server reported during the handshake, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeServerInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub protocol_version: String,
}

/// Error descriptor attached to a failed probe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeErrorDetails {
    /// Transport/protocol error code (e.g. `unauthorized`, `timeout`).
    /// Compared case-insensitively — gateways have been seen emitting
    /// both `connection_error` and `CONNECTION_FAILED`.
    pub code: Option<String>,
    /// HTTP status code observed by the probe, if any
    pub status_code: Option<u16>,
    /// Raw upstream error text, for logs only
    pub raw_error: Option<String>,
}

/// Wire-format result of one connectivity probe, as returned by the
/// status-probe collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeReport {
    #[serde(default)]
    pub server_url: String,
    pub status: Option<ProbeOutcome>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub last_checked: Option<u64>,
    #[serde(default)]
    pub server_info: Option<ProbeServerInfo>,
    #[serde(default)]
    pub ping_response_time_ms: Option<u64>,
    #[serde(default)]
    pub error_details: Option<ProbeErrorDetails>,
}

impl ProbeReport {
    /// Report for a probe that succeeded, optionally with a latency sample.
    pub fn connected(server_url: impl Into<String>, ping_ms: Option<u64>) -> Self {
        ProbeReport {
            server_url: server_url.into(),
            status: Some(ProbeOutcome::Connected),
            message: "OK".to_string(),
            ping_response_time_ms: ping_ms,
            ..Default::default()
        }
    }

    /// Report synthesized at the collaborator boundary when the probe call
    /// itself failed (timeout, DNS, refused connection). The classifier sees
    /// these as `Unreachable` inputs.
    pub fn transport_failure(
        server_url: impl Into<String>,
        code: &str,
        raw_error: impl Into<String>,
    ) -> Self {
        let raw = raw_error.into();
        ProbeReport {
            server_url: server_url.into(),
            status: Some(ProbeOutcome::Error),
            message: raw.clone(),
            error_details: Some(ProbeErrorDetails {
                code: Some(code.to_string()),
                status_code: None,
                raw_error: Some(raw),
            }),
            ..Default::default()
        }
    }

    fn is_success(&self) -> bool {
        self.status == Some(ProbeOutcome::Connected)
    }
}

/// Classify a probe report into a [`ConnectionStatus`].
///
/// Checked in order, first match wins:
/// success → `Connected`; 400/401/403 or `unauthorized`/`bad_request` →
/// `AuthRequired`; 404, 5xx, `timeout`, `connection_error` → `Unreachable`;
/// any other error payload → `Unreachable`; no information → `Unknown`.
///
/// Pure and synchronous. Latency and message fields never affect the result.
pub fn classify(report: &ProbeReport) -> ConnectionStatus {
    if report.is_success() {
        return ConnectionStatus::Connected;
    }

    let Some(details) = &report.error_details else {
        return ConnectionStatus::Unknown;
    };

    match details.status_code {
        Some(400 | 401 | 403) => return ConnectionStatus::AuthRequired,
        Some(404) => return ConnectionStatus::Unreachable,
        Some(code) if (500..=599).contains(&code) => return ConnectionStatus::Unreachable,
        _ => {}
    }

    let code = details.code.as_deref().unwrap_or("").to_ascii_lowercase();
    match code.as_str() {
        "unauthorized" | "bad_request" => ConnectionStatus::AuthRequired,
        "timeout" | "connection_error" | "connection_failed" => ConnectionStatus::Unreachable,
        // Error payload present but nothing we recognize — treat as unreachable
        _ => ConnectionStatus::Unreachable,
    }
}

/// Derive the display diagnostic for a probe report.
///
/// Display-only: the strings here are shown to the user next to the server
/// row and must not be parsed or used for classification.
pub fn status_diagnostic(report: &ProbeReport) -> String {
    if report.is_success() {
        return match report.ping_response_time_ms {
            Some(ms) => format!("Connected ({ms}ms)"),
            None => "Connected".to_string(),
        };
    }

    let Some(details) = &report.error_details else {
        return "Status unknown".to_string();
    };

    match details.status_code {
        Some(400) => return "Invalid request - check server configuration".to_string(),
        Some(401) => return "Authentication token required".to_string(),
        Some(403) => return "Access denied - insufficient permissions".to_string(),
        Some(404) => return "Endpoint not found".to_string(),
        _ => {}
    }

    let code = details.code.as_deref().unwrap_or("").to_ascii_lowercase();
    match code.as_str() {
        "timeout" => "Connection timeout".to_string(),
        "connection_error" | "connection_failed" => "Server unreachable".to_string(),
        _ if !report.message.is_empty() => report.message.clone(),
        _ => "Status unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_report(code: &str, status_code: Option<u16>, message: &str) -> ProbeReport {
        ProbeReport {
            server_url: "https://example.com/mcp".to_string(),
            status: Some(ProbeOutcome::Error),
            message: message.to_string(),
            error_details: Some(ProbeErrorDetails {
                code: Some(code.to_string()),
                status_code,
                raw_error: Some(message.to_string()),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_classify_connected() {
        let report = ProbeReport::connected("https://example.com/mcp", Some(150));
        assert_eq!(classify(&report), ConnectionStatus::Connected);
    }

    #[test]
    fn test_classify_connected_ignores_latency() {
        let report = ProbeReport::connected("https://example.com/mcp", None);
        assert_eq!(classify(&report), ConnectionStatus::Connected);
        let slow = ProbeReport::connected("https://example.com/mcp", Some(120_000));
        assert_eq!(classify(&slow), ConnectionStatus::Connected);
    }

    #[test]
    fn test_classify_auth_required_status_codes() {
        for (code, status_code) in [
            ("bad_request", 400),
            ("unauthorized", 401),
            ("forbidden", 403),
        ] {
            let report = error_report(code, Some(status_code), "denied");
            assert_eq!(
                classify(&report),
                ConnectionStatus::AuthRequired,
                "status code {status_code}"
            );
        }
    }

    #[test]
    fn test_classify_auth_required_error_codes_without_status() {
        for code in ["unauthorized", "bad_request"] {
            let report = error_report(code, None, "denied");
            assert_eq!(classify(&report), ConnectionStatus::AuthRequired, "code {code}");
        }
    }

    #[test]
    fn test_classify_unreachable_status_codes() {
        for status_code in [404, 500, 502, 503, 599] {
            let report = error_report("server_error", Some(status_code), "boom");
            assert_eq!(
                classify(&report),
                ConnectionStatus::Unreachable,
                "status code {status_code}"
            );
        }
    }

    #[test]
    fn test_classify_unreachable_error_codes() {
        let timeout = error_report("timeout", Some(408), "Request timeout");
        assert_eq!(classify(&timeout), ConnectionStatus::Unreachable);

        let conn = error_report("connection_error", None, "Failed to connect");
        assert_eq!(classify(&conn), ConnectionStatus::Unreachable);

        // Uppercase variant seen from some gateways
        let upper = error_report("CONNECTION_FAILED", None, "Failed to connect");
        assert_eq!(classify(&upper), ConnectionStatus::Unreachable);
    }

    #[test]
    fn test_classify_unhandled_error_falls_back_to_unreachable() {
        let report = error_report("unknown_error", Some(418), "Teapot error");
        assert_eq!(classify(&report), ConnectionStatus::Unreachable);
    }

    #[test]
    fn test_classify_no_information_is_unknown() {
        let report = ProbeReport {
            server_url: "https://example.com/mcp".to_string(),
            status: Some(ProbeOutcome::Error),
            message: "Unknown error".to_string(),
            ..Default::default()
        };
        assert_eq!(classify(&report), ConnectionStatus::Unknown);

        let empty = ProbeReport::default();
        assert_eq!(classify(&empty), ConnectionStatus::Unknown);
    }

    #[test]
    fn test_diagnostic_connected_with_ping() {
        let report = ProbeReport::connected("https://example.com/mcp", Some(150));
        assert_eq!(status_diagnostic(&report), "Connected (150ms)");
    }

    #[test]
    fn test_diagnostic_connected_without_ping() {
        let report = ProbeReport::connected("https://example.com/mcp", None);
        assert_eq!(status_diagnostic(&report), "Connected");
    }

    #[test]
    fn test_diagnostic_http_status_codes() {
        let cases = [
            (400, "Invalid request - check server configuration"),
            (401, "Authentication token required"),
            (403, "Access denied - insufficient permissions"),
            (404, "Endpoint not found"),
        ];
        for (status_code, expected) in cases {
            let report = error_report("some_code", Some(status_code), "upstream text");
            assert_eq!(status_diagnostic(&report), expected, "status {status_code}");
        }
    }

    #[test]
    fn test_diagnostic_timeout() {
        let report = error_report("timeout", Some(408), "Connection timed out");
        assert_eq!(status_diagnostic(&report), "Connection timeout");
    }

    #[test]
    fn test_diagnostic_connection_error() {
        let report = error_report("connection_error", Some(500), "Failed to connect");
        assert_eq!(status_diagnostic(&report), "Server unreachable");
        let upper = error_report("CONNECTION_FAILED", Some(500), "Failed to connect");
        assert_eq!(status_diagnostic(&upper), "Server unreachable");
    }

    #[test]
    fn test_diagnostic_falls_back_to_report_message() {
        let report = error_report("unknown_error", Some(500), "Custom error message");
        assert_eq!(status_diagnostic(&report), "Custom error message");
    }

    #[test]
    fn test_diagnostic_no_details_is_status_unknown() {
        let report = ProbeReport {
            status: Some(ProbeOutcome::Error),
            message: "Unknown error".to_string(),
            ..Default::default()
        };
        assert_eq!(status_diagnostic(&report), "Status unknown");
    }

    #[test]
    fn test_probe_report_deserializes_gateway_json() {
        let json = r#"{
            "server_url": "https://example.com/mcp",
            "status": "error",
            "message": "Unauthorized",
            "last_checked": 1727000000,
            "server_info": {"name": "", "version": "", "protocol_version": ""},
            "error_details": {"code": "unauthorized", "status_code": 401, "raw_error": "Token required"}
        }"#;
        let report: ProbeReport = serde_json::from_str(json).unwrap();
        assert_eq!(classify(&report), ConnectionStatus::AuthRequired);
        assert_eq!(status_diagnostic(&report), "Authentication token required");
    }

    #[test]
    fn test_transport_failure_classifies_unreachable() {
        let report =
            ProbeReport::transport_failure("https://example.com/mcp", "timeout", "deadline");
        assert_eq!(classify(&report), ConnectionStatus::Unreachable);
        assert_eq!(status_diagnostic(&report), "Connection timeout");
    }
}

//! API Request/Response Types
//!
//! Wire names are camelCase, matching the browser extension.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::models::errors::AppError;
use crate::models::types::{MaliciousUrlEntry, TransactionSimulation};
use crate::utils::telemetry::TelemetryStats;

// ============================================
// Requests
// ============================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub transaction_data: Option<TransactionSimulation>,
    #[serde(default)]
    pub domain: Option<String>,
    /// Checked against the registry before scoring
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckQuery {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub reported_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_verified")]
    pub verified: bool,
}

fn default_verified() -> bool {
    true
}

/// Non-empty value of a required field, or a bad request naming it
pub fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, AppError> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::bad_request(format!("Missing required field: {}", field))),
    }
}

// ============================================
// Responses
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportResponse {
    pub success: bool,
    pub entry: MaliciousUrlEntry,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub success: bool,
    /// False when no entry has that url
    pub updated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    /// Unix millis
    pub timestamp: i64,
    pub version: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    #[serde(flatten)]
    pub telemetry: TelemetryStats,
    pub registry_entries: usize,
    pub verified_entries: usize,
    pub uptime_seconds: u64,
}

/// Body of every error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            error!(code = self.code_str(), error = %self, "request failed");
        } else {
            warn!(code = self.code_str(), error = %self.message, "request rejected");
        }

        // Internal details stay in the logs
        let message = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.message
        };

        let body = ErrorBody {
            error: message,
            code: self.code.as_str().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_rejects_empty() {
        assert_eq!(required(&Some("x".to_string()), "url").unwrap(), "x");
        assert!(required(&None, "url").is_err());
        let err = required(&Some(String::new()), "reason").unwrap_err();
        assert_eq!(err.message, "Missing required field: reason");
    }

    #[test]
    fn test_analyze_request_camel_case() {
        let raw = r#"{"transactionData": {"success": true}, "domain": "jup.ag"}"#;
        let req: AnalyzeRequest = serde_json::from_str(raw).unwrap();
        assert!(req.transaction_data.is_some());
        assert_eq!(req.domain.as_deref(), Some("jup.ag"));
        assert!(req.url.is_none());
    }

    #[test]
    fn test_verify_defaults_to_true() {
        let req: VerifyRequest = serde_json::from_str(r#"{"url": "http://a.example/"}"#).unwrap();
        assert!(req.verified);
    }

    #[test]
    fn test_error_status_mapping() {
        let response = AppError::bad_request("nope").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = AppError::registry_closed().into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

//! API Request Handlers

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Json, Query, State,
    },
    http::HeaderMap,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use super::middleware::{RateLimitConfig, RateLimiter};
use super::types::*;
use crate::core::risk_score::ScoreAggregator;
use crate::core::safety::SafetyAnalysisService;
use crate::models::config::GuardConfig;
use crate::models::errors::{AppError, AppResult};
use crate::models::types::{
    FlagType, MaliciousUrlEntry, RegistryCheck, SafetyAnalysis,
};
use crate::registry::matcher::RegistryMatcher;
use crate::registry::store::RegistryStore;
use crate::utils::constants::{ADMIN_KEY_HEADER, APP_VERSION, UNKNOWN_DOMAIN};
use crate::utils::telemetry::TelemetryCollector;

/// Shared application state
pub struct AppState {
    pub service: Arc<SafetyAnalysisService>,
    pub store: Arc<RegistryStore>,
    pub telemetry: Arc<TelemetryCollector>,
    pub rate_limiter: Arc<RateLimiter>,
    pub admin_key: Option<String>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        config: &GuardConfig,
        store: Arc<RegistryStore>,
        telemetry: Arc<TelemetryCollector>,
    ) -> Self {
        let aggregator = ScoreAggregator::new(Arc::new(config.heuristics.clone()));
        let service = SafetyAnalysisService::new(RegistryMatcher::new(store.clone()), aggregator);

        Self {
            service: Arc::new(service),
            store,
            telemetry,
            rate_limiter: Arc::new(RateLimiter::new(RateLimitConfig::per_minute(
                config.rate_limit_per_minute,
            ))),
            admin_key: config.admin_key.clone(),
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// Run a registry operation off the async workers
async fn blocking<T, F>(f: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

/// Compare secrets without an early exit on the first differing byte
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Treat `Some("")` like an absent optional field
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

// ============================================
// Health & Stats
// ============================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().timestamp_millis(),
        version: APP_VERSION.to_string(),
        uptime_seconds: state.uptime_seconds(),
    })
}

pub async fn get_stats(State(state): State<Arc<AppState>>) -> AppResult<Json<StatsResponse>> {
    let store = state.store.clone();
    let entries = blocking(move || store.read()).await?;

    Ok(Json(StatsResponse {
        telemetry: state.telemetry.get_stats(),
        registry_entries: entries.len(),
        verified_entries: entries.iter().filter(|e| e.verified).count(),
        uptime_seconds: state.uptime_seconds(),
    }))
}

// ============================================
// Transaction Analysis
// ============================================

pub async fn analyze(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> AppResult<Json<SafetyAnalysis>> {
    let start = Instant::now();
    let Json(req) = body.map_err(|e| AppError::bad_request(e.body_text()))?;

    let simulation = req
        .transaction_data
        .ok_or_else(|| AppError::bad_request("Missing required field: transactionData"))?;
    let domain = non_empty(req.domain).unwrap_or_else(|| UNKNOWN_DOMAIN.to_string());
    let url = non_empty(req.url);
    let checked_registry = url.is_some();

    let service = state.service.clone();
    let analysis =
        blocking(move || service.analyze(url.as_deref(), Some(&simulation), &domain)).await?;

    if checked_registry {
        let hit = analysis
            .flags
            .iter()
            .any(|f| f.flag_type == FlagType::FlaggedAddress);
        state.telemetry.record_registry_check(hit);
    }
    state
        .telemetry
        .record_analysis(analysis.level, start.elapsed().as_micros() as u64);

    Ok(Json(analysis))
}

// ============================================
// Registry
// ============================================

pub async fn registry_check(
    State(state): State<Arc<AppState>>,
    query: Result<Query<CheckQuery>, QueryRejection>,
) -> AppResult<Json<RegistryCheck>> {
    let Query(query) = query.map_err(|e| AppError::bad_request(e.body_text()))?;
    let url = required(&query.url, "url")?.to_string();

    let service = state.service.clone();
    let result = blocking(move || service.matcher().check(&url)).await?;

    state.telemetry.record_registry_check(result.is_malicious);
    Ok(Json(result))
}

pub async fn registry_latest(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<Vec<MaliciousUrlEntry>>> {
    let store = state.store.clone();
    let entries = blocking(move || store.read()).await?;
    Ok(Json(entries))
}

pub async fn registry_report(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ReportRequest>, JsonRejection>,
) -> AppResult<Json<ReportResponse>> {
    let Json(req) = body.map_err(|e| AppError::bad_request(e.body_text()))?;

    let url = required(&req.url, "url")?;
    let reason = required(&req.reason, "reason")?;
    let reported_by = required(&req.reported_by, "reportedBy")?;

    let entry = MaliciousUrlEntry::report(url, reason, reported_by)?;

    let store = state.store.clone();
    let entry = blocking(move || store.report(entry)).await?;

    info!(url = %entry.url, domain = %entry.domain, "📝 Malicious URL reported");
    state.telemetry.record_report();

    Ok(Json(ReportResponse {
        success: true,
        entry,
    }))
}

pub async fn registry_verify(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<VerifyRequest>, JsonRejection>,
) -> AppResult<Json<VerifyResponse>> {
    let Some(expected) = state.admin_key.as_deref() else {
        warn!("Verification attempted but no admin key is configured");
        return Err(AppError::forbidden("Registry verification is disabled"));
    };

    let provided = headers
        .get(ADMIN_KEY_HEADER)
        .map(|v| v.as_bytes())
        .unwrap_or_default();
    if !constant_time_eq(provided, expected.as_bytes()) {
        warn!("Verification attempted with invalid admin key");
        return Err(AppError::forbidden("Invalid or missing admin key"));
    }

    let Json(req) = body.map_err(|e| AppError::bad_request(e.body_text()))?;
    let url = required(&req.url, "url")?.to_string();
    let verified = req.verified;

    let store = state.store.clone();
    let logged_url = url.clone();
    let updated = blocking(move || store.set_verified(&url, verified)).await?;

    if updated {
        info!(url = %logged_url, verified, "✅ Registry entry verification changed");
        state.telemetry.record_verification();
    }

    Ok(Json(VerifyResponse {
        success: true,
        updated,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"admin-key", b"admin-key"));
        assert!(!constant_time_eq(b"admin-key", b"admin-kez"));
        assert!(!constant_time_eq(b"admin", b"admin-key"));
        assert!(!constant_time_eq(b"", b"admin-key"));
    }
}

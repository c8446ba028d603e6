//! Telemetry Module for BlinkGuard
//!
//! In-process counters behind `/stats`:
//! - analyses by verdict level and latency
//! - registry lookups, hits and community reports
//!
//! Privacy-first: no URLs, wallets or transaction data are kept, only counts.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::models::types::SafetyLevel;

/// Aggregated statistics for reporting
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryStats {
    /// Total analyses served
    pub total_analyzed: u64,
    pub safe_count: u64,
    pub caution_count: u64,
    pub high_risk_count: u64,
    pub unknown_count: u64,
    /// Registry lookups (standalone checks and analysis pre-checks)
    pub registry_checks: u64,
    /// Lookups that matched a verified entry
    pub registry_hits: u64,
    /// Community reports accepted
    pub reports_submitted: u64,
    /// Entries whose verification flag was changed by an admin
    pub verifications: u64,
    /// Average analysis latency (ms)
    pub avg_latency_ms: f64,
    /// Session start (unix seconds)
    pub period_start: i64,
    /// Snapshot time (unix seconds)
    pub period_end: i64,
}

impl TelemetryStats {
    /// One-line summary for shutdown logs
    pub fn summary_line(&self) -> String {
        format!(
            "📊 {} analyses ({} safe / {} caution / {} high risk / {} unknown), {} registry checks, {} hits, {} reports, avg {:.2}ms",
            self.total_analyzed,
            self.safe_count,
            self.caution_count,
            self.high_risk_count,
            self.unknown_count,
            self.registry_checks,
            self.registry_hits,
            self.reports_submitted,
            self.avg_latency_ms,
        )
    }
}

/// Main telemetry collector
#[derive(Debug)]
pub struct TelemetryCollector {
    total_analyzed: AtomicU64,
    safe_count: AtomicU64,
    caution_count: AtomicU64,
    high_risk_count: AtomicU64,
    unknown_count: AtomicU64,
    registry_checks: AtomicU64,
    registry_hits: AtomicU64,
    reports_submitted: AtomicU64,
    verifications: AtomicU64,
    total_latency_us: AtomicU64,
    /// Session start time
    session_start: i64,
}

impl TelemetryCollector {
    pub fn new() -> Self {
        Self {
            total_analyzed: AtomicU64::new(0),
            safe_count: AtomicU64::new(0),
            caution_count: AtomicU64::new(0),
            high_risk_count: AtomicU64::new(0),
            unknown_count: AtomicU64::new(0),
            registry_checks: AtomicU64::new(0),
            registry_hits: AtomicU64::new(0),
            reports_submitted: AtomicU64::new(0),
            verifications: AtomicU64::new(0),
            total_latency_us: AtomicU64::new(0),
            session_start: chrono::Utc::now().timestamp(),
        }
    }

    /// Record one finished analysis
    pub fn record_analysis(&self, level: SafetyLevel, latency_us: u64) {
        self.total_analyzed.fetch_add(1, Ordering::Relaxed);
        self.total_latency_us.fetch_add(latency_us, Ordering::Relaxed);

        let counter = match level {
            SafetyLevel::Safe => &self.safe_count,
            SafetyLevel::Caution => &self.caution_count,
            SafetyLevel::HighRisk => &self.high_risk_count,
            SafetyLevel::Unknown => &self.unknown_count,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a registry lookup and whether it matched
    pub fn record_registry_check(&self, hit: bool) {
        self.registry_checks.fetch_add(1, Ordering::Relaxed);
        if hit {
            self.registry_hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_report(&self) {
        self.reports_submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_verification(&self) {
        self.verifications.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current statistics
    pub fn get_stats(&self) -> TelemetryStats {
        let total_analyzed = self.total_analyzed.load(Ordering::Relaxed);
        let total_latency_us = self.total_latency_us.load(Ordering::Relaxed);

        let avg_latency_ms = if total_analyzed > 0 {
            total_latency_us as f64 / total_analyzed as f64 / 1000.0
        } else {
            0.0
        };

        TelemetryStats {
            total_analyzed,
            safe_count: self.safe_count.load(Ordering::Relaxed),
            caution_count: self.caution_count.load(Ordering::Relaxed),
            high_risk_count: self.high_risk_count.load(Ordering::Relaxed),
            unknown_count: self.unknown_count.load(Ordering::Relaxed),
            registry_checks: self.registry_checks.load(Ordering::Relaxed),
            registry_hits: self.registry_hits.load(Ordering::Relaxed),
            reports_submitted: self.reports_submitted.load(Ordering::Relaxed),
            verifications: self.verifications.load(Ordering::Relaxed),
            avg_latency_ms,
            period_start: self.session_start,
            period_end: chrono::Utc::now().timestamp(),
        }
    }

    /// Export current stats to `<dir>/stats_<unix>.json`
    pub fn export_stats_json(&self, dir: &Path) -> Result<PathBuf, std::io::Error> {
        fs::create_dir_all(dir)?;

        let stats = self.get_stats();
        let path = dir.join(format!("stats_{}.json", stats.period_end));

        let json = serde_json::to_string_pretty(&stats)?;
        fs::write(&path, json)?;

        Ok(path)
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_basic() {
        let collector = TelemetryCollector::new();

        collector.record_analysis(SafetyLevel::Safe, 1_000);
        collector.record_analysis(SafetyLevel::HighRisk, 3_000);
        collector.record_registry_check(true);
        collector.record_registry_check(false);
        collector.record_report();

        let stats = collector.get_stats();
        assert_eq!(stats.total_analyzed, 2);
        assert_eq!(stats.safe_count, 1);
        assert_eq!(stats.high_risk_count, 1);
        assert_eq!(stats.registry_checks, 2);
        assert_eq!(stats.registry_hits, 1);
        assert_eq!(stats.reports_submitted, 1);
        assert!((stats.avg_latency_ms - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_collector_has_zero_latency() {
        let stats = TelemetryCollector::new().get_stats();
        assert_eq!(stats.total_analyzed, 0);
        assert_eq!(stats.avg_latency_ms, 0.0);
    }

    #[test]
    fn test_summary_line() {
        let stats = TelemetryStats {
            total_analyzed: 1000,
            registry_hits: 7,
            ..Default::default()
        };

        let line = stats.summary_line();
        assert!(line.contains("1000 analyses"));
        assert!(line.contains("7 hits"));
    }

    #[test]
    fn test_export_stats_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let collector = TelemetryCollector::new();
        collector.record_report();

        let path = collector.export_stats_json(&dir.path().join("telemetry")).unwrap();
        let stats: TelemetryStats =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(stats.reports_submitted, 1);
    }
}

//! BlinkGuard Library
//!
//! Pre-signing safety analysis for Solana Blinks:
//! - Balance drain / transfer size detection from simulation deltas
//! - Token approval and authority-change detection in program logs
//! - Unknown program and untrusted domain signals
//! - Community registry of malicious URLs (verified entries only match)

pub mod api;
pub mod core;
pub mod models;
pub mod providers;
pub mod registry;
pub mod utils;

pub use crate::core::{ScoreAggregator, SafetyAnalysisService, SafetyScoreBuilder};
pub use models::{
    AppError, AppResult, BalanceChange, ErrorCode, FlagType, GuardConfig, HeuristicConfig,
    MaliciousUrlEntry, RegistryCheck, SafetyAnalysis, SafetyFlag, SafetyLevel, Severity,
    TransactionSimulation,
};
pub use providers::RegistryClient;
pub use registry::{RegistryMatcher, RegistryStore};
pub use utils::telemetry::{TelemetryCollector, TelemetryStats};

//! Type definitions for BlinkGuard
//! Core data structures shared by the safety engine, the registry and the API.
//! Wire names are camelCase to stay compatible with the browser extension.

use serde::{Deserialize, Serialize};

use crate::models::errors::{AppError, AppResult};
use crate::utils::constants::UNKNOWN_SCORE;
use crate::utils::hostname;

// ============================================
// Transaction simulation
// ============================================

/// Balance delta of a single account, in base units (lamports)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceChange {
    pub account: String,
    pub pre_balance: u64,
    pub post_balance: u64,
    /// Always `post_balance - pre_balance`
    pub change: i128,
}

impl BalanceChange {
    pub fn new(account: impl Into<String>, pre_balance: u64, post_balance: u64) -> Self {
        Self {
            account: account.into(),
            pre_balance,
            post_balance,
            change: post_balance as i128 - pre_balance as i128,
        }
    }

    /// Check the `change == post - pre` invariant on caller-supplied data
    pub fn is_consistent(&self) -> bool {
        self.change == self.post_balance as i128 - self.pre_balance as i128
    }
}

/// Result of a dry-run execution, handed in by the simulation collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSimulation {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(default)]
    pub balance_changes: Vec<BalanceChange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TransactionSimulation {
    /// First balance change violating `change == post - pre`, if any
    pub fn inconsistent_change(&self) -> Option<&BalanceChange> {
        self.balance_changes.iter().find(|c| !c.is_consistent())
    }
}

// ============================================
// Safety verdict
// ============================================

/// Overall verdict shown to the user before signing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyLevel {
    Safe,
    Caution,
    HighRisk,
    Unknown,
}

impl SafetyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SafetyLevel::Safe => "safe",
            SafetyLevel::Caution => "caution",
            SafetyLevel::HighRisk => "high_risk",
            SafetyLevel::Unknown => "unknown",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            SafetyLevel::Safe => "✅",
            SafetyLevel::Caution => "🟠",
            SafetyLevel::HighRisk => "🔴",
            SafetyLevel::Unknown => "❓",
        }
    }
}

/// Kind of signal raised by a classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagType {
    Drainer,
    Approval,
    UnknownContract,
    HighTransfer,
    FlaggedAddress,
    DomainRisk,
}

impl FlagType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlagType::Drainer => "drainer",
            FlagType::Approval => "approval",
            FlagType::UnknownContract => "unknown_contract",
            FlagType::HighTransfer => "high_transfer",
            FlagType::FlaggedAddress => "flagged_address",
            FlagType::DomainRisk => "domain_risk",
        }
    }
}

/// Flag severity, ordered `Low < Medium < High < Critical`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyFlag {
    #[serde(rename = "type")]
    pub flag_type: FlagType,
    pub severity: Severity,
    pub description: String,
}

impl SafetyFlag {
    pub fn new(flag_type: FlagType, severity: Severity, description: impl Into<String>) -> Self {
        Self {
            flag_type,
            severity,
            description: description.into(),
        }
    }
}

/// Result of one analysis call. Built fresh and never mutated after return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyAnalysis {
    pub level: SafetyLevel,
    /// 0-100, higher is safer
    pub score: u8,
    pub flags: Vec<SafetyFlag>,
    pub reasons: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_simulation: Option<TransactionSimulation>,
}

impl SafetyAnalysis {
    /// Verdict for a URL matched in the community registry
    pub fn flagged(reason: &str) -> Self {
        Self {
            level: SafetyLevel::HighRisk,
            score: 0,
            flags: vec![SafetyFlag::new(
                FlagType::FlaggedAddress,
                Severity::Critical,
                "URL flagged in community registry",
            )],
            reasons: vec![format!("Flagged as malicious: {}", reason)],
            transaction_simulation: None,
        }
    }

    /// Verdict when there is nothing to analyze
    pub fn unknown() -> Self {
        Self {
            level: SafetyLevel::Unknown,
            score: UNKNOWN_SCORE,
            flags: Vec::new(),
            reasons: vec!["No transaction data available for analysis".to_string()],
            transaction_simulation: None,
        }
    }

    /// Pretty print for the CLI
    pub fn summary(&self) -> String {
        let mut output = format!(
            "{} {} (score {}/100)\n",
            self.level.emoji(),
            self.level.as_str().to_uppercase(),
            self.score
        );
        for flag in &self.flags {
            output.push_str(&format!(
                "   - [{:?}] {}: {}\n",
                flag.severity,
                flag.flag_type.as_str(),
                flag.description
            ));
        }
        for reason in &self.reasons {
            output.push_str(&format!("   * {}\n", reason));
        }
        output
    }
}

// ============================================
// Registry
// ============================================

/// Community report of a malicious URL, keyed by exact `url`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaliciousUrlEntry {
    pub url: String,
    pub domain: String,
    pub reason: String,
    pub reported_by: String,
    /// Unix millis
    pub reported_at: i64,
    pub verified: bool,
}

impl MaliciousUrlEntry {
    /// Build a fresh, unverified report stamped with the current time.
    ///
    /// Fails with a bad-request error when `url` cannot be parsed, since the
    /// domain must be derived from it.
    pub fn report(url: &str, reason: &str, reported_by: &str) -> AppResult<Self> {
        let domain = hostname::parse_hostname(url)
            .ok_or_else(|| AppError::bad_request(format!("Invalid URL: {}", url)))?;

        Ok(Self {
            url: url.to_string(),
            domain,
            reason: reason.to_string(),
            reported_by: reported_by.to_string(),
            reported_at: chrono::Utc::now().timestamp_millis(),
            verified: false,
        })
    }
}

/// Answer of the registry matcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryCheck {
    pub is_malicious: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<MaliciousUrlEntry>,
}

impl RegistryCheck {
    pub fn clean() -> Self {
        Self {
            is_malicious: false,
            reason: None,
            entry: None,
        }
    }

    pub fn matched(entry: &MaliciousUrlEntry) -> Self {
        Self {
            is_malicious: true,
            reason: Some(entry.reason.clone()),
            entry: Some(entry.clone()),
        }
    }
}

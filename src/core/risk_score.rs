//! Safety Scoring Module
//!
//! Folds the classifier outputs into a single 0-100 safety score (higher is
//! safer) and a discrete [`SafetyLevel`]:
//! - 80-100: safe
//! - 50-79: caution
//! - 0-49: high risk
//!
//! Checks run in a fixed order (balance, approval, contract, domain). Each
//! fired check appends one flag and one reason and deducts a fixed amount.

use std::sync::Arc;

use crate::core::balance::{analyze_balance_transfers, BalanceTransferAnalysis};
use crate::core::heuristics::{
    classify_contracts, classify_domain, detect_approval, ApprovalAnalysis, ContractAnalysis,
    DomainTrust,
};
use crate::models::config::HeuristicConfig;
use crate::models::types::{
    FlagType, SafetyAnalysis, SafetyFlag, SafetyLevel, Severity, TransactionSimulation,
};
use crate::utils::constants::{
    APPROVAL_DEDUCTION, CAUTION_MIN_SCORE, CAUTION_THRESHOLD, CAUTION_TRANSFER_DEDUCTION,
    CRITICAL_APPROVAL_DEDUCTION, DOMAIN_RISK_DEDUCTION, DRAINER_DEDUCTION,
    HIGH_TRANSFER_DEDUCTION, HIGH_TRANSFER_THRESHOLD, SAFE_MIN_SCORE, STARTING_SCORE,
    UNKNOWN_CONTRACT_DEDUCTION,
};

impl SafetyLevel {
    /// Map a clamped score to a level; anything below 50 is high risk
    pub fn from_score(score: u8) -> Self {
        if score >= SAFE_MIN_SCORE {
            SafetyLevel::Safe
        } else if score >= CAUTION_MIN_SCORE {
            SafetyLevel::Caution
        } else {
            SafetyLevel::HighRisk
        }
    }
}

/// Clamp a raw running score into 0-100
pub fn clamp_score(raw: i32) -> u8 {
    raw.clamp(0, 100) as u8
}

/// Round to one decimal with ties going up (`56.25` -> `56.3`)
fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Accumulates deductions, flags and reasons in evaluation order
#[derive(Debug, Clone)]
pub struct SafetyScoreBuilder {
    score: i32,
    flags: Vec<SafetyFlag>,
    reasons: Vec<String>,
}

impl SafetyScoreBuilder {
    pub fn new() -> Self {
        Self {
            score: STARTING_SCORE,
            flags: Vec::new(),
            reasons: Vec::new(),
        }
    }

    fn deduct(&mut self, flag: SafetyFlag, reason: String, points: i32) {
        self.flags.push(flag);
        self.reasons.push(reason);
        self.score -= points;
    }

    /// Check 1: exactly one of drainer / high / moderate transfer, or nothing
    pub fn with_balance_transfer(mut self, analysis: &BalanceTransferAnalysis) -> Self {
        let percent = analysis.percent();
        let description = format!("Transaction transfers {:.1}% of balance", round_tenths(percent));

        if analysis.is_drainer {
            self.deduct(
                SafetyFlag::new(FlagType::Drainer, Severity::Critical, description),
                format!("High balance transfer detected: {}%", percent),
                DRAINER_DEDUCTION,
            );
        } else if analysis.percentage > HIGH_TRANSFER_THRESHOLD {
            self.deduct(
                SafetyFlag::new(FlagType::HighTransfer, Severity::High, description),
                format!("Significant balance transfer: {}%", percent),
                HIGH_TRANSFER_DEDUCTION,
            );
        } else if analysis.percentage > CAUTION_THRESHOLD {
            self.deduct(
                SafetyFlag::new(FlagType::HighTransfer, Severity::Medium, description),
                format!("Moderate balance transfer: {}%", percent),
                CAUTION_TRANSFER_DEDUCTION,
            );
        }

        self
    }

    /// Check 2: approvals, heavier deduction for critical ones
    pub fn with_approval(mut self, analysis: &ApprovalAnalysis) -> Self {
        if analysis.has_suspicious_approval {
            let points = if analysis.severity == Severity::Critical {
                CRITICAL_APPROVAL_DEDUCTION
            } else {
                APPROVAL_DEDUCTION
            };
            self.deduct(
                SafetyFlag::new(
                    FlagType::Approval,
                    analysis.severity,
                    analysis.description.clone(),
                ),
                analysis.description.clone(),
                points,
            );
        }

        self
    }

    /// Check 3: programs outside the allow-list
    pub fn with_contracts(mut self, analysis: &ContractAnalysis) -> Self {
        if analysis.has_unknown_contract {
            self.deduct(
                SafetyFlag::new(
                    FlagType::UnknownContract,
                    Severity::Medium,
                    "Transaction interacts with unknown or unverified contract",
                ),
                "Unknown contract detected".to_string(),
                UNKNOWN_CONTRACT_DEDUCTION,
            );
        }

        self
    }

    /// Check 4: requesting domain outside the allow-list
    pub fn with_domain_trust(mut self, trust: &DomainTrust, domain: &str) -> Self {
        if !trust.is_trusted {
            self.deduct(
                SafetyFlag::new(
                    FlagType::DomainRisk,
                    Severity::Low,
                    format!("Domain {} has limited trust signals", domain),
                ),
                "Domain trust check failed".to_string(),
                DOMAIN_RISK_DEDUCTION,
            );
        }

        self
    }

    /// Current unclamped score
    pub fn raw_score(&self) -> i32 {
        self.score
    }

    /// Clamp, map to a level and attach the simulation echo
    pub fn build(self, simulation: Option<TransactionSimulation>) -> SafetyAnalysis {
        let score = clamp_score(self.score);
        SafetyAnalysis {
            level: SafetyLevel::from_score(score),
            score,
            flags: self.flags,
            reasons: self.reasons,
            transaction_simulation: simulation,
        }
    }
}

impl Default for SafetyScoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs every classifier over a simulation and scores the result
#[derive(Debug, Clone, Default)]
pub struct ScoreAggregator {
    config: Arc<HeuristicConfig>,
}

impl ScoreAggregator {
    pub fn new(config: Arc<HeuristicConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HeuristicConfig {
        &self.config
    }

    pub fn aggregate(&self, simulation: &TransactionSimulation, domain: &str) -> SafetyAnalysis {
        let balance = analyze_balance_transfers(&simulation.balance_changes);
        let approval = detect_approval(&simulation.logs, &self.config);
        let contracts = classify_contracts(&simulation.logs, &self.config);
        let trust = classify_domain(domain, &self.config);

        SafetyScoreBuilder::new()
            .with_balance_transfer(&balance)
            .with_approval(&approval)
            .with_contracts(&contracts)
            .with_domain_trust(&trust, domain)
            .build(Some(simulation.clone()))
    }
}

//! Heuristic classifiers over simulation logs and the requesting domain.
//!
//! Each classifier is a pure function of its input and a pattern table from
//! [`HeuristicConfig`]; none of them touches shared state.

use std::collections::BTreeSet;

use crate::models::config::HeuristicConfig;
use crate::models::types::Severity;
use crate::utils::constants::{PROGRAM_ID_MAX_LEN, PROGRAM_ID_MIN_LEN, PROGRAM_LOG_PREFIX};

// ============================================
// Approval patterns
// ============================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalAnalysis {
    pub has_suspicious_approval: bool,
    pub severity: Severity,
    pub description: String,
}

impl ApprovalAnalysis {
    fn clean() -> Self {
        Self {
            has_suspicious_approval: false,
            severity: Severity::Low,
            description: String::new(),
        }
    }

    fn unlimited() -> Self {
        Self {
            has_suspicious_approval: true,
            severity: Severity::Critical,
            description: "Unlimited or suspicious token approval detected".to_string(),
        }
    }

    fn plain() -> Self {
        Self {
            has_suspicious_approval: true,
            severity: Severity::Medium,
            description: "Token approval operation detected".to_string(),
        }
    }
}

/// Classify the first log line that mentions an approval keyword.
///
/// Keywords are compared case-insensitively. The line is then tested against
/// the unlimited-approval patterns: a hit is critical, otherwise medium.
/// Later approval lines are not looked at.
pub fn detect_approval(logs: &[String], config: &HeuristicConfig) -> ApprovalAnalysis {
    let keywords: Vec<String> = config
        .approval_keywords
        .iter()
        .map(|k| k.to_lowercase())
        .collect();

    for log in logs {
        let lower = log.to_lowercase();
        if !keywords.iter().any(|k| lower.contains(k.as_str())) {
            continue;
        }

        let unlimited = config
            .unlimited_approval_patterns
            .iter()
            .any(|pattern| pattern.is_match(log));

        return if unlimited {
            ApprovalAnalysis::unlimited()
        } else {
            ApprovalAnalysis::plain()
        };
    }

    ApprovalAnalysis::clean()
}

// ============================================
// Contract trust
// ============================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractAnalysis {
    pub has_unknown_contract: bool,
    /// Untrusted program ids, sorted and deduplicated
    pub unknown_contracts: Vec<String>,
}

/// Extract the ids that follow `Program <whitespace>` in a log line.
///
/// An id is a run of 32 to 44 ASCII alphanumerics; a longer run contributes
/// its first 44 characters. Scanning resumes after each extracted id.
pub fn extract_program_ids(log: &str) -> Vec<&str> {
    let bytes = log.as_bytes();
    let mut ids = Vec::new();
    let mut cursor = 0;

    while let Some(offset) = log[cursor..].find(PROGRAM_LOG_PREFIX) {
        let keyword_end = cursor + offset + PROGRAM_LOG_PREFIX.len();

        let after_ws = log[keyword_end..]
            .char_indices()
            .find(|(_, c)| !c.is_whitespace())
            .map(|(i, _)| keyword_end + i)
            .unwrap_or(log.len());

        if after_ws == keyword_end {
            cursor = keyword_end;
            continue;
        }

        let run = bytes[after_ws..]
            .iter()
            .take(PROGRAM_ID_MAX_LEN)
            .take_while(|b| b.is_ascii_alphanumeric())
            .count();

        if run >= PROGRAM_ID_MIN_LEN {
            ids.push(&log[after_ws..after_ws + run]);
            cursor = after_ws + run;
        } else {
            cursor = keyword_end;
        }
    }

    ids
}

/// Collect program ids from all logs and keep those not on the allow-list
pub fn classify_contracts(logs: &[String], config: &HeuristicConfig) -> ContractAnalysis {
    let program_ids: BTreeSet<&str> = logs
        .iter()
        .flat_map(|log| extract_program_ids(log))
        .collect();

    let unknown_contracts: Vec<String> = program_ids
        .into_iter()
        .filter(|id| !config.trusted_programs.iter().any(|trusted| trusted == id))
        .map(str::to_string)
        .collect();

    ContractAnalysis {
        has_unknown_contract: !unknown_contracts.is_empty(),
        unknown_contracts,
    }
}

// ============================================
// Domain trust
// ============================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainTrust {
    pub is_trusted: bool,
    pub reasons: Vec<String>,
}

/// Substring containment against the trusted domain list.
///
/// `jup.ag.evil.com` contains `jup.ag` and is therefore trusted; this is the
/// established behavior and is kept as is.
pub fn classify_domain(domain: &str, config: &HeuristicConfig) -> DomainTrust {
    let is_trusted = config
        .trusted_domains
        .iter()
        .any(|trusted| domain.contains(trusted.as_str()));

    let reasons = if is_trusted {
        Vec::new()
    } else {
        vec!["Domain not in trusted list".to_string()]
    };

    DomainTrust { is_trusted, reasons }
}

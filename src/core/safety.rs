//! Safety Analysis Service
//!
//! Orchestration: registry first, then the score aggregator, then the
//! "nothing to analyze" fallback. A registry hit bypasses scoring entirely.

use tracing::{debug, info, warn};

use crate::core::risk_score::ScoreAggregator;
use crate::models::errors::{AppError, AppResult};
use crate::models::types::{SafetyAnalysis, TransactionSimulation};
use crate::registry::matcher::RegistryMatcher;

#[derive(Debug, Clone)]
pub struct SafetyAnalysisService {
    matcher: RegistryMatcher,
    aggregator: ScoreAggregator,
}

impl SafetyAnalysisService {
    pub fn new(matcher: RegistryMatcher, aggregator: ScoreAggregator) -> Self {
        Self {
            matcher,
            aggregator,
        }
    }

    pub fn matcher(&self) -> &RegistryMatcher {
        &self.matcher
    }

    pub fn aggregator(&self) -> &ScoreAggregator {
        &self.aggregator
    }

    /// Produce a verdict for an optional URL and an optional simulation.
    ///
    /// Fails on registry storage errors and on balance changes that break
    /// `change == post - pre`; never returns a partial result.
    pub fn analyze(
        &self,
        url: Option<&str>,
        simulation: Option<&TransactionSimulation>,
        domain: &str,
    ) -> AppResult<SafetyAnalysis> {
        if let Some(url) = url {
            let check = self.matcher.check(url)?;
            if check.is_malicious {
                let reason = check.reason.unwrap_or_default();
                warn!(url = %url, reason = %reason, "🚨 URL flagged in community registry");
                return Ok(SafetyAnalysis::flagged(&reason));
            }
        }

        let Some(simulation) = simulation else {
            debug!(domain = %domain, "no transaction data to analyze");
            return Ok(SafetyAnalysis::unknown());
        };

        if let Some(bad) = simulation.inconsistent_change() {
            return Err(AppError::bad_request(format!(
                "Balance change for {} is inconsistent: change {} != {} - {}",
                bad.account, bad.change, bad.post_balance, bad.pre_balance
            )));
        }

        let analysis = self.aggregator.aggregate(simulation, domain);
        info!(
            domain = %domain,
            score = analysis.score,
            flags = analysis.flags.len(),
            "{} Analysis complete: {}",
            analysis.level.emoji(),
            analysis.level.as_str()
        );
        Ok(analysis)
    }
}

//! Balance transfer analysis
//!
//! Interprets the balance deltas of a simulation. The account with the
//! largest absolute change is taken as the user's own account; nothing in the
//! simulation identifies the signer, so a transaction that moves more lamports
//! through an unrelated account can mask the real drain.

use crate::models::types::BalanceChange;
use crate::utils::constants::DRAINER_THRESHOLD;

/// Outcome of the balance transfer check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceTransferAnalysis {
    pub is_drainer: bool,
    /// `|change| / pre_balance`, 0 when the pre-balance is 0
    pub percentage: f64,
    pub total_transferred: u128,
}

impl BalanceTransferAnalysis {
    pub fn none() -> Self {
        Self {
            is_drainer: false,
            percentage: 0.0,
            total_transferred: 0,
        }
    }

    /// Percentage scaled to 0-100 for display
    pub fn percent(&self) -> f64 {
        self.percentage * 100.0
    }
}

/// Pick the account with the largest absolute change (first one wins ties)
pub fn dominant_change(changes: &[BalanceChange]) -> Option<&BalanceChange> {
    let mut iter = changes.iter();
    let mut max = iter.next()?;
    for change in iter {
        if change.change.unsigned_abs() > max.change.unsigned_abs() {
            max = change;
        }
    }
    Some(max)
}

/// Derive transfer size and drainer status from the balance deltas
pub fn analyze_balance_transfers(changes: &[BalanceChange]) -> BalanceTransferAnalysis {
    let Some(user_change) = dominant_change(changes) else {
        return BalanceTransferAnalysis::none();
    };

    let total_transferred = user_change.change.unsigned_abs();
    let percentage = if user_change.pre_balance > 0 {
        total_transferred as f64 / user_change.pre_balance as f64
    } else {
        0.0
    };

    BalanceTransferAnalysis {
        is_drainer: percentage >= DRAINER_THRESHOLD,
        percentage,
        total_transferred,
    }
}

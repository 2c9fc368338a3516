//! Deposit / withdraw intents

use alloy_primitives::U256;
use serde::Serialize;

use crate::error::Result;
use crate::units::parse_amount;

/// Which vault method an intent maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentKind {
    /// `deposit()` with the amount as call value
    Deposit,
    /// `withdraw(amount)` with the amount as argument
    Withdraw,
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntentKind::Deposit => write!(f, "deposit"),
            IntentKind::Withdraw => write!(f, "withdraw"),
        }
    }
}

/// A single user request, consumed by the orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionIntent {
    pub kind: IntentKind,
    /// Amount as the user typed it, in display units
    pub amount: String,
}

impl TransactionIntent {
    pub fn deposit(amount: impl Into<String>) -> Self {
        Self {
            kind: IntentKind::Deposit,
            amount: amount.into(),
        }
    }

    pub fn withdraw(amount: impl Into<String>) -> Self {
        Self {
            kind: IntentKind::Withdraw,
            amount: amount.into(),
        }
    }

    /// Amount in smallest units; rejects anything not strictly positive
    pub fn smallest_units(&self, decimals: u8) -> Result<U256> {
        parse_amount(&self.amount, decimals)
    }
}

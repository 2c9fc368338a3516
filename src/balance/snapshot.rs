//! Balance snapshot shown to the user

use alloy_primitives::U256;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Native and token balances of the active account
///
/// Display-only. The vault decides whether a deposit or withdraw is
/// affordable; this snapshot may be stale at any time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceSnapshot {
    /// Native currency, decimal formatted
    pub native_balance: String,
    /// Vault token, decimal formatted
    pub token_balance: String,
    /// Native currency in smallest units
    pub native_raw: U256,
    /// Vault token in smallest units
    pub token_raw: U256,
    /// When the balances were fetched; `None` until the first refresh
    pub fetched_at: Option<DateTime<Utc>>,
}

impl Default for BalanceSnapshot {
    fn default() -> Self {
        Self {
            native_balance: "0".to_string(),
            token_balance: "0".to_string(),
            native_raw: U256::ZERO,
            token_raw: U256::ZERO,
            fetched_at: None,
        }
    }
}

impl BalanceSnapshot {
    pub fn is_fresh(&self) -> bool {
        self.fetched_at.is_some()
    }
}

impl std::fmt::Display for BalanceSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "native: {}, token: {}",
            self.native_balance, self.token_balance
        )
    }
}

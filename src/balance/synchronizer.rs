//! Balance synchronizer
//!
//! Fetches native and token balances for the active account and swaps the
//! snapshot in one write. Runs only when asked: after the session becomes
//! ready and after each settled transaction. No timer, no retry.
//!
//! Each refresh takes a generation number before it queries. Overlapping
//! refreshes can finish in any order; a result older than the stored one
//! is discarded.

use std::sync::atomic::{AtomicU64, Ordering};

use alloy_primitives::Address;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::UnitsConfig;
use crate::contracts::ContractBindings;
use crate::error::{Error, Result};
use crate::units::format_amount;
use crate::wallet::Session;

use super::snapshot::BalanceSnapshot;

/// Something that can refresh balances on demand
#[async_trait]
pub trait RefreshBalances: Send + Sync {
    async fn refresh_balances(&self) -> Result<BalanceSnapshot>;
}

/// Snapshot plus the generation of the refresh that wrote it
#[derive(Default)]
struct Stored {
    generation: u64,
    balances: BalanceSnapshot,
}

/// Balance synchronizer
pub struct BalanceSynchronizer {
    units: UnitsConfig,
    issued: AtomicU64,
    stored: RwLock<Stored>,
}

impl BalanceSynchronizer {
    pub fn new(units: UnitsConfig) -> Self {
        Self {
            units,
            issued: AtomicU64::new(0),
            stored: RwLock::new(Stored::default()),
        }
    }

    /// Latest snapshot
    pub async fn snapshot(&self) -> BalanceSnapshot {
        self.stored.read().await.balances.clone()
    }

    /// Query both balances and replace the snapshot
    ///
    /// Performs no network access unless account, identity, provider and
    /// token binding are all present. On failure the previous snapshot is
    /// kept untouched. When a refresh that started later has already been
    /// stored, this result is dropped and the stored snapshot is returned.
    pub async fn refresh(
        &self,
        session: &Session,
        bindings: Option<&ContractBindings>,
    ) -> Result<BalanceSnapshot> {
        let (account, provider, bindings) = match (
            session.account,
            session.identity.as_ref(),
            session.provider.as_ref(),
            bindings,
        ) {
            (Some(account), Some(_), Some(provider), Some(bindings)) => {
                (account, provider, bindings)
            }
            _ => return Err(Error::NotInitialized(missing_pieces(session, bindings))),
        };

        let generation = self.issued.fetch_add(1, Ordering::AcqRel) + 1;
        debug!("Refreshing balances for {} (generation {})", account, generation);

        let (native_raw, token_raw) = futures::try_join!(
            provider.native_balance(account),
            bindings.token.balance_of(account),
        )?;

        let next = BalanceSnapshot {
            native_balance: format_amount(native_raw, self.units.native_decimals)?,
            token_balance: format_amount(token_raw, self.units.token_decimals)?,
            native_raw,
            token_raw,
            fetched_at: Some(Utc::now()),
        };

        let mut stored = self.stored.write().await;
        if generation < stored.generation {
            debug!(
                "Dropping balances from generation {}, generation {} already stored",
                generation, stored.generation
            );
            return Ok(stored.balances.clone());
        }

        stored.generation = generation;
        stored.balances = next.clone();
        info!("Balances for {}: {}", short(account), next);

        Ok(next)
    }
}

fn missing_pieces(session: &Session, bindings: Option<&ContractBindings>) -> String {
    let mut missing = Vec::new();
    if session.account.is_none() {
        missing.push("account");
    }
    if session.identity.is_none() {
        missing.push("signing identity");
    }
    if session.provider.is_none() {
        missing.push("provider");
    }
    if bindings.is_none() {
        missing.push("token binding");
    }
    format!("cannot refresh balances, missing {}", missing.join(", "))
}

fn short(account: Address) -> String {
    let full = account.to_string();
    format!("{}…{}", &full[..6], &full[full.len() - 4..])
}

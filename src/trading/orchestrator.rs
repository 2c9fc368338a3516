//! Transaction orchestrator
//!
//! Drives one deposit/withdraw at a time through
//! `Idle → Submitting → AwaitingConfirmation → Settled → Idle`.
//! Broadcast completes before the confirmation wait starts, and the balance
//! refresh runs only after confirmation. Once broadcast a transaction cannot
//! be cancelled from here.

use std::sync::Arc;

use alloy_primitives::{B256, U256};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::balance::RefreshBalances;
use crate::contracts::ContractBindings;
use crate::error::{Error, Result};
use crate::wallet::OperationGuard;

use super::intent::{IntentKind, TransactionIntent};

/// Progress of the in-flight submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionPhase {
    Idle,
    Submitting,
    AwaitingConfirmation,
    Settled,
}

impl std::fmt::Display for TransactionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TransactionPhase::Idle => "idle",
            TransactionPhase::Submitting => "submitting",
            TransactionPhase::AwaitingConfirmation => "awaiting confirmation",
            TransactionPhase::Settled => "settled",
        };
        write!(f, "{}", label)
    }
}

/// Result of a settled submission
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionOutcome {
    pub id: Uuid,
    pub kind: IntentKind,
    /// Amount in smallest units
    pub amount: U256,
    pub tx_hash: B256,
    pub block_number: u64,
    pub submitted_at: DateTime<Utc>,
    pub settled_at: DateTime<Utc>,
    /// False when the post-settlement balance refresh failed
    pub refreshed: bool,
}

/// Resets the published phase to `Idle` on every exit path
struct PhaseReset<'a>(&'a watch::Sender<TransactionPhase>);

impl Drop for PhaseReset<'_> {
    fn drop(&mut self) {
        self.0.send_replace(TransactionPhase::Idle);
    }
}

/// Transaction orchestrator
pub struct TransactionOrchestrator {
    guard: Arc<OperationGuard>,
    decimals: u8,
    phase: watch::Sender<TransactionPhase>,
}

impl TransactionOrchestrator {
    /// `decimals` converts intent amounts to smallest units
    pub fn new(guard: Arc<OperationGuard>, decimals: u8) -> Self {
        let (phase, _) = watch::channel(TransactionPhase::Idle);
        Self {
            guard,
            decimals,
            phase,
        }
    }

    /// Subscribe to phase changes
    pub fn subscribe(&self) -> watch::Receiver<TransactionPhase> {
        self.phase.subscribe()
    }

    pub fn phase(&self) -> TransactionPhase {
        *self.phase.borrow()
    }

    pub fn is_submitting(&self) -> bool {
        self.guard.submitting.is_busy()
    }

    /// Submit an intent through the vault binding and wait for settlement
    ///
    /// Validation and the busy check happen before any remote call. On
    /// settlement `refresher` is invoked exactly once; its failure is not a
    /// submission failure.
    pub async fn submit(
        &self,
        intent: &TransactionIntent,
        bindings: Option<&ContractBindings>,
        refresher: &dyn RefreshBalances,
    ) -> Result<SubmissionOutcome> {
        let bindings = bindings.ok_or_else(|| {
            Error::NotInitialized("vault binding unavailable, connect a wallet first".to_string())
        })?;
        let amount = intent.smallest_units(self.decimals)?;

        let _submitting = self.guard.submitting.try_acquire().ok_or_else(|| {
            warn!("Rejected {} of {}: submission in flight", intent.kind, intent.amount);
            Error::AlreadySubmitting
        })?;
        let _reset = PhaseReset(&self.phase);

        let id = Uuid::new_v4();
        let submitted_at = Utc::now();
        info!(%id, "Submitting {} of {} ({} smallest units)", intent.kind, intent.amount, amount);

        self.phase.send_replace(TransactionPhase::Submitting);
        let pending = match intent.kind {
            IntentKind::Deposit => bindings.vault.deposit(amount).await,
            IntentKind::Withdraw => bindings.vault.withdraw(amount).await,
        }
        .map_err(|e| {
            error!(%id, "{} broadcast failed: {}", intent.kind, e);
            e
        })?;

        let tx_hash = pending.hash();
        info!(%id, "{} broadcast as {}, awaiting confirmation", intent.kind, tx_hash);

        self.phase.send_replace(TransactionPhase::AwaitingConfirmation);
        let receipt = pending.confirmation().await.map_err(|e| {
            error!(%id, "Confirmation of {} failed: {}", tx_hash, e);
            e
        })?;

        if !receipt.success {
            error!(%id, "{} reverted in block {}", tx_hash, receipt.block_number);
            return Err(Error::TransactionReverted(tx_hash.to_string()));
        }

        let settled_at = Utc::now();
        self.phase.send_replace(TransactionPhase::Settled);
        info!(%id, "{} settled in block {}", tx_hash, receipt.block_number);

        let refreshed = match refresher.refresh_balances().await {
            Ok(_) => true,
            Err(e) => {
                warn!(%id, "Balance refresh after {} failed: {}", tx_hash, e);
                false
            }
        };

        Ok(SubmissionOutcome {
            id,
            kind: intent.kind,
            amount,
            tx_hash,
            block_number: receipt.block_number,
            submitted_at,
            settled_at,
            refreshed,
        })
    }
}

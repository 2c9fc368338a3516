//! Session context
//!
//! `SafeVault` owns every component for the lifetime of the process:
//!
//! ```text
//! SessionManager ─identity─▶ BindingResolver ─bindings─▶ ReadinessTrigger
//!                                                              │ ready
//!                                                              ▼
//! request_deposit / request_withdraw ─▶ Orchestrator ─▶ BalanceSynchronizer
//! ```
//!
//! All public operations report failures through the configured
//! [`Reporter`] and also return them.

use std::sync::Arc;

use alloy_primitives::Address;
use async_trait::async_trait;
use tokio::sync::{watch, RwLock};
use tracing::{debug, info};

use crate::balance::{BalanceSnapshot, BalanceSynchronizer, ReadinessTrigger, RefreshBalances};
use crate::config::Config;
use crate::contracts::{BindingResolver, ContractBindings};
use crate::error::{Error, Result};
use crate::provider::ProviderSource;
use crate::report::{Operation, Report, Reporter};
use crate::trading::{
    IntentKind, SubmissionOutcome, TransactionIntent, TransactionOrchestrator, TransactionPhase,
};
use crate::wallet::{OperationGuard, Session, SessionManager};

/// Wallet session and transaction orchestrator
pub struct SafeVault {
    session: SessionManager,
    resolver: BindingResolver,
    bindings: RwLock<Option<ContractBindings>>,
    balances: BalanceSynchronizer,
    orchestrator: TransactionOrchestrator,
    readiness: ReadinessTrigger,
    reporter: Arc<dyn Reporter>,
}

impl SafeVault {
    /// Create the session context; no wallet access happens here
    pub fn new(config: &Config, reporter: Arc<dyn Reporter>) -> Result<Self> {
        let guard = Arc::new(OperationGuard::new());

        Ok(Self {
            session: SessionManager::new(Arc::clone(&guard)),
            resolver: BindingResolver::new(&config.contracts)?,
            bindings: RwLock::new(None),
            balances: BalanceSynchronizer::new(config.units.clone()),
            orchestrator: TransactionOrchestrator::new(guard, config.units.native_decimals),
            readiness: ReadinessTrigger::new(),
            reporter,
        })
    }

    fn reported(&self, operation: Operation, error: Error) -> Error {
        self.reporter.report(Report::new(operation, &error));
        error
    }

    /// Detect the wallet provider; call once at startup
    pub async fn initialize_provider(&self, source: &dyn ProviderSource) -> Result<()> {
        self.session
            .initialize_provider(source)
            .await
            .map_err(|e| self.reported(Operation::InitializeProvider, e))
    }

    /// Connect the wallet, rebuild bindings, and refresh balances when the
    /// session becomes ready
    ///
    /// A failed automatic refresh is reported but does not fail the connect.
    pub async fn connect(&self) -> Result<Address> {
        let account = self
            .session
            .connect()
            .await
            .map_err(|e| self.reported(Operation::Connect, e))?;

        self.rebind().await;
        self.on_session_change().await;

        Ok(account)
    }

    /// Replace bindings wholesale from the current identity
    ///
    /// New handles re-arm the readiness trigger, so every successful
    /// connect is followed by one refresh.
    async fn rebind(&self) {
        let identity = self.session.signing_identity().await;
        let next = self.resolver.resolve(identity.as_ref());
        debug!("Bindings {}", if next.is_some() { "resolved" } else { "cleared" });
        *self.bindings.write().await = next;
        self.readiness.reset();
    }

    /// React to a change of (account, vault binding, token binding)
    async fn on_session_change(&self) {
        let ready = self.session.account().await.is_some() && self.bindings.read().await.is_some();
        if self.readiness.observe(ready) {
            info!("Session ready, loading balances");
            // Already reported inside
            let _ = self.refresh_balances().await;
        }
    }

    /// Fetch both balances and replace the snapshot
    pub async fn refresh_balances(&self) -> Result<BalanceSnapshot> {
        let session = self.session.snapshot().await;
        let bindings = self.bindings.read().await.clone();

        self.balances
            .refresh(&session, bindings.as_ref())
            .await
            .map_err(|e| self.reported(Operation::RefreshBalances, e))
    }

    /// Deposit `amount` (display units) into the vault
    pub async fn request_deposit(&self, amount: &str) -> Result<SubmissionOutcome> {
        self.submit(TransactionIntent::deposit(amount)).await
    }

    /// Withdraw `amount` (display units) from the vault
    pub async fn request_withdraw(&self, amount: &str) -> Result<SubmissionOutcome> {
        self.submit(TransactionIntent::withdraw(amount)).await
    }

    /// Run an intent through the orchestrator
    pub async fn submit(&self, intent: TransactionIntent) -> Result<SubmissionOutcome> {
        let operation = match intent.kind {
            IntentKind::Deposit => Operation::Deposit,
            IntentKind::Withdraw => Operation::Withdraw,
        };
        let bindings = self.bindings.read().await.clone();

        self.orchestrator
            .submit(&intent, bindings.as_ref(), self)
            .await
            .map_err(|e| self.reported(operation, e))
    }

    /// Latest balance snapshot (display only)
    pub async fn balances(&self) -> BalanceSnapshot {
        self.balances.snapshot().await
    }

    /// Read-only session view
    pub async fn session(&self) -> Session {
        self.session.snapshot().await
    }

    pub async fn account(&self) -> Option<Address> {
        self.session.account().await
    }

    pub async fn bindings(&self) -> Option<ContractBindings> {
        self.bindings.read().await.clone()
    }

    /// Observe the transaction phase
    pub fn phase_updates(&self) -> watch::Receiver<TransactionPhase> {
        self.orchestrator.subscribe()
    }

    pub fn is_connecting(&self) -> bool {
        self.session.is_connecting()
    }

    pub fn is_submitting(&self) -> bool {
        self.orchestrator.is_submitting()
    }
}

#[async_trait]
impl RefreshBalances for SafeVault {
    async fn refresh_balances(&self) -> Result<BalanceSnapshot> {
        SafeVault::refresh_balances(self).await
    }
}

//! Recording fakes of the wallet boundary, shared by unit tests

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use tokio::sync::Notify;

use crate::balance::{BalanceSnapshot, RefreshBalances};
use crate::config::{
    Config, ConfirmationConfig, ContractsConfig, ProviderConfig, UnitsConfig,
};
use crate::contracts::{BindingResolver, ContractBindings};
use crate::error::{Error, ErrorKind, Result};
use crate::provider::{
    PendingTransaction, ProviderSource, SigningIdentity, TransactionReceipt, TransactionRequest,
    WalletProvider,
};
use crate::report::{Report, Reporter};
use crate::wallet::Session;

pub fn test_config() -> Config {
    Config {
        provider: ProviderConfig {
            endpoint: Some("http://127.0.0.1:8545".to_string()),
            timeout_ms: 5_000,
        },
        contracts: ContractsConfig {
            vault_address: "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string(),
            token_address: "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512".to_string(),
            deposit_signature: "deposit()".to_string(),
            withdraw_signature: "withdraw(uint256)".to_string(),
            balance_of_signature: "balanceOf(address)".to_string(),
        },
        units: UnitsConfig::default(),
        confirmation: ConfirmationConfig::default(),
    }
}

/// Ordered record of remote calls
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<String>>,
}

impl EventLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, event: &str) {
        self.events.lock().unwrap().push(event.to_string());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events.lock().unwrap().iter().filter(|e| *e == event).count()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

pub struct FakeProvider {
    log: Arc<EventLog>,
    accounts: Vec<Address>,
    identity: Arc<FakeIdentity>,
    native: Mutex<U256>,
    gate: Option<Notify>,
    balance_gate: Mutex<Option<Arc<Notify>>>,
    fail_identity: bool,
    account_requests: AtomicUsize,
    identity_requests: AtomicUsize,
    balance_requests: AtomicUsize,
}

impl FakeProvider {
    pub fn new(log: Arc<EventLog>) -> Self {
        let account = Address::repeat_byte(0xaa);
        Self {
            identity: Arc::new(FakeIdentity::new(account, log.clone())),
            log,
            accounts: vec![account],
            native: Mutex::new(U256::ZERO),
            gate: None,
            balance_gate: Mutex::new(None),
            fail_identity: false,
            account_requests: AtomicUsize::new(0),
            identity_requests: AtomicUsize::new(0),
            balance_requests: AtomicUsize::new(0),
        }
    }

    pub fn with_accounts(mut self, accounts: Vec<Address>) -> Self {
        self.accounts = accounts;
        self
    }

    /// Hold `request_accounts` until `open_gate` is called
    pub fn gated(mut self) -> Self {
        self.gate = Some(Notify::new());
        self
    }

    pub fn failing_identity(mut self) -> Self {
        self.fail_identity = true;
        self
    }

    pub fn open_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    /// Hold the next `native_balance` reply, after its value is read, until
    /// the returned gate is notified
    pub fn gate_next_balance(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.balance_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn accounts(&self) -> Vec<Address> {
        self.accounts.clone()
    }

    pub fn identity(&self) -> Arc<FakeIdentity> {
        Arc::clone(&self.identity)
    }

    pub fn set_native_balance(&self, value: U256) {
        *self.native.lock().unwrap() = value;
    }

    pub fn account_requests(&self) -> usize {
        self.account_requests.load(Ordering::SeqCst)
    }

    pub fn identity_requests(&self) -> usize {
        self.identity_requests.load(Ordering::SeqCst)
    }

    pub fn balance_requests(&self) -> usize {
        self.balance_requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletProvider for FakeProvider {
    fn describe(&self) -> String {
        "fake".to_string()
    }

    async fn request_accounts(&self) -> Result<Vec<Address>> {
        self.account_requests.fetch_add(1, Ordering::SeqCst);
        self.log.push("request_accounts");
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        Ok(self.accounts.clone())
    }

    async fn signing_identity(&self) -> Result<Arc<dyn SigningIdentity>> {
        self.identity_requests.fetch_add(1, Ordering::SeqCst);
        if self.fail_identity {
            return Err(Error::Authorization("user rejected".to_string()));
        }
        Ok(self.identity.clone())
    }

    async fn native_balance(&self, _account: Address) -> Result<U256> {
        self.balance_requests.fetch_add(1, Ordering::SeqCst);
        self.log.push("native_balance");
        let value = *self.native.lock().unwrap();
        let gate = self.balance_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(value)
    }
}

pub struct FakeIdentity {
    address: Address,
    log: Arc<EventLog>,
    sent: Mutex<Vec<TransactionRequest>>,
    token: Mutex<U256>,
    call_failure: Mutex<Option<String>>,
    send_failure: Mutex<Option<String>>,
    revert: AtomicBool,
    confirm_gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeIdentity {
    pub fn new(address: Address, log: Arc<EventLog>) -> Self {
        Self {
            address,
            log,
            sent: Mutex::new(Vec::new()),
            token: Mutex::new(U256::ZERO),
            call_failure: Mutex::new(None),
            send_failure: Mutex::new(None),
            revert: AtomicBool::new(false),
            confirm_gate: Mutex::new(None),
        }
    }

    pub fn sent(&self) -> Vec<TransactionRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn set_token_balance(&self, value: U256) {
        *self.token.lock().unwrap() = value;
    }

    pub fn fail_calls(&self, message: &str) {
        *self.call_failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn fail_sends(&self, message: &str) {
        *self.send_failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn clear_failures(&self) {
        *self.call_failure.lock().unwrap() = None;
        *self.send_failure.lock().unwrap() = None;
    }

    pub fn revert_transactions(&self) {
        self.revert.store(true, Ordering::SeqCst);
    }

    /// Hold confirmations of later broadcasts until the returned gate is notified
    pub fn gate_confirmations(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.confirm_gate.lock().unwrap() = Some(gate.clone());
        gate
    }
}

#[async_trait]
impl SigningIdentity for FakeIdentity {
    fn address(&self) -> Address {
        self.address
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<Box<dyn PendingTransaction>> {
        self.log.push("send");
        if let Some(message) = self.send_failure.lock().unwrap().clone() {
            return Err(Error::RpcResponse {
                code: -32000,
                message,
            });
        }

        let mut sent = self.sent.lock().unwrap();
        sent.push(tx);
        let nonce = sent.len() as u8;

        Ok(Box::new(FakePending {
            hash: B256::repeat_byte(nonce),
            log: self.log.clone(),
            success: !self.revert.load(Ordering::SeqCst),
            gate: self.confirm_gate.lock().unwrap().clone(),
        }))
    }

    async fn call(&self, _tx: TransactionRequest) -> Result<Bytes> {
        self.log.push("balance_of");
        if let Some(message) = self.call_failure.lock().unwrap().clone() {
            return Err(Error::RpcResponse {
                code: -32000,
                message,
            });
        }
        let word = self.token.lock().unwrap().to_be_bytes::<32>();
        Ok(Bytes::from(word.to_vec()))
    }
}

pub struct FakePending {
    hash: B256,
    log: Arc<EventLog>,
    success: bool,
    gate: Option<Arc<Notify>>,
}

#[async_trait]
impl PendingTransaction for FakePending {
    fn hash(&self) -> B256 {
        self.hash
    }

    async fn confirmation(&self) -> Result<TransactionReceipt> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.log.push("confirm");
        Ok(TransactionReceipt {
            tx_hash: self.hash,
            block_number: 100,
            success: self.success,
        })
    }
}

/// Provider source that hands out a fixed fake (or nothing)
pub struct StaticSource {
    provider: Option<Arc<FakeProvider>>,
    detections: AtomicUsize,
}

impl StaticSource {
    pub fn new(provider: Arc<FakeProvider>) -> Self {
        Self {
            provider: Some(provider),
            detections: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self {
            provider: None,
            detections: AtomicUsize::new(0),
        }
    }

    pub fn detections(&self) -> usize {
        self.detections.load(Ordering::SeqCst)
    }
}

impl ProviderSource for StaticSource {
    fn detect(&self) -> Result<Arc<dyn WalletProvider>> {
        self.detections.fetch_add(1, Ordering::SeqCst);
        match &self.provider {
            Some(provider) => Ok(provider.clone()),
            None => Err(Error::ProviderUnavailable("no wallet injected".to_string())),
        }
    }
}

/// Session and bindings as they look after a successful connect
pub async fn connected_session(provider: &Arc<FakeProvider>) -> (Session, ContractBindings) {
    let identity: Arc<dyn SigningIdentity> = provider.identity();
    let dyn_provider: Arc<dyn WalletProvider> = provider.clone();
    let bindings = BindingResolver::new(&test_config().contracts)
        .unwrap()
        .resolve(Some(&identity))
        .unwrap();

    let session = Session {
        provider: Some(dyn_provider),
        account: Some(provider.accounts()[0]),
        identity: Some(identity),
    };
    (session, bindings)
}

#[derive(Default)]
pub struct RecordingReporter {
    reports: Mutex<Vec<Report>>,
}

impl RecordingReporter {
    pub fn kinds(&self) -> Vec<ErrorKind> {
        self.reports.lock().unwrap().iter().map(|r| r.kind).collect()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, report: Report) {
        self.reports.lock().unwrap().push(report);
    }
}

/// Refresh stand-in that only counts and logs
pub struct CountingRefresher {
    log: Arc<EventLog>,
    count: AtomicUsize,
    fail: bool,
}

impl CountingRefresher {
    pub fn new(log: Arc<EventLog>) -> Self {
        Self {
            log,
            count: AtomicUsize::new(0),
            fail: false,
        }
    }

    pub fn failing(log: Arc<EventLog>) -> Self {
        Self {
            fail: true,
            ..Self::new(log)
        }
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RefreshBalances for CountingRefresher {
    async fn refresh_balances(&self) -> Result<BalanceSnapshot> {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.log.push("refresh");
        if self.fail {
            return Err(Error::Rpc("node unreachable".to_string()));
        }
        Ok(BalanceSnapshot::default())
    }
}

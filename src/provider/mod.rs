//! Wallet provider boundary
//!
//! The wallet (account discovery, signing, broadcast) and the node behind it
//! are external collaborators. Everything in the session and orchestration
//! layers talks to them through the traits in this module:
//!
//! ```text
//! ProviderSource ──detect──▶ WalletProvider ──signing_identity──▶ SigningIdentity
//!                                                                      │
//!                                                          send_transaction
//!                                                                      ▼
//!                                                           PendingTransaction
//! ```
//!
//! [`rpc`] implements them over Ethereum JSON-RPC.

pub mod rpc;

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;

use crate::error::Result;

pub use rpc::{JsonRpcProvider, RpcEnvironment};

/// A state-changing or read-only call against a remote contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    /// Sender; filled from the signing identity
    pub from: Address,
    /// Target contract
    pub to: Address,
    /// Native currency attached to the call, in smallest units
    pub value: U256,
    /// ABI-encoded calldata
    pub data: Bytes,
}

/// Settlement result of a broadcast transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub tx_hash: B256,
    pub block_number: u64,
    /// False when the transaction was included but reverted
    pub success: bool,
}

/// Detects whether a wallet is available in the execution environment
pub trait ProviderSource: Send + Sync {
    /// Returns the wallet provider, or `Error::ProviderUnavailable`
    fn detect(&self) -> Result<Arc<dyn WalletProvider>>;
}

/// External wallet provider
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Human-readable provider description for logs
    fn describe(&self) -> String;

    /// Ask the wallet to authorize this session; returns the exposed accounts
    async fn request_accounts(&self) -> Result<Vec<Address>>;

    /// Derive the identity that signs transactions for this session
    async fn signing_identity(&self) -> Result<Arc<dyn SigningIdentity>>;

    /// Native currency balance of `account`, in smallest units
    async fn native_balance(&self, account: Address) -> Result<U256>;
}

/// Authorization context able to sign and broadcast transactions
#[async_trait]
pub trait SigningIdentity: Send + Sync {
    /// Account this identity signs for
    fn address(&self) -> Address;

    /// Sign and broadcast; resolves once the network acknowledged the
    /// transaction, not when it settles
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<Box<dyn PendingTransaction>>;

    /// Read-only call, returns the raw return data
    async fn call(&self, tx: TransactionRequest) -> Result<Bytes>;
}

/// Handle to a broadcast transaction
#[async_trait]
pub trait PendingTransaction: Send + Sync {
    fn hash(&self) -> B256;

    /// Wait until the transaction is included. There is no timeout.
    async fn confirmation(&self) -> Result<TransactionReceipt>;
}

/// True when both handles point at the same identity instance
pub fn same_identity(a: &Arc<dyn SigningIdentity>, b: &Arc<dyn SigningIdentity>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

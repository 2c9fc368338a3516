//! Ethereum JSON-RPC wallet provider
//!
//! Talks to a wallet-backed node over HTTP through an alloy provider: the
//! node holds the user's accounts, so `eth_requestAccounts` /
//! `eth_sendTransaction` are signed on its side and this client never sees
//! key material.

use std::sync::Arc;
use std::time::Duration;

use alloy_network::ReceiptResponse;
use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_provider::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder};
use alloy_rpc_client::RpcClient;
use alloy_rpc_types::{TransactionInput, TransactionRequest as RpcTransactionRequest};
use alloy_transport_http::Http;
use async_trait::async_trait;
use tracing::{debug, info};
use url::Url;

use crate::config::{mask_url, ConfirmationConfig, ProviderConfig};
use crate::error::{Error, Result};

use super::{
    PendingTransaction, ProviderSource, SigningIdentity, TransactionReceipt, TransactionRequest,
    WalletProvider,
};

/// Wallet provider backed by a JSON-RPC node
pub struct JsonRpcProvider {
    provider: DynProvider,
    endpoint: String,
    confirmation: ConfirmationConfig,
}

impl JsonRpcProvider {
    pub fn new(endpoint: &str, timeout_ms: u64, confirmation: ConfirmationConfig) -> Result<Self> {
        let url: Url = endpoint
            .parse()
            .map_err(|e| Error::Config(format!("Invalid provider endpoint: {}", e)))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        // No retry layer: a failed call is reported once
        let client = RpcClient::builder().transport(Http::with_client(http, url), false);

        // The node fills nonce, gas and chain id for its own accounts
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_client(client);

        provider
            .client()
            .set_poll_interval(Duration::from_millis(confirmation.poll_interval_ms));

        Ok(Self {
            provider: provider.erased(),
            endpoint: endpoint.to_string(),
            confirmation,
        })
    }

    /// Chain id and client version, for health checks
    pub async fn health(&self) -> Result<(u64, String)> {
        let chain_id = self.provider.get_chain_id().await?;
        let version = self.provider.get_client_version().await?;
        Ok((chain_id, version))
    }
}

#[async_trait]
impl WalletProvider for JsonRpcProvider {
    fn describe(&self) -> String {
        format!("json-rpc {}", mask_url(&self.endpoint))
    }

    async fn request_accounts(&self) -> Result<Vec<Address>> {
        let accounts = self
            .provider
            .raw_request::<_, Vec<Address>>("eth_requestAccounts".into(), ())
            .await?;
        Ok(accounts)
    }

    async fn signing_identity(&self) -> Result<Arc<dyn SigningIdentity>> {
        let accounts = self.provider.get_accounts().await?;
        let address = accounts.first().copied().ok_or_else(|| {
            Error::Authorization("provider exposes no signing account".to_string())
        })?;

        Ok(Arc::new(RpcSigner {
            provider: self.provider.clone(),
            address,
            required_confirmations: self.confirmation.required_confirmations,
        }))
    }

    async fn native_balance(&self, account: Address) -> Result<U256> {
        Ok(self.provider.get_balance(account).await?)
    }
}

/// Node-side request for a contract call
///
/// Read-only calls carry no value so the node does not check the sender's
/// funds.
fn rpc_request(tx: TransactionRequest, with_value: bool) -> RpcTransactionRequest {
    let request = RpcTransactionRequest::default()
        .from(tx.from)
        .to(tx.to)
        .input(TransactionInput::new(tx.data));

    if with_value {
        request.value(tx.value)
    } else {
        request
    }
}

/// Signing identity that delegates signing to the node
pub struct RpcSigner {
    provider: DynProvider,
    address: Address,
    required_confirmations: u64,
}

#[async_trait]
impl SigningIdentity for RpcSigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<Box<dyn PendingTransaction>> {
        let to = tx.to;
        let pending = self
            .provider
            .send_transaction(rpc_request(tx, true))
            .await
            .map_err(|e| match Error::from(e) {
                Error::Rpc(message) => Error::TransactionSend(message),
                other => other,
            })?;

        let hash = *pending.tx_hash();
        info!("Broadcast {} to {}", hash, to);

        Ok(Box::new(RpcPendingTransaction {
            provider: self.provider.clone(),
            hash,
            required_confirmations: self.required_confirmations,
        }))
    }

    async fn call(&self, tx: TransactionRequest) -> Result<Bytes> {
        Ok(self.provider.call(rpc_request(tx, false)).await?)
    }
}

/// Broadcast transaction, settled once its receipt is deep enough
///
/// There is no timeout; the provider polls at the configured interval.
pub struct RpcPendingTransaction {
    provider: DynProvider,
    hash: B256,
    required_confirmations: u64,
}

#[async_trait]
impl PendingTransaction for RpcPendingTransaction {
    fn hash(&self) -> B256 {
        self.hash
    }

    async fn confirmation(&self) -> Result<TransactionReceipt> {
        debug!(
            "Waiting for {} ({} confirmation(s))",
            self.hash, self.required_confirmations
        );

        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), self.hash)
            .with_required_confirmations(self.required_confirmations)
            .with_timeout(None)
            .get_receipt()
            .await
            .map_err(|e| Error::TransactionConfirmation(format!("{}: {}", self.hash, e)))?;

        if receipt.transaction_hash() != self.hash {
            return Err(Error::TransactionConfirmation(format!(
                "receipt hash {} does not match {}",
                receipt.transaction_hash(),
                self.hash
            )));
        }

        Ok(TransactionReceipt {
            tx_hash: self.hash,
            block_number: receipt.block_number().unwrap_or_default(),
            success: receipt.status(),
        })
    }
}

/// Detects the wallet from configuration / environment
pub struct RpcEnvironment {
    provider: ProviderConfig,
    confirmation: ConfirmationConfig,
}

impl RpcEnvironment {
    pub fn new(provider: ProviderConfig, confirmation: ConfirmationConfig) -> Self {
        Self {
            provider,
            confirmation,
        }
    }

    /// Build the concrete provider, if an endpoint is configured
    pub fn rpc_provider(&self) -> Result<JsonRpcProvider> {
        let endpoint = self.provider.endpoint.as_deref().ok_or_else(|| {
            Error::ProviderUnavailable(
                "no endpoint configured (set provider.endpoint or SAFEVAULT__PROVIDER__ENDPOINT)"
                    .to_string(),
            )
        })?;

        JsonRpcProvider::new(endpoint, self.provider.timeout_ms, self.confirmation.clone())
    }
}

impl ProviderSource for RpcEnvironment {
    fn detect(&self) -> Result<Arc<dyn WalletProvider>> {
        Ok(Arc::new(self.rpc_provider()?))
    }
}

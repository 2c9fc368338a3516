//! Vault and token bindings
//!
//! A binding is a contract address plus its method shapes, scoped to one
//! signing identity. Bindings are derived values: when the identity changes
//! they are rebuilt, never patched.

use std::sync::Arc;

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::{Address, U256};
use tracing::debug;

use crate::config::ContractsConfig;
use crate::error::Result;
use crate::provider::{same_identity, PendingTransaction, SigningIdentity, TransactionRequest};

use super::abi::{decode_uint, MethodShape};

/// Handle to the deposit vault
#[derive(Clone)]
pub struct VaultBinding {
    address: Address,
    identity: Arc<dyn SigningIdentity>,
    deposit: MethodShape,
    withdraw: MethodShape,
}

impl VaultBinding {
    pub fn address(&self) -> Address {
        self.address
    }

    /// `deposit()` with the amount attached as call value
    pub async fn deposit(&self, value: U256) -> Result<Box<dyn PendingTransaction>> {
        let data = self.deposit.encode(&[])?;
        debug!("{} value={} on {}", self.deposit.signature(), value, self.address);

        self.identity
            .send_transaction(TransactionRequest {
                from: self.identity.address(),
                to: self.address,
                value,
                data,
            })
            .await
    }

    /// `withdraw(amount)` with the amount as an argument and no call value
    pub async fn withdraw(&self, amount: U256) -> Result<Box<dyn PendingTransaction>> {
        let data = self.withdraw.encode(&[DynSolValue::Uint(amount, 256)])?;
        debug!("{} amount={} on {}", self.withdraw.signature(), amount, self.address);

        self.identity
            .send_transaction(TransactionRequest {
                from: self.identity.address(),
                to: self.address,
                value: U256::ZERO,
                data,
            })
            .await
    }
}

/// Handle to the vault's token
#[derive(Clone)]
pub struct TokenBinding {
    address: Address,
    identity: Arc<dyn SigningIdentity>,
    balance_of: MethodShape,
}

impl TokenBinding {
    pub fn address(&self) -> Address {
        self.address
    }

    /// Token balance of `account`, in smallest units
    pub async fn balance_of(&self, account: Address) -> Result<U256> {
        let data = self.balance_of.encode(&[DynSolValue::Address(account)])?;
        let output = self
            .identity
            .call(TransactionRequest {
                from: self.identity.address(),
                to: self.address,
                value: U256::ZERO,
                data,
            })
            .await?;

        decode_uint(&output)
    }
}

/// Vault and token handles bound to the same identity
#[derive(Clone)]
pub struct ContractBindings {
    pub vault: VaultBinding,
    pub token: TokenBinding,
}

impl ContractBindings {
    /// Whether both handles are bound to `identity`
    pub fn is_bound_to(&self, identity: &Arc<dyn SigningIdentity>) -> bool {
        same_identity(&self.vault.identity, identity) && same_identity(&self.token.identity, identity)
    }

    /// Account the bindings sign for
    pub fn signer(&self) -> Address {
        self.vault.identity.address()
    }
}

/// Derives bindings from a signing identity
///
/// Addresses and method shapes are fixed at construction; `resolve` only
/// builds handles.
#[derive(Debug, Clone)]
pub struct BindingResolver {
    vault_address: Address,
    token_address: Address,
    deposit: MethodShape,
    withdraw: MethodShape,
    balance_of: MethodShape,
}

impl BindingResolver {
    pub fn new(config: &ContractsConfig) -> Result<Self> {
        let deposit = MethodShape::parse(&config.deposit_signature)?;
        deposit.expect_inputs(&[])?;

        let withdraw = MethodShape::parse(&config.withdraw_signature)?;
        withdraw.expect_inputs(&[DynSolType::Uint(256)])?;

        let balance_of = MethodShape::parse(&config.balance_of_signature)?;
        balance_of.expect_inputs(&[DynSolType::Address])?;

        Ok(Self {
            vault_address: config.vault()?,
            token_address: config.token()?,
            deposit,
            withdraw,
            balance_of,
        })
    }

    /// Bindings for `identity`, or none when there is no identity
    pub fn resolve(&self, identity: Option<&Arc<dyn SigningIdentity>>) -> Option<ContractBindings> {
        let identity = identity?;

        Some(ContractBindings {
            vault: VaultBinding {
                address: self.vault_address,
                identity: Arc::clone(identity),
                deposit: self.deposit.clone(),
                withdraw: self.withdraw.clone(),
            },
            token: TokenBinding {
                address: self.token_address,
                identity: Arc::clone(identity),
                balance_of: self.balance_of.clone(),
            },
        })
    }
}

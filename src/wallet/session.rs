//! Session manager - wallet connection lifecycle
//!
//! Owns the session value. Other components only ever see a cloned
//! [`Session`] view.

use std::sync::Arc;

use alloy_primitives::Address;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::provider::{ProviderSource, SigningIdentity, WalletProvider};

use super::guard::OperationGuard;

/// Current session state
///
/// `identity` and `account` are either both set or both absent.
#[derive(Clone, Default)]
pub struct Session {
    pub provider: Option<Arc<dyn WalletProvider>>,
    pub identity: Option<Arc<dyn SigningIdentity>>,
    pub account: Option<Address>,
}

impl Session {
    pub fn is_connected(&self) -> bool {
        self.identity.is_some() && self.account.is_some()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("provider", &self.provider.as_ref().map(|p| p.describe()))
            .field("identity", &self.identity.as_ref().map(|i| i.address()))
            .field("account", &self.account)
            .finish()
    }
}

/// Session manager
pub struct SessionManager {
    state: RwLock<Session>,
    guard: Arc<OperationGuard>,
}

impl SessionManager {
    pub fn new(guard: Arc<OperationGuard>) -> Self {
        Self {
            state: RwLock::new(Session::default()),
            guard,
        }
    }

    /// Detect the wallet and store its provider
    ///
    /// Runs once. When no wallet is available the session stays empty and
    /// `Error::ProviderUnavailable` is returned; there is no retry.
    pub async fn initialize_provider(&self, source: &dyn ProviderSource) -> Result<()> {
        if self.state.read().await.provider.is_some() {
            warn!("Provider already initialized, ignoring");
            return Ok(());
        }

        let provider = source.detect()?;
        info!("Wallet provider detected: {}", provider.describe());

        let mut state = self.state.write().await;
        if state.provider.is_none() {
            state.provider = Some(provider);
        }
        Ok(())
    }

    /// Authorize the session with the wallet
    ///
    /// Fails without any remote call when the provider is not initialized
    /// or another connect is in flight. Account and identity are stored
    /// together, only once both are known.
    pub async fn connect(&self) -> Result<Address> {
        let provider = self
            .state
            .read()
            .await
            .provider
            .clone()
            .ok_or(Error::ProviderNotInitialized)?;

        let _connecting = self
            .guard
            .connecting
            .try_acquire()
            .ok_or(Error::AlreadyConnecting)?;

        info!("Requesting account authorization from {}", provider.describe());
        let accounts = provider.request_accounts().await?;
        let account = accounts
            .first()
            .copied()
            .ok_or_else(|| Error::Authorization("provider returned no accounts".to_string()))?;

        let identity = provider.signing_identity().await?;
        if identity.address() != account {
            debug!(
                "Signing identity {} differs from first authorized account {}",
                identity.address(),
                account
            );
        }

        let mut state = self.state.write().await;
        state.account = Some(account);
        state.identity = Some(identity);

        info!("Connected as {}", account);
        Ok(account)
    }

    /// Read-only view of the session
    pub async fn snapshot(&self) -> Session {
        self.state.read().await.clone()
    }

    pub async fn account(&self) -> Option<Address> {
        self.state.read().await.account
    }

    pub async fn signing_identity(&self) -> Option<Arc<dyn SigningIdentity>> {
        self.state.read().await.identity.clone()
    }

    pub async fn is_connected(&self) -> bool {
        self.state.read().await.is_connected()
    }

    pub fn is_connecting(&self) -> bool {
        self.guard.connecting.is_busy()
    }
}

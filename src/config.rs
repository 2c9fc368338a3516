//! Configuration loading and validation

use alloy_primitives::Address;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

/// Largest decimal exponent whose unit still fits in a U256
const MAX_DECIMALS: u8 = 77;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    pub contracts: ContractsConfig,
    #[serde(default)]
    pub units: UnitsConfig,
    #[serde(default)]
    pub confirmation: ConfirmationConfig,
}

/// Wallet provider connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Wallet-backed JSON-RPC endpoint. Absent means no wallet is available.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Fixed remote addresses and method shapes of the vault and token
#[derive(Debug, Clone, Deserialize)]
pub struct ContractsConfig {
    pub vault_address: String,
    pub token_address: String,
    #[serde(default = "default_deposit_signature")]
    pub deposit_signature: String,
    #[serde(default = "default_withdraw_signature")]
    pub withdraw_signature: String,
    #[serde(default = "default_balance_of_signature")]
    pub balance_of_signature: String,
}

impl ContractsConfig {
    /// Parsed vault address
    pub fn vault(&self) -> crate::Result<Address> {
        parse_address("vault_address", &self.vault_address)
    }

    /// Parsed token address
    pub fn token(&self) -> crate::Result<Address> {
        parse_address("token_address", &self.token_address)
    }
}

fn parse_address(field: &str, value: &str) -> crate::Result<Address> {
    Address::from_str(value.trim())
        .map_err(|e| crate::Error::Config(format!("Invalid {}: '{}' ({})", field, value, e)))
}

/// Decimal exponents used to convert between display and smallest units
#[derive(Debug, Clone, Deserialize)]
pub struct UnitsConfig {
    #[serde(default = "default_decimals")]
    pub native_decimals: u8,
    #[serde(default = "default_decimals")]
    pub token_decimals: u8,
}

impl Default for UnitsConfig {
    fn default() -> Self {
        Self {
            native_decimals: default_decimals(),
            token_decimals: default_decimals(),
        }
    }
}

/// Settlement wait settings
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmationConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_required_confirmations")]
    pub required_confirmations: u64,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            required_confirmations: default_required_confirmations(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_deposit_signature() -> String {
    "deposit()".to_string()
}

fn default_withdraw_signature() -> String {
    "withdraw(uint256)".to_string()
}

fn default_balance_of_signature() -> String {
    "balanceOf(address)".to_string()
}

fn default_decimals() -> u8 {
    18
}

fn default_poll_interval_ms() -> u64 {
    1_000
}

fn default_required_confirmations() -> u64 {
    1
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            // Start with defaults
            .set_default("provider.timeout_ms", default_timeout_ms() as i64)?
            .set_default("contracts.deposit_signature", default_deposit_signature())?
            .set_default("contracts.withdraw_signature", default_withdraw_signature())?
            .set_default("contracts.balance_of_signature", default_balance_of_signature())?
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (prefix SAFEVAULT_)
            .add_source(
                config::Environment::with_prefix("SAFEVAULT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let vault = self
            .contracts
            .vault()
            .context("contracts.vault_address must be a 20-byte hex address")?;
        let token = self
            .contracts
            .token()
            .context("contracts.token_address must be a 20-byte hex address")?;

        if vault == token {
            anyhow::bail!("vault_address and token_address must differ");
        }

        for (name, signature) in [
            ("deposit_signature", &self.contracts.deposit_signature),
            ("withdraw_signature", &self.contracts.withdraw_signature),
            ("balance_of_signature", &self.contracts.balance_of_signature),
        ] {
            if !signature.contains('(') || !signature.ends_with(')') {
                anyhow::bail!("{} must look like 'name(types)', got '{}'", name, signature);
            }
        }

        if self.units.native_decimals > MAX_DECIMALS || self.units.token_decimals > MAX_DECIMALS {
            anyhow::bail!("decimals cannot exceed {}", MAX_DECIMALS);
        }

        if self.confirmation.poll_interval_ms == 0 {
            anyhow::bail!("poll_interval_ms must be positive");
        }

        if self.confirmation.required_confirmations == 0 {
            anyhow::bail!("required_confirmations must be at least 1");
        }

        if let Some(endpoint) = &self.provider.endpoint {
            let parsed = url::Url::parse(endpoint)
                .with_context(|| format!("Invalid provider endpoint: {}", endpoint))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                anyhow::bail!("provider endpoint must be http(s), got '{}'", parsed.scheme());
            }
        }

        Ok(())
    }

    /// Get masked configuration for display (hide secrets)
    pub fn masked_display(&self) -> String {
        format!(
            r#"Configuration:
  Provider:
    endpoint: {}
    timeout: {}ms
  Contracts:
    vault: {}
    token: {}
    deposit: {}
    withdraw: {}
    balance_of: {}
  Units:
    native_decimals: {}
    token_decimals: {}
  Confirmation:
    poll_interval: {}ms
    required_confirmations: {}
"#,
            self.provider
                .endpoint
                .as_deref()
                .map(mask_url)
                .unwrap_or_else(|| "(not set)".to_string()),
            self.provider.timeout_ms,
            self.contracts.vault_address,
            self.contracts.token_address,
            self.contracts.deposit_signature,
            self.contracts.withdraw_signature,
            self.contracts.balance_of_signature,
            self.units.native_decimals,
            self.units.token_decimals,
            self.confirmation.poll_interval_ms,
            self.confirmation.required_confirmations,
        )
    }
}

/// Mask URL for display (hide API keys in query params)
pub(crate) fn mask_url(url: &str) -> String {
    if let Some(idx) = url.find('?') {
        format!("{}?***", &url[..idx])
    } else {
        url.to_string()
    }
}

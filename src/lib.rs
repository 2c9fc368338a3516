//! SafeVault wallet session library
//!
//! Connects a wallet provider, keeps the vault/token bindings in step with
//! the signing identity, and serializes vault deposits and withdrawals.

pub mod app;
pub mod balance;
pub mod cli;
pub mod config;
pub mod contracts;
pub mod error;
pub mod provider;
pub mod report;
pub mod trading;
pub mod units;
pub mod wallet;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use app::SafeVault;
pub use config::Config;
pub use error::{Error, ErrorKind, Result};

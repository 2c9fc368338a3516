//! Wallet session module
//!
//! Provides the connection lifecycle to the external wallet:
//! - Provider detection (once per process)
//! - Account authorization and signing identity
//! - Re-entrancy guards shared with the transaction orchestrator
//!
//! # Lifecycle
//!
//! ```text
//! initialize_provider → connect → (account, identity)
//!                          ↑
//!                   connecting flag
//! ```

pub mod guard;
pub mod session;

pub use guard::{BusyFlag, BusyToken, OperationGuard};
pub use session::{Session, SessionManager};

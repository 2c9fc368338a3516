//! Trading module - vault deposit and withdraw submission
//!
//! Both operations go through the vault binding and share one busy flag:
//! - Deposit: `deposit()` with the amount as call value
//! - Withdraw: `withdraw(amount)` with the amount as argument

pub mod intent;
pub mod orchestrator;

pub use intent::{IntentKind, TransactionIntent};
pub use orchestrator::{SubmissionOutcome, TransactionOrchestrator, TransactionPhase};

//! User-visible error reporting
//!
//! Every failure caught at the `SafeVault` boundary is handed to a
//! [`Reporter`] before the result is returned.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{error, warn};

use crate::error::{Error, ErrorKind};

/// Operation that produced a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    InitializeProvider,
    Connect,
    RefreshBalances,
    Deposit,
    Withdraw,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Operation::InitializeProvider => "initialize provider",
            Operation::Connect => "connect",
            Operation::RefreshBalances => "refresh balances",
            Operation::Deposit => "deposit",
            Operation::Withdraw => "withdraw",
        };
        write!(f, "{}", label)
    }
}

/// A reported failure
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub operation: Operation,
    #[serde(skip)]
    pub kind: ErrorKind,
    pub message: String,
    pub recoverable: bool,
    pub at: DateTime<Utc>,
}

impl Report {
    pub fn new(operation: Operation, error: &Error) -> Self {
        Self {
            operation,
            kind: error.kind(),
            message: error.to_string(),
            recoverable: error.is_recoverable(),
            at: Utc::now(),
        }
    }
}

/// Sink for user-visible failure reports
pub trait Reporter: Send + Sync {
    fn report(&self, report: Report);
}

/// Logs reports through tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, report: Report) {
        match report.kind {
            ErrorKind::ReEntrancy | ErrorKind::Validation | ErrorKind::NotInitialized => {
                warn!("{} rejected: {}", report.operation, report.message)
            }
            _ => error!(
                "{} failed: {} (recoverable: {})",
                report.operation, report.message, report.recoverable
            ),
        }
    }
}

/// Forwards reports to a channel, for interactive front ends
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    sender: mpsc::UnboundedSender<Report>,
}

impl ChannelReporter {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Report>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Reporter for ChannelReporter {
    fn report(&self, report: Report) {
        // Receiver gone means nobody is listening any more
        let _ = self.sender.send(report);
    }
}

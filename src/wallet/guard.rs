//! Re-entrancy guards for wallet operations
//!
//! Each flag protects one class of operation against being started again
//! while an earlier invocation is still in flight. Acquiring returns a token;
//! dropping the token clears the flag, so every exit path releases it.

use std::sync::atomic::{AtomicBool, Ordering};

/// A single busy flag
#[derive(Debug)]
pub struct BusyFlag {
    name: &'static str,
    busy: AtomicBool,
}

impl BusyFlag {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            busy: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Set the flag if it is clear; `None` when already busy
    pub fn try_acquire(&self) -> Option<BusyToken<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyToken { flag: self })
    }
}

/// Held while the guarded operation runs
#[derive(Debug)]
pub struct BusyToken<'a> {
    flag: &'a BusyFlag,
}

impl Drop for BusyToken<'_> {
    fn drop(&mut self) {
        self.flag.busy.store(false, Ordering::Release);
    }
}

/// The process-wide pair of operation flags
#[derive(Debug)]
pub struct OperationGuard {
    pub connecting: BusyFlag,
    pub submitting: BusyFlag,
}

impl OperationGuard {
    pub const fn new() -> Self {
        Self {
            connecting: BusyFlag::new("connecting"),
            submitting: BusyFlag::new("submitting"),
        }
    }
}

impl Default for OperationGuard {
    fn default() -> Self {
        Self::new()
    }
}

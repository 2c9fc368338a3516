//! Readiness trigger for automatic balance refresh

use std::sync::atomic::{AtomicBool, Ordering};

/// Fires once each time (account, vault binding, token binding) goes from
/// "not all present" to "all present", or becomes present again after the
/// bindings were replaced
#[derive(Debug, Default)]
pub struct ReadinessTrigger {
    ready: AtomicBool,
}

impl ReadinessTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current readiness; true on a not-ready → ready transition
    pub fn observe(&self, ready: bool) -> bool {
        let was_ready = self.ready.swap(ready, Ordering::AcqRel);
        ready && !was_ready
    }

    /// Forget the last readiness so the next ready observation fires again
    ///
    /// Used when the bindings are replaced: new handles count as a fresh
    /// ready transition.
    pub fn reset(&self) {
        self.ready.store(false, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }
}

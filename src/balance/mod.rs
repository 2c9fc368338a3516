//! Balance synchronization module

pub mod snapshot;
pub mod synchronizer;
pub mod trigger;

pub use snapshot::BalanceSnapshot;
pub use synchronizer::{BalanceSynchronizer, RefreshBalances};
pub use trigger::ReadinessTrigger;

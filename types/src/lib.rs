//! Common types for the fruit wheel backend: the payout table, round phases
//! and the socket protocol.

use std::time::{SystemTime, UNIX_EPOCH};

pub mod api;
pub mod wheel;

pub use wheel::{payout_for, BetTarget, Payout, Phase, Slot, PAYOUT_TABLE};

/// Current wall-clock time in unix seconds.
pub fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

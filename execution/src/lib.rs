//! Game logic for the fruit wheel backend.
//!
//! Everything here is synchronous and free of I/O: [SessionState] holds one
//! connection's game, [RoundEngine] moves it through its phases and [router]
//! answers client requests against it.

use fruitwheel_types::Slot;
use thiserror::Error;

pub mod engine;
pub mod router;
pub mod state;

pub use engine::{RoundEngine, RoundTiming};
pub use state::{BetRejection, LedgerEntry, Profile, SessionState, Settlement};

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    #[error("payout for result {result} overflows")]
    Overflow { result: Slot },
    #[error("round reached settlement without a result")]
    NotSpun,
    #[error("round deadline is out of range")]
    Clock,
}

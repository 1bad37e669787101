mod constants;
mod payout;
mod phase;

pub use constants::*;
pub use payout::*;
pub use phase::*;

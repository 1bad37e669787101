use super::{SLOT_COUNT, TARGETS_PER_SLOT, TARGET_COUNT};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One wheel position and what it pays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Payout {
    pub slot: u8,
    pub symbol: &'static str,
    /// Total returned per coin staked on a winning target.
    pub multiplier: u64,
}

/// Payout for every slot, indexed by slot.
pub const PAYOUT_TABLE: [Payout; SLOT_COUNT] = [
    Payout { slot: 0, symbol: "apple", multiplier: 2 },
    Payout { slot: 1, symbol: "orange", multiplier: 2 },
    Payout { slot: 2, symbol: "banana", multiplier: 5 },
    Payout { slot: 3, symbol: "grape", multiplier: 8 },
    Payout { slot: 4, symbol: "watermelon", multiplier: 10 },
    Payout { slot: 5, symbol: "cherry", multiplier: 20 },
    Payout { slot: 6, symbol: "lemon", multiplier: 50 },
    Payout { slot: 7, symbol: "star", multiplier: 100 },
];

/// Look up the payout of a slot.
pub fn payout_for(slot: Slot) -> &'static Payout {
    &PAYOUT_TABLE[slot.0 as usize]
}

/// A wheel position, always in `0..SLOT_COUNT`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Slot(u8);

impl Slot {
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < SLOT_COUNT {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Draw a slot uniformly.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(rng.gen_range(0..SLOT_COUNT as u8))
    }

    pub const fn index(self) -> u8 {
        self.0
    }

    pub fn payout(self) -> &'static Payout {
        payout_for(self)
    }

}

impl TryFrom<u8> for Slot {
    type Error = InvalidSlot;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(InvalidSlot(value))
    }
}

impl From<Slot> for u8 {
    fn from(slot: Slot) -> Self {
        slot.0
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.0, self.payout().symbol)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("slot {0} is outside the wheel")]
pub struct InvalidSlot(pub u8);

/// A bettable identifier. Each slot `s` can be backed through `2s` or `2s + 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BetTarget(u8);

impl BetTarget {
    pub const fn new(id: u8) -> Option<Self> {
        if (id as usize) < TARGET_COUNT {
            Some(Self(id))
        } else {
            None
        }
    }

    /// Parse a target id as sent by clients.
    pub fn from_wire(id: i64) -> Option<Self> {
        u8::try_from(id).ok().and_then(Self::new)
    }

    pub const fn id(self) -> u8 {
        self.0
    }

    pub const fn slot(self) -> Slot {
        Slot(self.0 / TARGETS_PER_SLOT)
    }

    /// Whether this target pays out when `result` comes up.
    pub fn wins(self, result: Slot) -> bool {
        self.slot() == result
    }
}

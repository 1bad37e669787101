use crate::api::DecodeError;
use std::fmt;

/// Round phases, in the order they cycle.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    #[default]
    None = 0,
    Bet = 1,
    Spin = 2,
    Finish = 3,
}

impl Phase {
    /// Stage number used on the wire.
    pub const fn stage(self) -> u8 {
        self as u8
    }

    pub const fn next(self) -> Self {
        match self {
            Phase::None => Phase::Bet,
            Phase::Bet => Phase::Spin,
            Phase::Spin => Phase::Finish,
            Phase::Finish => Phase::None,
        }
    }

    pub const fn accepts_bets(self) -> bool {
        matches!(self, Phase::Bet)
    }
}

impl TryFrom<u8> for Phase {
    type Error = DecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Phase::None),
            1 => Ok(Phase::Bet),
            2 => Ok(Phase::Spin),
            3 => Ok(Phase::Finish),
            _ => Err(DecodeError::InvalidStage(value)),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::None => "none",
            Phase::Bet => "bet",
            Phase::Spin => "spin",
            Phase::Finish => "finish",
        };
        f.write_str(name)
    }
}

use crate::Error;
use fruitwheel_types::{
    unix_timestamp,
    wheel::{
        CODE_COIN_NOT_ENOUGH, CODE_INVALID_BET, CODE_STAGE_CLOSED, DEFAULT_NICKNAME,
        HISTORY_CAPACITY, HISTORY_SEED_LEN, STARTING_COIN,
    },
    BetTarget, Phase, Slot,
};
use rand::Rng;
use std::collections::VecDeque;

/// Who the session plays as and what it starts with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Profile {
    pub starting_coin: u64,
    pub nickname: String,
    pub avatar: String,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            starting_coin: STARTING_COIN,
            nickname: DEFAULT_NICKNAME.to_string(),
            avatar: String::new(),
        }
    }
}

/// A stake placed during the current betting phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LedgerEntry {
    pub target: BetTarget,
    pub amount: u64,
}

/// Why a bet was turned down. None of these end the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BetRejection {
    #[error("insufficient coins")]
    InsufficientFunds,
    #[error("betting is closed")]
    StageClosed,
    #[error("invalid bet")]
    InvalidBet,
}

impl BetRejection {
    /// Reply code sent to the client.
    pub const fn code(self) -> i32 {
        match self {
            BetRejection::InsufficientFunds => CODE_COIN_NOT_ENOUGH,
            BetRejection::StageClosed => CODE_STAGE_CLOSED,
            BetRejection::InvalidBet => CODE_INVALID_BET,
        }
    }
}

/// Result of settling a round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settlement {
    pub result: Slot,
    pub reward: u64,
    pub coin: u64,
}

/// Total owed for `ledger` if `result` comes up.
///
/// Each winning entry pays `amount * multiplier(result)`.
pub fn winnings(ledger: &[LedgerEntry], result: Slot) -> Result<u64, Error> {
    let multiplier = result.payout().multiplier;
    ledger
        .iter()
        .filter(|entry| entry.target.wins(result))
        .try_fold(0u64, |total, entry| {
            entry
                .amount
                .checked_mul(multiplier)
                .and_then(|win| total.checked_add(win))
                .ok_or(Error::Overflow { result })
        })
}

/// Generate a round id of the form `<unix seconds>-<4 digits>`.
pub fn new_round_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{}-{}", unix_timestamp(), rng.gen_range(1000..=9999))
}

/// Everything one connection knows about its game.
///
/// Owned by exactly one connection; nothing here is shared.
#[derive(Clone, Debug)]
pub struct SessionState {
    coin: u64,
    today_win: u64,
    round_id: String,
    countdown: u64,
    phase: Phase,
    ledger: Vec<LedgerEntry>,
    history: VecDeque<Slot>,
    last_result: Option<Slot>,
    nickname: String,
    avatar: String,
}

impl SessionState {
    /// Create a session with a few random results as prior history.
    pub fn new<R: Rng + ?Sized>(profile: &Profile, rng: &mut R) -> Self {
        let mut history = VecDeque::with_capacity(HISTORY_CAPACITY + 1);
        history.extend((0..HISTORY_SEED_LEN).map(|_| Slot::random(rng)));
        Self {
            coin: profile.starting_coin,
            today_win: 0,
            round_id: new_round_id(rng),
            countdown: 0,
            phase: Phase::None,
            ledger: Vec::new(),
            history,
            last_result: None,
            nickname: profile.nickname.clone(),
            avatar: profile.avatar.clone(),
        }
    }

    pub fn coin(&self) -> u64 {
        self.coin
    }

    pub fn today_win(&self) -> u64 {
        self.today_win
    }

    pub fn round_id(&self) -> &str {
        &self.round_id
    }

    pub fn countdown(&self) -> u64 {
        self.countdown
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn ledger(&self) -> &[LedgerEntry] {
        &self.ledger
    }

    pub fn history(&self) -> impl ExactSizeIterator<Item = Slot> + '_ {
        self.history.iter().copied()
    }

    /// The newest `n` results, oldest first.
    pub fn recent_history(&self, n: usize) -> Vec<Slot> {
        let skip = self.history.len().saturating_sub(n);
        self.history.iter().skip(skip).copied().collect()
    }

    pub fn last_result(&self) -> Option<Slot> {
        self.last_result
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    pub fn avatar(&self) -> &str {
        &self.avatar
    }

    /// Stake `amount` on target `target`, returning the new balance.
    ///
    /// Fields arrive straight from the client, so both are range checked here.
    pub fn place_bet(&mut self, target: i64, amount: i64) -> Result<u64, BetRejection> {
        if !self.phase.accepts_bets() {
            return Err(BetRejection::StageClosed);
        }
        let Some(target) = BetTarget::from_wire(target) else {
            return Err(BetRejection::InvalidBet);
        };
        let amount = match u64::try_from(amount) {
            Ok(amount) if amount > 0 => amount,
            _ => return Err(BetRejection::InvalidBet),
        };
        if amount > self.coin {
            return Err(BetRejection::InsufficientFunds);
        }
        self.coin -= amount;
        self.ledger.push(LedgerEntry { target, amount });
        Ok(self.coin)
    }

    /// Pay out the ledger against `result` and record the result.
    ///
    /// Nothing is modified if the payout cannot be represented.
    pub fn settle(&mut self, result: Slot) -> Result<Settlement, Error> {
        let reward = winnings(&self.ledger, result)?;
        let coin = self
            .coin
            .checked_add(reward)
            .ok_or(Error::Overflow { result })?;
        let today_win = self
            .today_win
            .checked_add(reward)
            .ok_or(Error::Overflow { result })?;

        self.coin = coin;
        self.today_win = today_win;
        self.ledger.clear();
        self.record_result(result);
        Ok(Settlement {
            result,
            reward,
            coin,
        })
    }

    fn record_result(&mut self, result: Slot) {
        self.history.push_back(result);
        while self.history.len() > HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.last_result = Some(result);
    }

    /// Open a new betting phase.
    pub(crate) fn begin_round(&mut self, round_id: String, countdown: u64) {
        self.round_id = round_id;
        self.ledger.clear();
        self.phase = Phase::Bet;
        self.countdown = countdown;
    }

    pub(crate) fn enter(&mut self, phase: Phase, countdown: u64) {
        self.phase = phase;
        self.countdown = countdown;
    }

    /// Count one second off the betting clock.
    pub(crate) fn tick(&mut self) -> u64 {
        self.countdown = self.countdown.saturating_sub(1);
        self.countdown
    }

    /// Drop back to idle without announcing it (used when a step fails).
    pub(crate) fn abandon_round(&mut self) {
        self.phase = Phase::None;
        self.countdown = 0;
    }

    #[cfg(test)]
    pub(crate) fn ledger_mut(&mut self) -> &mut Vec<LedgerEntry> {
        &mut self.ledger
    }
}

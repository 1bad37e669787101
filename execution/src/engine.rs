//! Round state machine.
//!
//! The engine never sleeps. It keeps the instant at which the next step is
//! due and the caller waits for that deadline (alongside whatever else it is
//! doing) before calling [RoundEngine::advance]. Each step performs exactly
//! one transition or countdown tick:
//!
//! ```text
//! NONE --idle--> BET --1s x bet_secs--> SPIN --spin--> FINISH --finish--> NONE
//! ```

use crate::{
    state::{new_round_id, SessionState},
    Error,
};
use fruitwheel_types::{
    api::{CoinUpdate, Response, StageBroadcast},
    wheel::{BET_SECS, FINISH_SECS, IDLE_SECS, RETRY_PAUSE_MS, SPIN_SECS},
    Phase, Slot,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const TICK: Duration = Duration::from_secs(1);

/// How long each phase lasts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundTiming {
    pub bet_secs: u64,
    pub spin_secs: u64,
    pub finish_secs: u64,
    pub idle_secs: u64,
    pub retry_pause_ms: u64,
}

impl Default for RoundTiming {
    fn default() -> Self {
        Self {
            bet_secs: BET_SECS,
            spin_secs: SPIN_SECS,
            finish_secs: FINISH_SECS,
            idle_secs: IDLE_SECS,
            retry_pause_ms: RETRY_PAUSE_MS,
        }
    }
}

impl RoundTiming {
    pub fn retry_pause(&self) -> Duration {
        Duration::from_millis(self.retry_pause_ms)
    }
}

/// Drives one session through its rounds.
#[derive(Debug)]
pub struct RoundEngine {
    timing: RoundTiming,
    deadline: Instant,
    spun: Option<Slot>,
}

impl RoundEngine {
    /// Create an engine whose first step (opening the betting phase) is due at `start`.
    pub fn new(timing: RoundTiming, start: Instant) -> Self {
        Self {
            timing,
            deadline: start,
            spun: None,
        }
    }

    /// When the next step is due.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// The result drawn for the current round, once spinning has started.
    pub fn spun(&self) -> Option<Slot> {
        self.spun
    }

    /// Run the step that is due and return what should be broadcast.
    ///
    /// A failed step is logged and the cycle restarts at BET after the retry
    /// pause (counted from `now`).
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        state: &mut SessionState,
        rng: &mut R,
        now: Instant,
    ) -> Vec<Response> {
        match self.step(state, rng, now) {
            Ok(broadcasts) => broadcasts,
            Err(e) => {
                warn!(
                    phase = %state.phase(),
                    round_id = state.round_id(),
                    error = %e,
                    "Round step failed, restarting round"
                );
                self.recover(state, now);
                Vec::new()
            }
        }
    }

    /// Perform one transition (or countdown tick).
    ///
    /// A new betting phase is timed from `now` if its deadline has already
    /// passed, so a stalled caller cannot shorten it.
    /// On error neither the engine nor `state` are modified.
    pub fn step<R: Rng + ?Sized>(
        &mut self,
        state: &mut SessionState,
        rng: &mut R,
        now: Instant,
    ) -> Result<Vec<Response>, Error> {
        let phase = state.phase();
        if phase == Phase::Bet && state.countdown() > 1 {
            self.deadline = later(self.deadline, TICK)?;
            state.tick();
            return Ok(Vec::new());
        }

        let next = phase.next();
        let anchor = match next {
            Phase::Bet => self.deadline.max(now),
            _ => self.deadline,
        };
        let deadline = later(anchor, self.duration_of(next))?;
        let broadcasts = match next {
            Phase::Bet => self.open_betting(state, rng),
            Phase::Spin => self.spin(state, rng),
            Phase::Finish => self.finish(state)?,
            Phase::None => self.close(state),
        };
        self.deadline = deadline;
        Ok(broadcasts)
    }

    /// Time until the step after entering `phase`.
    fn duration_of(&self, phase: Phase) -> Duration {
        match phase {
            Phase::Bet => TICK,
            Phase::Spin => Duration::from_secs(self.timing.spin_secs),
            Phase::Finish => Duration::from_secs(self.timing.finish_secs),
            Phase::None => Duration::from_secs(self.timing.idle_secs),
        }
    }

    fn open_betting<R: Rng + ?Sized>(
        &mut self,
        state: &mut SessionState,
        rng: &mut R,
    ) -> Vec<Response> {
        self.spun = None;
        state.begin_round(new_round_id(rng), self.timing.bet_secs);
        debug!(round_id = state.round_id(), "Betting open");
        let stage = StageBroadcast::bet(state.round_id(), state.countdown());
        vec![Response::Stage(stage)]
    }

    fn spin<R: Rng + ?Sized>(&mut self, state: &mut SessionState, rng: &mut R) -> Vec<Response> {
        let result = Slot::random(rng);
        self.spun = Some(result);
        state.enter(Phase::Spin, self.timing.spin_secs);
        debug!(round_id = state.round_id(), %result, "Wheel spinning");

        // The result is announced as soon as it is drawn
        let stage = StageBroadcast::spin(state.round_id(), result, self.timing.spin_secs);
        vec![Response::Stage(stage)]
    }

    fn finish(&mut self, state: &mut SessionState) -> Result<Vec<Response>, Error> {
        let result = self.spun.ok_or(Error::NotSpun)?;
        let settlement = state.settle(result)?;
        state.enter(Phase::Finish, self.timing.finish_secs);
        debug!(
            round_id = state.round_id(),
            %result,
            reward = settlement.reward,
            coin = settlement.coin,
            "Round settled"
        );

        let stage = StageBroadcast::finish(
            state.round_id(),
            result,
            settlement.reward,
            settlement.coin,
        );
        Ok(vec![
            Response::Stage(stage),
            Response::CoinUpdate(CoinUpdate {
                coin: settlement.coin,
            }),
        ])
    }

    fn close(&mut self, state: &mut SessionState) -> Vec<Response> {
        state.enter(Phase::None, self.timing.idle_secs);
        vec![Response::Stage(StageBroadcast::idle(state.round_id()))]
    }

    fn recover(&mut self, state: &mut SessionState, now: Instant) {
        self.spun = None;
        state.abandon_round();
        self.deadline = later(now, self.timing.retry_pause()).unwrap_or(now);
    }
}

fn later(at: Instant, wait: Duration) -> Result<Instant, Error> {
    at.checked_add(wait).ok_or(Error::Clock)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{LedgerEntry, Profile};
    use fruitwheel_types::BetTarget;
    use rand::{rngs::StdRng, SeedableRng};

    fn setup_with(timing: RoundTiming) -> (RoundEngine, SessionState, StdRng, Instant) {
        let mut rng = StdRng::seed_from_u64(42);
        let state = SessionState::new(&Profile::default(), &mut rng);
        let start = Instant::now();
        (RoundEngine::new(timing, start), state, rng, start)
    }

    fn setup() -> (RoundEngine, SessionState, StdRng, Instant) {
        setup_with(RoundTiming::default())
    }

    fn stage(response: &Response) -> &StageBroadcast {
        match response {
            Response::Stage(stage) => stage,
            other => panic!("expected stage broadcast, got {other:?}"),
        }
    }

    /// Step until the next phase change, returning its broadcasts.
    fn run_phase(
        engine: &mut RoundEngine,
        state: &mut SessionState,
        rng: &mut StdRng,
        now: Instant,
    ) -> Vec<Response> {
        let phase = state.phase();
        loop {
            let broadcasts = engine.step(state, rng, now).unwrap();
            if state.phase() != phase {
                return broadcasts;
            }
            assert!(broadcasts.is_empty());
        }
    }

    #[test]
    fn test_first_step_opens_betting() {
        let (mut engine, mut state, mut rng, start) = setup();
        assert_eq!(engine.deadline(), start);

        let broadcasts = engine.step(&mut state, &mut rng, start).unwrap();
        assert_eq!(broadcasts.len(), 1);
        let bet = stage(&broadcasts[0]);
        assert_eq!(bet.phase().unwrap(), Phase::Bet);
        assert_eq!(bet.countdown, Some(15));
        assert_eq!(bet.round_id, state.round_id());
        assert_eq!(state.phase(), Phase::Bet);
        assert_eq!(engine.deadline(), start + TICK);
    }

    #[test]
    fn test_betting_countdown() {
        let (mut engine, mut state, mut rng, start) = setup();
        engine.step(&mut state, &mut rng, start).unwrap();

        // Silent ticks from 14 down to 1
        for expected in (1..15).rev() {
            assert!(engine.step(&mut state, &mut rng, start).unwrap().is_empty());
            assert_eq!(state.countdown(), expected);
            assert_eq!(state.phase(), Phase::Bet);
        }

        // The fifteenth tick spins the wheel
        let broadcasts = engine.step(&mut state, &mut rng, start).unwrap();
        let spin = stage(&broadcasts[0]);
        assert_eq!(spin.phase().unwrap(), Phase::Spin);
        assert_eq!(spin.result, engine.spun());
        assert_eq!(spin.countdown, Some(5));
        assert_eq!(state.phase(), Phase::Spin);
        assert_eq!(engine.deadline(), start + Duration::from_secs(15 + 5));
    }

    #[test]
    fn test_phase_cycle() {
        let (mut engine, mut state, mut rng, start) = setup();
        let mut observed = Vec::new();
        let mut round_ids = Vec::new();
        for _ in 0..12 {
            let broadcasts = run_phase(&mut engine, &mut state, &mut rng, start);
            let phase = stage(&broadcasts[0]).phase().unwrap();
            assert_eq!(phase, state.phase());
            if phase == Phase::Bet {
                round_ids.push(state.round_id().to_string());
            }
            observed.push(phase);
        }

        let expected: Vec<Phase> = [Phase::Bet, Phase::Spin, Phase::Finish, Phase::None]
            .into_iter()
            .cycle()
            .take(12)
            .collect();
        assert_eq!(observed, expected);

        // Three rounds, each due exactly one round length after the last
        assert_eq!(round_ids.len(), 3);
        assert_eq!(
            engine.deadline(),
            start + Duration::from_secs(3 * (15 + 5 + 3 + 2))
        );
    }

    #[test]
    fn test_late_betting_is_reanchored() {
        let (mut engine, mut state, mut rng, start) = setup();
        for _ in 0..4 {
            run_phase(&mut engine, &mut state, &mut rng, start);
        }
        assert_eq!(state.phase(), Phase::None);

        // The caller wakes long after the idle deadline passed
        let late = start + Duration::from_secs(600);
        let broadcasts = engine.step(&mut state, &mut rng, late).unwrap();
        assert_eq!(stage(&broadcasts[0]).phase().unwrap(), Phase::Bet);
        assert_eq!(engine.deadline(), late + TICK);

        // The full betting window still has to elapse
        run_phase(&mut engine, &mut state, &mut rng, late);
        assert_eq!(state.phase(), Phase::Spin);
        assert_eq!(engine.deadline(), late + Duration::from_secs(15 + 5));
    }

    #[test]
    fn test_round_settlement() {
        let (mut engine, mut state, mut rng, start) = setup();
        engine.step(&mut state, &mut rng, start).unwrap();

        // Cover every target so the result always pays
        for target in 0..16 {
            state.place_bet(target, 100).unwrap();
        }
        assert_eq!(state.coin(), 8_400);

        run_phase(&mut engine, &mut state, &mut rng, start);
        let result = engine.spun().unwrap();
        let history_len = state.history().len();

        let broadcasts = run_phase(&mut engine, &mut state, &mut rng, start);
        let reward = 200 * result.payout().multiplier;
        let finish = stage(&broadcasts[0]);
        assert_eq!(finish.phase().unwrap(), Phase::Finish);
        assert_eq!(finish.result, Some(result));
        assert_eq!(finish.reward, Some(reward));
        assert_eq!(finish.coin, Some(8_400 + reward));
        assert_eq!(
            broadcasts[1],
            Response::CoinUpdate(CoinUpdate {
                coin: 8_400 + reward
            })
        );
        assert_eq!(state.today_win(), reward);
        assert!(state.ledger().is_empty());
        assert_eq!(state.history().len(), history_len + 1);
        assert_eq!(state.last_result(), Some(result));
    }

    #[test]
    fn test_ledger_empty_on_new_round() {
        let (mut engine, mut state, mut rng, start) = setup();
        engine.step(&mut state, &mut rng, start).unwrap();
        state.place_bet(2, 10).unwrap();
        for _ in 0..3 {
            run_phase(&mut engine, &mut state, &mut rng, start);
        }

        // Next round starts clean
        engine.step(&mut state, &mut rng, start).unwrap();
        assert_eq!(state.phase(), Phase::Bet);
        assert!(state.ledger().is_empty());
    }

    #[test]
    fn test_failed_step_restarts_round() {
        let (mut engine, mut state, mut rng, start) = setup();
        engine.step(&mut state, &mut rng, start).unwrap();
        run_phase(&mut engine, &mut state, &mut rng, start);
        assert_eq!(state.phase(), Phase::Spin);

        // A stake no result can pay without overflowing
        for target in 0..16 {
            state.ledger_mut().push(LedgerEntry {
                target: BetTarget::new(target).unwrap(),
                amount: u64::MAX / 2,
            });
        }
        let deadline = engine.deadline();
        assert!(engine.step(&mut state, &mut rng, start).is_err());
        assert_eq!(state.phase(), Phase::Spin);
        assert_eq!(engine.deadline(), deadline);

        let now = Instant::now();
        assert!(engine.advance(&mut state, &mut rng, now).is_empty());
        assert_eq!(state.phase(), Phase::None);
        assert_eq!(engine.deadline(), now + Duration::from_secs(1));
        assert_eq!(state.coin(), 10_000);

        // Next step opens a fresh round
        let broadcasts = engine.advance(&mut state, &mut rng, now);
        assert_eq!(stage(&broadcasts[0]).phase().unwrap(), Phase::Bet);
        assert!(state.ledger().is_empty());
    }

    #[test]
    fn test_unrepresentable_deadline() {
        let (mut engine, mut state, mut rng, start) = setup_with(RoundTiming {
            spin_secs: u64::MAX,
            ..RoundTiming::default()
        });
        engine.step(&mut state, &mut rng, start).unwrap();
        while state.countdown() > 1 {
            engine.step(&mut state, &mut rng, start).unwrap();
        }

        // Spinning would schedule past the end of time
        let deadline = engine.deadline();
        assert_eq!(
            engine.step(&mut state, &mut rng, start),
            Err(Error::Clock)
        );
        assert_eq!(state.phase(), Phase::Bet);
        assert_eq!(engine.spun(), None);
        assert_eq!(engine.deadline(), deadline);

        // The failure is absorbed and the cycle keeps going
        let now = Instant::now();
        assert!(engine.advance(&mut state, &mut rng, now).is_empty());
        assert_eq!(state.phase(), Phase::None);
        assert_eq!(engine.deadline(), now + Duration::from_secs(1));
    }
}

//! Request handlers.
//!
//! Routing is stateless: every handler reads or updates the [SessionState]
//! it is given and returns the single reply to send back.

use crate::state::SessionState;
use fruitwheel_types::{
    api::{
        BetReply, BetRequest, DecodeError, GameInfo, Heartbeat, RankEntry, Ranks, Request,
        Response, SelfRecord, SelfRecords, TodayWin,
    },
    unix_timestamp,
    wheel::{
        CODE_OK, DEFAULT_NICKNAME, INFO_HISTORY_LEN, RANK_COUNT, RANK_UID_BASE,
        SELF_RECORD_COUNT, SELF_RECORD_SPACING_SECS,
    },
    Slot,
};
use rand::Rng;
use serde_json::json;
use std::collections::BTreeMap;
use tracing::debug;

/// Decode a text frame and answer it.
pub fn route<R: Rng + ?Sized>(
    text: &str,
    state: &mut SessionState,
    rng: &mut R,
) -> Result<Response, DecodeError> {
    let request = Request::decode(text)?;
    debug!(request = request.name(), "Routing request");
    Ok(dispatch(request, state, rng))
}

pub fn dispatch<R: Rng + ?Sized>(
    request: Request,
    state: &mut SessionState,
    rng: &mut R,
) -> Response {
    match request {
        Request::GameInfo => game_info(state),
        Request::GameBet(bet) => place_bet(state, &bet),
        Request::SelfRecord => self_records(rng),
        Request::TodayWin => today_win(state),
        Request::Rank => rank(rng),
        Request::Heartbeat => heartbeat(),
    }
}

/// Snapshot of the current round. Also sent unprompted when a client connects.
pub fn game_info(state: &SessionState) -> Response {
    Response::GameInfo(GameInfo {
        code: CODE_OK,
        stage: state.phase().stage(),
        round_id: state.round_id().to_string(),
        countdown: state.countdown(),
        coin: state.coin(),
        nickname: state.nickname().to_string(),
        avatar: state.avatar().to_string(),
        today_win: state.today_win(),
        history: state.recent_history(INFO_HISTORY_LEN),
        bets: BTreeMap::new(),
        myself_bets: BTreeMap::new(),
    })
}

pub fn place_bet(state: &mut SessionState, request: &BetRequest) -> Response {
    // Stale round ids are accepted
    if request.round_id != state.round_id() {
        debug!(
            round_id = state.round_id(),
            requested = request.round_id.as_str(),
            "Bet round id does not match current round"
        );
    }

    let reply = match state.place_bet(request.id, request.bet) {
        Ok(coin) => BetReply {
            code: CODE_OK,
            id: request.id,
            bet: request.bet,
            coin,
        },
        Err(rejection) => {
            debug!(target_id = request.id, amount = request.bet, %rejection, "Bet rejected");
            BetReply {
                code: rejection.code(),
                id: request.id,
                bet: 0,
                coin: state.coin(),
            }
        }
    };
    Response::GameBet(reply)
}

/// Fabricated past rounds, newest first.
pub fn self_records<R: Rng + ?Sized>(rng: &mut R) -> Response {
    let now = unix_timestamp();
    let records = (0..SELF_RECORD_COUNT as u64)
        .map(|i| {
            let target = rng.gen_range(0..=3u8).to_string();
            let stake = rng.gen_range(10..=100u64);
            let detail = json!({ target: stake });
            SelfRecord {
                round_time: now.saturating_sub(i * SELF_RECORD_SPACING_SECS),
                result: Slot::random(rng),
                reward: rng.gen_range(-100..=500),
                detail: detail.to_string(),
            }
        })
        .collect();
    Response::SelfRecord(SelfRecords {
        code: CODE_OK,
        records,
    })
}

pub fn today_win(state: &SessionState) -> Response {
    Response::TodayWin(TodayWin {
        code: CODE_OK,
        today_win: state.today_win(),
    })
}

/// Fabricated leaderboard.
pub fn rank<R: Rng + ?Sized>(rng: &mut R) -> Response {
    let ranks = (0..RANK_COUNT as u64)
        .map(|i| RankEntry {
            uid: RANK_UID_BASE + i,
            nickname: format!("{DEFAULT_NICKNAME}{}", i + 1),
            avatar: String::new(),
            win: rng.gen_range(1_000..=10_000),
        })
        .collect();
    Response::Rank(Ranks {
        code: CODE_OK,
        ranks,
    })
}

pub fn heartbeat() -> Response {
    Response::Heartbeat(Heartbeat {
        time: unix_timestamp(),
    })
}

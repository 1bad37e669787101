//! Wire protocol spoken over the game socket.
//!
//! Every frame, in both directions, is a JSON object of the form
//! `{"type": <tag>, "data": <object>}`. Outbound frames are modelled by
//! [Response] (serialized as an adjacently tagged enum), inbound frames are
//! decoded into [Request] by exact tag lookup.

use crate::wheel::{Phase, Slot};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Prefix shared by every protocol tag. Optional on inbound frames.
pub const TAG_PREFIX: &str = "pb.";

pub const GAME_INFO_S2C: &str = "pb.FruitwheelGameInfoS2C";
pub const GAME_BET_S2C: &str = "pb.FruitwheelGameBetS2C";
pub const SELF_RECORD_S2C: &str = "pb.FruitwheelGameSelfRecordS2C";
pub const TODAY_WIN_S2C: &str = "pb.GetTodayWinS2C";
pub const RANK_S2C: &str = "pb.FruitwheelRankS2C";
pub const STAGE_BRC: &str = "pb.FruitwheelGameStageBrc";
pub const COIN_UPDATE_BRC: &str = "pb.CoinUpdateBrc";
pub const HEARTBEAT_S2C: &str = "pb.HeartbeatS2C";

pub const GAME_INFO_C2S: &str = "pb.FruitwheelGameInfoC2S";
pub const GAME_BET_C2S: &str = "pb.FruitwheelGameBetC2S";
pub const SELF_RECORD_C2S: &str = "pb.FruitwheelGameSelfRecordC2S";
pub const TODAY_WIN_C2S: &str = "pb.GetTodayWinC2S";
pub const RANK_C2S: &str = "pb.FruitwheelRankC2S";
pub const HEARTBEAT_C2S: &str = "pb.HeartbeatC2S";
pub const PING_C2S: &str = "pb.PingC2S";

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unknown message type: {0}")]
    UnknownTag(String),
    #[error("invalid stage: {0}")]
    InvalidStage(u8),
}

/// An inbound frame before its tag has been interpreted.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RawEnvelope {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

/// Place a stake on a target for the current round.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BetRequest {
    /// Target id (`2 * slot` or `2 * slot + 1`).
    pub id: i64,
    /// Amount staked.
    pub bet: i64,
    pub round_id: String,
}

/// Requests a client can make, in routing priority order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request {
    GameInfo,
    GameBet(BetRequest),
    SelfRecord,
    TodayWin,
    Rank,
    Heartbeat,
}

impl Request {
    /// Decode a text frame.
    pub fn decode(text: &str) -> Result<Self, DecodeError> {
        let envelope: RawEnvelope = serde_json::from_str(text)?;
        Self::from_envelope(envelope)
    }

    pub fn from_envelope(envelope: RawEnvelope) -> Result<Self, DecodeError> {
        let RawEnvelope { kind, data } = envelope;
        let name = kind.strip_prefix(TAG_PREFIX).unwrap_or(&kind);
        let request = match name {
            "FruitwheelGameInfoC2S" => Request::GameInfo,
            "FruitwheelGameBetC2S" => {
                let data = if data.is_null() {
                    Value::Object(Default::default())
                } else {
                    data
                };
                Request::GameBet(serde_json::from_value(data)?)
            }
            "FruitwheelGameSelfRecordC2S" => Request::SelfRecord,
            "GetTodayWinC2S" => Request::TodayWin,
            "FruitwheelRankC2S" => Request::Rank,
            "HeartbeatC2S" | "PingC2S" => Request::Heartbeat,
            _ => return Err(DecodeError::UnknownTag(kind)),
        };
        Ok(request)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Request::GameInfo => "game_info",
            Request::GameBet(_) => "game_bet",
            Request::SelfRecord => "self_record",
            Request::TodayWin => "today_win",
            Request::Rank => "rank",
            Request::Heartbeat => "heartbeat",
        }
    }
}

/// Snapshot of the session and the current round.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameInfo {
    pub code: i32,
    pub stage: u8,
    pub round_id: String,
    pub countdown: u64,
    pub coin: u64,
    pub nickname: String,
    pub avatar: String,
    pub today_win: u64,
    pub history: Vec<Slot>,
    pub bets: BTreeMap<String, u64>,
    pub myself_bets: BTreeMap<String, u64>,
}

/// Outcome of a bet. `bet` echoes the accepted amount, 0 on rejection.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BetReply {
    pub code: i32,
    pub id: i64,
    pub bet: i64,
    pub coin: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfRecord {
    pub round_time: u64,
    pub result: Slot,
    /// Net result of the round; negative for losses.
    pub reward: i64,
    /// JSON text mapping target ids to stakes.
    pub detail: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfRecords {
    pub code: i32,
    pub records: Vec<SelfRecord>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayWin {
    pub code: i32,
    pub today_win: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankEntry {
    pub uid: u64,
    pub nickname: String,
    pub avatar: String,
    pub win: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ranks {
    pub code: i32,
    pub ranks: Vec<RankEntry>,
}

/// Broadcast on every phase transition. Which optional fields are present
/// depends on the phase being entered.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageBroadcast {
    pub stage: u8,
    pub round_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Slot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub countdown: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coin: Option<u64>,
}

impl StageBroadcast {
    pub fn bet(round_id: &str, countdown: u64) -> Self {
        Self {
            stage: Phase::Bet.stage(),
            round_id: round_id.to_string(),
            countdown: Some(countdown),
            ..Default::default()
        }
    }

    pub fn spin(round_id: &str, result: Slot, countdown: u64) -> Self {
        Self {
            stage: Phase::Spin.stage(),
            round_id: round_id.to_string(),
            result: Some(result),
            countdown: Some(countdown),
            ..Default::default()
        }
    }

    pub fn finish(round_id: &str, result: Slot, reward: u64, coin: u64) -> Self {
        Self {
            stage: Phase::Finish.stage(),
            round_id: round_id.to_string(),
            result: Some(result),
            reward: Some(reward),
            coin: Some(coin),
            ..Default::default()
        }
    }

    pub fn idle(round_id: &str) -> Self {
        Self {
            stage: Phase::None.stage(),
            round_id: round_id.to_string(),
            ..Default::default()
        }
    }

    pub fn phase(&self) -> Result<Phase, DecodeError> {
        Phase::try_from(self.stage)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinUpdate {
    pub coin: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heartbeat {
    /// Server time in unix seconds.
    pub time: u64,
}

/// Every frame the server sends.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Response {
    #[serde(rename = "pb.FruitwheelGameInfoS2C")]
    GameInfo(GameInfo),
    #[serde(rename = "pb.FruitwheelGameBetS2C")]
    GameBet(BetReply),
    #[serde(rename = "pb.FruitwheelGameSelfRecordS2C")]
    SelfRecord(SelfRecords),
    #[serde(rename = "pb.GetTodayWinS2C")]
    TodayWin(TodayWin),
    #[serde(rename = "pb.FruitwheelRankS2C")]
    Rank(Ranks),
    #[serde(rename = "pb.FruitwheelGameStageBrc")]
    Stage(StageBroadcast),
    #[serde(rename = "pb.CoinUpdateBrc")]
    CoinUpdate(CoinUpdate),
    #[serde(rename = "pb.HeartbeatS2C")]
    Heartbeat(Heartbeat),
}

impl Response {
    pub fn tag(&self) -> &'static str {
        match self {
            Response::GameInfo(_) => GAME_INFO_S2C,
            Response::GameBet(_) => GAME_BET_S2C,
            Response::SelfRecord(_) => SELF_RECORD_S2C,
            Response::TodayWin(_) => TODAY_WIN_S2C,
            Response::Rank(_) => RANK_S2C,
            Response::Stage(_) => STAGE_BRC,
            Response::CoinUpdate(_) => COIN_UPDATE_BRC,
            Response::Heartbeat(_) => HEARTBEAT_S2C,
        }
    }

    /// Encode as a single text frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

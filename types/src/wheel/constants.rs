/// Number of slots on the wheel.
pub const SLOT_COUNT: usize = 8;

/// Bettable targets per slot (a target `t` belongs to slot `t / 2`).
pub const TARGETS_PER_SLOT: u8 = 2;

/// Total number of bettable targets.
pub const TARGET_COUNT: usize = SLOT_COUNT * TARGETS_PER_SLOT as usize;

/// Maximum number of resolved results kept per session.
pub const HISTORY_CAPACITY: usize = 20;

/// Results generated when a session starts, to simulate prior rounds.
pub const HISTORY_SEED_LEN: usize = 10;

/// Results included in a game info reply.
pub const INFO_HISTORY_LEN: usize = 10;

/// Starting coins for a new session.
pub const STARTING_COIN: u64 = 10_000;

/// Nickname reported for every session unless configured otherwise.
pub const DEFAULT_NICKNAME: &str = "Player";

/// Phase durations, in seconds.
pub const BET_SECS: u64 = 15;
pub const SPIN_SECS: u64 = 5;
pub const FINISH_SECS: u64 = 3;
pub const IDLE_SECS: u64 = 2;

/// Pause before the round loop restarts after a failed step.
pub const RETRY_PAUSE_MS: u64 = 1_000;

/// Synthetic self records returned per query (one minute apart).
pub const SELF_RECORD_COUNT: usize = 5;
pub const SELF_RECORD_SPACING_SECS: u64 = 60;

/// Synthetic leaderboard rows returned per query.
pub const RANK_COUNT: usize = 10;
pub const RANK_UID_BASE: u64 = 1_000;

/// Reply codes
pub const CODE_OK: i32 = 0;
pub const CODE_COIN_NOT_ENOUGH: i32 = 1;
pub const CODE_STAGE_CLOSED: i32 = 2;
pub const CODE_INVALID_BET: i32 = 3;

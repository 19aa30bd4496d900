//! Lottery state - the single source of truth for the game screen

use thiserror::Error;

/// Coins a new player starts with
pub const STARTING_COINS: u64 = 100;

/// Why a round could not be played to completion
///
/// Carried as a value through `PlayDidResolve`, never raised as an error
/// across the store boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum LotteryError {
    #[error("You are banned from playing this game")]
    Banned,
    #[error("Please try again later")]
    Unavailable,
    #[error("The draw took too long, please try again later")]
    Timeout,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub banned: bool,
}

impl Player {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            banned: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    /// A draw is in flight
    Loading,
    Error(LotteryError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LotteryState {
    pub player: Player,
    pub coins: u64,
    pub phase: Phase,
}

impl LotteryState {
    pub fn new(player: Player, coins: u64) -> Self {
        Self {
            player,
            coins,
            phase: Phase::Idle,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }
}

impl Default for LotteryState {
    fn default() -> Self {
        Self::new(Player::new("player-1", "Player One"), STARTING_COINS)
    }
}

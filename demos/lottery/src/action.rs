//! Messages of the lottery store
//!
//! - Actions go through the reducer and may start a draw
//! - Changes are decided already and fold straight onto state
//! - Outputs are one-shot events for the flow

use crate::state::{LotteryError, Player};

#[derive(oneway::Action, Clone, Debug, PartialEq)]
pub enum LotteryAction {
    /// Intent: the player pressed play (starts a draw)
    Play,

    /// Result: the draw finished, `Ok(true)` is a win
    PlayDidResolve(Result<bool, LotteryError>),
}

#[derive(oneway::Change, Clone, Debug, PartialEq)]
pub enum LotteryChange {
    Ban,
    Unban,
    /// Add coins to the player's balance
    Grant(u64),
}

#[derive(oneway::Output, Clone, Debug, PartialEq)]
pub enum LotteryOutput {
    DidLose,
}

/// Work the reducer hands to the draw agent
#[derive(Clone, Debug, PartialEq)]
pub enum LotteryEffect {
    Draw { player: Player },
}

//! Reducer and fold for the lottery store
//!
//! Double or nothing: a win doubles the balance, a loss empties it and
//! announces `DidLose`. Banned players never reach the draw agent.

use oneway::{Reduction, StoreDefinition};

use crate::action::{LotteryAction, LotteryChange, LotteryEffect, LotteryOutput};
use crate::state::{LotteryError, LotteryState, Phase};

pub struct Lottery;

impl StoreDefinition for Lottery {
    type State = LotteryState;
    type Action = LotteryAction;
    type Change = LotteryChange;
    type Output = LotteryOutput;
    type Effect = LotteryEffect;

    fn reduce(
        &self,
        state: &mut LotteryState,
        action: LotteryAction,
    ) -> Reduction<LotteryOutput, LotteryEffect> {
        match action {
            LotteryAction::Play => {
                if state.player.banned {
                    state.phase = Phase::Error(LotteryError::Banned);
                    return Reduction::changed();
                }
                if state.is_loading() {
                    // One draw at a time
                    return Reduction::unchanged();
                }
                state.phase = Phase::Loading;
                Reduction::changed_with(LotteryEffect::Draw {
                    player: state.player.clone(),
                })
            }

            LotteryAction::PlayDidResolve(Ok(true)) => {
                state.coins = state.coins.saturating_mul(2);
                state.phase = Phase::Idle;
                Reduction::changed()
            }

            LotteryAction::PlayDidResolve(Ok(false)) => {
                state.coins = 0;
                state.phase = Phase::Idle;
                Reduction::changed_with_output(LotteryOutput::DidLose)
            }

            LotteryAction::PlayDidResolve(Err(error)) => {
                state.phase = Phase::Error(error);
                Reduction::changed()
            }
        }
    }

    fn fold(&self, state: &mut LotteryState, change: LotteryChange) {
        match change {
            LotteryChange::Ban => state.player.banned = true,
            LotteryChange::Unban => {
                state.player.banned = false;
                if state.phase == Phase::Error(LotteryError::Banned) {
                    state.phase = Phase::Idle;
                }
            }
            LotteryChange::Grant(coins) => state.coins = state.coins.saturating_add(coins),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reduce(state: &mut LotteryState, action: LotteryAction) -> Reduction<LotteryOutput, LotteryEffect> {
        Lottery.reduce(state, action)
    }

    #[test]
    fn test_play_starts_draw() {
        let mut state = LotteryState::default();

        let reduction = reduce(&mut state, LotteryAction::Play);

        assert!(reduction.changed);
        assert_eq!(state.phase, Phase::Loading);
        assert_eq!(
            reduction.effects,
            vec![LotteryEffect::Draw {
                player: state.player.clone()
            }]
        );
    }

    #[test]
    fn test_play_while_loading_is_ignored() {
        let mut state = LotteryState {
            phase: Phase::Loading,
            ..Default::default()
        };

        let reduction = reduce(&mut state, LotteryAction::Play);

        assert!(!reduction.changed);
        assert!(!reduction.has_effects());
    }

    #[test]
    fn test_banned_player_gets_error_without_draw() {
        let mut state = LotteryState::default();
        Lottery.fold(&mut state, LotteryChange::Ban);

        let reduction = reduce(&mut state, LotteryAction::Play);

        assert!(reduction.changed);
        assert!(!reduction.has_effects());
        assert_eq!(state.phase, Phase::Error(LotteryError::Banned));
    }

    #[test]
    fn test_win_doubles_coins() {
        let mut state = LotteryState {
            phase: Phase::Loading,
            ..Default::default()
        };

        let reduction = reduce(&mut state, LotteryAction::PlayDidResolve(Ok(true)));

        assert!(reduction.output.is_none());
        assert_eq!(state.coins, 200);
        assert_eq!(state.phase, Phase::Idle);
    }

    #[test]
    fn test_loss_empties_balance_and_announces() {
        let mut state = LotteryState {
            phase: Phase::Loading,
            ..Default::default()
        };

        let reduction = reduce(&mut state, LotteryAction::PlayDidResolve(Ok(false)));

        assert_eq!(reduction.output, Some(LotteryOutput::DidLose));
        assert_eq!(state.coins, 0);
        assert_eq!(state.phase, Phase::Idle);
    }

    #[test]
    fn test_failure_is_shown_in_phase() {
        let mut state = LotteryState {
            phase: Phase::Loading,
            ..Default::default()
        };

        reduce(
            &mut state,
            LotteryAction::PlayDidResolve(Err(LotteryError::Unavailable)),
        );

        assert_eq!(state.coins, 100);
        assert_eq!(state.phase, Phase::Error(LotteryError::Unavailable));
    }

    #[test]
    fn test_unban_clears_banned_error() {
        let mut state = LotteryState::default();
        Lottery.fold(&mut state, LotteryChange::Ban);
        reduce(&mut state, LotteryAction::Play);

        Lottery.fold(&mut state, LotteryChange::Unban);

        assert!(!state.player.banned);
        assert_eq!(state.phase, Phase::Idle);
    }

    #[test]
    fn test_grant_saturates() {
        let mut state = LotteryState::default();
        Lottery.fold(&mut state, LotteryChange::Grant(u64::MAX));
        assert_eq!(state.coins, u64::MAX);

        reduce(&mut state, LotteryAction::PlayDidResolve(Ok(true)));
        assert_eq!(state.coins, u64::MAX);
    }
}

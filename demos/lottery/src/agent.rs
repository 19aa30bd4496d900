//! Draw agent - the lottery service behind `LotteryEffect::Draw`
//!
//! The draw waits for `delay`, then flips a coin (`rand` by default). The
//! whole call is bounded
//! by `timeout`; running out of time resolves the round with
//! `LotteryError::Timeout` instead of leaving it loading forever.

use std::time::Duration;

use oneway::{ActionSender, Agent, AgentFuture};

use crate::action::{LotteryAction, LotteryEffect};
use crate::state::{LotteryError, Player};

pub const DEFAULT_DELAY: Duration = Duration::from_secs(2);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug)]
pub struct DrawAgent {
    delay: Duration,
    timeout: Duration,
    coin: fn() -> bool,
}

impl Default for DrawAgent {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY, DEFAULT_TIMEOUT)
    }
}

impl DrawAgent {
    pub fn new(delay: Duration, timeout: Duration) -> Self {
        Self {
            delay,
            timeout,
            coin: rand::random::<bool>,
        }
    }

    /// Replace the coin flip; `true` is a win
    pub fn with_coin(mut self, coin: fn() -> bool) -> Self {
        self.coin = coin;
        self
    }
}

impl Agent<LotteryEffect, LotteryAction> for DrawAgent {
    fn run(&self, effect: LotteryEffect, actions: ActionSender<LotteryAction>) -> AgentFuture {
        let LotteryEffect::Draw { player } = effect;
        let delay = self.delay;
        let timeout = self.timeout;
        let coin = self.coin;

        Box::pin(async move {
            let result = match tokio::time::timeout(timeout, draw(&player, delay, coin)).await {
                Ok(result) => result,
                Err(_) => Err(LotteryError::Timeout),
            };
            tracing::debug!(player = %player.id, ?result, "Draw finished");

            if actions.send(LotteryAction::PlayDidResolve(result)).is_err() {
                tracing::debug!(player = %player.id, "Lottery store gone, draw result dropped");
            }
        })
    }
}

async fn draw(player: &Player, delay: Duration, coin: fn() -> bool) -> Result<bool, LotteryError> {
    tracing::trace!(player = %player.id, ?delay, "Drawing");
    tokio::time::sleep(delay).await;
    Ok(coin())
}

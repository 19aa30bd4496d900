//! Crossterm event poller feeding the host loop

use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Terminal input the host loop reacts to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TermEvent {
    Key(KeyEvent),
    Resize(u16, u16),
}

/// Spawn a task that polls crossterm and forwards key presses and resizes.
///
/// Stops when `cancel_token` is cancelled or the receiver is dropped.
pub fn spawn_event_poller(
    tx: mpsc::UnboundedSender<TermEvent>,
    poll_timeout: Duration,
    loop_sleep: Duration,
    cancel_token: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        const MAX_EVENTS_PER_BATCH: usize = 20;

        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => {
                    tracing::debug!("Event poller cancelled");
                    break;
                }
                _ = tokio::time::sleep(loop_sleep) => {
                    let mut processed = 0;
                    while processed < MAX_EVENTS_PER_BATCH
                        && event::poll(poll_timeout).unwrap_or(false)
                    {
                        processed += 1;
                        let Ok(evt) = event::read() else {
                            continue;
                        };
                        let forwarded = match evt {
                            Event::Key(key) if key.kind == KeyEventKind::Press => {
                                Some(TermEvent::Key(key))
                            }
                            Event::Resize(w, h) => Some(TermEvent::Resize(w, h)),
                            _ => None,
                        };
                        if let Some(forwarded) = forwarded {
                            if tx.send(forwarded).is_err() {
                                tracing::debug!("Event channel closed, stopping poller");
                                return;
                            }
                        }
                    }
                }
            }
        }
    })
}

//! Message traits: the three kinds of value that flow through a store

use std::fmt::Debug;

/// A command describing intent ("user pressed play")
///
/// Actions are consumed exactly once by the store's reducer, which may
/// answer with a new state, an output, and effects for an agent.
///
/// Use `#[derive(Action)]` from `oneway-macros` to auto-implement this trait.
pub trait Action: Debug + Send + 'static {
    /// Get the action name for logging and filtering
    fn name(&self) -> &'static str;
}

/// A pre-decided state delta, folded synchronously onto the current state
///
/// Unlike actions, changes never trigger further async work.
pub trait Change: Debug + Send + 'static {
    /// Get the change name for logging and filtering
    fn name(&self) -> &'static str;
}

/// A one-shot event that is not part of state ("lost game", "navigate away")
///
/// Outputs are delivered only to observers registered when they are emitted
/// and are never replayed.
pub trait Output: Clone + Debug + Send + 'static {
    /// Get the output name for logging
    fn name(&self) -> &'static str;
}

/// Uninhabited placeholder for the message kinds a store does not use
///
/// A change-only store declares `type Action = Never` and its reducer body
/// is simply `match action {}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Never {}

impl Action for Never {
    fn name(&self) -> &'static str {
        match *self {}
    }
}

impl Change for Never {
    fn name(&self) -> &'static str {
        match *self {}
    }
}

impl Output for Never {
    fn name(&self) -> &'static str {
        match *self {}
    }
}

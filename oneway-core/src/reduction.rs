//! Reduction results
//!
//! A reducer answers every action with a [`Reduction`]: whether the state
//! changed, an optional one-shot output, and any effects to hand to the
//! store's agent. Effects are declarative descriptions of work to be done,
//! not the work itself.
//!
//! # Example
//!
//! ```ignore
//! fn reduce(&self, state: &mut State, action: Action) -> Reduction<Output, Effect> {
//!     match action {
//!         Action::Play if state.banned => {
//!             state.phase = Phase::Error;
//!             Reduction::changed()
//!         }
//!         Action::Play => {
//!             state.phase = Phase::Loading;
//!             Reduction::changed_with(Effect::Draw)
//!         }
//!         Action::DidLose => Reduction::changed_with_output(Output::DidLose),
//!     }
//! }
//! ```

/// Result of reducing one action.
///
/// `changed == false` means "no new state": observers are not notified.
/// `output` and a state change may be present at the same time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reduction<O, E> {
    /// Whether the state was modified by this action.
    pub changed: bool,
    /// One-shot output to deliver to output observers.
    pub output: Option<O>,
    /// Effects to hand to the store's agent after the mutation commits.
    pub effects: Vec<E>,
}

impl<O, E> Default for Reduction<O, E> {
    fn default() -> Self {
        Self::unchanged()
    }
}

impl<O, E> Reduction<O, E> {
    /// No state change, no output, no effects.
    #[inline]
    pub fn unchanged() -> Self {
        Self {
            changed: false,
            output: None,
            effects: vec![],
        }
    }

    /// State changed, nothing else.
    #[inline]
    pub fn changed() -> Self {
        Self {
            changed: true,
            output: None,
            effects: vec![],
        }
    }

    /// An output without a state change.
    #[inline]
    pub fn output(output: O) -> Self {
        Self {
            changed: false,
            output: Some(output),
            effects: vec![],
        }
    }

    /// State changed and an output is emitted.
    #[inline]
    pub fn changed_with_output(output: O) -> Self {
        Self {
            changed: true,
            output: Some(output),
            effects: vec![],
        }
    }

    /// A single effect but no state change.
    #[inline]
    pub fn effect(effect: E) -> Self {
        Self {
            changed: false,
            output: None,
            effects: vec![effect],
        }
    }

    /// State changed with a single effect.
    #[inline]
    pub fn changed_with(effect: E) -> Self {
        Self {
            changed: true,
            output: None,
            effects: vec![effect],
        }
    }

    /// Add an effect to this result.
    #[inline]
    pub fn with(mut self, effect: E) -> Self {
        self.effects.push(effect);
        self
    }

    /// Attach an output, replacing any previous one.
    #[inline]
    pub fn with_output(mut self, output: O) -> Self {
        self.output = Some(output);
        self
    }

    /// Set the changed flag to true.
    #[inline]
    pub fn mark_changed(mut self) -> Self {
        self.changed = true;
        self
    }

    /// Returns true if there are any effects to process.
    #[inline]
    pub fn has_effects(&self) -> bool {
        !self.effects.is_empty()
    }
}

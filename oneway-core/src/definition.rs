//! Store definitions: the single reduction authority of a store

use crate::action::{Action, Change, Output};
use crate::reduction::Reduction;

/// Describes a store's types and how its state transitions.
///
/// One definition drives all update shapes a store supports:
///
/// - **Action/reduce**: [`reduce`](StoreDefinition::reduce) may change the
///   state, emit an output and request agent effects.
/// - **Change/fold**: [`fold`](StoreDefinition::fold) always produces the next
///   state; a no-op change must leave the state equal.
///
/// Kinds a store does not use are set to [`Never`](crate::Never), so the
/// corresponding method is an empty `match`. Both methods must be total over
/// their input: a panic is treated as a programming error.
///
/// # Example
///
/// ```ignore
/// struct Counter;
///
/// impl StoreDefinition for Counter {
///     type State = i64;
///     type Action = Never;
///     type Change = CounterChange;
///     type Output = Never;
///     type Effect = Never;
///
///     fn reduce(&self, _: &mut i64, action: Never) -> Reduction<Never, Never> {
///         match action {}
///     }
///
///     fn fold(&self, state: &mut i64, change: CounterChange) {
///         match change {
///             CounterChange::Add(n) => *state += n,
///             CounterChange::Reset => *state = 0,
///         }
///     }
/// }
/// ```
pub trait StoreDefinition: Send + Sync + 'static {
    /// Durable, observable state. Observers receive shared snapshots.
    type State: Clone + Send + Sync + 'static;
    /// Commands reduced on the store's action worker.
    type Action: Action;
    /// Deltas folded synchronously on the caller's thread.
    type Change: Change;
    /// One-shot events delivered to output observers.
    type Output: Output;
    /// Work requests handed to the store's agent.
    type Effect: Send + 'static;

    /// Reduce an action against the current state.
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
    ) -> Reduction<Self::Output, Self::Effect>;

    /// Fold a change onto the current state.
    fn fold(&self, state: &mut Self::State, change: Self::Change);
}

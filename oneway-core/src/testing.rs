//! Test utilities for oneway stores and flows
//!
//! - [`StoreHarness`]: a store on a manual delivery queue that records every
//!   delivered state and output
//! - [`RecordingAgent`]: an agent whose invocations the test resolves by hand
//! - [`RecordingContext`]: a presentation context that records what was shown
//! - Assertion macros over recorded outputs
//!
//! # Example
//!
//! ```ignore
//! use oneway::testing::StoreHarness;
//!
//! let mut harness = StoreHarness::new(Counter, 0);
//!
//! harness.dispatch_change(CounterChange::Add(2));
//! harness.dispatch_action(CounterAction::Announce);
//! harness.settle().await.unwrap();
//!
//! assert_eq!(harness.drain_states(), vec![0, 2]);
//! assert_output!(harness.drain_outputs(), CounterOutput::Announced(2));
//! ```

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::agent::{ActionSender, Agent, AgentFuture};
use crate::definition::StoreDefinition;
use crate::delivery::{DeliveryContext, DeliveryQueue};
use crate::error::StoreError;
use crate::flow::PresentationContext;
use crate::store::{Store, StoreBuilder};

/// Test harness around a [`Store`] whose notifications fire only when the
/// test asks for them.
///
/// The harness registers one state observer and one output observer at
/// construction, so the first recorded state is always the initial state.
pub struct StoreHarness<D: StoreDefinition> {
    store: Store<D>,
    queue: DeliveryQueue,
    states: Arc<Mutex<Vec<D::State>>>,
    outputs: Arc<Mutex<Vec<D::Output>>>,
}

impl<D: StoreDefinition> StoreHarness<D> {
    /// Create a harness with default store configuration.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(definition: D, initial: D::State) -> Self {
        Self::with_builder(definition, initial, |builder| builder)
    }

    /// Create a harness, letting `configure` add an agent, middleware or
    /// config to the store. The delivery context is always the harness's own.
    pub fn with_builder(
        definition: D,
        initial: D::State,
        configure: impl FnOnce(StoreBuilder<D>) -> StoreBuilder<D>,
    ) -> Self {
        let (delivery, queue) = DeliveryContext::manual();
        let store = configure(Store::builder(definition, initial))
            .deliver_on(delivery)
            .build();

        let states = Arc::new(Mutex::new(Vec::new()));
        let outputs = Arc::new(Mutex::new(Vec::new()));
        {
            let states = Arc::clone(&states);
            store.observe_state(move |state: &D::State| states.lock().push(state.clone()));
        }
        {
            let outputs = Arc::clone(&outputs);
            store.observe_output(move |output: &D::Output| outputs.lock().push(output.clone()));
        }

        Self {
            store,
            queue,
            states,
            outputs,
        }
    }

    /// The store under test
    pub fn store(&self) -> &Store<D> {
        &self.store
    }

    pub fn dispatch_action(&self, action: D::Action) {
        self.store.dispatch_action(action);
    }

    pub fn dispatch_change(&self, change: D::Change) {
        self.store.dispatch_change(change);
    }

    pub fn dispatch_batch_changes(&self, changes: impl IntoIterator<Item = D::Change>) {
        self.store.dispatch_batch_changes(changes);
    }

    /// The store's current state
    pub fn state(&self) -> D::State {
        self.store.state()
    }

    /// Settle the store and deliver every pending notification.
    ///
    /// Repeats until delivering notifications produces no further work, so
    /// actions dispatched by observers are settled too.
    pub async fn settle(&mut self) -> Result<(), StoreError> {
        loop {
            self.store.settle().await?;
            if self.queue.drain() == 0 {
                return Ok(());
            }
        }
    }

    /// Deliver the notifications queued so far, returning how many ran
    pub fn deliver(&mut self) -> usize {
        self.queue.drain()
    }

    /// Take the states delivered since the last call
    pub fn drain_states(&self) -> Vec<D::State> {
        std::mem::take(&mut *self.states.lock())
    }

    /// Take the outputs delivered since the last call
    pub fn drain_outputs(&self) -> Vec<D::Output> {
        std::mem::take(&mut *self.outputs.lock())
    }
}

impl<D: StoreDefinition> fmt::Debug for StoreHarness<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreHarness")
            .field("store", &self.store)
            .field("queue", &self.queue)
            .finish()
    }
}

/// Agent that records its invocations instead of doing any work.
///
/// Each invocation completes immediately, so [`Store::settle`] does not wait
/// for it. The test takes the pending invocations and answers them through
/// their senders, in any order and at any time.
///
/// ```ignore
/// let agent = RecordingAgent::new();
/// let mut harness = StoreHarness::with_builder(Lottery, state, |b| b.agent(agent.clone()));
///
/// harness.dispatch_action(LotteryAction::Play);
/// harness.settle().await?;
///
/// let (draw, actions) = agent.take_pending().remove(0);
/// actions.send(LotteryAction::PlayDidResolve(Ok(true)))?;
/// ```
pub struct RecordingAgent<I, A> {
    pending: Arc<Mutex<Vec<(I, ActionSender<A>)>>>,
    calls: Arc<AtomicUsize>,
}

impl<I, A> RecordingAgent<I, A> {
    pub fn new() -> Self {
        Self {
            pending: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Take every invocation not yet taken, oldest first
    pub fn take_pending(&self) -> Vec<(I, ActionSender<A>)> {
        std::mem::take(&mut *self.pending.lock())
    }

    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Total number of invocations, taken or not
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<I, A> Default for RecordingAgent<I, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I, A> Clone for RecordingAgent<I, A> {
    fn clone(&self) -> Self {
        Self {
            pending: Arc::clone(&self.pending),
            calls: Arc::clone(&self.calls),
        }
    }
}

impl<I, A> fmt::Debug for RecordingAgent<I, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingAgent")
            .field("pending", &self.pending_len())
            .field("calls", &self.calls())
            .finish()
    }
}

impl<I, A> Agent<I, A> for RecordingAgent<I, A>
where
    I: Send + 'static,
    A: Send + 'static,
{
    fn run(&self, input: I, actions: ActionSender<A>) -> AgentFuture {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pending.lock().push((input, actions));
        Box::pin(async {})
    }
}

/// What a [`RecordingContext`] was asked to show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presentation<T> {
    Presented(T),
    Pushed(T),
}

/// A [`PresentationContext`] that records presentations in order
pub struct RecordingContext<T> {
    log: Arc<Mutex<Vec<Presentation<T>>>>,
}

impl<T> RecordingContext<T> {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Take everything recorded so far
    pub fn take(&self) -> Vec<Presentation<T>> {
        std::mem::take(&mut *self.log.lock())
    }

    pub fn len(&self) -> usize {
        self.log.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.lock().is_empty()
    }
}

impl<T> Default for RecordingContext<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for RecordingContext<T> {
    fn clone(&self) -> Self {
        Self {
            log: Arc::clone(&self.log),
        }
    }
}

impl<T> fmt::Debug for RecordingContext<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingContext")
            .field("recorded", &self.len())
            .finish()
    }
}

impl<T: Send + 'static> PresentationContext for RecordingContext<T> {
    type Content = T;
    type Navigation = ();

    fn present(&self, content: T) {
        self.log.lock().push(Presentation::Presented(content));
    }

    fn push_or_present(&self, content: T) {
        self.log.lock().push(Presentation::Pushed(content));
    }
}

/// Assert that an output matching a pattern was recorded.
///
/// # Example
///
/// ```ignore
/// let outputs = harness.drain_outputs();
/// assert_output!(outputs, LotteryOutput::DidLose);
/// ```
#[macro_export]
macro_rules! assert_output {
    ($outputs:expr, $pattern:pat $(if $guard:expr)?) => {{
        let outputs = &$outputs;
        assert!(
            outputs.iter().any(|o| matches!(o, $pattern $(if $guard)?)),
            "Expected output matching `{}`, but got: {:?}",
            stringify!($pattern),
            outputs
        );
    }};
}

/// Assert that no output matching a pattern was recorded.
#[macro_export]
macro_rules! assert_no_output {
    ($outputs:expr, $pattern:pat $(if $guard:expr)?) => {{
        let outputs = &$outputs;
        assert!(
            !outputs.iter().any(|o| matches!(o, $pattern $(if $guard)?)),
            "Expected no output matching `{}`, but it was recorded: {:?}",
            stringify!($pattern),
            outputs
        );
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Action, Change, Output};
    use crate::reduction::Reduction;

    #[derive(Debug)]
    enum PingAction {
        Ping,
        DidPong(u32),
    }

    impl Action for PingAction {
        fn name(&self) -> &'static str {
            match self {
                PingAction::Ping => "Ping",
                PingAction::DidPong(_) => "DidPong",
            }
        }
    }

    #[derive(Debug)]
    enum PingChange {
        Reset,
    }

    impl Change for PingChange {
        fn name(&self) -> &'static str {
            "Reset"
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum PingOutput {
        Ponged(u32),
    }

    impl Output for PingOutput {
        fn name(&self) -> &'static str {
            "Ponged"
        }
    }

    struct Pinger;

    impl StoreDefinition for Pinger {
        type State = u32;
        type Action = PingAction;
        type Change = PingChange;
        type Output = PingOutput;
        type Effect = u32;

        fn reduce(&self, state: &mut u32, action: PingAction) -> Reduction<PingOutput, u32> {
            match action {
                PingAction::Ping => Reduction::effect(*state + 1),
                PingAction::DidPong(n) => {
                    *state = n;
                    Reduction::changed_with_output(PingOutput::Ponged(n))
                }
            }
        }

        fn fold(&self, state: &mut u32, change: PingChange) {
            match change {
                PingChange::Reset => *state = 0,
            }
        }
    }

    #[tokio::test]
    async fn test_harness_records_states_and_outputs() {
        let agent = RecordingAgent::new();
        let mut harness = {
            let agent = agent.clone();
            StoreHarness::with_builder(Pinger, 0, move |builder| builder.agent(agent))
        };

        harness.dispatch_action(PingAction::Ping);
        harness.settle().await.unwrap();
        assert_eq!(agent.calls(), 1);
        assert!(harness.drain_outputs().is_empty());

        for (n, actions) in agent.take_pending() {
            actions.send(PingAction::DidPong(n)).unwrap();
        }
        harness.settle().await.unwrap();

        assert_eq!(harness.state(), 1);
        assert_eq!(harness.drain_states(), vec![0, 1]);
        let outputs = harness.drain_outputs();
        assert_output!(outputs, PingOutput::Ponged(1));
        assert_no_output!(outputs, PingOutput::Ponged(n) if *n > 1);
    }

    #[tokio::test]
    async fn test_harness_delivers_only_on_request() {
        let mut harness = StoreHarness::new(Pinger, 5);
        harness.dispatch_change(PingChange::Reset);

        assert!(harness.drain_states().is_empty());
        assert_eq!(harness.deliver(), 3);
        assert_eq!(harness.drain_states(), vec![5, 0]);
    }

    #[test]
    fn test_recording_context_records_in_order() {
        let context = RecordingContext::new();
        context.present("alert");
        context.push_or_present("detail");

        assert_eq!(context.len(), 2);
        assert_eq!(
            context.take(),
            vec![Presentation::Presented("alert"), Presentation::Pushed("detail")]
        );
        assert!(context.is_empty());
    }
}

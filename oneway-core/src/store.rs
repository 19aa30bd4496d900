//! Centralized state store with serialized mutation and ordered notification
//!
//! A [`Store`] owns one state value. The state changes only through its
//! [`StoreDefinition`]: actions are reduced one at a time on the store's
//! action worker, changes are folded synchronously on the caller's thread.
//! Both paths take the same mutation lock, so at most one mutation is ever
//! in flight and reads always see the last fully-applied state.
//!
//! Notifications are posted to the store's [`DeliveryContext`] while the
//! mutation lock is held, which makes delivery order equal mutation order.
//!
//! # Example
//!
//! ```ignore
//! let store = Store::builder(Counter, 0)
//!     .config(StoreConfig::labeled("counter"))
//!     .build();
//!
//! store.observe_state(|count| println!("count is {count}"));
//!
//! store.dispatch_change(CounterChange::Add(2));
//! assert_eq!(store.state(), 2);
//!
//! store.dispatch_batch_changes([CounterChange::Add(1), CounterChange::Add(1)]);
//! assert_eq!(store.state(), 4); // observers see one notification for the batch
//! ```

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::action::{Action, Change, Output};
use crate::agent::{ActionSender, Agent, AgentRunner, Envelope};
use crate::config::{Qos, StoreConfig};
use crate::definition::StoreDefinition;
use crate::delivery::{DeliveryContext, Fanout};
use crate::error::StoreError;
use crate::middleware::{ComposedMiddleware, LoggingMiddleware, Middleware, MutationKind, MutationRecord};
use crate::reduction::Reduction;

/// Handle to a store.
///
/// Cloning is cheap and shares the store. When the last handle is dropped
/// the store is torn down: its action worker stops, undelivered
/// notifications are discarded and agent results are dropped.
pub struct Store<D: StoreDefinition> {
    inner: Arc<StoreHandle<D>>,
}

impl<D: StoreDefinition> Clone for Store<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: StoreDefinition> fmt::Debug for Store<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("label", &self.core().label)
            .field("sequence", &self.core().cell.lock().sequence)
            .field("agents_in_flight", &self.core().agents.in_flight())
            .finish()
    }
}

/// Non-owning handle to a store, from [`Store::downgrade`].
///
/// Holding one never delays teardown.
pub struct WeakStore<D: StoreDefinition> {
    inner: Weak<StoreHandle<D>>,
}

impl<D: StoreDefinition> Clone for WeakStore<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<D: StoreDefinition> fmt::Debug for WeakStore<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakStore")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl<D: StoreDefinition> WeakStore<D> {
    /// The store, unless it has been torn down
    pub fn upgrade(&self) -> Option<Store<D>> {
        self.inner.upgrade().map(|inner| Store { inner })
    }
}

struct StoreHandle<D: StoreDefinition> {
    core: Arc<Core<D>>,
}

impl<D: StoreDefinition> Drop for StoreHandle<D> {
    fn drop(&mut self) {
        self.core.token.cancel();
        tracing::debug!(store = %self.core.label, "Store torn down");
    }
}

struct Cell<S> {
    state: Arc<S>,
    sequence: u64,
    middleware: ComposedMiddleware,
}

struct Core<D: StoreDefinition> {
    label: String,
    definition: D,
    cell: Arc<Mutex<Cell<D::State>>>,
    states: Fanout<D::State>,
    outputs: Fanout<D::Output>,
    agent: Option<Box<dyn Agent<D::Effect, D::Action>>>,
    agents: Arc<AgentRunner>,
    action_tx: mpsc::UnboundedSender<Envelope<D::Action>>,
    token: CancellationToken,
}

/// Builder returned by [`Store::builder`]
pub struct StoreBuilder<D: StoreDefinition> {
    definition: D,
    initial: D::State,
    config: StoreConfig,
    delivery: Option<DeliveryContext>,
    agent: Option<Box<dyn Agent<D::Effect, D::Action>>>,
    middleware: ComposedMiddleware,
}

impl<D: StoreDefinition> StoreBuilder<D> {
    /// Apply a configuration (label, scheduling hint, logging)
    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Deliver notifications on the given context instead of a dedicated one
    pub fn deliver_on(mut self, delivery: DeliveryContext) -> Self {
        self.delivery = Some(delivery);
        self
    }

    /// Hand reducer effects to this agent
    pub fn agent(mut self, agent: impl Agent<D::Effect, D::Action>) -> Self {
        self.agent = Some(Box::new(agent));
        self
    }

    /// Add a middleware; middlewares run in the order they were added
    pub fn middleware<M: Middleware>(mut self, middleware: M) -> Self {
        self.middleware.add(middleware);
        self
    }

    /// Create the store and start its action worker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> Store<D> {
        let StoreConfig {
            label,
            qos,
            logging,
        } = self.config;

        let mut middleware = ComposedMiddleware::new();
        if let Some(filter) = logging {
            middleware.add(LoggingMiddleware::new(filter).labeled(label.clone()));
        }
        if !self.middleware.is_empty() {
            middleware.add(self.middleware);
        }

        let token = CancellationToken::new();
        let delivery = self.delivery.unwrap_or_else(DeliveryContext::spawn);
        let (action_tx, action_rx) = mpsc::unbounded_channel();

        let core = Arc::new(Core {
            label,
            definition: self.definition,
            cell: Arc::new(Mutex::new(Cell {
                state: Arc::new(self.initial),
                sequence: 0,
                middleware,
            })),
            states: Fanout::new(delivery.clone(), token.clone()),
            outputs: Fanout::new(delivery, token.clone()),
            agent: self.agent,
            agents: Arc::new(AgentRunner::default()),
            action_tx,
            token,
        });

        tracing::debug!(store = %core.label, ?qos, "Store created");
        tokio::spawn(run_worker(Arc::clone(&core), action_rx, qos));

        Store {
            inner: Arc::new(StoreHandle { core }),
        }
    }
}

impl<D: StoreDefinition> Store<D> {
    /// Start building a store with the given definition and initial state
    pub fn builder(definition: D, initial: D::State) -> StoreBuilder<D> {
        StoreBuilder {
            definition,
            initial,
            config: StoreConfig::default(),
            delivery: None,
            agent: None,
            middleware: ComposedMiddleware::new(),
        }
    }

    /// Create a store with default configuration
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(definition: D, initial: D::State) -> Self {
        Self::builder(definition, initial).build()
    }

    fn core(&self) -> &Core<D> {
        &self.inner.core
    }

    /// The store's label
    pub fn label(&self) -> &str {
        &self.core().label
    }

    /// A copy of the latest fully-applied state
    pub fn state(&self) -> D::State {
        D::State::clone(&self.snapshot())
    }

    /// The latest fully-applied state, shared rather than copied
    pub fn snapshot(&self) -> Arc<D::State> {
        Arc::clone(&self.core().cell.lock().state)
    }

    /// Queue an action for the action worker.
    ///
    /// Returns immediately; actions are reduced in dispatch order.
    pub fn dispatch_action(&self, action: D::Action) {
        if self.core().action_tx.send(Envelope::Action(action)).is_err() {
            tracing::warn!(store = %self.core().label, "Action worker stopped, action dropped");
        }
    }

    /// Fold a change onto the state before returning.
    ///
    /// A read on this thread right after the call observes the change.
    pub fn dispatch_change(&self, change: D::Change) {
        let name = change.name();
        self.core().fold_all(MutationKind::Change, name, vec![change]);
    }

    /// Fold several changes as one mutation before returning.
    ///
    /// No other mutation interleaves with the batch and state observers get
    /// a single notification carrying the final state. An empty batch does
    /// nothing.
    pub fn dispatch_batch_changes(&self, changes: impl IntoIterator<Item = D::Change>) {
        let changes: Vec<D::Change> = changes.into_iter().collect();
        if changes.is_empty() {
            return;
        }
        let kind = MutationKind::Batch { len: changes.len() };
        self.core().fold_all(kind, "Batch", changes);
    }

    /// Observe state changes on the delivery context.
    ///
    /// The observer first receives the state current at registration, then
    /// every later state in mutation order. There is no way to unregister:
    /// observers live as long as the store.
    pub fn observe_state(&self, observer: impl FnMut(&D::State) + Send + 'static) {
        let core = self.core();
        // Snapshot and registration must not be split by a mutation
        let cell = core.cell.lock();
        core.states
            .subscribe(Box::new(observer), Some(Arc::clone(&cell.state)));
    }

    /// Observe outputs emitted after this call, on the delivery context.
    pub fn observe_output(&self, observer: impl FnMut(&D::Output) + Send + 'static) {
        self.core()
            .outputs
            .subscribe(Box::new(observer), None::<D::Output>);
    }

    /// A handle that does not keep the store alive
    pub fn downgrade(&self) -> WeakStore<D> {
        WeakStore {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Reads the latest state without keeping the store alive.
    pub(crate) fn state_reader(&self) -> impl Fn() -> Arc<D::State> + Send + Sync + 'static {
        let cell = Arc::clone(&self.core().cell);
        move || Arc::clone(&cell.lock().state)
    }

    /// A dispatcher that does not keep the store alive
    pub fn sender(&self) -> ActionSender<D::Action> {
        self.core().sender()
    }

    /// Forward every item of `stream` into the action queue.
    ///
    /// Forwarding stops when the stream ends or the store is torn down.
    pub fn merge_actions<S>(&self, stream: S)
    where
        S: Stream<Item = D::Action> + Send + 'static,
    {
        let sender = self.sender();
        let token = self.core().token.clone();
        let label = self.core().label.clone();
        tokio::spawn(async move {
            tokio::pin!(stream);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    item = stream.next() => match item {
                        Some(action) => {
                            if sender.send(action).is_err() {
                                break;
                            }
                        }
                        None => break,
                    },
                }
            }
            tracing::trace!(store = %label, "Merged action stream finished");
        });
    }

    /// Wait until every action queued before this call has been reduced.
    pub async fn flush(&self) -> Result<(), StoreError> {
        let (tx, rx) = oneshot::channel();
        self.core()
            .action_tx
            .send(Envelope::Flush(tx))
            .map_err(|_| StoreError::Closed)?;
        rx.await.map_err(|_| StoreError::Closed)
    }

    /// Wait until the action queue is empty and no agent is running.
    ///
    /// Actions sent by agents that finish before this returns are reduced
    /// before it returns.
    pub async fn settle(&self) -> Result<(), StoreError> {
        let agents = &self.core().agents;
        loop {
            let idle_before = agents.is_idle();
            self.flush().await?;
            if idle_before && agents.is_idle() {
                return Ok(());
            }
            agents.wait_idle().await;
        }
    }
}

impl<D: StoreDefinition> Core<D> {
    fn sender(&self) -> ActionSender<D::Action> {
        ActionSender::new(self.action_tx.clone(), self.token.clone())
    }

    /// Replace the state and notify, while the caller holds the lock.
    fn commit(&self, cell: &mut Cell<D::State>, next: D::State) {
        cell.state = Arc::new(next);
        self.states.publish(Arc::clone(&cell.state));
    }

    /// Fold `changes` as one mutation.
    ///
    /// A panicking fold leaves the state untouched. Middlewares still get a
    /// closing `after` (unchanged) before the panic resumes in the caller.
    fn fold_all(&self, kind: MutationKind, name: &'static str, changes: Vec<D::Change>) {
        let mut cell = self.cell.lock();
        cell.middleware.before(kind, name);

        let mut next = D::State::clone(&cell.state);
        let folded = panic::catch_unwind(AssertUnwindSafe(|| {
            for change in changes {
                self.definition.fold(&mut next, change);
            }
        }));
        if folded.is_ok() {
            self.commit(&mut cell, next);
        }

        let record = MutationRecord {
            sequence: cell.sequence,
            kind,
            name,
            changed: folded.is_ok(),
            output: None,
            effects: 0,
        };
        cell.sequence += 1;
        cell.middleware.after(&record);

        if let Err(payload) = folded {
            drop(cell);
            tracing::error!(store = %self.label, change = name, "Fold panicked, state left unchanged");
            panic::resume_unwind(payload);
        }
    }

    fn apply_action(&self, action: D::Action) {
        let name = action.name();
        let effects = {
            let mut cell = self.cell.lock();
            cell.middleware.before(MutationKind::Action, name);

            let mut next = D::State::clone(&cell.state);
            let reduced = panic::catch_unwind(AssertUnwindSafe(|| {
                self.definition.reduce(&mut next, action)
            }));
            let Reduction {
                changed,
                output,
                effects,
            } = match reduced {
                Ok(reduction) => reduction,
                Err(_) => {
                    tracing::error!(
                        store = %self.label,
                        action = name,
                        "Reducer panicked; this is a programming error, aborting"
                    );
                    std::process::abort();
                }
            };

            if changed {
                self.commit(&mut cell, next);
            }
            let output = output.map(|output| {
                let output_name = output.name();
                self.outputs.publish(output);
                output_name
            });

            let record = MutationRecord {
                sequence: cell.sequence,
                kind: MutationKind::Action,
                name,
                changed,
                output,
                effects: effects.len(),
            };
            cell.sequence += 1;
            cell.middleware.after(&record);
            effects
        };

        self.run_effects(effects);
    }

    fn run_effects(&self, effects: Vec<D::Effect>) {
        if effects.is_empty() {
            return;
        }
        let Some(agent) = self.agent.as_ref() else {
            tracing::warn!(
                store = %self.label,
                count = effects.len(),
                "Effects discarded: no agent configured"
            );
            return;
        };
        for effect in effects {
            self.agents.spawn(agent.run(effect, self.sender()));
        }
    }
}

async fn run_worker<D: StoreDefinition>(
    core: Arc<Core<D>>,
    mut action_rx: mpsc::UnboundedReceiver<Envelope<D::Action>>,
    qos: Qos,
) {
    loop {
        let envelope = tokio::select! {
            biased;
            _ = core.token.cancelled() => break,
            envelope = action_rx.recv() => match envelope {
                Some(envelope) => envelope,
                None => break,
            },
        };

        match envelope {
            Envelope::Action(action) => core.apply_action(action),
            Envelope::Flush(done) => {
                let _ = done.send(());
            }
        }

        if qos.yields() {
            tokio::task::yield_now().await;
        }
    }
    tracing::debug!(store = %core.label, "Action worker stopped");
}

//! Agents: external async capabilities that feed actions back into a store
//!
//! A reducer requests work by returning effects. The store hands each effect
//! to its agent, which runs as its own tokio task and reports results by
//! sending further actions through an [`ActionSender`]. Those actions
//! re-enter the store's queue like any other dispatch, so serialization is
//! preserved no matter which thread the agent finishes on.
//!
//! Agents report failures and timeouts as action payloads, never as errors.
//!
//! # Example
//!
//! ```ignore
//! let agent = |effect: Effect, actions: ActionSender<Action>| async move {
//!     let Effect::Fetch { id } = effect;
//!     let result = tokio::time::timeout(Duration::from_secs(5), api::fetch(id)).await;
//!     let _ = actions.send(match result {
//!         Ok(Ok(payload)) => Action::DidLoad(payload),
//!         Ok(Err(e)) => Action::DidFail(e.to_string()),
//!         Err(_) => Action::DidFail("timed out".into()),
//!     });
//! };
//!
//! let store = Store::builder(Definition, State::default()).agent(agent).build();
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, Notify};
use tokio_util::sync::CancellationToken;

use crate::error::StoreError;

/// Boxed future returned by [`Agent::run`]
pub type AgentFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// An async capability invoked with an effect, producing zero or more actions.
///
/// Implemented for every `Fn(I, ActionSender<A>) -> impl Future<Output = ()>`.
pub trait Agent<I, A>: Send + Sync + 'static {
    /// Start one invocation. The returned future is spawned by the store.
    fn run(&self, input: I, actions: ActionSender<A>) -> AgentFuture;
}

impl<I, A, F, Fut> Agent<I, A> for F
where
    F: Fn(I, ActionSender<A>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn run(&self, input: I, actions: ActionSender<A>) -> AgentFuture {
        Box::pin(self(input, actions))
    }
}

/// Item on a store's action queue
pub(crate) enum Envelope<A> {
    Action(A),
    Flush(oneshot::Sender<()>),
}

/// Cloneable handle for dispatching actions into a store from anywhere.
///
/// Holding a sender does not keep the store alive. Once the store is torn
/// down, [`send`](ActionSender::send) fails and the action is dropped.
pub struct ActionSender<A> {
    tx: mpsc::UnboundedSender<Envelope<A>>,
    token: CancellationToken,
}

impl<A> Clone for ActionSender<A> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            token: self.token.clone(),
        }
    }
}

impl<A> fmt::Debug for ActionSender<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionSender")
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl<A> ActionSender<A> {
    pub(crate) fn new(tx: mpsc::UnboundedSender<Envelope<A>>, token: CancellationToken) -> Self {
        Self { tx, token }
    }

    /// Queue an action on the store's action worker.
    pub fn send(&self, action: A) -> Result<(), StoreError> {
        if self.token.is_cancelled() {
            return Err(StoreError::Closed);
        }
        self.tx
            .send(Envelope::Action(action))
            .map_err(|_| StoreError::Closed)
    }

    /// Whether the store has been torn down
    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled() || self.tx.is_closed()
    }
}

/// Spawns agent invocations and tracks how many are still running.
#[derive(Debug, Default)]
pub(crate) struct AgentRunner {
    in_flight: AtomicUsize,
    idle: Notify,
}

struct InFlight(Arc<AgentRunner>);

impl Drop for InFlight {
    fn drop(&mut self) {
        if self.0.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

impl AgentRunner {
    pub(crate) fn spawn(self: &Arc<Self>, future: AgentFuture) {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        // Decrements even if the agent panics
        let guard = InFlight(Arc::clone(self));
        tokio::spawn(async move {
            let _guard = guard;
            future.await;
        });
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.in_flight() == 0
    }

    pub(crate) async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.is_idle() {
                return;
            }
            notified.await;
        }
    }
}

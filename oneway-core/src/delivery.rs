//! Delivery context: the single serialized context observers run on
//!
//! Every observer callback of a store runs as a job on one
//! [`DeliveryContext`], no matter which thread applied the mutation. Jobs
//! run one at a time in the order they were posted, so observers never need
//! their own synchronization. Several stores may share one context, the way
//! UI code shares one main queue.
//!
//! The queue is either driven by a dedicated task ([`DeliveryContext::spawn`])
//! or handed to the host loop ([`DeliveryContext::manual`]), which lets a UI
//! render loop or a test decide exactly when notifications fire.
//!
//! # Example
//!
//! ```ignore
//! let (delivery, mut queue) = DeliveryContext::manual();
//! let store = Store::builder(Lottery, LotteryState::default())
//!     .deliver_on(delivery)
//!     .build();
//!
//! loop {
//!     tokio::select! {
//!         Some(event) = events.recv() => { /* map to actions */ }
//!         true = queue.next() => { needs_render = true; }
//!     }
//! }
//! ```

use std::borrow::Borrow;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Handle to a serialized delivery queue.
///
/// Cloning the handle shares the queue. The queue stays open while any
/// handle is alive.
#[derive(Clone)]
pub struct DeliveryContext {
    tx: mpsc::UnboundedSender<Job>,
}

impl fmt::Debug for DeliveryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeliveryContext")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

impl DeliveryContext {
    /// Create a context whose queue runs on its own tokio task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn() -> Self {
        let (context, queue) = Self::manual();
        tokio::spawn(queue.run());
        context
    }

    /// Create a context together with the queue that executes its jobs.
    ///
    /// Nothing is delivered until the queue is driven.
    pub fn manual() -> (Self, DeliveryQueue) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, DeliveryQueue { rx, delivered: 0 })
    }

    /// Whether the queue has been dropped
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub(crate) fn post(&self, job: impl FnOnce() + Send + 'static) {
        if self.tx.send(Box::new(job)).is_err() {
            tracing::trace!("Delivery queue closed, dropping notification");
        }
    }
}

/// The executing side of a [`DeliveryContext`].
pub struct DeliveryQueue {
    rx: mpsc::UnboundedReceiver<Job>,
    delivered: u64,
}

impl fmt::Debug for DeliveryQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeliveryQueue")
            .field("delivered", &self.delivered)
            .finish()
    }
}

impl DeliveryQueue {
    /// Wait for the next job and run it.
    ///
    /// Returns `false` once every [`DeliveryContext`] handle is gone.
    pub async fn next(&mut self) -> bool {
        match self.rx.recv().await {
            Some(job) => {
                self.execute(job);
                true
            }
            None => false,
        }
    }

    /// Run every job that is already queued, without waiting.
    ///
    /// Jobs posted by the jobs themselves are run too. Returns the number of
    /// jobs run.
    pub fn drain(&mut self) -> usize {
        let mut count = 0;
        while let Ok(job) = self.rx.try_recv() {
            self.execute(job);
            count += 1;
        }
        count
    }

    /// Run jobs until every [`DeliveryContext`] handle is gone.
    pub async fn run(mut self) {
        while self.next().await {}
        tracing::debug!(delivered = self.delivered, "Delivery queue closed");
    }

    /// Total number of jobs run so far
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    /// A panicking observer is logged and skipped; the queue keeps running.
    fn execute(&mut self, job: Job) {
        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
            tracing::error!(delivered = self.delivered, "Observer panicked during delivery");
        }
        self.delivered += 1;
    }
}

pub(crate) type Observer<T> = Box<dyn FnMut(&T) + Send + 'static>;

/// Observer list whose every mutation and invocation is a delivery job.
///
/// Because registration is itself a job, an observer sees exactly the
/// publications posted after its registration, in post order.
pub(crate) struct Fanout<T: 'static> {
    delivery: DeliveryContext,
    observers: Arc<Mutex<Vec<Observer<T>>>>,
    token: CancellationToken,
}

impl<T: 'static> Fanout<T> {
    pub(crate) fn new(delivery: DeliveryContext, token: CancellationToken) -> Self {
        Self {
            delivery,
            observers: Arc::new(Mutex::new(Vec::new())),
            token,
        }
    }

    /// Register `observer`, delivering `initial` to it first when present.
    pub(crate) fn subscribe<P>(&self, mut observer: Observer<T>, initial: Option<P>)
    where
        P: Borrow<T> + Send + 'static,
    {
        let observers = Arc::clone(&self.observers);
        let token = self.token.clone();
        self.delivery.post(move || {
            if token.is_cancelled() {
                return;
            }
            if let Some(value) = initial {
                observer(value.borrow());
            }
            observers.lock().push(observer);
        });
    }

    /// Deliver `value` to every observer registered so far.
    pub(crate) fn publish<P>(&self, value: P)
    where
        P: Borrow<T> + Send + 'static,
    {
        let observers = Arc::clone(&self.observers);
        let token = self.token.clone();
        self.delivery.post(move || {
            if token.is_cancelled() {
                return;
            }
            let value = value.borrow();
            for observer in observers.lock().iter_mut() {
                observer(value);
            }
        });
    }
}

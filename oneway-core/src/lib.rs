//! Core traits and types for oneway
//!
//! This crate provides a unidirectional-data-flow store: one state value,
//! mutated only through a single reduction authority, observed through
//! ordered notifications on one delivery context.
//!
//! # Core Concepts
//!
//! - **Action**: a command reduced on the store's action worker; may emit an
//!   output and request agent effects
//! - **Change**: a pre-decided delta folded synchronously, visible on return
//! - **Output**: a one-shot event, delivered only to current observers
//! - **Agent**: async work that answers effects with further actions
//! - **DeliveryContext**: the serialized context every observer runs on
//! - **Process/Flow**: coordinators that drive a presentation context and
//!   announce their own outputs
//!
//! # Basic Example
//!
//! ```ignore
//! use oneway_core::prelude::*;
//!
//! #[derive(Debug)]
//! enum CounterChange {
//!     Add(i64),
//! }
//!
//! struct Counter;
//!
//! impl StoreDefinition for Counter {
//!     type State = i64;
//!     type Action = Never;
//!     type Change = CounterChange;
//!     type Output = Never;
//!     type Effect = Never;
//!
//!     fn reduce(&self, _: &mut i64, action: Never) -> Reduction<Never, Never> {
//!         match action {}
//!     }
//!
//!     fn fold(&self, state: &mut i64, change: CounterChange) {
//!         match change {
//!             CounterChange::Add(n) => *state += n,
//!         }
//!     }
//! }
//!
//! let store = Store::new(Counter, 0);
//! store.dispatch_change(CounterChange::Add(3));
//! assert_eq!(store.state(), 3);
//! ```
//!
//! # Agent Pattern
//!
//! Async work uses a two-phase action pattern:
//!
//! 1. **Intent actions** make the reducer return an effect (e.g. `Play`)
//! 2. **Result actions** carry the agent's outcome back (e.g. `PlayDidResolve`)
//!
//! Failures and timeouts travel inside the result action and are folded into
//! state like any other outcome.

pub mod action;
pub mod adapt;
pub mod agent;
pub mod config;
pub mod definition;
pub mod delivery;
pub mod error;
pub mod flow;
pub mod middleware;
pub mod reduction;
pub mod store;
pub mod testing;
pub mod view;

// Core trait exports
pub use action::{Action, Change, Never, Output};
pub use definition::StoreDefinition;
pub use reduction::Reduction;

// Store exports
pub use adapt::AnyViewStore;
pub use agent::{ActionSender, Agent, AgentFuture};
pub use config::{Qos, StoreConfig};
pub use delivery::{DeliveryContext, DeliveryQueue};
pub use error::StoreError;
pub use store::{Store, StoreBuilder, WeakStore};

// Middleware exports
pub use middleware::{
    glob_match, ComposedMiddleware, LogFilter, LoggingMiddleware, Middleware, MutationKind,
    MutationLog, MutationRecord, NoopMiddleware, RecordingMiddleware,
};

// Flow exports
pub use flow::{present_root, push_root, Flow, OutputHub, PresentationContext, Process, RootFlow};
pub use view::{bind, View};

// Testing exports
pub use testing::{Presentation, RecordingAgent, RecordingContext, StoreHarness};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::action::{Action, Change, Never, Output};
    pub use crate::adapt::AnyViewStore;
    pub use crate::agent::{ActionSender, Agent};
    pub use crate::config::{Qos, StoreConfig};
    pub use crate::definition::StoreDefinition;
    pub use crate::delivery::{DeliveryContext, DeliveryQueue};
    pub use crate::error::StoreError;
    pub use crate::flow::{
        present_root, push_root, Flow, OutputHub, PresentationContext, Process, RootFlow,
    };
    pub use crate::middleware::{ComposedMiddleware, LogFilter, LoggingMiddleware, Middleware};
    pub use crate::reduction::Reduction;
    pub use crate::store::{Store, StoreBuilder, WeakStore};
    pub use crate::view::{bind, View};
}

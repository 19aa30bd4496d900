//! oneway: Unidirectional state stores with ordered notification
//!
//! One state value per store, mutated only through its definition's reducer
//! and fold, observed through notifications that arrive on a single delivery
//! context in mutation order.
//!
//! # Example
//! ```ignore
//! use oneway::prelude::*;
//!
//! #[derive(Action, Debug)]
//! enum LotteryAction {
//!     Play,
//!     PlayDidResolve(Result<bool, LotteryError>),
//! }
//!
//! #[derive(Change, Debug)]
//! enum LotteryChange {
//!     Ban,
//!     Grant(u64),
//! }
//!
//! #[derive(Output, Clone, Debug)]
//! enum LotteryOutput {
//!     DidLose,
//! }
//! ```

// Re-export everything from core
pub use oneway_core::*;

// Re-export derive macros
pub use oneway_macros::{Action, Change, Output};

/// Prelude for convenient imports
pub mod prelude {
    // Traits
    pub use oneway_core::{Action, Agent, Change, Output, StoreDefinition, View};

    // Store
    pub use oneway_core::{
        ActionSender, AnyViewStore, DeliveryContext, DeliveryQueue, Never, Qos, Reduction, Store,
        StoreBuilder, StoreConfig, StoreError,
    };

    // Middleware
    pub use oneway_core::{ComposedMiddleware, LogFilter, LoggingMiddleware, Middleware};

    // Flow
    pub use oneway_core::{
        bind, present_root, push_root, Flow, OutputHub, PresentationContext, Process, RootFlow,
    };

    // Derive macros
    pub use oneway_macros::{Action, Change, Output};
}

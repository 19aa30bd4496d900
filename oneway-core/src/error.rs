//! Infrastructure errors
//!
//! Domain failures (a network call failing, a timeout) are not errors at
//! this level: agents report them as action payloads and reducers fold them
//! into state.

use thiserror::Error;

/// Errors surfaced by the store machinery itself.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store was torn down; the request can no longer be served.
    #[error("store has been torn down")]
    Closed,

    /// A store configuration could not be parsed.
    #[error("invalid store configuration: {0}")]
    Config(#[from] serde_json::Error),
}

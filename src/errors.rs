use thiserror::Error;

/// Errors raised by the simulation core.
///
/// Only genuine misuse is an error here. Empirical non-events (a depleted
/// quota, a gatherer with nothing to measure, an unevaluable fitness) are
/// absorbed into recorded data and never surface as `Error`.
#[derive(Debug, Error)]
pub enum Error {
    /// A structurally invalid setup, detected before any state is mutated:
    /// duplicate column names, mismatched per-species vectors, an ITQ
    /// regulation without a quota price strategy, and the like.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An operation called in the wrong lifecycle state, e.g. stepping a
    /// schedule that was never started or was already stopped.
    #[error("invalid state: {0}")]
    State(String),

    /// A lookup for something that was never registered.
    #[error("not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;

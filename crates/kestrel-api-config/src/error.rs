//! Error types for API configuration operations.

use thiserror::Error;

use crate::store::StoreError;

/// Primary error type for API configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A persisting mutator ran before any property store was attached.
    #[error("no property store attached")]
    NotAttached,
    /// The attached store failed to flush a change to durable storage.
    ///
    /// The in-memory value has already been updated when this surfaces, so
    /// the runtime and persisted views may diverge until the next successful
    /// persist or reload.
    #[error("failed to persist API configuration")]
    Persistence {
        /// Source store error.
        source: StoreError,
    },
}

/// Convenience alias for API configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;

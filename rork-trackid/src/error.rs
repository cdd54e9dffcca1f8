//! Error types for rork-trackid
//!
//! Only batch-level failures surface as `IdError`. A text fragment that is not
//! a track mention is a normal `None`, and a store failure while resolving one
//! mention degrades that mention to unresolved.

use thiserror::Error;

/// Track identification error type
#[derive(Debug, Error)]
pub enum IdError {
    /// The canonical store could not be reached when the batch started
    #[error("Canonical store unavailable: {0}")]
    StoreUnavailable(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// rork-common error
    #[error("Common error: {0}")]
    Common(#[from] rork_common::Error),
}

/// Result type for track identification operations
pub type IdResult<T> = Result<T, IdError>;

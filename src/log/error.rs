//! Log construction errors.

use thiserror::Error;

/// Errors that can occur when setting up a log over a store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogError {
    /// The store cannot hold the header plus two slots (one is always kept empty)
    #[error("Store of {capacity} bytes is too small for a log, need at least {required}")]
    StoreTooSmall { capacity: usize, required: usize },
}

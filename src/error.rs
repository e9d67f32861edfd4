//! Error taxonomy for the retrieval pipeline.
//!
//! Three failure classes cover everything the core can report:
//!
//! - [`RetrievalError::SourceUnavailable`] — the fact source could not be
//!   reached or answered with a non-success status. Surfaced to whoever
//!   triggered the build; the service itself falls back to an empty index.
//! - [`RetrievalError::EmbeddingFailure`] — the embedding model rejected the
//!   input or failed to run. A build keeps the previously installed index
//!   untouched; a query returns this error rather than a partial result.
//! - [`RetrievalError::InvalidArgument`] — caller error (`k == 0`, blank
//!   question). Rejected before the index is consulted.
//!
//! An empty fact source is deliberately *not* an error: it produces an empty
//! index and every query against it returns an empty result.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Failures the retrieval core can surface to its callers.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The SPARQL endpoint was unreachable, timed out, or answered non-2xx.
    #[error("fact source unavailable: {0}")]
    SourceUnavailable(String),

    /// The embedding model failed to produce vectors.
    #[error("embedding failed: {0}")]
    EmbeddingFailure(String),

    /// The caller passed an argument the engine refuses to act on.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

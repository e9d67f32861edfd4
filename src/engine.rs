//! # Retrieval engine
//!
//! Owns the process-wide index lifecycle: one shared handle pairing the
//! [`Embedder`] with the currently installed [`VectorIndex`], swapped
//! wholesale on rebuild.
//!
//! ## Concurrency model
//! Queries are pure reads. Each query clones the `Arc` holding the current
//! index and works against that immutable snapshot, so any number of queries
//! run in parallel with no coordination, and a rebuild finishing mid-query
//! never tears the snapshot out from under them — they either see the old
//! index in its entirety or the new one, never a mix.
//!
//! Rebuilds serialize behind a dedicated mutex: the expensive embedding work
//! happens outside the reader lock, and only the final pointer swap takes the
//! write lock. A failed rebuild leaves the previous index untouched.

use std::sync::{Arc, Mutex, RwLock};

use tracing::info;

use crate::embedding::Embedder;
use crate::error::{Result, RetrievalError};
use crate::index::VectorIndex;

/// Shared build/query handle over the current index snapshot.
pub struct RetrievalEngine {
    embedder: Arc<dyn Embedder>,
    index: RwLock<Arc<VectorIndex>>,
    /// Serializes concurrent rebuilds; held across embed + swap.
    build_lock: Mutex<()>,
}

impl RetrievalEngine {
    /// Create an engine in the empty state. Every query returns no context
    /// until a corpus is installed.
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            index: RwLock::new(Arc::new(VectorIndex::empty())),
            build_lock: Mutex::new(()),
        }
    }

    /// Embed `corpus`, build a fresh index, and atomically replace the
    /// current one. Returns the number of indexed documents.
    ///
    /// Concurrent calls serialize; the replacement is a single pointer swap,
    /// so in-flight queries keep their snapshot.
    ///
    /// # Errors
    /// Propagates [`RetrievalError::EmbeddingFailure`]; on error the
    /// previously installed index stays in place.
    pub fn install(&self, corpus: Vec<String>) -> Result<usize> {
        let _build = self.build_lock.lock().expect("build lock poisoned");

        info!("Indexing {} documents", corpus.len());
        let next = Arc::new(VectorIndex::build(corpus, self.embedder.as_ref())?);
        let count = next.len();

        *self.index.write().expect("index lock poisoned") = next;
        Ok(count)
    }

    /// Embed `text` and return the top `k` (document, score) pairs from the
    /// current snapshot, best first.
    ///
    /// An empty index yields an empty result, never an error. `k == 0` is
    /// rejected before the index is consulted.
    ///
    /// # Errors
    /// - [`RetrievalError::InvalidArgument`] for `k == 0`.
    /// - [`RetrievalError::EmbeddingFailure`] if the query cannot be embedded;
    ///   no partial result is returned.
    pub fn query(&self, text: &str, k: usize) -> Result<Vec<(String, f32)>> {
        if k == 0 {
            return Err(RetrievalError::InvalidArgument(
                "k must be a positive integer".to_string(),
            ));
        }

        let snapshot = self.snapshot();
        if snapshot.is_empty() {
            return Ok(Vec::new());
        }

        let query = self.embedder.embed(&[text.to_string()])?.remove(0);
        Ok(snapshot.search(&query, k))
    }

    /// Number of documents in the current snapshot.
    pub fn indexed_documents(&self) -> usize {
        self.snapshot().len()
    }

    fn snapshot(&self) -> Arc<VectorIndex> {
        Arc::clone(&self.index.read().expect("index lock poisoned"))
    }
}

//! # VectorIndex
//!
//! In-memory flat inner-product index over an ordered corpus of short text
//! documents. This is the algorithmic core of the service: everything around
//! it is I/O glue.
//!
//! ## Responsibilities
//! - **Embedding at build time**: every document is mapped to a vector by the
//!   supplied [`Embedder`], in corpus order.
//! - **Normalization**: every stored vector (and every query vector) is
//!   L2-normalized, so the dot product computed at search time is cosine
//!   similarity in `[-1, 1]`.
//! - **Exact top-k search**: a full scan over the entries, ranked by
//!   descending score with ties broken by lower corpus position. Exact and
//!   deterministic — no approximate structure, no randomness.
//!
//! ## Position is the identifier
//! A document has no key other than its position: entry *i* of the index is
//! document *i* of the corpus that built it. Text and vector live in one
//! [`IndexEntry`] struct, so the two can never drift apart the way parallel
//! arrays can. Breaking this correspondence would silently corrupt every
//! search result, which is why the index is immutable once built — there is
//! no insert, update, or delete, only whole-corpus rebuild.
//!
//! ## Quick Example
//! ```ignore
//! let index = VectorIndex::build(corpus, embedder.as_ref())?;
//! let query = embedder.embed(&["capital of France".to_string()])?.remove(0);
//! for (text, score) in index.search(&query, 8) {
//!     println!("{score:.3} {text}");
//! }
//! ```

use tracing::debug;

use crate::embedding::Embedder;
use crate::error::Result;

/// One indexed document: its text and its normalized embedding, kept in a
/// single struct so position `i` always refers to both at once.
#[derive(Debug)]
struct IndexEntry {
    text: String,
    vector: Vec<f32>,
}

/// Flat inner-product index over an ordered corpus.
///
/// Two observable states: **Empty** (zero entries, built from an empty
/// corpus or never built) and **Built**. Queries against an empty index
/// return an empty result, never an error.
#[derive(Debug)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// The explicit empty state. All searches return no results.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Embed `corpus` and build an index over it, preserving corpus order.
    ///
    /// An empty corpus yields the empty state. An embedding failure aborts
    /// the whole build — no partially filled index is ever returned.
    ///
    /// # Errors
    /// Propagates [`EmbeddingFailure`](crate::error::RetrievalError::EmbeddingFailure)
    /// from the embedder.
    pub fn build(corpus: Vec<String>, embedder: &dyn Embedder) -> Result<Self> {
        if corpus.is_empty() {
            debug!("Building empty index: corpus has no documents");
            return Ok(Self::empty());
        }

        let mut vectors = embedder.embed(&corpus)?;
        for vector in &mut vectors {
            l2_normalize(vector);
        }

        let entries = corpus
            .into_iter()
            .zip(vectors)
            .map(|(text, vector)| IndexEntry { text, vector })
            .collect::<Vec<_>>();
        debug!("Built index with {} entries", entries.len());

        Ok(Self { entries })
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether this index is in the empty state.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return the `k` entries most similar to `query`, best first.
    ///
    /// The query vector is L2-normalized here, identically to build-time
    /// vectors, so scores are cosine similarities. Results are sorted by
    /// descending score; equal scores sort by lower corpus position. If the
    /// index holds fewer than `k` entries, all of them come back — `k` is an
    /// upper bound, not a requirement.
    ///
    /// The query must come from the same embedder that built the index; that
    /// is a caller invariant, not checked here.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<(String, f32)> {
        if self.entries.is_empty() || k == 0 {
            return Vec::new();
        }

        let mut query = query.to_vec();
        l2_normalize(&mut query);

        let mut ranked: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (position, dot(&query, &entry.vector)))
            .collect();
        // Descending score, ascending position on ties. total_cmp keeps the
        // ordering deterministic even if a degenerate vector produces NaN.
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(k);

        // Positions outside the corpus are dropped rather than surfaced;
        // different search backends signal "no match" with sentinels like -1,
        // and the result assembly must never trust a raw position.
        ranked
            .into_iter()
            .filter_map(|(position, score)| {
                self.entries
                    .get(position)
                    .map(|entry| (entry.text.clone(), score))
            })
            .collect()
    }
}

/// Scale `vector` so its Euclidean norm is 1. Zero vectors are left alone:
/// there is no direction to preserve, and dividing by zero would poison every
/// score computed against them.
fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

/// Plain dot product over the shared prefix of `a` and `b`.
fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

//! # triplerag (library root)
//!
//! Retrieval-augmented context over a SPARQL triple store. The service pulls
//! factual statements from a Fuseki dataset, embeds them with a sentence
//! embedding model, and answers top-k similarity queries so a downstream
//! answer generator has relevant context to work with.
//!
//! The pipeline, in consumption order:
//!
//! - [`ingest`] — one bounded SPARQL SELECT, flattened into one-line
//!   documents (`"{subject} {predicate} {object}"`).
//! - [`embedding`] — the [`Embedder`](embedding::Embedder) seam plus the
//!   all-MiniLM-L6-v2 implementation via Candle (pure Rust ML framework).
//! - [`index`] — the flat inner-product index: L2-normalized vectors, exact
//!   deterministic top-k with positional tie-breaks.
//! - [`engine`] — index lifecycle: build-once, atomically swappable snapshot,
//!   concurrent read-only queries.
//! - [`server`] — the `POST /ask` HTTP boundary (plus `/rebuild` and
//!   `/health`).
//! - [`config`], [`error`] — environment configuration and the error
//!   taxonomy.
//!
//! The index lives in process memory for the service's lifetime; there is no
//! persistence and no incremental update — rebuilds replace the whole
//! corpus-and-index pair at once. Answer generation, conversational state,
//! and UI are out of scope: this crate ends at `(text, score)` pairs.

pub mod config;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod index;
pub mod ingest;
pub mod server;

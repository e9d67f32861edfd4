//! # Document ingestor
//!
//! Pulls the corpus from the fact source: one bounded, read-only SPARQL
//! SELECT against the configured Fuseki query endpoint, flattened into
//! one-line documents ready for embedding.
//!
//! Flattening is deterministic — `"{subject} {predicate} {object}"` with the
//! predicate reduced to its IRI fragment — so ingesting identical source data
//! twice yields byte-identical documents, which in turn keeps rebuilt indexes
//! byte-identical. The request is not retried here; a transient failure
//! surfaces as [`RetrievalError::SourceUnavailable`] and the caller decides
//! whether to trigger another build.

use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::config::{FETCH_TIMEOUT, RESULT_LIMIT};
use crate::error::{Result, RetrievalError};

/// The predicates worth retrieving context from. Everything else in the
/// dataset (geometry, provenance) adds noise to the embedding space.
const CONTEXT_PREDICATES: &str = "ex:formedBy, ex:mergedInto, rdfs:label, ex:canonicalLabel";

fn context_query() -> String {
    format!(
        "PREFIX ex: <http://example.org/vn/ontology#>\n\
         PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>\n\
         SELECT ?s ?p ?o WHERE {{\n\
           ?s ?p ?o .\n\
           FILTER(?p IN ({CONTEXT_PREDICATES}))\n\
         }}\n\
         LIMIT {RESULT_LIMIT}"
    )
}

/// SPARQL JSON results envelope (`application/sparql-results+json`).
#[derive(Debug, Deserialize)]
struct SparqlResults {
    results: SparqlBindings,
}

#[derive(Debug, Deserialize)]
struct SparqlBindings {
    bindings: Vec<HashMap<String, SparqlTerm>>,
}

#[derive(Debug, Deserialize)]
struct SparqlTerm {
    value: String,
}

/// Fetch the corpus: one SPARQL read, flattened to one document per triple.
///
/// Returns `Ok(vec![])` when the source holds zero matching triples — an
/// empty source is not a failure, it just means every query will answer with
/// empty context.
///
/// # Errors
/// [`RetrievalError::SourceUnavailable`] when the endpoint cannot be reached,
/// times out, answers non-2xx, or returns a body that is not SPARQL JSON.
pub async fn fetch_documents(client: &reqwest::Client, query_url: &str) -> Result<Vec<String>> {
    debug!("Fetching triples from {query_url}");

    let response = client
        .get(query_url)
        .query(&[
            ("query", context_query().as_str()),
            ("format", "application/sparql-results+json"),
        ])
        .timeout(FETCH_TIMEOUT)
        .send()
        .await
        .map_err(source_unavailable)?
        .error_for_status()
        .map_err(source_unavailable)?;

    let results: SparqlResults = response.json().await.map_err(source_unavailable)?;

    let documents: Vec<String> = results
        .results
        .bindings
        .iter()
        .filter_map(flatten_binding)
        .collect();
    info!("Fetched {} context documents", documents.len());

    Ok(documents)
}

/// Flatten one result row into `"{s} {p_local} {o}"`.
///
/// Rows missing any of the three variables are dropped — a malformed binding
/// must never become a document. The predicate keeps only its fragment after
/// the last `#` (the whole IRI when there is none), matching how the triples
/// are written back out as readable statements.
fn flatten_binding(binding: &HashMap<String, SparqlTerm>) -> Option<String> {
    let subject = binding.get("s")?;
    let predicate = binding.get("p")?;
    let object = binding.get("o")?;

    let predicate_local = predicate
        .value
        .rsplit('#')
        .next()
        .unwrap_or(&predicate.value);

    Some(format!(
        "{} {} {}",
        subject.value, predicate_local, object.value
    ))
}

fn source_unavailable(err: impl std::fmt::Display) -> RetrievalError {
    RetrievalError::SourceUnavailable(err.to_string())
}

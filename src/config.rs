//! Runtime configuration.
//!
//! The service is configured almost entirely by constants; the only setting
//! that affects retrieval behavior is the fact-source base address, read from
//! the `FUSEKI_URL` environment variable. Everything else (bind address) is a
//! serving detail.
//!
//! # Examples
//!
//! ```rust
//! use triplerag::config::RagConfig;
//!
//! let config = RagConfig::from_env();
//! println!("querying {}", config.query_url());
//! ```

use std::env;
use std::time::Duration;

/// Default base address of the Fuseki dataset when `FUSEKI_URL` is unset.
pub const DEFAULT_FUSEKI_URL: &str = "http://localhost:3030/vn";

/// Default listen address when `TRIPLERAG_BIND` is unset.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

/// Upper bound on the number of triples pulled per ingest pass.
pub const RESULT_LIMIT: usize = 5000;

/// Timeout applied to the single SPARQL read. A stalled endpoint must not
/// hang the whole index build.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Number of context snippets returned per `/ask` request.
pub const CONTEXT_K: usize = 8;

/// Represents the service configuration.
///
/// Built from the process environment with [`RagConfig::from_env`]; both
/// fields fall back to local defaults so a bare `triplerag` invocation works
/// against a Fuseki instance on the same host.
#[derive(Debug, Clone, PartialEq)]
pub struct RagConfig {
    /// Base address of the Fuseki dataset, e.g. `http://localhost:3030/vn`.
    pub fuseki_url: String,

    /// Address the HTTP server binds to.
    pub bind_addr: String,
}

impl RagConfig {
    /// Load the configuration from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let fuseki_url =
            env::var("FUSEKI_URL").unwrap_or_else(|_| DEFAULT_FUSEKI_URL.to_string());
        let bind_addr =
            env::var("TRIPLERAG_BIND").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        Self {
            fuseki_url,
            bind_addr,
        }
    }

    /// The SPARQL query endpoint derived from the base address.
    ///
    /// Trailing slashes on `fuseki_url` are tolerated so that
    /// `http://host:3030/vn` and `http://host:3030/vn/` resolve to the same
    /// endpoint.
    pub fn query_url(&self) -> String {
        format!("{}/query", self.fuseki_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_url_appends_query_path() {
        let config = RagConfig {
            fuseki_url: "http://localhost:3030/vn".to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        };
        assert_eq!(config.query_url(), "http://localhost:3030/vn/query");
    }

    #[test]
    fn query_url_tolerates_trailing_slash() {
        let config = RagConfig {
            fuseki_url: "http://localhost:3030/vn/".to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        };
        assert_eq!(config.query_url(), "http://localhost:3030/vn/query");
    }
}

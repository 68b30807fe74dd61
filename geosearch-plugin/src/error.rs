//! Plugin-level error taxonomy.
//!
//! Every error below the host-contract boundary folds into a response:
//! the `Display` text of a [`PluginError`] is exactly the message the
//! host sees in `error_message`. Nothing here crosses `do_search` as a
//! panic or a bare `Err`.

use thiserror::Error;

/// Failures that can end a search invocation.
///
/// Causes are mutually exclusive per invocation — the first one
/// encountered short-circuits the rest of the pipeline.
#[derive(Error, Debug)]
pub enum PluginError {
    /// No usable datastore connection (init failed, never ran, or the
    /// plugin was closed).
    #[error("Datastore connection is not available")]
    ConnectionUnavailable,

    /// The request carries no key this plugin recognizes.
    #[error("Unable to interpret search request")]
    UnrecognizedRequest,

    /// Query execution failed; carries the datastore diagnostic.
    #[error("DB Query Error: {0}")]
    Query(String),

    /// Row retrieval failed mid-iteration.
    #[error("DB Results Error: {0}")]
    Results(String),

    /// Geometry bytes could not be decoded.
    #[error("Geometry parsing error: {0}")]
    GeometryDecode(String),

    /// The per-search deadline expired during row iteration.
    #[error("Search timed out after {0}ms")]
    Timeout(u64),
}

impl PluginError {
    /// Classify a query-execution failure from the datastore.
    pub fn from_query(err: geosearch_store::StoreError) -> Self {
        use geosearch_store::StoreError;
        match err {
            StoreError::Connection(_) | StoreError::Closed => PluginError::ConnectionUnavailable,
            other => PluginError::Query(other.to_string()),
        }
    }
}

/// Result type alias using PluginError.
pub type Result<T> = std::result::Result<T, PluginError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_the_response_message() {
        assert_eq!(
            PluginError::UnrecognizedRequest.to_string(),
            "Unable to interpret search request"
        );
        assert_eq!(
            PluginError::Query("syntax error at or near \"FROM\"".to_string()).to_string(),
            "DB Query Error: syntax error at or near \"FROM\""
        );
        assert_eq!(
            PluginError::GeometryDecode("truncated WKB input at byte 13".to_string()).to_string(),
            "Geometry parsing error: truncated WKB input at byte 13"
        );
    }

    #[test]
    fn test_query_failure_classification() {
        use geosearch_store::StoreError;

        assert!(matches!(
            PluginError::from_query(StoreError::Closed),
            PluginError::ConnectionUnavailable
        ));
        assert!(matches!(
            PluginError::from_query(StoreError::connection("refused")),
            PluginError::ConnectionUnavailable
        ));
        assert!(matches!(
            PluginError::from_query(StoreError::query("bad relation")),
            PluginError::Query(_)
        ));
    }
}

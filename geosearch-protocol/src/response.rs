//! Search response types.

use crate::style::StyleRegistry;
use geo_types::GeometryCollection;
use serde::{Deserialize, Serialize};

/// Descriptive metadata attached to a matched geometry.
///
/// `description` is presentation-ready text (the reference clients render
/// it as HTML in a balloon); the assembler formats it, the presentation
/// layer passes it through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeomMetadata {
    /// Display name of the matched feature.
    pub name: String,
    /// Short one-line summary.
    pub snippet: String,
    /// Longer formatted description.
    pub description: String,
}

/// One matched feature: geometry, metadata, and a style reference.
///
/// The geometry is always a collection — single features are wrapped in
/// a one-element collection so single- and multi-geometry results have a
/// uniform shape. `style_id` references the response's style registry;
/// entries never own style definitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultEntry {
    /// Matched geometry, uniformly collection-wrapped.
    pub geometry: GeometryCollection<f64>,
    /// Feature metadata.
    pub metadata: GeomMetadata,
    /// Key into the response's style registry.
    pub style_id: String,
}

/// Response envelope produced by one plugin invocation.
///
/// Created once per search, mutated only by the invocation that created
/// it, immutable once handed back. A response always comes back — the
/// host must inspect `success`, never treat emptiness as success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Name of the datastore that produced these results.
    pub data_store_name: String,

    /// The search term, echoed for client display.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_term: Option<String>,

    /// Whether the search ran to completion.
    pub success: bool,

    /// Human-readable failure description when `success` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Matched features, in datastore row order.
    pub results: Vec<ResultEntry>,

    /// Style definitions referenced by `results`, keyed by style id.
    pub styles: StyleRegistry,

    /// Non-fatal notes (e.g. rows skipped under a lenient row policy).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl SearchResponse {
    /// Create an empty, successful response for the named datastore.
    pub fn new(data_store_name: impl Into<String>) -> Self {
        Self {
            data_store_name: data_store_name.into(),
            search_term: None,
            success: true,
            error_message: None,
            results: Vec::new(),
            styles: StyleRegistry::new(),
            warnings: Vec::new(),
        }
    }

    /// Record the term this response answers.
    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = Some(term.into());
    }

    /// Mark the response failed with a human-readable message.
    ///
    /// Entries appended before the failure are kept; the flag tells the
    /// host the set is not complete.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.success = false;
        self.error_message = Some(message.into());
    }

    /// Append a matched feature.
    pub fn add_result(&mut self, entry: ResultEntry) {
        self.results.push(entry);
    }

    /// Record a non-fatal warning.
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Check the style-reference invariant: every entry's `style_id` is
    /// registered in `styles`.
    pub fn styles_resolved(&self) -> bool {
        self.results
            .iter()
            .all(|entry| self.styles.contains(&entry.style_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::StyleDefinition;
    use geo_types::{Geometry, Point};

    fn entry(style_id: &str) -> ResultEntry {
        ResultEntry {
            geometry: GeometryCollection(vec![Geometry::Point(Point::new(1.0, 2.0))]),
            metadata: GeomMetadata {
                name: "Mission District".to_string(),
                snippet: "District 9".to_string(),
                description: "test".to_string(),
            },
            style_id: style_id.to_string(),
        }
    }

    #[test]
    fn test_new_response_is_successful_and_empty() {
        let response = SearchResponse::new("neighborhoods");
        assert!(response.success);
        assert!(response.error_message.is_none());
        assert!(response.results.is_empty());
        assert!(response.styles.is_empty());
    }

    #[test]
    fn test_fail_keeps_existing_results() {
        let mut response = SearchResponse::new("neighborhoods");
        response.styles.register("s", StyleDefinition::default());
        response.add_result(entry("s"));
        response.fail("Geometry parsing error: truncated input");

        assert!(!response.success);
        assert_eq!(response.results.len(), 1);
        assert_eq!(
            response.error_message.as_deref(),
            Some("Geometry parsing error: truncated input")
        );
    }

    #[test]
    fn test_styles_resolved_invariant() {
        let mut response = SearchResponse::new("neighborhoods");
        response.add_result(entry("missing_style"));
        assert!(!response.styles_resolved());

        response
            .styles
            .register("missing_style", StyleDefinition::default());
        assert!(response.styles_resolved());
    }

    #[test]
    fn test_serialization_omits_empty_optionals() {
        let response = SearchResponse::new("neighborhoods");
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("error_message"));
        assert!(!json.contains("warnings"));
        assert!(!json.contains("search_term"));

        let parsed: SearchResponse = serde_json::from_str(&json).unwrap();
        assert!(parsed.success);
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn test_response_round_trips_with_results() {
        let mut response = SearchResponse::new("neighborhoods");
        response.set_search_term("mission");
        response.styles.register("s", StyleDefinition::default());
        response.add_result(entry("s"));

        let json = serde_json::to_string(&response).unwrap();
        let parsed: SearchResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.results.len(), 1);
        assert_eq!(parsed.results[0].metadata.name, "Mission District");
        assert_eq!(parsed.results[0].geometry.0.len(), 1);
        assert_eq!(parsed.search_term.as_deref(), Some("mission"));
    }
}

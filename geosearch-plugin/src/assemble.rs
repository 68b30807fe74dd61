//! Response assembly.

use crate::error::PluginError;
use crate::RowErrorPolicy;
use geo_types::GeometryCollection;
use geosearch_protocol::{GeomMetadata, ResultEntry, SearchResponse, StyleDefinition};
use geosearch_store::{Row, AREA_COLUMN, GEOMETRY_COLUMN, PERIMETER_COLUMN};
use geosearch_wkb::decode_transport;

/// The fixed two-line description attached to every matched feature.
pub fn format_description(name: &str, area: f64, perimeter: f64) -> String {
    format!(
        "The total area in decimal degrees of {name} is: {area}<br>\
         The total perimeter in decimal degrees of {name} is: {perimeter}"
    )
}

/// Folds result rows into a [`SearchResponse`].
///
/// Owns the response for the duration of one search invocation. Each
/// pushed row is decoded, wrapped, styled, and appended; the first
/// failing row is handled per the configured [`RowErrorPolicy`]. The
/// style definition is registered in the response the first time a row
/// lands (re-registration is a no-op), so the style-reference invariant
/// holds by the time [`ResponseAssembler::finish`] runs.
#[derive(Debug)]
pub struct ResponseAssembler {
    response: SearchResponse,
    policy: RowErrorPolicy,
    style_id: String,
    style: StyleDefinition,
    name_column: String,
    snippet_column: String,
    failed: bool,
}

impl ResponseAssembler {
    pub fn new(
        response: SearchResponse,
        policy: RowErrorPolicy,
        style_id: impl Into<String>,
        style: StyleDefinition,
        name_column: impl Into<String>,
        snippet_column: impl Into<String>,
    ) -> Self {
        Self {
            response,
            policy,
            style_id: style_id.into(),
            style,
            name_column: name_column.into(),
            snippet_column: snippet_column.into(),
            failed: false,
        }
    }

    /// Record the term this response answers.
    pub fn set_search_term(&mut self, term: &str) {
        self.response.set_search_term(term);
    }

    /// Process one row. Returns `false` once an aborting failure has
    /// been recorded — the caller stops iterating.
    pub fn push_row(&mut self, row: &Row) -> bool {
        match self.try_push(row) {
            Ok(()) => true,
            Err(err) => match self.policy {
                RowErrorPolicy::Abort => {
                    self.fail(&err);
                    false
                }
                RowErrorPolicy::Skip => {
                    tracing::debug!(error = %err, "Skipping bad result row");
                    self.response.add_warning(format!("row skipped: {err}"));
                    true
                }
            },
        }
    }

    /// Mark the response failed with the error's message.
    pub fn fail(&mut self, err: &PluginError) {
        self.response.fail(err.to_string());
        self.failed = true;
    }

    /// Whether an aborting failure has been recorded.
    pub fn failed(&self) -> bool {
        self.failed
    }

    /// Entries assembled so far.
    pub fn len(&self) -> usize {
        self.response.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.response.results.is_empty()
    }

    /// Hand the finished response back.
    pub fn finish(self) -> SearchResponse {
        debug_assert!(self.response.styles_resolved());
        self.response
    }

    fn try_push(&mut self, row: &Row) -> Result<(), PluginError> {
        let transport = row
            .get_bytes(GEOMETRY_COLUMN)
            .map_err(|e| PluginError::Results(e.to_string()))?;
        let geometry =
            decode_transport(transport).map_err(|e| PluginError::GeometryDecode(e.to_string()))?;

        let name = row
            .get_str(&self.name_column)
            .map_err(|e| PluginError::Results(e.to_string()))?;
        // The snippet column is optional in practice; absent or NULL
        // renders as an empty snippet.
        let snippet = row.get_str(&self.snippet_column).unwrap_or("");
        let area = row
            .get_f64(AREA_COLUMN)
            .map_err(|e| PluginError::Results(e.to_string()))?;
        let perimeter = row
            .get_f64(PERIMETER_COLUMN)
            .map_err(|e| PluginError::Results(e.to_string()))?;

        let metadata = GeomMetadata {
            name: name.to_string(),
            snippet: snippet.to_string(),
            description: format_description(name, area, perimeter),
        };

        self.response
            .styles
            .register(self.style_id.clone(), self.style.clone());
        self.response.add_result(ResultEntry {
            // Uniform shape: single features ride in a one-element
            // collection, like multi-geometry results.
            geometry: GeometryCollection(vec![geometry]),
            metadata,
            style_id: self.style_id.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{Geometry, Point};
    use geosearch_store::ColumnValue;
    use geosearch_wkb::{encode_transport, ByteOrder};

    fn assembler(policy: RowErrorPolicy) -> ResponseAssembler {
        ResponseAssembler::new(
            SearchResponse::new("test store"),
            policy,
            "neighborhood_style",
            StyleDefinition {
                line_color: Some("ff00ffff".to_string()),
                ..Default::default()
            },
            "nbrhood",
            "sfar_distr",
        )
    }

    fn good_row(name: &str) -> Row {
        let transport =
            encode_transport(&Geometry::Point(Point::new(1.0, 2.0)), ByteOrder::BigEndian)
                .unwrap();
        Row::new()
            .with(GEOMETRY_COLUMN, ColumnValue::Bytes(transport))
            .with(AREA_COLUMN, ColumnValue::Float(0.002))
            .with(PERIMETER_COLUMN, ColumnValue::Float(0.3))
            .with("nbrhood", ColumnValue::Text(name.to_string()))
            .with("sfar_distr", ColumnValue::Text("District 9".to_string()))
    }

    fn corrupt_row() -> Row {
        good_row("Corrupt").with(GEOMETRY_COLUMN, ColumnValue::Bytes(b"@@not-wkb@@".to_vec()))
    }

    #[test]
    fn test_description_format() {
        let description = format_description("Mission District", 0.002, 0.3);
        assert_eq!(
            description,
            "The total area in decimal degrees of Mission District is: 0.002<br>\
             The total perimeter in decimal degrees of Mission District is: 0.3"
        );
    }

    #[test]
    fn test_push_row_builds_wrapped_entry() {
        let mut assembler = assembler(RowErrorPolicy::Abort);
        assert!(assembler.push_row(&good_row("Mission District")));

        let response = assembler.finish();
        assert!(response.success);
        assert_eq!(response.results.len(), 1);

        let entry = &response.results[0];
        assert_eq!(entry.metadata.name, "Mission District");
        assert_eq!(entry.metadata.snippet, "District 9");
        assert!(entry.metadata.description.contains("0.002"));
        assert!(entry.metadata.description.contains("0.3"));
        // Single feature, still collection-wrapped.
        assert_eq!(entry.geometry.0.len(), 1);
        assert_eq!(entry.style_id, "neighborhood_style");
        assert!(response.styles.contains("neighborhood_style"));
    }

    #[test]
    fn test_style_registered_once_across_rows() {
        let mut assembler = assembler(RowErrorPolicy::Abort);
        assembler.push_row(&good_row("A"));
        assembler.push_row(&good_row("B"));

        let response = assembler.finish();
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.styles.len(), 1);
    }

    #[test]
    fn test_abort_policy_keeps_prior_entries() {
        let mut assembler = assembler(RowErrorPolicy::Abort);
        assert!(assembler.push_row(&good_row("First")));
        assert!(!assembler.push_row(&corrupt_row()));
        assert!(assembler.failed());

        let response = assembler.finish();
        assert!(!response.success);
        assert_eq!(response.results.len(), 1);
        assert!(response
            .error_message
            .as_deref()
            .is_some_and(|m| m.starts_with("Geometry parsing error:")));
    }

    #[test]
    fn test_skip_policy_warns_and_continues() {
        let mut assembler = assembler(RowErrorPolicy::Skip);
        assert!(assembler.push_row(&good_row("First")));
        assert!(assembler.push_row(&corrupt_row()));
        assert!(assembler.push_row(&good_row("Third")));
        assert!(!assembler.failed());

        let response = assembler.finish();
        assert!(response.success);
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.warnings.len(), 1);
        assert!(response.warnings[0].contains("row skipped"));
    }

    #[test]
    fn test_missing_geometry_column_is_results_error() {
        let mut assembler = assembler(RowErrorPolicy::Abort);
        let row = Row::new().with("nbrhood", ColumnValue::Text("X".to_string()));
        assert!(!assembler.push_row(&row));

        let response = assembler.finish();
        assert!(response
            .error_message
            .as_deref()
            .is_some_and(|m| m.starts_with("DB Results Error:")));
    }
}

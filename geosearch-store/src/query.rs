//! Parameterized attribute queries.

use serde::{Deserialize, Serialize};

/// Column name under which transport-encoded geometry is returned.
pub const GEOMETRY_COLUMN: &str = "the_geom";
/// Column name for the computed feature area.
pub const AREA_COLUMN: &str = "area";
/// Column name for the computed feature perimeter.
pub const PERIMETER_COLUMN: &str = "perimeter";

/// A case-insensitive substring query against one attribute column.
///
/// The search term is lower-cased and wrapped in `%` wildcards when the
/// query is built, then carried as a bound parameter — query text never
/// contains the term. Table and column identifiers come from plugin
/// configuration, not from the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeQuery {
    table: String,
    match_column: String,
    attribute_columns: Vec<String>,
    term: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    limit: Option<usize>,
}

impl AttributeQuery {
    /// Build a substring query for `term` against `match_column`.
    pub fn substring(
        table: impl Into<String>,
        match_column: impl Into<String>,
        term: &str,
    ) -> Self {
        Self {
            table: table.into(),
            match_column: match_column.into(),
            attribute_columns: Vec::new(),
            term: term.to_lowercase(),
            limit: None,
        }
    }

    /// Request an additional attribute column in the result rows.
    pub fn with_attribute_column(mut self, column: impl Into<String>) -> Self {
        self.attribute_columns.push(column.into());
        self
    }

    /// Cap the number of returned rows.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn match_column(&self) -> &str {
        &self.match_column
    }

    pub fn attribute_columns(&self) -> &[String] {
        &self.attribute_columns
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// The bound wildcard pattern: `%term%`, lower-cased.
    pub fn pattern(&self) -> String {
        format!("%{}%", self.term)
    }

    /// Whether an attribute value matches the term (case-insensitive
    /// substring). Used by stores that evaluate the query in process.
    pub fn matches(&self, value: &str) -> bool {
        value.to_lowercase().contains(&self.term)
    }

    /// Render placeholder SQL plus the parameter list for SQL-backed
    /// stores. The geometry is requested in transport form and the
    /// area/perimeter fields are computed server-side.
    pub fn to_sql(&self) -> (String, Vec<String>) {
        let mut columns = format!(
            "encode(ST_AsBinary({geom}, 'XDR'), 'base64') AS {geom}, \
             ST_Area({geom}) AS {area}, ST_Perimeter({geom}) AS {perim}",
            geom = GEOMETRY_COLUMN,
            area = AREA_COLUMN,
            perim = PERIMETER_COLUMN,
        );
        for column in &self.attribute_columns {
            columns.push_str(", ");
            columns.push_str(column);
        }

        let mut sql = format!(
            "SELECT {columns} FROM {} WHERE lower({}) LIKE $1",
            self.table, self.match_column,
        );
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        (sql, vec![self.pattern()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_is_lowercased_and_wrapped() {
        let query = AttributeQuery::substring("san_francisco_neighborhoods", "nbrhood", "Mission");
        assert_eq!(query.pattern(), "%mission%");
    }

    #[test]
    fn test_sql_never_contains_the_term() {
        let query =
            AttributeQuery::substring("san_francisco_neighborhoods", "nbrhood", "Mission'; DROP")
                .with_attribute_column("sfar_distr")
                .with_attribute_column("nbrhood");
        let (sql, params) = query.to_sql();

        assert!(!sql.to_lowercase().contains("mission"));
        assert!(sql.contains("LIKE $1"));
        assert!(sql.contains("sfar_distr, nbrhood"));
        assert_eq!(params, vec!["%mission'; drop%".to_string()]);
    }

    #[test]
    fn test_sql_requests_transport_geometry_and_measures() {
        let query = AttributeQuery::substring("t", "c", "x");
        let (sql, _) = query.to_sql();
        assert!(sql.contains("encode(ST_AsBinary(the_geom, 'XDR'), 'base64') AS the_geom"));
        assert!(sql.contains("ST_Area(the_geom) AS area"));
        assert!(sql.contains("ST_Perimeter(the_geom) AS perimeter"));
    }

    #[test]
    fn test_matches_is_case_insensitive_substring() {
        let query = AttributeQuery::substring("t", "c", "mIsSiOn");
        assert!(query.matches("Mission District"));
        assert!(query.matches("mission"));
        assert!(!query.matches("Noe Valley"));
    }

    #[test]
    fn test_limit_rendered() {
        let query = AttributeQuery::substring("t", "c", "x").with_limit(25);
        let (sql, _) = query.to_sql();
        assert!(sql.ends_with("LIMIT 25"));
    }
}

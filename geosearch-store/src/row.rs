//! Result row model.

use crate::error::{Result, StoreError};
use std::collections::HashMap;

/// A single column value.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    /// Free-form text.
    Text(String),
    /// Floating-point number (computed area/perimeter fields).
    Float(f64),
    /// Raw bytes (transport-encoded geometry).
    Bytes(Vec<u8>),
    /// SQL NULL.
    Null,
}

impl ColumnValue {
    fn kind(&self) -> &'static str {
        match self {
            ColumnValue::Text(_) => "text",
            ColumnValue::Float(_) => "float",
            ColumnValue::Bytes(_) => "bytes",
            ColumnValue::Null => "null",
        }
    }
}

/// One result row with named columns.
///
/// Accessors are typed; asking for a column that is absent or holds the
/// wrong type is a [`StoreError`], never a panic — a misconfigured
/// column list should surface as a reported search failure.
#[derive(Debug, Clone, Default)]
pub struct Row {
    columns: HashMap<String, ColumnValue>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a column value, replacing any previous one.
    pub fn set(&mut self, name: impl Into<String>, value: ColumnValue) {
        self.columns.insert(name.into(), value);
    }

    /// Builder form of [`Row::set`].
    pub fn with(mut self, name: impl Into<String>, value: ColumnValue) -> Self {
        self.set(name, value);
        self
    }

    /// Raw column lookup.
    pub fn get(&self, name: &str) -> Option<&ColumnValue> {
        self.columns.get(name)
    }

    /// Text column accessor.
    pub fn get_str(&self, name: &str) -> Result<&str> {
        match self.require(name)? {
            ColumnValue::Text(s) => Ok(s),
            other => Err(self.type_error(name, "text", other)),
        }
    }

    /// Float column accessor.
    pub fn get_f64(&self, name: &str) -> Result<f64> {
        match self.require(name)? {
            ColumnValue::Float(v) => Ok(*v),
            other => Err(self.type_error(name, "float", other)),
        }
    }

    /// Bytes column accessor.
    pub fn get_bytes(&self, name: &str) -> Result<&[u8]> {
        match self.require(name)? {
            ColumnValue::Bytes(b) => Ok(b),
            other => Err(self.type_error(name, "bytes", other)),
        }
    }

    /// Column names present in this row (unordered).
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    fn require(&self, name: &str) -> Result<&ColumnValue> {
        self.columns
            .get(name)
            .ok_or_else(|| StoreError::missing_column(name))
    }

    fn type_error(&self, name: &str, expected: &'static str, actual: &ColumnValue) -> StoreError {
        StoreError::ColumnType {
            name: name.to_string(),
            expected,
            actual: actual.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> Row {
        Row::new()
            .with("nbrhood", ColumnValue::Text("Mission District".to_string()))
            .with("area", ColumnValue::Float(0.002))
            .with("the_geom", ColumnValue::Bytes(vec![1, 2, 3]))
    }

    #[test]
    fn test_typed_accessors() {
        let row = sample_row();
        assert_eq!(row.get_str("nbrhood").unwrap(), "Mission District");
        assert_eq!(row.get_f64("area").unwrap(), 0.002);
        assert_eq!(row.get_bytes("the_geom").unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn test_missing_column() {
        let row = sample_row();
        assert!(matches!(
            row.get_str("perimeter"),
            Err(StoreError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_type_mismatch() {
        let row = sample_row();
        let err = row.get_f64("nbrhood").unwrap_err();
        match err {
            StoreError::ColumnType {
                name,
                expected,
                actual,
            } => {
                assert_eq!(name, "nbrhood");
                assert_eq!(expected, "float");
                assert_eq!(actual, "text");
            }
            other => panic!("expected ColumnType, got {other:?}"),
        }
    }
}

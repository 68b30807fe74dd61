//! Error types for WKB decoding and encoding.

use thiserror::Error;

/// WKB codec errors.
///
/// Decode errors carry the byte offset (into the raw WKB record, after
/// base64 decoding) of the field that failed, so a corrupted row can be
/// diagnosed without a hex dump.
#[derive(Error, Debug)]
pub enum WkbError {
    /// base64 transport decode failure.
    #[error("transport decode error: {0}")]
    Transport(#[from] base64::DecodeError),

    /// Input ended before a required field.
    #[error("truncated WKB input at byte {offset}: {needed} more bytes needed")]
    Truncated { offset: usize, needed: usize },

    /// Byte-order marker was neither XDR (0) nor NDR (1).
    #[error("invalid byte-order marker {marker:#04x} at byte {offset}")]
    InvalidByteOrder { marker: u8, offset: usize },

    /// Geometry type tag outside the supported range.
    #[error("unknown geometry type tag {tag} at byte {offset}")]
    UnknownGeometryType { tag: u32, offset: usize },

    /// Declared element count cannot fit in the remaining input.
    #[error("declared count {count} at byte {offset} exceeds remaining {remaining} bytes")]
    CountOverflow {
        count: u32,
        offset: usize,
        remaining: usize,
    },

    /// A typed multi-geometry contained a child of the wrong type.
    #[error("expected {expected} element at byte {offset}")]
    MismatchedElement {
        expected: &'static str,
        offset: usize,
    },

    /// Collection nesting exceeded [`crate::MAX_NESTING_DEPTH`].
    #[error("geometry nesting exceeds {max} levels")]
    NestingTooDeep { max: usize },

    /// Bytes left over after the top-level geometry.
    #[error("{remaining} trailing bytes after geometry")]
    TrailingBytes { remaining: usize },

    /// Well-formed WKB feature this codec does not handle (Z/M
    /// coordinates), or a geometry variant with no WKB representation.
    #[error("unsupported WKB feature: {0}")]
    Unsupported(String),
}

/// Result type for WKB operations.
pub type Result<T> = std::result::Result<T, WkbError>;

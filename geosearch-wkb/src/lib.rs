//! Well-known-binary geometry codec for spatial search results.
//!
//! Spatial datastores hand geometry back as WKB wrapped in a text-safe
//! transport encoding: the raw WKB record is serialized big-endian (XDR)
//! and then base64 encoded. This crate decodes that transport form into
//! [`geo_types::Geometry`] values, and re-encodes geometries for fixtures
//! and round-trip verification.
//!
//! # Decoding
//!
//! Decoding is two-stage:
//!
//! 1. base64 transport decode (ASCII whitespace is tolerated — database
//!    `encode(..., 'base64')` output line-wraps at 76 columns)
//! 2. WKB parse into a structured geometry
//!
//! The WKB stage honors the per-record byte-order marker (XDR or NDR),
//! including inside nested collections — a collection serialized on one
//! machine may embed records produced on another.
//!
//! # Validation
//!
//! Malformed input never panics. Every read is bounds-checked first, and
//! declared element counts are validated against the remaining input
//! before any allocation, so a corrupted count cannot trigger an
//! out-of-memory abort. Errors carry the byte offset of the offending
//! field where one exists.
//!
//! # Example
//!
//! ```
//! use geo_types::{Geometry, Point};
//! use geosearch_wkb::{decode_transport, encode_transport, ByteOrder};
//!
//! let geom = Geometry::Point(Point::new(-122.41, 37.76));
//! let transport = encode_transport(&geom, ByteOrder::BigEndian).unwrap();
//! let decoded = decode_transport(&transport).unwrap();
//! assert_eq!(decoded, geom);
//! ```

mod decode;
mod encode;
mod error;
mod geometry;

pub use decode::{decode_transport, decode_wkb};
pub use encode::{encode_transport, encode_wkb};
pub use error::{Result, WkbError};
pub use geometry::{perimeter, ByteOrder, GeometryType};

/// Maximum nesting depth accepted for geometry collections.
///
/// Real feature data nests one or two levels; the cap exists so a
/// malicious or corrupted record cannot recurse the parser off the stack.
pub const MAX_NESTING_DEPTH: usize = 32;

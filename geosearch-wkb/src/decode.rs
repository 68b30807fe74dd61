//! Transport and WKB decoding.
//!
//! # WKB record layout
//!
//! ```text
//! marker:  u8            0 = XDR (big-endian), 1 = NDR (little-endian)
//! type:    u32           tag 1..=7, optionally OR'd with EWKB flag bits
//! [srid:   u32]          present iff the EWKB SRID flag is set (skipped)
//! body:                  per-type payload; nested records carry their
//!                        own marker and type
//! ```
//!
//! Counts and coordinates use the byte order declared by the enclosing
//! record's marker. Nested records re-declare theirs.

use crate::error::{Result, WkbError};
use crate::geometry::{ByteOrder, GeometryType};
use crate::MAX_NESTING_DEPTH;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use geo_types::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon,
};

/// EWKB flag: record carries Z coordinates.
const EWKB_Z: u32 = 0x8000_0000;
/// EWKB flag: record carries M coordinates.
const EWKB_M: u32 = 0x4000_0000;
/// EWKB flag: a 4-byte SRID follows the type word.
const EWKB_SRID: u32 = 0x2000_0000;

/// Decode a transport-encoded geometry: base64 text over XDR/NDR WKB.
///
/// ASCII whitespace is stripped before the base64 stage; datastore
/// `encode(..., 'base64')` output arrives line-wrapped.
pub fn decode_transport(bytes: &[u8]) -> Result<Geometry<f64>> {
    let compact: Vec<u8> = bytes
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    let wkb = STANDARD.decode(compact)?;
    decode_wkb(&wkb)
}

/// Decode a raw WKB byte sequence into a geometry.
///
/// The whole input must be consumed; trailing bytes are an error.
pub fn decode_wkb(bytes: &[u8]) -> Result<Geometry<f64>> {
    let mut reader = WkbReader::new(bytes);
    let geom = reader.read_geometry(0)?;
    if reader.remaining() > 0 {
        return Err(WkbError::TrailingBytes {
            remaining: reader.remaining(),
        });
    }
    Ok(geom)
}

/// Bounds-checked cursor over a WKB byte sequence.
struct WkbReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WkbReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Take `n` bytes, or report how many were missing.
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(WkbError::Truncated {
                offset: self.pos,
                needed: n - self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_u32(&mut self, order: ByteOrder) -> Result<u32> {
        let bytes: [u8; 4] = self.take(4)?.try_into().unwrap();
        Ok(match order {
            ByteOrder::BigEndian => u32::from_be_bytes(bytes),
            ByteOrder::LittleEndian => u32::from_le_bytes(bytes),
        })
    }

    fn read_f64(&mut self, order: ByteOrder) -> Result<f64> {
        let bytes: [u8; 8] = self.take(8)?.try_into().unwrap();
        Ok(match order {
            ByteOrder::BigEndian => f64::from_be_bytes(bytes),
            ByteOrder::LittleEndian => f64::from_le_bytes(bytes),
        })
    }

    fn read_coord(&mut self, order: ByteOrder) -> Result<Coord<f64>> {
        let x = self.read_f64(order)?;
        let y = self.read_f64(order)?;
        Ok(Coord { x, y })
    }

    /// Read an element count and validate it against the remaining input.
    ///
    /// `min_element_size` is the smallest possible encoding of one
    /// element; a count that cannot fit is rejected before allocation.
    fn read_count(&mut self, order: ByteOrder, min_element_size: usize) -> Result<usize> {
        let offset = self.pos;
        let count = self.read_u32(order)?;
        let needed = (count as usize).saturating_mul(min_element_size);
        if needed > self.remaining() {
            return Err(WkbError::CountOverflow {
                count,
                offset,
                remaining: self.remaining(),
            });
        }
        Ok(count as usize)
    }

    /// Read one WKB record: marker, type word, optional SRID, body.
    fn read_geometry(&mut self, depth: usize) -> Result<Geometry<f64>> {
        if depth > MAX_NESTING_DEPTH {
            return Err(WkbError::NestingTooDeep {
                max: MAX_NESTING_DEPTH,
            });
        }

        let marker_offset = self.pos;
        let marker = self.read_u8()?;
        let order = ByteOrder::from_marker(marker).ok_or(WkbError::InvalidByteOrder {
            marker,
            offset: marker_offset,
        })?;

        let tag_offset = self.pos;
        let type_word = self.read_u32(order)?;
        if type_word & (EWKB_Z | EWKB_M) != 0 {
            return Err(WkbError::Unsupported(
                "Z/M coordinate dimensions".to_string(),
            ));
        }
        let tag = type_word & !EWKB_SRID;
        if (1000..4000).contains(&tag) {
            return Err(WkbError::Unsupported(format!(
                "ISO Z/M geometry type tag {tag}"
            )));
        }
        let geom_type = GeometryType::from_wkb_tag(tag).ok_or(WkbError::UnknownGeometryType {
            tag,
            offset: tag_offset,
        })?;
        if type_word & EWKB_SRID != 0 {
            // SRID accompanies EWKB output; coordinate reference handling
            // is outside this codec, so the value is skipped.
            self.read_u32(order)?;
        }

        match geom_type {
            GeometryType::Point => Ok(Geometry::Point(Point::from(self.read_coord(order)?))),
            GeometryType::LineString => {
                Ok(Geometry::LineString(self.read_linestring_body(order)?))
            }
            GeometryType::Polygon => Ok(Geometry::Polygon(self.read_polygon_body(order)?)),
            GeometryType::MultiPoint => {
                let count = self.read_count(order, 5)?;
                let mut points = Vec::with_capacity(count);
                for _ in 0..count {
                    let offset = self.pos;
                    match self.read_geometry(depth + 1)? {
                        Geometry::Point(p) => points.push(p),
                        _ => {
                            return Err(WkbError::MismatchedElement {
                                expected: GeometryType::Point.name(),
                                offset,
                            })
                        }
                    }
                }
                Ok(Geometry::MultiPoint(MultiPoint(points)))
            }
            GeometryType::MultiLineString => {
                let count = self.read_count(order, 5)?;
                let mut lines = Vec::with_capacity(count);
                for _ in 0..count {
                    let offset = self.pos;
                    match self.read_geometry(depth + 1)? {
                        Geometry::LineString(ls) => lines.push(ls),
                        _ => {
                            return Err(WkbError::MismatchedElement {
                                expected: GeometryType::LineString.name(),
                                offset,
                            })
                        }
                    }
                }
                Ok(Geometry::MultiLineString(MultiLineString(lines)))
            }
            GeometryType::MultiPolygon => {
                let count = self.read_count(order, 5)?;
                let mut polys = Vec::with_capacity(count);
                for _ in 0..count {
                    let offset = self.pos;
                    match self.read_geometry(depth + 1)? {
                        Geometry::Polygon(p) => polys.push(p),
                        _ => {
                            return Err(WkbError::MismatchedElement {
                                expected: GeometryType::Polygon.name(),
                                offset,
                            })
                        }
                    }
                }
                Ok(Geometry::MultiPolygon(MultiPolygon(polys)))
            }
            GeometryType::GeometryCollection => {
                let count = self.read_count(order, 5)?;
                let mut children = Vec::with_capacity(count);
                for _ in 0..count {
                    children.push(self.read_geometry(depth + 1)?);
                }
                Ok(Geometry::GeometryCollection(GeometryCollection(children)))
            }
        }
    }

    fn read_linestring_body(&mut self, order: ByteOrder) -> Result<LineString<f64>> {
        let count = self.read_count(order, 16)?;
        let mut coords = Vec::with_capacity(count);
        for _ in 0..count {
            coords.push(self.read_coord(order)?);
        }
        Ok(LineString::new(coords))
    }

    fn read_polygon_body(&mut self, order: ByteOrder) -> Result<Polygon<f64>> {
        let ring_count = self.read_count(order, 4)?;
        let mut rings = Vec::with_capacity(ring_count);
        for _ in 0..ring_count {
            rings.push(self.read_linestring_body(order)?);
        }
        let mut rings = rings.into_iter();
        let exterior = rings.next().unwrap_or_else(|| LineString::new(Vec::new()));
        Ok(Polygon::new(exterior, rings.collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode_wkb;

    /// Hand-assembled big-endian WKB point.
    fn xdr_point(x: f64, y: f64) -> Vec<u8> {
        let mut buf = vec![0u8];
        buf.extend_from_slice(&1u32.to_be_bytes());
        buf.extend_from_slice(&x.to_be_bytes());
        buf.extend_from_slice(&y.to_be_bytes());
        buf
    }

    #[test]
    fn test_decode_xdr_point() {
        let geom = decode_wkb(&xdr_point(-122.41, 37.76)).unwrap();
        assert_eq!(geom, Geometry::Point(Point::new(-122.41, 37.76)));
    }

    #[test]
    fn test_decode_ndr_point() {
        let mut buf = vec![1u8];
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf.extend_from_slice(&3.5f64.to_le_bytes());
        buf.extend_from_slice(&(-7.25f64).to_le_bytes());
        let geom = decode_wkb(&buf).unwrap();
        assert_eq!(geom, Geometry::Point(Point::new(3.5, -7.25)));
    }

    #[test]
    fn test_decode_skips_ewkb_srid() {
        let mut buf = vec![0u8];
        buf.extend_from_slice(&(1u32 | EWKB_SRID).to_be_bytes());
        buf.extend_from_slice(&4326u32.to_be_bytes());
        buf.extend_from_slice(&1.0f64.to_be_bytes());
        buf.extend_from_slice(&2.0f64.to_be_bytes());
        let geom = decode_wkb(&buf).unwrap();
        assert_eq!(geom, Geometry::Point(Point::new(1.0, 2.0)));
    }

    #[test]
    fn test_decode_rejects_z_flag() {
        let mut buf = vec![0u8];
        buf.extend_from_slice(&(1u32 | EWKB_Z).to_be_bytes());
        buf.extend_from_slice(&[0u8; 24]);
        assert!(matches!(
            decode_wkb(&buf),
            Err(WkbError::Unsupported(_))
        ));
    }

    #[test]
    fn test_decode_rejects_iso_z_tag() {
        let mut buf = vec![0u8];
        buf.extend_from_slice(&1001u32.to_be_bytes());
        buf.extend_from_slice(&[0u8; 24]);
        assert!(matches!(decode_wkb(&buf), Err(WkbError::Unsupported(_))));
    }

    #[test]
    fn test_truncated_point_reports_offset() {
        // 13 bytes: marker + tag + x, no y.
        let full = xdr_point(1.0, 2.0);
        let err = decode_wkb(&full[..13]).unwrap_err();
        match err {
            WkbError::Truncated { offset, needed } => {
                assert_eq!(offset, 13);
                assert_eq!(needed, 8);
            }
            other => panic!("expected Truncated, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(
            decode_wkb(&[]),
            Err(WkbError::Truncated { offset: 0, .. })
        ));
    }

    #[test]
    fn test_invalid_byte_order_marker() {
        let err = decode_wkb(&[9u8, 0, 0, 0, 1]).unwrap_err();
        assert!(matches!(
            err,
            WkbError::InvalidByteOrder {
                marker: 9,
                offset: 0
            }
        ));
    }

    #[test]
    fn test_unknown_type_tag() {
        let mut buf = vec![0u8];
        buf.extend_from_slice(&99u32.to_be_bytes());
        let err = decode_wkb(&buf).unwrap_err();
        assert!(matches!(
            err,
            WkbError::UnknownGeometryType { tag: 99, offset: 1 }
        ));
    }

    #[test]
    fn test_count_overflow_rejected_before_allocation() {
        // LINESTRING claiming u32::MAX points with 8 bytes of payload.
        let mut buf = vec![0u8];
        buf.extend_from_slice(&2u32.to_be_bytes());
        buf.extend_from_slice(&u32::MAX.to_be_bytes());
        buf.extend_from_slice(&[0u8; 8]);
        let err = decode_wkb(&buf).unwrap_err();
        assert!(matches!(
            err,
            WkbError::CountOverflow {
                count: u32::MAX,
                ..
            }
        ));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut buf = xdr_point(1.0, 2.0);
        buf.push(0xAB);
        assert!(matches!(
            decode_wkb(&buf),
            Err(WkbError::TrailingBytes { remaining: 1 })
        ));
    }

    #[test]
    fn test_truncated_polygon_ring() {
        // POLYGON with one ring declaring 4 points but carrying 2.
        let mut buf = vec![0u8];
        buf.extend_from_slice(&3u32.to_be_bytes());
        buf.extend_from_slice(&1u32.to_be_bytes());
        buf.extend_from_slice(&4u32.to_be_bytes());
        for v in [0.0f64, 0.0, 1.0, 0.0] {
            buf.extend_from_slice(&v.to_be_bytes());
        }
        let err = decode_wkb(&buf).unwrap_err();
        assert!(matches!(err, WkbError::CountOverflow { count: 4, .. }));
    }

    #[test]
    fn test_multipoint_child_type_enforced() {
        // MULTIPOINT whose single child is a LINESTRING record.
        let mut buf = vec![0u8];
        buf.extend_from_slice(&4u32.to_be_bytes());
        buf.extend_from_slice(&1u32.to_be_bytes());
        buf.push(0);
        buf.extend_from_slice(&2u32.to_be_bytes());
        buf.extend_from_slice(&0u32.to_be_bytes());
        let err = decode_wkb(&buf).unwrap_err();
        assert!(matches!(
            err,
            WkbError::MismatchedElement {
                expected: "POINT",
                ..
            }
        ));
    }

    #[test]
    fn test_nesting_depth_capped() {
        // A tower of single-child collections deeper than the cap.
        let mut buf = Vec::new();
        for _ in 0..(MAX_NESTING_DEPTH + 2) {
            buf.push(0);
            buf.extend_from_slice(&7u32.to_be_bytes());
            buf.extend_from_slice(&1u32.to_be_bytes());
        }
        let err = decode_wkb(&buf).unwrap_err();
        assert!(matches!(err, WkbError::NestingTooDeep { .. }));
    }

    #[test]
    fn test_empty_collection_is_legal() {
        let mut buf = vec![0u8];
        buf.extend_from_slice(&7u32.to_be_bytes());
        buf.extend_from_slice(&0u32.to_be_bytes());
        let geom = decode_wkb(&buf).unwrap();
        match geom {
            Geometry::GeometryCollection(gc) => assert!(gc.0.is_empty()),
            other => panic!("expected collection, got {other:?}"),
        }
    }

    #[test]
    fn test_mixed_byte_orders_in_collection() {
        // XDR collection wrapping an NDR point: each record's marker wins.
        let mut inner = vec![1u8];
        inner.extend_from_slice(&1u32.to_le_bytes());
        inner.extend_from_slice(&5.0f64.to_le_bytes());
        inner.extend_from_slice(&6.0f64.to_le_bytes());

        let mut buf = vec![0u8];
        buf.extend_from_slice(&7u32.to_be_bytes());
        buf.extend_from_slice(&1u32.to_be_bytes());
        buf.extend_from_slice(&inner);

        let geom = decode_wkb(&buf).unwrap();
        match geom {
            Geometry::GeometryCollection(gc) => {
                assert_eq!(gc.0[0], Geometry::Point(Point::new(5.0, 6.0)));
            }
            other => panic!("expected collection, got {other:?}"),
        }
    }

    #[test]
    fn test_transport_decode_tolerates_line_wrapping() {
        let geom = Geometry::Point(Point::new(-122.41, 37.76));
        let wkb = encode_wkb(&geom, ByteOrder::BigEndian).unwrap();
        let mut encoded = STANDARD.encode(&wkb);
        // Simulate the 76-column wrapping of database base64 output.
        encoded.insert(10, '\n');
        encoded.insert(0, ' ');
        let decoded = decode_transport(encoded.as_bytes()).unwrap();
        assert_eq!(decoded, geom);
    }

    #[test]
    fn test_transport_decode_bad_base64() {
        assert!(matches!(
            decode_transport(b"!!!not-base64!!!"),
            Err(WkbError::Transport(_))
        ));
    }
}

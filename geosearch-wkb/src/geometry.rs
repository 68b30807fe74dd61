//! Geometry type tags and measurement helpers.

use geo::line_measures::LengthMeasurable;
use geo::Euclidean;
use geo_types::Geometry;
use serde::{Deserialize, Serialize};

/// WKB byte-order variants.
///
/// Each WKB record begins with a one-byte marker selecting the byte order
/// of every integer and float that follows, up to the next nested record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ByteOrder {
    /// XDR: big-endian (marker byte 0).
    BigEndian,
    /// NDR: little-endian (marker byte 1).
    LittleEndian,
}

impl ByteOrder {
    /// Parse a WKB byte-order marker.
    pub fn from_marker(marker: u8) -> Option<Self> {
        match marker {
            0 => Some(ByteOrder::BigEndian),
            1 => Some(ByteOrder::LittleEndian),
            _ => None,
        }
    }

    /// The marker byte for this order.
    pub fn marker(&self) -> u8 {
        match self {
            ByteOrder::BigEndian => 0,
            ByteOrder::LittleEndian => 1,
        }
    }
}

/// Geometry type discriminator, numbered by WKB type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u32)]
pub enum GeometryType {
    Point = 1,
    LineString = 2,
    Polygon = 3,
    MultiPoint = 4,
    MultiLineString = 5,
    MultiPolygon = 6,
    GeometryCollection = 7,
}

impl GeometryType {
    /// Parse a WKB type tag (flag bits already masked off).
    pub fn from_wkb_tag(tag: u32) -> Option<Self> {
        match tag {
            1 => Some(GeometryType::Point),
            2 => Some(GeometryType::LineString),
            3 => Some(GeometryType::Polygon),
            4 => Some(GeometryType::MultiPoint),
            5 => Some(GeometryType::MultiLineString),
            6 => Some(GeometryType::MultiPolygon),
            7 => Some(GeometryType::GeometryCollection),
            _ => None,
        }
    }

    /// The WKB type tag for this geometry type.
    pub fn wkb_tag(&self) -> u32 {
        *self as u32
    }

    /// Classify a geo-types Geometry.
    ///
    /// Returns `None` for variants with no WKB representation
    /// (`Line`, `Rect`, `Triangle`).
    pub fn from_geometry(geom: &Geometry<f64>) -> Option<Self> {
        match geom {
            Geometry::Point(_) => Some(GeometryType::Point),
            Geometry::LineString(_) => Some(GeometryType::LineString),
            Geometry::Polygon(_) => Some(GeometryType::Polygon),
            Geometry::MultiPoint(_) => Some(GeometryType::MultiPoint),
            Geometry::MultiLineString(_) => Some(GeometryType::MultiLineString),
            Geometry::MultiPolygon(_) => Some(GeometryType::MultiPolygon),
            Geometry::GeometryCollection(_) => Some(GeometryType::GeometryCollection),
            _ => None,
        }
    }

    /// Human-readable name, as used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            GeometryType::Point => "POINT",
            GeometryType::LineString => "LINESTRING",
            GeometryType::Polygon => "POLYGON",
            GeometryType::MultiPoint => "MULTIPOINT",
            GeometryType::MultiLineString => "MULTILINESTRING",
            GeometryType::MultiPolygon => "MULTIPOLYGON",
            GeometryType::GeometryCollection => "GEOMETRYCOLLECTION",
        }
    }
}

/// Perimeter of a geometry in coordinate units.
///
/// Matches datastore `Perimeter()` semantics: only areal geometries
/// contribute (ring lengths, interior rings included); points and lines
/// measure zero. Collections sum their children.
pub fn perimeter(geom: &Geometry<f64>) -> f64 {
    match geom {
        Geometry::Polygon(poly) => polygon_perimeter(poly),
        Geometry::MultiPolygon(mp) => mp.0.iter().map(polygon_perimeter).sum(),
        Geometry::GeometryCollection(gc) => gc.0.iter().map(perimeter).sum(),
        _ => 0.0,
    }
}

fn polygon_perimeter(poly: &geo_types::Polygon<f64>) -> f64 {
    let mut total = poly.exterior().length(&Euclidean);
    for ring in poly.interiors() {
        total += ring.length(&Euclidean);
    }
    total
}

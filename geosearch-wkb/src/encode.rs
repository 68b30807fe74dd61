//! WKB and transport encoding.
//!
//! The encoder is the inverse of [`crate::decode`]: it exists so fixtures
//! can be produced in the same transport form the datastore emits, and so
//! decode/encode round-trips can be verified. Either byte order can be
//! requested; the transport form uses XDR to match datastore output.

use crate::error::{Result, WkbError};
use crate::geometry::{ByteOrder, GeometryType};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use geo_types::{Coord, Geometry, LineString, Polygon};

/// Encode a geometry as raw WKB in the given byte order.
///
/// Variants without a WKB representation (`Line`, `Rect`, `Triangle`)
/// are rejected.
pub fn encode_wkb(geom: &Geometry<f64>, order: ByteOrder) -> Result<Vec<u8>> {
    let mut writer = WkbWriter::new(order);
    writer.write_geometry(geom)?;
    Ok(writer.buf)
}

/// Encode a geometry in transport form: base64 text over big-endian WKB.
pub fn encode_transport(geom: &Geometry<f64>, order: ByteOrder) -> Result<Vec<u8>> {
    let wkb = encode_wkb(geom, order)?;
    Ok(STANDARD.encode(wkb).into_bytes())
}

struct WkbWriter {
    buf: Vec<u8>,
    order: ByteOrder,
}

impl WkbWriter {
    fn new(order: ByteOrder) -> Self {
        Self {
            buf: Vec::new(),
            order,
        }
    }

    fn write_u32(&mut self, value: u32) {
        match self.order {
            ByteOrder::BigEndian => self.buf.extend_from_slice(&value.to_be_bytes()),
            ByteOrder::LittleEndian => self.buf.extend_from_slice(&value.to_le_bytes()),
        }
    }

    fn write_f64(&mut self, value: f64) {
        match self.order {
            ByteOrder::BigEndian => self.buf.extend_from_slice(&value.to_be_bytes()),
            ByteOrder::LittleEndian => self.buf.extend_from_slice(&value.to_le_bytes()),
        }
    }

    fn write_coord(&mut self, coord: &Coord<f64>) {
        self.write_f64(coord.x);
        self.write_f64(coord.y);
    }

    fn write_header(&mut self, geom_type: GeometryType) {
        self.buf.push(self.order.marker());
        self.write_u32(geom_type.wkb_tag());
    }

    fn write_geometry(&mut self, geom: &Geometry<f64>) -> Result<()> {
        let geom_type = GeometryType::from_geometry(geom).ok_or_else(|| {
            WkbError::Unsupported(format!(
                "geometry variant {:?} has no WKB representation",
                std::mem::discriminant(geom)
            ))
        })?;
        self.write_header(geom_type);

        match geom {
            Geometry::Point(p) => self.write_coord(&p.0),
            Geometry::LineString(ls) => self.write_linestring_body(ls),
            Geometry::Polygon(poly) => self.write_polygon_body(poly),
            Geometry::MultiPoint(mp) => {
                self.write_u32(mp.0.len() as u32);
                for p in &mp.0 {
                    self.write_geometry(&Geometry::Point(*p))?;
                }
            }
            Geometry::MultiLineString(mls) => {
                self.write_u32(mls.0.len() as u32);
                for ls in &mls.0 {
                    self.write_geometry(&Geometry::LineString(ls.clone()))?;
                }
            }
            Geometry::MultiPolygon(mp) => {
                self.write_u32(mp.0.len() as u32);
                for poly in &mp.0 {
                    self.write_geometry(&Geometry::Polygon(poly.clone()))?;
                }
            }
            Geometry::GeometryCollection(gc) => {
                self.write_u32(gc.0.len() as u32);
                for child in &gc.0 {
                    self.write_geometry(child)?;
                }
            }
            // from_geometry returned a type above; unreachable for the rest.
            _ => unreachable!("variant rejected by GeometryType::from_geometry"),
        }
        Ok(())
    }

    fn write_linestring_body(&mut self, ls: &LineString<f64>) {
        self.write_u32(ls.0.len() as u32);
        for coord in &ls.0 {
            self.write_coord(coord);
        }
    }

    fn write_polygon_body(&mut self, poly: &Polygon<f64>) {
        self.write_u32(1 + poly.interiors().len() as u32);
        self.write_linestring_body(poly.exterior());
        for ring in poly.interiors() {
            self.write_linestring_body(ring);
        }
    }
}

//! Geometry values, type tags, and WKT helpers
//!
//! Geometries are stored in a table's geometry column as WKT text and parsed
//! on demand. WKT is the source of truth: it survives every tabular
//! operation unchanged, carries optional Z/M ordinates that the planar
//! engine does not model, and keeps null handling trivial (a null cell is a
//! null geometry). Parsing targets `geo-types`, which backs all
//! computational operations (bounds, predicates, union, distance).

use crate::error::{GeoFrameError, Result};
use geo::BoundingRect;
use geo_types::Geometry;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Geometry type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GeometryType {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
}

impl GeometryType {
    /// Classify a geo-types Geometry.
    pub fn from_geometry(geom: &Geometry<f64>) -> Self {
        match geom {
            Geometry::Point(_) => GeometryType::Point,
            Geometry::MultiPoint(_) => GeometryType::MultiPoint,
            Geometry::Line(_) | Geometry::LineString(_) => GeometryType::LineString,
            Geometry::MultiLineString(_) => GeometryType::MultiLineString,
            Geometry::Rect(_) | Geometry::Triangle(_) | Geometry::Polygon(_) => {
                GeometryType::Polygon
            }
            Geometry::MultiPolygon(_) => GeometryType::MultiPolygon,
            Geometry::GeometryCollection(_) => GeometryType::GeometryCollection,
        }
    }

    /// The single/multi family this type belongs to, if it has one.
    pub fn family(&self) -> Option<GeometryFamily> {
        match self {
            GeometryType::Point | GeometryType::MultiPoint => Some(GeometryFamily::Point),
            GeometryType::LineString | GeometryType::MultiLineString => Some(GeometryFamily::Line),
            GeometryType::Polygon | GeometryType::MultiPolygon => Some(GeometryFamily::Polygon),
            GeometryType::GeometryCollection => None,
        }
    }
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GeometryType::Point => "Point",
            GeometryType::LineString => "LineString",
            GeometryType::Polygon => "Polygon",
            GeometryType::MultiPoint => "MultiPoint",
            GeometryType::MultiLineString => "MultiLineString",
            GeometryType::MultiPolygon => "MultiPolygon",
            GeometryType::GeometryCollection => "GeometryCollection",
        };
        write!(f, "{}", name)
    }
}

/// Variant family shared by the single and multi form of a geometry type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryFamily {
    Point,
    Line,
    Polygon,
}

/// Axis-aligned bounding box in the table's CRS units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Compute from a geo-types Geometry. `None` for empty geometries.
    pub fn from_geometry(geom: &Geometry<f64>) -> Option<Self> {
        let rect = geom.bounding_rect()?;
        Some(Self {
            min_x: rect.min().x,
            min_y: rect.min().y,
            max_x: rect.max().x,
            max_y: rect.max().y,
        })
    }

    /// Smallest box covering both `self` and `other`.
    pub fn merge(&self, other: &BBox) -> BBox {
        BBox {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Check if this bbox intersects another. Used as a cheap prefilter
    /// before exact predicate evaluation in spatial joins.
    pub fn intersects(&self, other: &BBox) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }
}

/// Parse WKT text to a geo-types Geometry.
pub fn parse_wkt(text: &str) -> Result<Geometry<f64>> {
    wkt::Wkt::from_str(text)
        .map_err(|e| GeoFrameError::Format(format!("WKT parse error: {}", e)))
        .and_then(|w| {
            w.try_into().map_err(|e: wkt::conversion::Error| {
                GeoFrameError::Format(format!("WKT conversion error: {:?}", e))
            })
        })
}

/// Parse WKT text into the raw WKT structure, keeping Z/M ordinates.
pub fn parse_wkt_raw(text: &str) -> Result<wkt::Wkt<f64>> {
    wkt::Wkt::from_str(text).map_err(|e| GeoFrameError::Format(format!("WKT parse error: {}", e)))
}

/// Serialize a geo-types Geometry to WKT text.
pub fn to_wkt(geom: &Geometry<f64>) -> String {
    use wkt::ToWkt;
    geom.wkt_string()
}

/// Format a point as WKT, annotating the Z/M dimensions actually present.
pub fn format_point_wkt(x: f64, y: f64, z: Option<f64>, m: Option<f64>) -> String {
    match (z, m) {
        (None, None) => format!("POINT({} {})", x, y),
        (Some(z), None) => format!("POINT Z({} {} {})", x, y, z),
        (None, Some(m)) => format!("POINT M({} {} {})", x, y, m),
        (Some(z), Some(m)) => format!("POINT ZM({} {} {} {})", x, y, z, m),
    }
}

/// Apply a pointwise transform to every X/Y coordinate of a raw WKT value,
/// leaving Z/M ordinates untouched.
///
/// The transform may fail (a coordinate outside the valid domain of a
/// projection); the first failure aborts the whole walk.
pub fn map_wkt_xy<F>(wkt: wkt::Wkt<f64>, f: &F) -> Result<wkt::Wkt<f64>>
where
    F: Fn(f64, f64) -> Result<(f64, f64)>,
{
    use wkt::Wkt;
    Ok(match wkt {
        Wkt::Point(p) => Wkt::Point(map_point(p, f)?),
        Wkt::LineString(ls) => Wkt::LineString(map_line_string(ls, f)?),
        Wkt::Polygon(poly) => Wkt::Polygon(map_polygon(poly, f)?),
        Wkt::MultiPoint(mp) => {
            let points = mp
                .0
                .into_iter()
                .map(|p| map_point(p, f))
                .collect::<Result<Vec<_>>>()?;
            Wkt::MultiPoint(wkt::types::MultiPoint(points))
        }
        Wkt::MultiLineString(mls) => {
            let lines = mls
                .0
                .into_iter()
                .map(|ls| map_line_string(ls, f))
                .collect::<Result<Vec<_>>>()?;
            Wkt::MultiLineString(wkt::types::MultiLineString(lines))
        }
        Wkt::MultiPolygon(mpoly) => {
            let polys = mpoly
                .0
                .into_iter()
                .map(|p| map_polygon(p, f))
                .collect::<Result<Vec<_>>>()?;
            Wkt::MultiPolygon(wkt::types::MultiPolygon(polys))
        }
        Wkt::GeometryCollection(gc) => {
            let members = gc
                .0
                .into_iter()
                .map(|g| map_wkt_xy(g, f))
                .collect::<Result<Vec<_>>>()?;
            Wkt::GeometryCollection(wkt::types::GeometryCollection(members))
        }
    })
}

fn map_coord<F>(coord: wkt::types::Coord<f64>, f: &F) -> Result<wkt::types::Coord<f64>>
where
    F: Fn(f64, f64) -> Result<(f64, f64)>,
{
    let (x, y) = f(coord.x, coord.y)?;
    Ok(wkt::types::Coord {
        x,
        y,
        z: coord.z,
        m: coord.m,
    })
}

fn map_point<F>(point: wkt::types::Point<f64>, f: &F) -> Result<wkt::types::Point<f64>>
where
    F: Fn(f64, f64) -> Result<(f64, f64)>,
{
    Ok(wkt::types::Point(match point.0 {
        Some(coord) => Some(map_coord(coord, f)?),
        None => None,
    }))
}

fn map_line_string<F>(ls: wkt::types::LineString<f64>, f: &F) -> Result<wkt::types::LineString<f64>>
where
    F: Fn(f64, f64) -> Result<(f64, f64)>,
{
    let coords = ls
        .0
        .into_iter()
        .map(|c| map_coord(c, f))
        .collect::<Result<Vec<_>>>()?;
    Ok(wkt::types::LineString(coords))
}

fn map_polygon<F>(poly: wkt::types::Polygon<f64>, f: &F) -> Result<wkt::types::Polygon<f64>>
where
    F: Fn(f64, f64) -> Result<(f64, f64)>,
{
    let rings = poly
        .0
        .into_iter()
        .map(|ring| map_line_string(ring, f))
        .collect::<Result<Vec<_>>>()?;
    Ok(wkt::types::Polygon(rings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_point() {
        let geom = parse_wkt("POINT(-78.643 35.778)").unwrap();
        assert_eq!(GeometryType::from_geometry(&geom), GeometryType::Point);
    }

    #[test]
    fn test_parse_polygon_bbox() {
        let geom = parse_wkt("POLYGON((0 0, 10 0, 10 20, 0 20, 0 0))").unwrap();
        let bbox = BBox::from_geometry(&geom).unwrap();
        assert_eq!(bbox.min_x, 0.0);
        assert_eq!(bbox.max_x, 10.0);
        assert_eq!(bbox.min_y, 0.0);
        assert_eq!(bbox.max_y, 20.0);
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(parse_wkt("POINT OF NO RETURN").is_err());
    }

    #[test]
    fn test_bbox_merge() {
        let a = BBox::new(0.0, 0.0, 1.0, 1.0);
        let b = BBox::new(-1.0, 0.5, 0.5, 2.0);
        let merged = a.merge(&b);
        assert_eq!(merged, BBox::new(-1.0, 0.0, 1.0, 2.0));
    }

    #[test]
    fn test_bbox_intersects() {
        let a = BBox::new(0.0, 0.0, 2.0, 2.0);
        assert!(a.intersects(&BBox::new(1.0, 1.0, 3.0, 3.0)));
        assert!(!a.intersects(&BBox::new(3.0, 3.0, 4.0, 4.0)));
    }

    #[test]
    fn test_family() {
        assert_eq!(
            GeometryType::MultiPolygon.family(),
            Some(GeometryFamily::Polygon)
        );
        assert_eq!(GeometryType::Point.family(), Some(GeometryFamily::Point));
        assert_eq!(GeometryType::GeometryCollection.family(), None);
    }

    #[test]
    fn test_format_point_roundtrip() {
        let text = format_point_wkt(-78.643, 35.778, None, None);
        let geom = parse_wkt(&text).unwrap();
        match geom {
            Geometry::Point(p) => {
                assert_eq!(p.x(), -78.643);
                assert_eq!(p.y(), 35.778);
            }
            other => panic!("expected point, got {:?}", other),
        }
    }

    #[test]
    fn test_format_point_z_preserved() {
        let text = format_point_wkt(1.0, 2.0, Some(3.0), None);
        let raw = parse_wkt_raw(&text).unwrap();
        match raw {
            wkt::Wkt::Point(p) => {
                let coord = p.0.expect("non-empty point");
                assert_eq!(coord.z, Some(3.0));
                assert_eq!(coord.m, None);
            }
            other => panic!("expected point, got {:?}", other),
        }
    }

    #[test]
    fn test_map_wkt_xy_shifts_and_keeps_z() {
        let raw = parse_wkt_raw("POINT Z(1 2 3)").unwrap();
        let shifted = map_wkt_xy(raw, &|x, y| Ok((x + 10.0, y + 20.0))).unwrap();
        match shifted {
            wkt::Wkt::Point(p) => {
                let coord = p.0.unwrap();
                assert_eq!(coord.x, 11.0);
                assert_eq!(coord.y, 22.0);
                assert_eq!(coord.z, Some(3.0));
            }
            other => panic!("expected point, got {:?}", other),
        }
    }
}

//! Constructors: coordinate columns and external sources
//!
//! The constructor family is a closed set, one per source kind: coordinate
//! columns in an attribute frame, a delimited text file with a WKT column,
//! or an in-memory geometry sequence. Each has an explicit contract instead
//! of a single overloaded dispatch.

use crate::crs::Crs;
use crate::error::{GeoFrameError, Result};
use crate::geometry::{self, format_point_wkt};
use crate::naming;
use crate::reader::{CsvReader, Reader};
use crate::table::types::ScalarValue;
use crate::table::SpatialTable;
use geo_types::Geometry;
use polars::prelude::*;
use std::path::PathBuf;
use tracing::debug;

/// Column names feeding the point constructor.
#[derive(Debug, Clone, Copy)]
pub struct PointColumns<'a> {
    pub x: &'a str,
    pub y: &'a str,
    pub z: Option<&'a str>,
    pub m: Option<&'a str>,
}

impl<'a> PointColumns<'a> {
    /// Plain 2-D points from an X and a Y column.
    pub fn xy(x: &'a str, y: &'a str) -> Self {
        Self {
            x,
            y,
            z: None,
            m: None,
        }
    }

    /// Also read elevation from `z`.
    pub fn with_z(mut self, z: &'a str) -> Self {
        self.z = Some(z);
        self
    }

    /// Also read a measure value from `m`.
    pub fn with_m(mut self, m: &'a str) -> Self {
        self.m = Some(m);
        self
    }
}

/// Identifies an external geometry-bearing dataset.
#[derive(Debug, Clone)]
pub enum SourceDescriptor {
    /// A delimited text file whose geometry column holds WKT.
    ///
    /// Delimited text has no in-band CRS declaration, so `crs` here *is* the
    /// declaration; leaving it empty (and supplying no override) fails with
    /// `MissingCrs`.
    Csv {
        path: PathBuf,
        geometry_column: Option<String>,
        crs: Option<Crs>,
    },
    /// An in-memory attribute frame plus a parallel geometry sequence.
    Memory {
        df: DataFrame,
        geometries: Vec<Option<Geometry<f64>>>,
        crs: Crs,
    },
}

impl SpatialTable {
    /// Build a point table from coordinate columns of an attribute frame.
    ///
    /// One Point per row, coordinates taken from the named columns; all
    /// attribute columns are retained unchanged. `crs` is attached as a
    /// label: no validation, no transformation. Fails with
    /// `NamingConflict` when the frame already has a column named
    /// [`naming::GEOMETRY_COLUMN`].
    ///
    /// Tolerance is row-granular: a row whose X or Y is null or non-numeric
    /// gets a null geometry and keeps its other attributes. Numeric text
    /// (`"35.778"`) counts as numeric. Z/M columns, when named, add those
    /// ordinates to rows that have them.
    pub fn from_coordinate_columns(
        df: DataFrame,
        columns: PointColumns<'_>,
        crs: Crs,
    ) -> Result<Self> {
        let names = df
            .get_column_names()
            .into_iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>();
        if !naming::is_free(&names, naming::GEOMETRY_COLUMN) {
            return Err(GeoFrameError::NamingConflict(
                naming::GEOMETRY_COLUMN.to_string(),
            ));
        }

        let x = df.column(columns.x)?.as_materialized_series().clone();
        let y = df.column(columns.y)?.as_materialized_series().clone();
        let z = columns
            .z
            .map(|name| df.column(name).map(|c| c.as_materialized_series().clone()))
            .transpose()?;
        let m = columns
            .m
            .map(|name| df.column(name).map(|c| c.as_materialized_series().clone()))
            .transpose()?;

        let mut wkt = Vec::with_capacity(df.height());
        let mut nulled = 0usize;
        for idx in 0..df.height() {
            let text = match (coord_at(&x, idx), coord_at(&y, idx)) {
                (Some(px), Some(py)) => {
                    let pz = z.as_ref().and_then(|s| coord_at(s, idx));
                    let pm = m.as_ref().and_then(|s| coord_at(s, idx));
                    Some(format_point_wkt(px, py, pz, pm))
                }
                _ => {
                    nulled += 1;
                    None
                }
            };
            wkt.push(text);
        }
        if nulled > 0 {
            debug!(rows = nulled, "rows with missing coordinates got null geometry");
        }

        let series = Series::new(naming::GEOMETRY_COLUMN.into(), wkt);
        let df = df.hstack(&[series.into_column()])?;
        Self::from_parts_unchecked(df, naming::GEOMETRY_COLUMN.to_string(), crs)
    }

    /// Build a table from an external geometry-bearing source.
    ///
    /// The declared CRS comes from the descriptor; `crs_override`, when
    /// given, **relabels only**; it never reprojects. Fails with `Format`
    /// when the source cannot be decoded and `MissingCrs` when neither the
    /// descriptor nor the caller supplies a CRS.
    pub fn from_existing_source(
        descriptor: SourceDescriptor,
        crs_override: Option<Crs>,
    ) -> Result<Self> {
        match descriptor {
            SourceDescriptor::Csv {
                path,
                geometry_column,
                crs,
            } => {
                let crs = crs_override.or(crs).ok_or(GeoFrameError::MissingCrs)?;
                let geometry_column =
                    geometry_column.unwrap_or_else(|| naming::GEOMETRY_COLUMN.to_string());
                let df = CsvReader::new(path).read()?;
                // from_parts parses every WKT cell; an undecodable source
                // fails here as a whole.
                Self::from_parts(df, geometry_column, crs)
            }
            SourceDescriptor::Memory {
                df,
                geometries,
                crs,
            } => {
                if geometries.len() != df.height() {
                    return Err(GeoFrameError::Format(format!(
                        "geometry sequence length {} does not match row count {}",
                        geometries.len(),
                        df.height()
                    )));
                }
                let names = df
                    .get_column_names()
                    .into_iter()
                    .map(|n| n.to_string())
                    .collect::<Vec<_>>();
                if !naming::is_free(&names, naming::GEOMETRY_COLUMN) {
                    return Err(GeoFrameError::NamingConflict(
                        naming::GEOMETRY_COLUMN.to_string(),
                    ));
                }
                let wkt: Vec<Option<String>> = geometries
                    .iter()
                    .map(|g| g.as_ref().map(geometry::to_wkt))
                    .collect();
                let series = Series::new(naming::GEOMETRY_COLUMN.into(), wkt);
                let df = df.hstack(&[series.into_column()])?;
                Self::from_parts_unchecked(
                    df,
                    naming::GEOMETRY_COLUMN.to_string(),
                    crs_override.unwrap_or(crs),
                )
            }
        }
    }
}

/// Read a coordinate from a series cell, tolerating numeric text.
fn coord_at(series: &Series, idx: usize) -> Option<f64> {
    let value = series.get(idx).ok()?;
    match ScalarValue::from_any_value(&value) {
        ScalarValue::Int(v) => Some(v as f64),
        ScalarValue::Float(v) if v.is_finite() => Some(v),
        ScalarValue::Str(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::parse_wkt_raw;
    use polars::df;
    use std::io::Write;

    #[test]
    fn test_from_coordinate_columns_scenario() {
        let df = df!(
            "name" => &["fountain", "bench"],
            "lat" => &[35.778, 35.774],
            "lon" => &[-78.643, -78.642],
        )
        .unwrap();
        let table =
            SpatialTable::from_coordinate_columns(df, PointColumns::xy("lon", "lat"), Crs::WGS84)
                .unwrap();

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.crs(), Crs::WGS84);
        let geoms = table.geometries().unwrap();
        match geoms[0].as_ref().unwrap() {
            geo_types::Geometry::Point(p) => {
                assert_eq!(p.x(), -78.643);
                assert_eq!(p.y(), 35.778);
            }
            other => panic!("expected point, got {:?}", other),
        }

        let bounds = table.bounds().unwrap().unwrap();
        assert_eq!(
            (bounds.min_x, bounds.min_y, bounds.max_x, bounds.max_y),
            (-78.643, 35.774, -78.642, 35.778)
        );
    }

    #[test]
    fn test_missing_coordinate_yields_null_geometry() {
        let df = df!(
            "name" => &["a", "b"],
            "x" => &[Some(1.0), None],
            "y" => &[Some(2.0), Some(3.0)],
        )
        .unwrap();
        let table =
            SpatialTable::from_coordinate_columns(df, PointColumns::xy("x", "y"), Crs::WGS84)
                .unwrap();
        let geoms = table.geometries().unwrap();
        assert!(geoms[0].is_some());
        assert!(geoms[1].is_none());
        // The row's other attributes survive.
        let names = table.df().column("name").unwrap();
        assert_eq!(names.as_materialized_series().str().unwrap().get(1), Some("b"));
    }

    #[test]
    fn test_textual_coordinates() {
        let df = df!(
            "x" => &["1.5", "east"],
            "y" => &["2.5", "3.0"],
        )
        .unwrap();
        let table =
            SpatialTable::from_coordinate_columns(df, PointColumns::xy("x", "y"), Crs::WGS84)
                .unwrap();
        let geoms = table.geometries().unwrap();
        assert!(geoms[0].is_some());
        assert!(geoms[1].is_none());
    }

    #[test]
    fn test_naming_conflict() {
        let df = df!(
            "geometry" => &["occupied"],
            "x" => &[1.0],
            "y" => &[2.0],
        )
        .unwrap();
        let err =
            SpatialTable::from_coordinate_columns(df, PointColumns::xy("x", "y"), Crs::WGS84)
                .unwrap_err();
        assert!(matches!(err, GeoFrameError::NamingConflict(_)));
    }

    #[test]
    fn test_z_column_carried_in_wkt() {
        let df = df!(
            "x" => &[1.0],
            "y" => &[2.0],
            "elev" => &[120.0],
        )
        .unwrap();
        let table = SpatialTable::from_coordinate_columns(
            df,
            PointColumns::xy("x", "y").with_z("elev"),
            Crs::WGS84,
        )
        .unwrap();
        let text = table.geometry_strings().unwrap()[0].clone().unwrap();
        match parse_wkt_raw(&text).unwrap() {
            wkt::Wkt::Point(p) => assert_eq!(p.0.unwrap().z, Some(120.0)),
            other => panic!("expected point, got {:?}", other),
        }
    }

    #[test]
    fn test_memory_source_roundtrip() {
        let df = df!("id" => &[1i64, 2]).unwrap();
        let geometries = vec![
            Some(geo_types::Geometry::Point(geo_types::Point::new(1.0, 2.0))),
            None,
        ];
        let table = SpatialTable::from_existing_source(
            SourceDescriptor::Memory {
                df,
                geometries,
                crs: Crs::WGS84,
            },
            None,
        )
        .unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.crs(), Crs::WGS84);
        assert!(table.geometries().unwrap()[1].is_none());
    }

    #[test]
    fn test_memory_source_length_mismatch() {
        let df = df!("id" => &[1i64, 2]).unwrap();
        let err = SpatialTable::from_existing_source(
            SourceDescriptor::Memory {
                df,
                geometries: vec![None],
                crs: Crs::WGS84,
            },
            None,
        )
        .unwrap_err();
        assert!(matches!(err, GeoFrameError::Format(_)));
    }

    #[test]
    fn test_memory_source_override_relabels_only() {
        let df = df!("id" => &[1i64]).unwrap();
        let geometries = vec![Some(geo_types::Geometry::Point(geo_types::Point::new(
            -78.643, 35.778,
        )))];
        let table = SpatialTable::from_existing_source(
            SourceDescriptor::Memory {
                df,
                geometries,
                crs: Crs::WGS84,
            },
            Some(Crs::WEB_MERCATOR),
        )
        .unwrap();
        assert_eq!(table.crs(), Crs::WEB_MERCATOR);
        // Coordinates untouched: relabel is not reprojection.
        let bounds = table.bounds().unwrap().unwrap();
        assert_eq!(bounds.min_x, -78.643);
    }

    #[test]
    fn test_csv_source_requires_crs() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id,geometry").unwrap();
        writeln!(file, "1,POINT(1 2)").unwrap();
        let err = SpatialTable::from_existing_source(
            SourceDescriptor::Csv {
                path: file.path().to_path_buf(),
                geometry_column: None,
                crs: None,
            },
            None,
        )
        .unwrap_err();
        assert!(matches!(err, GeoFrameError::MissingCrs));
    }

    #[test]
    fn test_csv_source_reads_wkt() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "id,geometry").unwrap();
        writeln!(file, "1,POINT(1 2)").unwrap();
        writeln!(file, "2,\"POLYGON((0 0, 1 0, 1 1, 0 0))\"").unwrap();
        let table = SpatialTable::from_existing_source(
            SourceDescriptor::Csv {
                path: file.path().to_path_buf(),
                geometry_column: None,
                crs: Some(Crs::WGS84),
            },
            None,
        )
        .unwrap();
        assert_eq!(table.row_count(), 2);
        let types = table.geometry_types().unwrap();
        assert_eq!(types.len(), 2);
    }
}

//! Spatially enabled tables
//!
//! A [`SpatialTable`] is a Polars `DataFrame` with one designated geometry
//! column (WKT text, null for a missing geometry) and a single [`Crs`]
//! applying to every row. Construction attaches the geometry column;
//! every subsequent operation (reprojection, filtering, joins, dissolve)
//! returns a **new** table and leaves its input untouched; callers observe
//! value semantics throughout.
//!
//! The module is organized into submodules:
//!
//! - `construct` - coordinate-column and source-descriptor constructors
//! - `reproject` - CRS-to-CRS coordinate transformation
//! - `filter` - strict attribute-predicate subsetting
//! - `join` - attribute (key) and spatial (relation) joins
//! - `dissolve` - grouped geometry union with attribute aggregation
//! - `types` - shared value types (`ScalarValue`, `Row`, join/agg enums)

pub mod construct;
pub mod dissolve;
pub mod filter;
pub mod join;
pub mod reproject;
pub mod types;

pub use construct::{PointColumns, SourceDescriptor};
pub use types::{Aggregate, JoinKind, Row, ScalarValue, SpatialPredicate};

use crate::crs::Crs;
use crate::error::{GeoFrameError, Result};
use crate::geometry::{self, BBox, GeometryType};
use geo_types::Geometry;
use polars::prelude::*;
use std::collections::BTreeSet;

/// A tabular dataset with an attached geometry column and CRS.
#[derive(Debug, Clone)]
pub struct SpatialTable {
    df: DataFrame,
    geometry_column: String,
    crs: Crs,
}

impl SpatialTable {
    /// Adopt a frame that already carries a WKT geometry column.
    ///
    /// The column must exist and hold WKT text (or nulls); every non-null
    /// entry is parsed once up front so that later operations can assume
    /// decodable geometries. Fails with `Format` on a missing column or
    /// undecodable WKT.
    pub fn from_parts(
        df: DataFrame,
        geometry_column: impl Into<String>,
        crs: Crs,
    ) -> Result<Self> {
        let geometry_column = geometry_column.into();
        let table = Self::from_parts_unchecked(df, geometry_column, crs)?;
        // Validation: parse every non-null geometry once.
        table.geometries()?;
        Ok(table)
    }

    /// Internal constructor for callers that just produced known-good WKT.
    pub(crate) fn from_parts_unchecked(
        df: DataFrame,
        geometry_column: String,
        crs: Crs,
    ) -> Result<Self> {
        if df.column(&geometry_column).is_err() {
            return Err(GeoFrameError::Format(format!(
                "geometry column '{}' not found in table",
                geometry_column
            )));
        }
        Ok(Self {
            df,
            geometry_column,
            crs,
        })
    }

    /// The underlying dataframe, geometry column included.
    pub fn df(&self) -> &DataFrame {
        &self.df
    }

    /// The table's coordinate reference system.
    pub fn crs(&self) -> Crs {
        self.crs
    }

    /// Name of the geometry column.
    pub fn geometry_column(&self) -> &str {
        &self.geometry_column
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// All column names in order, geometry column included.
    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .into_iter()
            .map(|n| n.to_string())
            .collect()
    }

    /// Relabel the CRS without touching coordinates.
    ///
    /// This is an explicit *declaration* that the stored coordinates are to
    /// be interpreted in `crs`; use [`reproject`](Self::reproject) to
    /// actually transform them.
    pub fn with_crs(&self, crs: Crs) -> Self {
        Self {
            df: self.df.clone(),
            geometry_column: self.geometry_column.clone(),
            crs,
        }
    }

    /// The per-row WKT text of the geometry column.
    pub(crate) fn geometry_strings(&self) -> Result<Vec<Option<String>>> {
        let column = self.df.column(&self.geometry_column)?;
        let series = column.as_materialized_series();
        if series.dtype() == &DataType::Null {
            // An all-null geometry column may never have been typed.
            return Ok(vec![None; series.len()]);
        }
        let ca = series.str()?;
        Ok(ca.into_iter().map(|v| v.map(|s| s.to_string())).collect())
    }

    /// Parse every row's geometry. Null cells stay `None`.
    pub fn geometries(&self) -> Result<Vec<Option<Geometry<f64>>>> {
        self.geometry_strings()?
            .into_iter()
            .map(|text| match text {
                Some(text) => geometry::parse_wkt(&text).map(Some),
                None => Ok(None),
            })
            .collect()
    }

    /// The set of geometry type tags present among non-null geometries.
    /// Empty for an all-null or zero-row table.
    pub fn geometry_types(&self) -> Result<BTreeSet<GeometryType>> {
        Ok(self
            .geometries()?
            .iter()
            .flatten()
            .map(GeometryType::from_geometry)
            .collect())
    }

    /// Minimal axis-aligned box covering all non-null geometries, or `None`
    /// when there are none.
    pub fn bounds(&self) -> Result<Option<BBox>> {
        let mut merged: Option<BBox> = None;
        for geom in self.geometries()?.iter().flatten() {
            if let Some(bbox) = BBox::from_geometry(geom) {
                merged = Some(match merged {
                    Some(acc) => acc.merge(&bbox),
                    None => bbox,
                });
            }
        }
        Ok(merged)
    }

    /// Replace the geometry column's WKT contents, keeping name and width.
    pub(crate) fn replace_geometry_strings(
        &self,
        wkt: Vec<Option<String>>,
        crs: Crs,
    ) -> Result<Self> {
        debug_assert_eq!(wkt.len(), self.df.height());
        let mut df = self.df.clone();
        let series = Series::new(self.geometry_column.as_str().into(), wkt);
        df.replace(&self.geometry_column, series)?;
        Ok(Self {
            df,
            geometry_column: self.geometry_column.clone(),
            crs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    fn sample() -> SpatialTable {
        let df = df!(
            "name" => &["a", "b", "c"],
            "geometry" => &[
                Some("POINT(-78.643 35.778)"),
                Some("POINT(-78.642 35.774)"),
                None,
            ],
        )
        .unwrap();
        SpatialTable::from_parts(df, "geometry", Crs::WGS84).unwrap()
    }

    #[test]
    fn test_from_parts_missing_column() {
        let df = df!("name" => &["a"]).unwrap();
        let err = SpatialTable::from_parts(df, "geometry", Crs::WGS84).unwrap_err();
        assert!(matches!(err, GeoFrameError::Format(_)));
    }

    #[test]
    fn test_from_parts_rejects_bad_wkt() {
        let df = df!("geometry" => &["POINT(1 2)", "not wkt"]).unwrap();
        assert!(SpatialTable::from_parts(df, "geometry", Crs::WGS84).is_err());
    }

    #[test]
    fn test_structural_accessors() {
        let table = sample();
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column_names(), vec!["name", "geometry"]);
        assert_eq!(table.crs(), Crs::WGS84);
        assert_eq!(table.geometry_column(), "geometry");
    }

    #[test]
    fn test_geometry_types_skips_nulls() {
        let types = sample().geometry_types().unwrap();
        assert_eq!(types.len(), 1);
        assert!(types.contains(&GeometryType::Point));
    }

    #[test]
    fn test_geometry_types_empty_when_all_null() {
        let df = df!(
            "name" => &["a"],
            "geometry" => &[None::<&str>],
        )
        .unwrap();
        let table = SpatialTable::from_parts(df, "geometry", Crs::WGS84).unwrap();
        assert!(table.geometry_types().unwrap().is_empty());
    }

    #[test]
    fn test_bounds_covers_all_points() {
        let bounds = sample().bounds().unwrap().unwrap();
        assert_eq!(bounds.min_x, -78.643);
        assert_eq!(bounds.min_y, 35.774);
        assert_eq!(bounds.max_x, -78.642);
        assert_eq!(bounds.max_y, 35.778);
    }

    #[test]
    fn test_bounds_none_when_no_geometries() {
        let df = df!(
            "name" => &["a"],
            "geometry" => &[None::<&str>],
        )
        .unwrap();
        let table = SpatialTable::from_parts(df, "geometry", Crs::WGS84).unwrap();
        assert!(table.bounds().unwrap().is_none());
    }

    #[test]
    fn test_with_crs_relabels_without_moving() {
        let table = sample();
        let relabeled = table.with_crs(Crs::WEB_MERCATOR);
        assert_eq!(relabeled.crs(), Crs::WEB_MERCATOR);
        assert_eq!(
            relabeled.geometry_strings().unwrap(),
            table.geometry_strings().unwrap()
        );
    }
}

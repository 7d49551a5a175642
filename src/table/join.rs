//! Attribute and spatial joins
//!
//! Both joins share one output-assembly path: compute (left row, optional
//! right row) pairs, gather the left rows, then append the right side's
//! columns with nulls where no match exists. A key matching several right
//! rows fans out into several output rows; match order follows right-table
//! row order. The left table's geometry column and CRS always pass through
//! unchanged.

use crate::error::{GeoFrameError, Result};
use crate::geometry::BBox;
use crate::table::types::{JoinKind, ScalarValue, SpatialPredicate};
use crate::table::SpatialTable;
use geo::{Contains, Distance, Euclidean, Intersects};
use geo_types::Geometry;
use polars::prelude::*;
use std::collections::HashMap;
use tracing::debug;

impl SpatialTable {
    /// Join attribute rows from `right` onto this table by key equality.
    ///
    /// `Inner` keeps only left rows with at least one key match; `Left`
    /// keeps every left row, null-filling the right columns when unmatched.
    /// Right's non-key columns are appended; a name collision with any left
    /// column fails with `DuplicateColumn`. Null keys never match.
    pub fn attribute_join(
        &self,
        right: &DataFrame,
        left_key: &str,
        right_key: &str,
        kind: JoinKind,
    ) -> Result<Self> {
        check_collisions(self.df(), right, &[right_key])?;

        let right_keys = key_groups(right, right_key)?;
        let left_key_series = self.df().column(left_key)?.as_materialized_series().clone();

        let mut pairs: Vec<(IdxSize, Option<IdxSize>)> = Vec::new();
        for idx in 0..self.row_count() {
            let key = ScalarValue::from_any_value(&left_key_series.get(idx)?);
            let matches = if key.is_null() {
                None
            } else {
                right_keys.get(&key)
            };
            push_pairs(&mut pairs, idx as IdxSize, matches.map(|m| m.as_slice()), kind);
        }
        debug!(kind = %kind, rows = pairs.len(), "attribute join assembled");

        let df = join_output(self.df(), right, &[right_key], &pairs)?;
        Self::from_parts_unchecked(df, self.geometry_column().to_string(), self.crs())
    }

    /// Join attribute rows from `right` onto this table by a spatial
    /// relation between the two geometry columns.
    ///
    /// Both tables must already share a CRS; the join fails with
    /// `CrsMismatch` rather than reprojecting behind the caller's back.
    /// Rows with a null geometry on either side never match. For
    /// `Nearest`, the single closest right row wins, ties broken by right
    /// row order.
    pub fn spatial_join(
        &self,
        right: &SpatialTable,
        predicate: SpatialPredicate,
        kind: JoinKind,
    ) -> Result<Self> {
        if self.crs() != right.crs() {
            return Err(GeoFrameError::CrsMismatch {
                left: self.crs(),
                right: right.crs(),
            });
        }
        check_collisions(self.df(), right.df(), &[right.geometry_column()])?;

        let left_geoms = self.geometries()?;
        let right_geoms = right.geometries()?;
        // Bbox prefilter before the exact predicate.
        let right_boxes: Vec<Option<BBox>> = right_geoms
            .iter()
            .map(|g| g.as_ref().and_then(BBox::from_geometry))
            .collect();

        let mut pairs: Vec<(IdxSize, Option<IdxSize>)> = Vec::new();
        for (idx, left_geom) in left_geoms.iter().enumerate() {
            let matches: Vec<IdxSize> = match left_geom {
                None => Vec::new(),
                Some(lg) => match predicate {
                    SpatialPredicate::Nearest => nearest_match(lg, &right_geoms),
                    _ => {
                        let lbox = BBox::from_geometry(lg);
                        right_geoms
                            .iter()
                            .enumerate()
                            .filter(|(ri, rg)| {
                                let Some(rg) = rg else { return false };
                                if let (Some(lb), Some(rb)) = (&lbox, &right_boxes[*ri]) {
                                    if !lb.intersects(rb) {
                                        return false;
                                    }
                                }
                                relation_holds(predicate, lg, rg)
                            })
                            .map(|(ri, _)| ri as IdxSize)
                            .collect()
                    }
                },
            };
            let matches = if matches.is_empty() {
                None
            } else {
                Some(matches)
            };
            push_pairs(
                &mut pairs,
                idx as IdxSize,
                matches.as_deref(),
                kind,
            );
        }
        debug!(predicate = %predicate, kind = %kind, rows = pairs.len(), "spatial join assembled");

        let df = join_output(self.df(), right.df(), &[right.geometry_column()], &pairs)?;
        Self::from_parts_unchecked(df, self.geometry_column().to_string(), self.crs())
    }
}

/// Exact topological test for the non-nearest predicates.
fn relation_holds(predicate: SpatialPredicate, left: &Geometry<f64>, right: &Geometry<f64>) -> bool {
    match predicate {
        SpatialPredicate::Intersects => left.intersects(right),
        SpatialPredicate::Contains => left.contains(right),
        SpatialPredicate::Within => right.contains(left),
        SpatialPredicate::Nearest => unreachable!("nearest is handled separately"),
    }
}

/// Index of the single closest non-null right geometry; strict inequality
/// keeps the earliest row on ties.
fn nearest_match(left: &Geometry<f64>, right_geoms: &[Option<Geometry<f64>>]) -> Vec<IdxSize> {
    let mut best: Option<(IdxSize, f64)> = None;
    for (ri, rg) in right_geoms.iter().enumerate() {
        let Some(rg) = rg else { continue };
        let d = Euclidean.distance(left, rg);
        match best {
            Some((_, bd)) if d >= bd => {}
            _ => best = Some((ri as IdxSize, d)),
        }
    }
    best.map(|(ri, _)| vec![ri]).unwrap_or_default()
}

/// Fail if `right` would introduce a column name `left` already has,
/// ignoring `skip` (join keys, geometry columns).
fn check_collisions(left: &DataFrame, right: &DataFrame, skip: &[&str]) -> Result<()> {
    let left_names: Vec<&str> = left.get_column_names().iter().map(|n| n.as_str()).collect();
    for name in right.get_column_names() {
        let name = name.as_str();
        if skip.contains(&name) {
            continue;
        }
        if left_names.contains(&name) {
            return Err(GeoFrameError::DuplicateColumn(name.to_string()));
        }
    }
    Ok(())
}

/// Group right-row indices by key value, preserving row order per group.
fn key_groups(right: &DataFrame, right_key: &str) -> Result<HashMap<ScalarValue, Vec<IdxSize>>> {
    let series = right.column(right_key)?.as_materialized_series().clone();
    let mut groups: HashMap<ScalarValue, Vec<IdxSize>> = HashMap::new();
    for idx in 0..right.height() {
        let key = ScalarValue::from_any_value(&series.get(idx)?);
        if key.is_null() {
            continue;
        }
        groups.entry(key).or_default().push(idx as IdxSize);
    }
    Ok(groups)
}

fn push_pairs(
    pairs: &mut Vec<(IdxSize, Option<IdxSize>)>,
    left_idx: IdxSize,
    matches: Option<&[IdxSize]>,
    kind: JoinKind,
) {
    match (matches, kind) {
        (Some(m), _) => pairs.extend(m.iter().map(|ri| (left_idx, Some(*ri)))),
        (None, JoinKind::Left) => pairs.push((left_idx, None)),
        (None, JoinKind::Inner) => {}
    }
}

/// Gather the paired left rows and append right's columns (minus `skip`),
/// null-filled where the pair has no right row.
fn join_output(
    left: &DataFrame,
    right: &DataFrame,
    skip: &[&str],
    pairs: &[(IdxSize, Option<IdxSize>)],
) -> Result<DataFrame> {
    let left_idx: Vec<IdxSize> = pairs.iter().map(|(li, _)| *li).collect();
    let idx = IdxCa::from_vec(PlSmallStr::EMPTY, left_idx);
    let mut out = left.take(&idx)?;

    for column in right.get_columns() {
        let name = column.name().as_str();
        if skip.contains(&name) {
            continue;
        }
        let series = column.as_materialized_series();
        let mut values: Vec<AnyValue<'static>> = Vec::with_capacity(pairs.len());
        for (_, ri) in pairs {
            match ri {
                Some(ri) => values.push(series.get(*ri as usize)?.into_static()),
                None => values.push(AnyValue::Null),
            }
        }
        let appended =
            Series::from_any_values_and_dtype(name.into(), &values, series.dtype(), false)?;
        out.hstack_mut(&[appended.into_column()])?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crs::Crs;
    use crate::table::construct::PointColumns;
    use polars::df;

    fn left_table() -> SpatialTable {
        let df = df!(
            "tract" => &["A", "B", "C"],
            "x" => &[0.0, 10.0, 20.0],
            "y" => &[0.0, 0.0, 0.0],
        )
        .unwrap();
        SpatialTable::from_coordinate_columns(df, PointColumns::xy("x", "y"), Crs::WGS84).unwrap()
    }

    #[test]
    fn test_inner_join_counts_and_fanout() {
        let table = left_table();
        let right = df!(
            "tract" => &["A", "A", "C"],
            "pop" => &[100i64, 200, 300],
        )
        .unwrap();
        let joined = table
            .attribute_join(&right, "tract", "tract", JoinKind::Inner)
            .unwrap();
        // A fans out to two rows, B is dropped, C matches once.
        assert_eq!(joined.row_count(), 3);
        let pop = joined.df().column("pop").unwrap();
        let pop = pop.as_materialized_series();
        assert_eq!(pop.i64().unwrap().get(0), Some(100));
        assert_eq!(pop.i64().unwrap().get(1), Some(200));
        assert_eq!(pop.i64().unwrap().get(2), Some(300));
    }

    #[test]
    fn test_left_join_null_fills_unmatched() {
        let table = left_table();
        let right = df!(
            "tract" => &["A"],
            "pop" => &[100i64],
        )
        .unwrap();
        let joined = table
            .attribute_join(&right, "tract", "tract", JoinKind::Left)
            .unwrap();
        assert_eq!(joined.row_count(), 3);
        let pop = joined.df().column("pop").unwrap();
        let pop = pop.as_materialized_series();
        assert_eq!(pop.i64().unwrap().get(0), Some(100));
        assert_eq!(pop.i64().unwrap().get(1), None);
        assert_eq!(pop.i64().unwrap().get(2), None);
    }

    #[test]
    fn test_join_preserves_geometry_and_crs() {
        let table = left_table();
        let right = df!(
            "tract" => &["B"],
            "pop" => &[1i64],
        )
        .unwrap();
        let joined = table
            .attribute_join(&right, "tract", "tract", JoinKind::Inner)
            .unwrap();
        assert_eq!(joined.crs(), Crs::WGS84);
        assert_eq!(
            joined.geometry_strings().unwrap(),
            vec![Some("POINT(10 0)".to_string())]
        );
    }

    #[test]
    fn test_join_duplicate_column_rejected() {
        let table = left_table();
        let right = df!(
            "tract" => &["A"],
            "x" => &[9.0],
        )
        .unwrap();
        let err = table
            .attribute_join(&right, "tract", "tract", JoinKind::Inner)
            .unwrap_err();
        assert!(matches!(err, GeoFrameError::DuplicateColumn(c) if c == "x"));
    }

    #[test]
    fn test_join_null_keys_never_match() {
        let df = df!(
            "tract" => &[None::<&str>, Some("A")],
            "x" => &[0.0, 1.0],
            "y" => &[0.0, 1.0],
        )
        .unwrap();
        let table =
            SpatialTable::from_coordinate_columns(df, PointColumns::xy("x", "y"), Crs::WGS84)
                .unwrap();
        let right = df!(
            "tract" => &[None::<&str>, Some("A")],
            "pop" => &[5i64, 7],
        )
        .unwrap();
        let joined = table
            .attribute_join(&right, "tract", "tract", JoinKind::Inner)
            .unwrap();
        assert_eq!(joined.row_count(), 1);
    }

    fn polygon_table() -> SpatialTable {
        let df = df!(
            "zone" => &["west", "east"],
            "geometry" => &[
                "POLYGON((-1 -1, 5 -1, 5 5, -1 5, -1 -1))",
                "POLYGON((9 -1, 25 -1, 25 5, 9 5, 9 -1))",
            ],
        )
        .unwrap();
        SpatialTable::from_parts(df, "geometry", Crs::WGS84).unwrap()
    }

    #[test]
    fn test_spatial_join_within() {
        let points = left_table();
        let zones = polygon_table();
        let joined = points
            .spatial_join(&zones, SpatialPredicate::Within, JoinKind::Inner)
            .unwrap();
        // (0,0) is in west, (10,0) and (20,0) in east.
        assert_eq!(joined.row_count(), 3);
        let zone = joined.df().column("zone").unwrap();
        let zone = zone.as_materialized_series();
        assert_eq!(zone.str().unwrap().get(0), Some("west"));
        assert_eq!(zone.str().unwrap().get(1), Some("east"));
    }

    #[test]
    fn test_spatial_join_crs_mismatch() {
        let points = left_table();
        let zones = polygon_table().with_crs(Crs::WEB_MERCATOR);
        let err = points
            .spatial_join(&zones, SpatialPredicate::Intersects, JoinKind::Inner)
            .unwrap_err();
        assert!(matches!(err, GeoFrameError::CrsMismatch { .. }));
    }

    #[test]
    fn test_spatial_join_nearest_tie_breaks_to_first() {
        let df = df!(
            "site" => &["mid"],
            "x" => &[5.0],
            "y" => &[0.0],
        )
        .unwrap();
        let points =
            SpatialTable::from_coordinate_columns(df, PointColumns::xy("x", "y"), Crs::WGS84)
                .unwrap();
        // Two stations equidistant from (5, 0).
        let stations = df!(
            "station" => &["first", "second"],
            "sx" => &[0.0, 10.0],
            "sy" => &[0.0, 0.0],
        )
        .unwrap();
        let stations =
            SpatialTable::from_coordinate_columns(stations, PointColumns::xy("sx", "sy"), Crs::WGS84)
                .unwrap();
        let joined = points
            .spatial_join(&stations, SpatialPredicate::Nearest, JoinKind::Inner)
            .unwrap();
        assert_eq!(joined.row_count(), 1);
        let station = joined.df().column("station").unwrap();
        let station = station.as_materialized_series();
        assert_eq!(station.str().unwrap().get(0), Some("first"));
    }

    #[test]
    fn test_spatial_join_left_keeps_null_geometry_rows() {
        let df = df!(
            "site" => &["a", "orphan"],
            "x" => &[Some(0.0), None],
            "y" => &[Some(0.0), None],
        )
        .unwrap();
        let points =
            SpatialTable::from_coordinate_columns(df, PointColumns::xy("x", "y"), Crs::WGS84)
                .unwrap();
        let zones = polygon_table();
        let joined = points
            .spatial_join(&zones, SpatialPredicate::Within, JoinKind::Left)
            .unwrap();
        assert_eq!(joined.row_count(), 2);
        let zone = joined.df().column("zone").unwrap();
        let zone = zone.as_materialized_series();
        assert_eq!(zone.str().unwrap().get(1), None);
    }
}

//! Dissolve: grouped geometry union with attribute aggregation
//!
//! Rows are partitioned by the value of a grouping column; each group's
//! geometries merge into one (union for polygons, multi-part collection for
//! points and lines) and each requested aggregation reduces the group's
//! attribute values. Output rows appear in first-encountered group order.
//!
//! A group containing any null geometry dissolves to a null geometry: the
//! missing member is surfaced rather than silently dropped. Filter the
//! nulls out first to union only the present members.

use crate::error::{GeoFrameError, Result};
use crate::geometry::{self, GeometryFamily, GeometryType};
use crate::table::types::{Aggregate, ScalarValue};
use crate::table::SpatialTable;
use geo::BooleanOps;
use geo_types::{Geometry, MultiLineString, MultiPoint, MultiPolygon};
use polars::prelude::*;
use std::collections::HashMap;
use tracing::warn;

impl SpatialTable {
    /// Dissolve rows sharing a `by` value into one row per distinct value.
    ///
    /// `aggregations` maps output column names to the reduction feeding
    /// them. Output columns are `[by, aggregations..., geometry]`; an
    /// output name colliding with `by`, the geometry column, or another
    /// output fails with `DuplicateColumn`. Rows where `by` is null form
    /// their own group.
    pub fn dissolve(&self, by: &str, aggregations: &[(&str, Aggregate)]) -> Result<Self> {
        let mut seen: Vec<&str> = vec![by, self.geometry_column()];
        for (name, _) in aggregations {
            if seen.contains(name) {
                return Err(GeoFrameError::DuplicateColumn(name.to_string()));
            }
            seen.push(*name);
        }

        let by_series = self.df().column(by)?.as_materialized_series().clone();
        // Resolve aggregation inputs up front so a typo fails before any work.
        let mut inputs: HashMap<&str, Series> = HashMap::new();
        for (_, agg) in aggregations {
            if let Some(column) = agg.column() {
                inputs.insert(
                    column,
                    self.df().column(column)?.as_materialized_series().clone(),
                );
            }
        }

        // Partition row indices by group key, first-encountered order.
        let mut order: Vec<ScalarValue> = Vec::new();
        let mut groups: HashMap<ScalarValue, Vec<usize>> = HashMap::new();
        for idx in 0..self.row_count() {
            let key = ScalarValue::from_any_value(&by_series.get(idx)?);
            groups
                .entry(key.clone())
                .or_insert_with(|| {
                    order.push(key.clone());
                    Vec::new()
                })
                .push(idx);
        }

        let geoms = self.geometries()?;

        let mut key_values: Vec<AnyValue<'static>> = Vec::with_capacity(order.len());
        let mut agg_values: Vec<Vec<AnyValue<'static>>> =
            vec![Vec::with_capacity(order.len()); aggregations.len()];
        let mut dissolved: Vec<Option<String>> = Vec::with_capacity(order.len());

        for key in &order {
            let rows = &groups[key];
            key_values.push(key.to_any_value());

            for (slot, (_, agg)) in agg_values.iter_mut().zip(aggregations) {
                let values: Vec<ScalarValue> = match agg.column() {
                    Some(column) => {
                        let series = &inputs[column];
                        rows.iter()
                            .map(|&idx| {
                                series
                                    .get(idx)
                                    .map(|v| ScalarValue::from_any_value(&v))
                                    .map_err(GeoFrameError::from)
                            })
                            .collect::<Result<_>>()?
                    }
                    None => Vec::new(),
                };
                slot.push(agg.aggregate(&values, rows.len()).to_any_value());
            }

            let members: Vec<&Geometry<f64>> = rows.iter().filter_map(|&idx| geoms[idx].as_ref()).collect();
            if members.len() < rows.len() {
                warn!(group = %key, "group contains null geometry; dissolved geometry is null");
                dissolved.push(None);
            } else {
                dissolved.push(Some(geometry::to_wkt(&union_members(&members, key)?)));
            }
        }

        let mut columns: Vec<Column> = Vec::with_capacity(aggregations.len() + 2);
        columns.push(
            Series::from_any_values_and_dtype(by.into(), &key_values, by_series.dtype(), false)?
                .into_column(),
        );
        for ((name, _), values) in aggregations.iter().zip(agg_values) {
            columns.push(Series::from_any_values((*name).into(), &values, false)?.into_column());
        }
        columns.push(
            Series::new(self.geometry_column().into(), dissolved).into_column(),
        );

        let df = DataFrame::new(columns)?;
        Self::from_parts_unchecked(df, self.geometry_column().to_string(), self.crs())
    }
}

/// Union a group's geometries according to their shared family.
fn union_members(members: &[&Geometry<f64>], key: &ScalarValue) -> Result<Geometry<f64>> {
    if members.len() == 1 {
        return Ok(members[0].clone());
    }

    let mut family: Option<GeometryFamily> = None;
    for geom in members {
        let tag = GeometryType::from_geometry(geom);
        let this = tag.family().ok_or_else(|| {
            GeoFrameError::Format(format!("cannot dissolve geometry collections (group {})", key))
        })?;
        match family {
            None => family = Some(this),
            Some(f) if f == this => {}
            Some(_) => {
                return Err(GeoFrameError::Format(format!(
                    "mixed geometry families in group {}",
                    key
                )))
            }
        }
    }

    Ok(match family.expect("non-empty group") {
        GeometryFamily::Point => {
            let mut points = Vec::new();
            for geom in members {
                match geom {
                    Geometry::Point(p) => points.push(*p),
                    Geometry::MultiPoint(mp) => points.extend(mp.iter().copied()),
                    _ => unreachable!("family checked above"),
                }
            }
            Geometry::MultiPoint(MultiPoint::new(points))
        }
        GeometryFamily::Line => {
            let mut lines = Vec::new();
            for geom in members {
                match geom {
                    Geometry::LineString(ls) => lines.push(ls.clone()),
                    Geometry::MultiLineString(mls) => lines.extend(mls.iter().cloned()),
                    _ => unreachable!("family checked above"),
                }
            }
            Geometry::MultiLineString(MultiLineString::new(lines))
        }
        GeometryFamily::Polygon => {
            let mut acc: Option<MultiPolygon<f64>> = None;
            for geom in members {
                let mp = match geom {
                    Geometry::Polygon(p) => MultiPolygon::new(vec![p.clone()]),
                    Geometry::MultiPolygon(mp) => mp.clone(),
                    _ => unreachable!("family checked above"),
                };
                acc = Some(match acc {
                    None => mp,
                    Some(acc) => acc.union(&mp),
                });
            }
            Geometry::MultiPolygon(acc.expect("non-empty group"))
        }
    })
}

//! Reprojection: transform every geometry into a target CRS
//!
//! Coordinates are mapped in the raw WKT structure so that Z/M ordinates
//! ride along untouched; only X/Y pass through the resolved transform. The
//! walk is all-or-nothing: a failing coordinate aborts the operation before
//! any output table exists, so callers never observe a partially
//! reprojected table.

use crate::crs::transform::{BuiltinResolver, TransformResolver};
use crate::crs::Crs;
use crate::error::Result;
use crate::geometry::{map_wkt_xy, parse_wkt_raw};
use crate::table::SpatialTable;
use tracing::debug;

impl SpatialTable {
    /// Reproject into `target` using the built-in resolver.
    ///
    /// Reprojecting into the table's current CRS is a no-op returning the
    /// coordinates unchanged; this holds even for CRS identifiers the
    /// built-in resolver cannot resolve.
    pub fn reproject(&self, target: Crs) -> Result<Self> {
        self.reproject_with(target, &BuiltinResolver)
    }

    /// Reproject with a caller-supplied resolver (an external transform
    /// engine, a test stub, ...).
    pub fn reproject_with(&self, target: Crs, resolver: &dyn TransformResolver) -> Result<Self> {
        if target == self.crs() {
            return Ok(self.clone());
        }
        let transform = resolver.resolve(self.crs(), target)?;
        debug!(from = %self.crs(), to = %target, rows = self.row_count(), "reprojecting");

        let mapped = self
            .geometry_strings()?
            .into_iter()
            .map(|text| {
                text.map(|text| {
                    let raw = parse_wkt_raw(&text)?;
                    let moved = map_wkt_xy(raw, &|x, y| transform.apply(x, y))?;
                    Ok(moved.to_string())
                })
                .transpose()
            })
            .collect::<Result<Vec<_>>>()?;

        self.replace_geometry_strings(mapped, target)
    }
}

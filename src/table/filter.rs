//! Attribute subsetting with a strict row predicate
//!
//! Unlike the row-tolerant point constructor, `filter` is all-or-nothing: a
//! predicate that fails on any row aborts the whole operation. Silently
//! skipping rows would make a failed predicate indistinguishable from a
//! false one.

use crate::error::{GeoFrameError, Result};
use crate::table::types::Row;
use crate::table::SpatialTable;
use polars::prelude::*;

impl SpatialTable {
    /// Keep exactly the rows for which `predicate` returns `Ok(true)`,
    /// preserving row order, all columns, geometry, and CRS.
    ///
    /// The predicate sees a [`Row`] view of the attribute values only; the
    /// geometry column is hidden from it. An `Err` from the predicate on
    /// any row fails the whole filter with `PredicateEvaluation`.
    pub fn filter<F>(&self, predicate: F) -> Result<Self>
    where
        F: Fn(&Row<'_>) -> std::result::Result<bool, String>,
    {
        let columns = self.df().get_columns();
        let mut mask = Vec::with_capacity(self.row_count());
        for idx in 0..self.row_count() {
            let row = Row {
                columns,
                geometry_column: self.geometry_column(),
                idx,
            };
            match predicate(&row) {
                Ok(keep) => mask.push(keep),
                Err(message) => {
                    return Err(GeoFrameError::PredicateEvaluation { row: idx, message })
                }
            }
        }
        let mask = BooleanChunked::from_slice(PlSmallStr::EMPTY, &mask);
        let df = self.df().filter(&mask)?;
        Self::from_parts_unchecked(df, self.geometry_column().to_string(), self.crs())
    }
}

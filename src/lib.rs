//! geoframe - spatially enabled tables for Rust
//!
//! A [`SpatialTable`] is a Polars `DataFrame` with one designated geometry
//! column (WKT text) and a single coordinate reference system. On top of
//! that sit the spatial operations: construction from coordinate columns or
//! external sources, reprojection, attribute filtering, attribute and
//! spatial joins, and dissolve (grouped geometry union).
//!
//! Every operation returns a new table; existing references stay valid and
//! unchanged. Geometry algorithms (predicates, union, distance) come from
//! the `geo` ecosystem; this crate owns the tabular semantics around them.
//!
//! # Example
//!
//! ```rust
//! use geoframe::{Crs, PointColumns, SpatialTable};
//! use polars::df;
//!
//! # fn main() -> geoframe::Result<()> {
//! let df = df!(
//!     "name" => &["fountain", "bench"],
//!     "lon" => &[-78.643, -78.642],
//!     "lat" => &[35.778, 35.774],
//! ).expect("valid frame");
//!
//! let table = SpatialTable::from_coordinate_columns(
//!     df,
//!     PointColumns::xy("lon", "lat"),
//!     Crs::WGS84,
//! )?;
//!
//! let projected = table.reproject(Crs::WEB_MERCATOR)?;
//! assert_eq!(projected.row_count(), 2);
//! # Ok(())
//! # }
//! ```

pub mod crs;
pub mod error;
pub mod geometry;
pub mod naming;
pub mod reader;
pub mod table;

// Re-export the primary types at the crate root for convenience
pub use crs::{BuiltinResolver, CoordinateTransform, Crs, Projection, TransformResolver};
pub use error::{GeoFrameError, Result};
pub use geometry::{BBox, GeometryFamily, GeometryType};
pub use reader::{CsvReader, Reader};
pub use table::{
    Aggregate, JoinKind, PointColumns, Row, ScalarValue, SourceDescriptor, SpatialPredicate,
    SpatialTable,
};

/// Re-export of the dataframe type the tables are built on.
pub use polars::prelude::DataFrame;

/// Crate version, surfaced by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

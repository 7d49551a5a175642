//! Error types for geoframe
//!
//! All fallible operations in the crate return [`Result`], an alias over
//! [`GeoFrameError`]. Row-level data-quality problems (a missing coordinate
//! at construction time) degrade to a null geometry instead of erroring;
//! structural problems (name collisions, unresolvable CRS identifiers,
//! mismatched CRS between join operands, predicate failures) abort the whole
//! operation and surface here.

use crate::crs::Crs;
use thiserror::Error;

/// Errors produced by geoframe operations.
#[derive(Error, Debug)]
pub enum GeoFrameError {
    /// The geometry column name chosen for a new table already exists
    /// among the attribute columns.
    #[error("column '{0}' already exists; pick a different geometry column name")]
    NamingConflict(String),

    /// A source or geometry value could not be decoded (bad WKT, malformed
    /// file, mixed geometry families where one family is required).
    #[error("format error: {0}")]
    Format(String),

    /// A source declared no CRS and the caller supplied none.
    #[error("source has no coordinate reference system and none was supplied")]
    MissingCrs,

    /// A CRS identifier is not known to the resolver.
    #[error("unknown CRS: {0}")]
    UnknownCrs(Crs),

    /// Both CRS identifiers are known but no transformation path exists
    /// between them.
    #[error("no transform path from {from} to {to}")]
    NoTransformPath { from: Crs, to: Crs },

    /// A filter predicate failed while evaluating a row. The whole filter
    /// aborts; rows are never silently skipped.
    #[error("predicate failed on row {row}: {message}")]
    PredicateEvaluation { row: usize, message: String },

    /// A join would introduce a right-side column whose name collides with
    /// an existing left-side column.
    #[error("join would duplicate column '{0}'")]
    DuplicateColumn(String),

    /// The two operands of a spatial join carry different CRS. Reproject
    /// one side explicitly first; the join never reprojects for you.
    #[error("CRS mismatch: left is {left}, right is {right}")]
    CrsMismatch { left: Crs, right: Crs },

    /// IO error reading a source.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error bubbled up from the dataframe engine.
    #[error("dataframe error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

/// Result type for geoframe operations.
pub type Result<T> = std::result::Result<T, GeoFrameError>;

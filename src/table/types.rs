//! Value types shared by the table operations
//!
//! Join keys, group keys, and aggregation inputs are lifted out of the
//! dataframe engine's borrowed `AnyValue` into the owned [`ScalarValue`]
//! enum, which carries explicit equality and hashing semantics (floats
//! compare by bit pattern so they can key a hash map). All column access is
//! through this enum; no `dyn Any`.

use polars::prelude::{AnyValue, Column};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// An owned attribute scalar: null, boolean, integer, float, or string.
#[derive(Debug, Clone)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ScalarValue {
    /// Lift a Polars value. Integer widths collapse to `i64`, floats to
    /// `f64`; anything exotic (temporal, nested) keys by its display form.
    pub fn from_any_value(value: &AnyValue<'_>) -> Self {
        match value {
            AnyValue::Null => ScalarValue::Null,
            AnyValue::Boolean(b) => ScalarValue::Bool(*b),
            AnyValue::Int8(v) => ScalarValue::Int(*v as i64),
            AnyValue::Int16(v) => ScalarValue::Int(*v as i64),
            AnyValue::Int32(v) => ScalarValue::Int(*v as i64),
            AnyValue::Int64(v) => ScalarValue::Int(*v),
            AnyValue::UInt8(v) => ScalarValue::Int(*v as i64),
            AnyValue::UInt16(v) => ScalarValue::Int(*v as i64),
            AnyValue::UInt32(v) => ScalarValue::Int(*v as i64),
            AnyValue::UInt64(v) => ScalarValue::Int(*v as i64),
            AnyValue::Float32(v) => ScalarValue::Float(*v as f64),
            AnyValue::Float64(v) => ScalarValue::Float(*v),
            AnyValue::String(s) => ScalarValue::Str((*s).to_string()),
            AnyValue::StringOwned(s) => ScalarValue::Str(s.to_string()),
            other => ScalarValue::Str(format!("{}", other)),
        }
    }

    /// Convert back to a Polars value for column building.
    pub fn to_any_value(&self) -> AnyValue<'static> {
        match self {
            ScalarValue::Null => AnyValue::Null,
            ScalarValue::Bool(b) => AnyValue::Boolean(*b),
            ScalarValue::Int(v) => AnyValue::Int64(*v),
            ScalarValue::Float(v) => AnyValue::Float64(*v),
            ScalarValue::Str(s) => AnyValue::StringOwned(s.as_str().into()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    /// Numeric view, coercing integers to floats. `None` for everything else.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::Int(v) => Some(*v as f64),
            ScalarValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ScalarValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Ordering within a variant; numeric variants compare across `Int` and
    /// `Float`. Mixed non-numeric variants are incomparable.
    pub fn partial_cmp_value(&self, other: &ScalarValue) -> Option<Ordering> {
        match (self, other) {
            (ScalarValue::Str(a), ScalarValue::Str(b)) => Some(a.cmp(b)),
            (ScalarValue::Bool(a), ScalarValue::Bool(b)) => Some(a.cmp(b)),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.partial_cmp(&b),
                _ => None,
            },
        }
    }
}

impl PartialEq for ScalarValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ScalarValue::Null, ScalarValue::Null) => true,
            (ScalarValue::Bool(a), ScalarValue::Bool(b)) => a == b,
            (ScalarValue::Int(a), ScalarValue::Int(b)) => a == b,
            (ScalarValue::Float(a), ScalarValue::Float(b)) => a.to_bits() == b.to_bits(),
            (ScalarValue::Str(a), ScalarValue::Str(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ScalarValue {}

impl Hash for ScalarValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            ScalarValue::Null => {}
            ScalarValue::Bool(b) => b.hash(state),
            ScalarValue::Int(v) => v.hash(state),
            ScalarValue::Float(v) => v.to_bits().hash(state),
            ScalarValue::Str(s) => s.hash(state),
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => write!(f, "null"),
            ScalarValue::Bool(b) => write!(f, "{}", b),
            ScalarValue::Int(v) => write!(f, "{}", v),
            ScalarValue::Float(v) => write!(f, "{}", v),
            ScalarValue::Str(s) => write!(f, "{}", s),
        }
    }
}

/// Borrowed view of one row's attribute values, handed to filter predicates.
/// The geometry column is not visible through it.
pub struct Row<'a> {
    pub(crate) columns: &'a [Column],
    pub(crate) geometry_column: &'a str,
    pub(crate) idx: usize,
}

impl<'a> Row<'a> {
    /// Positional index of this row in the table.
    pub fn index(&self) -> usize {
        self.idx
    }

    /// Look up an attribute value by column name. `None` when the column
    /// does not exist (or names the hidden geometry column).
    pub fn get(&self, name: &str) -> Option<ScalarValue> {
        if name == self.geometry_column {
            return None;
        }
        let column = self.columns.iter().find(|c| c.name().as_str() == name)?;
        let value = column.as_materialized_series().get(self.idx).ok()?;
        Some(ScalarValue::from_any_value(&value))
    }

    /// Numeric attribute lookup; `None` if missing, null, or non-numeric.
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name)?.as_f64()
    }

    /// String attribute lookup.
    pub fn get_str(&self, name: &str) -> Option<String> {
        self.get(name)?.as_str().map(|s| s.to_string())
    }

    /// Boolean attribute lookup.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name)?.as_bool()
    }
}

/// Join kind for attribute and spatial joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// Keep only left rows with at least one match.
    Inner,
    /// Keep every left row, null-filling right columns when unmatched.
    Left,
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinKind::Inner => write!(f, "inner"),
            JoinKind::Left => write!(f, "left"),
        }
    }
}

/// Spatial relation used as the match condition of a spatial join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpatialPredicate {
    /// Geometries share at least one point.
    Intersects,
    /// Left geometry contains the right geometry.
    Contains,
    /// Left geometry lies within the right geometry.
    Within,
    /// The single closest right geometry by Euclidean distance; ties break
    /// to the earliest right row.
    Nearest,
}

impl fmt::Display for SpatialPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpatialPredicate::Intersects => write!(f, "intersects"),
            SpatialPredicate::Contains => write!(f, "contains"),
            SpatialPredicate::Within => write!(f, "within"),
            SpatialPredicate::Nearest => write!(f, "nearest"),
        }
    }
}

/// Aggregation applied to one output column of a dissolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Aggregate {
    /// Number of rows in the group.
    Count,
    /// Numeric sum over a column, nulls skipped.
    Sum(String),
    /// Numeric mean over a column, nulls skipped.
    Mean(String),
    /// Minimum over a column, nulls skipped.
    Min(String),
    /// Maximum over a column, nulls skipped.
    Max(String),
    /// First non-null value of a column in group order.
    First(String),
}

impl Aggregate {
    /// The input column this aggregation reads, if any.
    pub fn column(&self) -> Option<&str> {
        match self {
            Aggregate::Count => None,
            Aggregate::Sum(c)
            | Aggregate::Mean(c)
            | Aggregate::Min(c)
            | Aggregate::Max(c)
            | Aggregate::First(c) => Some(c),
        }
    }

    /// Reduce one group's values.
    pub fn aggregate(&self, values: &[ScalarValue], group_len: usize) -> ScalarValue {
        match self {
            Aggregate::Count => ScalarValue::Int(group_len as i64),
            Aggregate::Sum(_) => {
                let mut int_sum: i64 = 0;
                let mut float_sum: f64 = 0.0;
                let mut saw_float = false;
                let mut saw_any = false;
                for v in values {
                    match v {
                        ScalarValue::Int(i) => {
                            saw_any = true;
                            int_sum += i;
                            float_sum += *i as f64;
                        }
                        ScalarValue::Float(x) => {
                            saw_any = true;
                            saw_float = true;
                            float_sum += x;
                        }
                        _ => {}
                    }
                }
                if !saw_any {
                    ScalarValue::Null
                } else if saw_float {
                    ScalarValue::Float(float_sum)
                } else {
                    ScalarValue::Int(int_sum)
                }
            }
            Aggregate::Mean(_) => {
                let nums: Vec<f64> = values.iter().filter_map(|v| v.as_f64()).collect();
                if nums.is_empty() {
                    ScalarValue::Null
                } else {
                    ScalarValue::Float(nums.iter().sum::<f64>() / nums.len() as f64)
                }
            }
            Aggregate::Min(_) => extremum(values, Ordering::Less),
            Aggregate::Max(_) => extremum(values, Ordering::Greater),
            Aggregate::First(_) => values
                .iter()
                .find(|v| !v.is_null())
                .cloned()
                .unwrap_or(ScalarValue::Null),
        }
    }
}

fn extremum(values: &[ScalarValue], keep: Ordering) -> ScalarValue {
    let mut best: Option<&ScalarValue> = None;
    for v in values.iter().filter(|v| !v.is_null()) {
        match best {
            None => best = Some(v),
            Some(b) => {
                if v.partial_cmp_value(b) == Some(keep) {
                    best = Some(v);
                }
            }
        }
    }
    best.cloned().unwrap_or(ScalarValue::Null)
}

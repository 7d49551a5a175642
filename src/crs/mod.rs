//! Coordinate reference system identifiers
//!
//! A [`Crs`] is a well-known numeric identifier (WKID / EPSG code) naming a
//! projection and datum. Every table carries exactly one, applying uniformly
//! to all of its geometries. The identifier is a *label*: attaching one never
//! transforms coordinates. Transformation lives in [`transform`].

pub mod transform;

pub use transform::{BuiltinResolver, CoordinateTransform, Projection, TransformResolver};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A coordinate reference system identifier (EPSG/WKID code).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Crs(u32);

impl Crs {
    /// WGS 84 geographic coordinates (longitude/latitude degrees).
    pub const WGS84: Crs = Crs(4326);
    /// Spherical Web Mercator (meters).
    pub const WEB_MERCATOR: Crs = Crs(3857);
    /// World Equidistant Cylindrical (meters).
    pub const EQUIDISTANT_CYLINDRICAL: Crs = Crs(4087);

    pub const fn epsg(code: u32) -> Self {
        Crs(code)
    }

    pub const fn code(&self) -> u32 {
        self.0
    }

    /// Human-readable name, for codes this crate has heard of.
    ///
    /// A named code is not necessarily transformable; see
    /// [`BuiltinResolver`] for which codes carry built-in projection math.
    pub fn name(&self) -> Option<&'static str> {
        match self.0 {
            4326 => Some("WGS 84"),
            4269 => Some("NAD83"),
            3857 => Some("WGS 84 / Pseudo-Mercator"),
            4087 => Some("WGS 84 / World Equidistant Cylindrical"),
            2264 => Some("NAD83 / North Carolina (ftUS)"),
            _ => None,
        }
    }

    /// Whether this code is in the built-in registry.
    pub fn is_known(&self) -> bool {
        self.name().is_some()
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.0)
    }
}

impl FromStr for Crs {
    type Err = String;

    /// Accepts `"4326"` or `"EPSG:4326"` (case-insensitive authority).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = match s.split_once(':') {
            Some((authority, rest)) if authority.eq_ignore_ascii_case("epsg") => rest,
            Some(_) => return Err(format!("unsupported CRS authority in '{}'", s)),
            None => s,
        };
        digits
            .trim()
            .parse::<u32>()
            .map(Crs)
            .map_err(|_| format!("invalid CRS identifier '{}'", s))
    }
}

impl From<u32> for Crs {
    fn from(code: u32) -> Self {
        Crs(code)
    }
}

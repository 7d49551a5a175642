//! Pointwise coordinate transformation between reference systems
//!
//! Transforms are resolved by a [`TransformResolver`]: given a source and a
//! target [`Crs`], it either produces a [`CoordinateTransform`] or fails with
//! `UnknownCrs` / `NoTransformPath`. The built-in resolver routes every
//! transform through geographic longitude/latitude as a hub (invert the
//! source projection, apply the target's), which makes chained
//! reprojections agree with direct ones by construction.
//!
//! The built-in projections are spherical closed forms, adequate for the
//! web-mapping CRSs they cover. Anything datum-sensitive belongs in an
//! external resolver plugged in via `reproject_with`.

use crate::crs::Crs;
use crate::error::{GeoFrameError, Result};

/// Mean Earth radius used by the spherical projections, in meters.
const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// A map projection between geographic coordinates (longitude/latitude in
/// degrees) and projected planar coordinates.
pub trait Projection: Send + Sync {
    /// Forward: (lon, lat) degrees -> projected (x, y).
    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64)>;

    /// Inverse: projected (x, y) -> (lon, lat) degrees.
    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64)>;
}

/// Geographic coordinates used directly as planar x/y. The hub projection.
pub struct LonLat;

impl Projection for LonLat {
    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64)> {
        Ok((lon, lat))
    }

    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        Ok((x, y))
    }
}

/// Spherical Web Mercator (EPSG:3857).
pub struct WebMercator {
    radius: f64,
}

impl Default for WebMercator {
    fn default() -> Self {
        Self {
            radius: EARTH_RADIUS_M,
        }
    }
}

impl Projection for WebMercator {
    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64)> {
        if !(lat > -90.0 && lat < 90.0) {
            return Err(GeoFrameError::Format(format!(
                "latitude {} out of range for Web Mercator",
                lat
            )));
        }
        let x = self.radius * lon.to_radians();
        let y = self.radius * (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
        Ok((x, y))
    }

    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let lon = (x / self.radius).to_degrees();
        let lat = (2.0 * (y / self.radius).exp().atan() - std::f64::consts::FRAC_PI_2).to_degrees();
        Ok((lon, lat))
    }
}

/// World Equidistant Cylindrical (EPSG:4087), plate carrée on a sphere.
pub struct EquidistantCylindrical {
    radius: f64,
}

impl Default for EquidistantCylindrical {
    fn default() -> Self {
        Self {
            radius: EARTH_RADIUS_M,
        }
    }
}

impl Projection for EquidistantCylindrical {
    fn forward(&self, lon: f64, lat: f64) -> Result<(f64, f64)> {
        Ok((self.radius * lon.to_radians(), self.radius * lat.to_radians()))
    }

    fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        Ok(((x / self.radius).to_degrees(), (y / self.radius).to_degrees()))
    }
}

/// A resolved pointwise transform from one CRS to another.
pub trait CoordinateTransform {
    /// Transform a single (x, y) coordinate pair.
    fn apply(&self, x: f64, y: f64) -> Result<(f64, f64)>;
}

/// Inverse-then-forward composition through the geographic hub.
struct ComposedTransform {
    source: Box<dyn Projection>,
    target: Box<dyn Projection>,
}

impl CoordinateTransform for ComposedTransform {
    fn apply(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        let (lon, lat) = self.source.inverse(x, y)?;
        self.target.forward(lon, lat)
    }
}

/// Resolves a (source, target) CRS pair to a pointwise transform.
pub trait TransformResolver {
    /// Produce a transform, or fail with `UnknownCrs` when an identifier is
    /// not resolvable and `NoTransformPath` when both are known but no
    /// transformation between them is available.
    fn resolve(&self, source: Crs, target: Crs) -> Result<Box<dyn CoordinateTransform>>;
}

/// Resolver backed by the built-in spherical projections.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinResolver;

impl BuiltinResolver {
    fn projection_for(crs: Crs) -> Option<Box<dyn Projection>> {
        match crs {
            Crs::WGS84 => Some(Box::new(LonLat)),
            Crs::WEB_MERCATOR => Some(Box::new(WebMercator::default())),
            Crs::EQUIDISTANT_CYLINDRICAL => Some(Box::new(EquidistantCylindrical::default())),
            _ => None,
        }
    }
}

impl TransformResolver for BuiltinResolver {
    fn resolve(&self, source: Crs, target: Crs) -> Result<Box<dyn CoordinateTransform>> {
        for crs in [source, target] {
            if !crs.is_known() {
                return Err(GeoFrameError::UnknownCrs(crs));
            }
        }
        let (Some(src), Some(dst)) = (
            Self::projection_for(source),
            Self::projection_for(target),
        ) else {
            // Known identifier, no built-in math (datum-sensitive CRS).
            return Err(GeoFrameError::NoTransformPath {
                from: source,
                to: target,
            });
        };
        Ok(Box::new(ComposedTransform {
            source: src,
            target: dst,
        }))
    }
}

use crate::error::{ClusterRasterError, Result};
use gdal::spatial_ref::{AxisMappingStrategy, CoordTransform, SpatialRef};
use log::debug;
use std::fmt;

/// Coordinate reference system of every input geometry (WGS84 lon/lat).
pub const SOURCE_EPSG: i32 = 4326;

/// A coordinate reference system that resolved to a usable definition.
///
/// Only the EPSG code and the WKT it expanded to are kept, so the value is
/// plain data and can travel with feature collections and rasters.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialReference {
    epsg: u32,
    wkt: String,
}

impl SpatialReference {
    /// Resolve an EPSG code, rejecting codes that do not expand to a WKT definition.
    pub fn resolve(epsg: i32) -> Result<Self> {
        let code = u32::try_from(epsg)
            .ok()
            .filter(|&c| c > 0)
            .ok_or_else(|| ClusterRasterError::InvalidProjection {
                code: epsg,
                reason: "EPSG codes are positive integers".to_string(),
            })?;

        let srs = SpatialRef::from_epsg(code).map_err(|e| ClusterRasterError::InvalidProjection {
            code: epsg,
            reason: e.to_string(),
        })?;
        let wkt = srs.to_wkt().map_err(|e| ClusterRasterError::InvalidProjection {
            code: epsg,
            reason: e.to_string(),
        })?;

        if wkt.trim().len() <= 1 {
            return Err(ClusterRasterError::InvalidProjection {
                code: epsg,
                reason: "definition is empty".to_string(),
            });
        }

        debug!("Resolved EPSG:{} ({} bytes of WKT)", code, wkt.len());
        Ok(Self { epsg: code, wkt })
    }

    /// WGS84 geographic reference used for all input vectors
    pub fn source() -> Result<Self> {
        Self::resolve(SOURCE_EPSG)
    }

    pub fn epsg(&self) -> u32 {
        self.epsg
    }

    pub fn wkt(&self) -> &str {
        &self.wkt
    }

    // x is always longitude/easting regardless of the authority's axis order
    fn to_gdal(&self) -> Result<SpatialRef> {
        let mut srs = SpatialRef::from_epsg(self.epsg)?;
        srs.set_axis_mapping_strategy(AxisMappingStrategy::TraditionalGisOrder);
        Ok(srs)
    }
}

impl fmt::Display for SpatialReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

/// Maps 2D coordinates from one reference system into another, in place.
pub trait PointTransform {
    fn transform_xy(&self, xs: &mut [f64], ys: &mut [f64]) -> Result<()>;
}

impl<F> PointTransform for F
where
    F: Fn(f64, f64) -> (f64, f64),
{
    fn transform_xy(&self, xs: &mut [f64], ys: &mut [f64]) -> Result<()> {
        for (x, y) in xs.iter_mut().zip(ys.iter_mut()) {
            let (tx, ty) = self(*x, *y);
            *x = tx;
            *y = ty;
        }
        Ok(())
    }
}

/// GDAL-backed transformation between two resolved references
pub struct CoordinateTransform {
    inner: CoordTransform,
}

impl CoordinateTransform {
    /// Transform one point; `z` comes back exactly as given.
    pub fn transform_point(&self, x: f64, y: f64, z: f64) -> Result<(f64, f64, f64)> {
        let mut xs = [x];
        let mut ys = [y];
        let mut zs = [z];
        self.transform_coords(&mut xs, &mut ys, &mut zs)?;
        Ok((xs[0], ys[0], zs[0]))
    }

    /// Transform coordinate slices in place. Heights are restored after the
    /// GDAL call, whatever the target's vertical handling.
    pub fn transform_coords(&self, xs: &mut [f64], ys: &mut [f64], zs: &mut [f64]) -> Result<()> {
        if xs.is_empty() {
            return Ok(());
        }
        let heights = zs.to_vec();
        self.inner.transform_coords(xs, ys, zs)?;
        zs.copy_from_slice(&heights);
        Ok(())
    }
}

impl PointTransform for CoordinateTransform {
    fn transform_xy(&self, xs: &mut [f64], ys: &mut [f64]) -> Result<()> {
        let mut zs = vec![0.0; xs.len()];
        self.transform_coords(xs, ys, &mut zs)
    }
}

/// Build the transformation that maps coordinates in `source` onto `target`.
pub fn transform_between(
    source: &SpatialReference,
    target: &SpatialReference,
) -> Result<CoordinateTransform> {
    let inner = CoordTransform::new(&source.to_gdal()?, &target.to_gdal()?)?;
    debug!("Coordinate transform {} -> {}", source, target);
    Ok(CoordinateTransform { inner })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_resolve_well_known_codes() {
        let wgs84 = SpatialReference::resolve(4326).unwrap();
        assert_eq!(wgs84.epsg(), 4326);
        assert!(wgs84.wkt().contains("WGS"));

        let mercator = SpatialReference::resolve(3857).unwrap();
        assert_eq!(mercator.to_string(), "EPSG:3857");
    }

    #[test]
    fn test_resolve_rejects_zero_and_negative() {
        for code in [0, -1, -4326] {
            match SpatialReference::resolve(code) {
                Err(ClusterRasterError::InvalidProjection { code: c, .. }) => assert_eq!(c, code),
                other => panic!("expected InvalidProjection for {}, got {:?}", code, other),
            }
        }
    }

    #[test]
    fn test_resolve_rejects_unknown_code() {
        assert!(matches!(
            SpatialReference::resolve(999_999),
            Err(ClusterRasterError::InvalidProjection { .. })
        ));
    }

    #[test]
    fn test_web_mercator_uses_lon_lat_order() {
        let src = SpatialReference::source().unwrap();
        let dst = SpatialReference::resolve(3857).unwrap();
        let tf = transform_between(&src, &dst).unwrap();

        let (x, y, z) = tf.transform_point(180.0, 0.0, 12.5).unwrap();
        assert_relative_eq!(x, 20_037_508.342_789_244, epsilon = 1e-3);
        assert_relative_eq!(y, 0.0, epsilon = 1e-6);
        assert_relative_eq!(z, 12.5, epsilon = 1e-9);
    }

    #[test]
    fn test_heights_pass_through_geocentric_target() {
        // EPSG:4978 is geocentric, so GDAL itself would rewrite z
        let src = SpatialReference::source().unwrap();
        let dst = SpatialReference::resolve(4978).unwrap();
        let tf = transform_between(&src, &dst).unwrap();

        let (x, _, z) = tf.transform_point(0.0, 0.0, 250.0).unwrap();
        assert_relative_eq!(x, 6_378_387.0, epsilon = 1e-3);
        assert_eq!(z, 250.0);

        let mut xs = [10.0, 20.0];
        let mut ys = [40.0, 50.0];
        let mut zs = [1.5, -3.0];
        tf.transform_coords(&mut xs, &mut ys, &mut zs).unwrap();
        assert_eq!(zs, [1.5, -3.0]);
    }

    #[test]
    fn test_closure_transform() {
        let shift = |x: f64, y: f64| (x + 1.0, y * 2.0);
        let mut xs = [0.0, 1.0];
        let mut ys = [3.0, 4.0];
        shift.transform_xy(&mut xs, &mut ys).unwrap();
        assert_eq!(xs, [1.0, 2.0]);
        assert_eq!(ys, [6.0, 8.0]);
    }
}

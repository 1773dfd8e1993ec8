use crate::config::RasterOutputConfig;
use crate::error::{ClusterRasterError, Result};
use crate::features::FeatureCollection;
use crate::geotransform::GeoTransform;
use crate::raster::{Raster, RasterSpec};
use geo_types::{MultiPolygon, Polygon};
use log::{debug, info, warn};
use ndarray::parallel::prelude::*;
use ndarray::{ArrayViewMut2, Axis};

/// Value written into pixels covered by a cluster polygon
pub const BURN_VALUE: f32 = 1.0;

/// Rasterize cluster polygons into one binary mask band per feature.
///
/// Band `i` holds every feature whose `cluster` attribute equals `i`. A pixel
/// is burned when its centre falls inside the polygon (even-odd rule, with a
/// half-open crossing test on each scanline through pixel centres).
pub fn rasterize(features: &FeatureCollection, config: &RasterOutputConfig) -> Result<Raster> {
    let output = config.validate()?;
    if !output.geotransform.is_invertible() {
        return Err(ClusterRasterError::InvalidGeoTransform(
            output.geotransform.to_gdal(),
        ));
    }

    let band_count = features.len();
    check_allocation(band_count, output.width, output.height)?;
    let groups = group_by_cluster(features)?;

    info!(
        "Rasterizing {} features into {} bands of {}x{}",
        features.len(),
        band_count,
        output.width,
        output.height
    );

    let mut raster = Raster::zeros(RasterSpec {
        width: output.width,
        height: output.height,
        geotransform: output.geotransform,
        spatial_ref: features.spatial_ref().clone(),
        band_count,
    });

    let geotransform = output.geotransform;
    raster
        .data
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(band_index, mut band)| {
            debug!(
                "Burning {} geometries into band {}",
                groups[band_index].len(),
                band_index + 1
            );
            for geometry in &groups[band_index] {
                for polygon in &geometry.0 {
                    burn_polygon(&mut band, polygon, &geotransform);
                }
            }
        });

    Ok(raster)
}

// bands * rows * cols f32 values must be addressable
fn check_allocation(band_count: usize, width: usize, height: usize) -> Result<()> {
    let max_elements = isize::MAX as usize / std::mem::size_of::<f32>();
    match band_count
        .checked_mul(height)
        .and_then(|n| n.checked_mul(width))
    {
        Some(n) if n <= max_elements => Ok(()),
        _ => Err(ClusterRasterError::InvalidDimensions(width, height)),
    }
}

/// Group feature geometries by cluster index, one slot per feature.
fn group_by_cluster(features: &FeatureCollection) -> Result<Vec<Vec<&MultiPolygon<f64>>>> {
    let band_count = features.len();
    let mut groups: Vec<Vec<&MultiPolygon<f64>>> = vec![Vec::new(); band_count];

    for (idx, feature) in features.iter().enumerate() {
        let cluster = feature
            .cluster()
            .ok_or(ClusterRasterError::MissingClusterField { feature: idx })?;

        match usize::try_from(cluster) {
            Ok(band) if band < band_count => groups[band].push(&feature.geometry),
            _ => warn!(
                "Feature {} has cluster {} outside 0..{}, not rasterized",
                idx, cluster, band_count
            ),
        }
    }

    Ok(groups)
}

/// Require cluster indices to be exactly a permutation of `0..N`.
pub fn validate_cluster_indices(features: &FeatureCollection) -> Result<()> {
    let count = features.len();
    let mut seen = vec![false; count];

    for (idx, feature) in features.iter().enumerate() {
        let cluster = feature
            .cluster()
            .ok_or(ClusterRasterError::MissingClusterField { feature: idx })?;
        let slot = usize::try_from(cluster)
            .ok()
            .filter(|&c| c < count)
            .ok_or(ClusterRasterError::InvalidClusterIndex {
                feature: idx,
                index: cluster,
                count,
            })?;
        if seen[slot] {
            return Err(ClusterRasterError::DuplicateCluster(cluster));
        }
        seen[slot] = true;
    }

    Ok(())
}

/// Scanline fill of one polygon (exterior plus holes) into a band.
fn burn_polygon(band: &mut ArrayViewMut2<f32>, polygon: &Polygon<f64>, geotransform: &GeoTransform) {
    let (height, width) = band.dim();

    let mut rings: Vec<Vec<(f64, f64)>> = Vec::with_capacity(1 + polygon.interiors().len());
    for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
        let mut points = Vec::with_capacity(ring.0.len());
        for c in &ring.0 {
            match geotransform.geo_to_pixel(c.x, c.y) {
                Some((px, py)) if px.is_finite() && py.is_finite() => points.push((px, py)),
                _ => {
                    warn!("Skipping polygon with non-finite vertex ({}, {})", c.x, c.y);
                    return;
                }
            }
        }
        rings.push(points);
    }

    let (min_y, max_y) = rings
        .iter()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, y)| {
            (lo.min(y), hi.max(y))
        });
    if min_y > max_y {
        return;
    }

    let row_start = (min_y - 0.5).floor().max(0.0) as usize;
    let row_end = (max_y.ceil().max(0.0) as usize).min(height);

    let mut crossings: Vec<f64> = Vec::new();
    for row in row_start..row_end {
        let y = row as f64 + 0.5;
        crossings.clear();

        for ring in &rings {
            if ring.len() < 2 {
                continue;
            }
            // implicit closing edge for rings that were not stored closed
            let closing = (ring[ring.len() - 1], ring[0]);
            let edges = ring.windows(2).map(|w| (w[0], w[1])).chain(std::iter::once(closing));
            for ((x0, y0), (x1, y1)) in edges {
                if (y0 > y) != (y1 > y) {
                    crossings.push(x0 + (y - y0) * (x1 - x0) / (y1 - y0));
                }
            }
        }

        crossings.sort_by(|a, b| a.total_cmp(b));
        for span in crossings.chunks_exact(2) {
            let col_start = (span[0] - 0.5).ceil().max(0.0) as usize;
            let col_end = ((span[1] - 0.5).ceil().max(0.0) as usize).min(width);
            for col in col_start..col_end {
                band[[row, col]] = BURN_VALUE;
            }
        }
    }
}

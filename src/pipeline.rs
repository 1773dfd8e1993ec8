//! Vector clusters -> smoothed weight raster, end to end

use crate::config::RasterOutputConfig;
use crate::crs::SpatialReference;
use crate::error::{ClusterRasterError, Result};
use crate::features::FeatureCollection;
use crate::io::{read_feature_collection, write_raster, WriteOptions};
use crate::rasterize::{rasterize, validate_cluster_indices};
use crate::raster::Raster;
use crate::reproject::reproject;
use crate::smoothing::{smooth, DEFAULT_SIGMA};
use log::info;

#[derive(Debug, Clone)]
pub struct PipelineParams {
    pub input: String,
    pub config: RasterOutputConfig,
    pub target_epsg: i32,
    pub sigma: f64,
    pub strict_clusters: bool,
    pub write_options: WriteOptions,
}

impl PipelineParams {
    pub fn new(input: impl Into<String>, config: RasterOutputConfig, target_epsg: i32) -> Self {
        Self {
            input: input.into(),
            config,
            target_epsg,
            sigma: DEFAULT_SIGMA,
            strict_clusters: false,
            write_options: WriteOptions::default(),
        }
    }
}

/// Reproject, rasterize and smooth an in-memory collection.
pub fn build_weight_raster(
    features: &FeatureCollection,
    target_epsg: i32,
    config: &RasterOutputConfig,
    sigma: f64,
    strict_clusters: bool,
) -> Result<Raster> {
    let projected = reproject(features, target_epsg)?;
    if strict_clusters {
        validate_cluster_indices(&projected)?;
    }
    let raster = rasterize(&projected, config)?;
    smooth(raster, sigma)
}

/// Run the whole pipeline and write the result to the configured output target.
///
/// Configuration, projection and option errors are all raised before the
/// source is read, and nothing is written unless every stage succeeded.
pub fn run(params: &PipelineParams) -> Result<Raster> {
    let output = params.config.validate()?;
    params.write_options.validate()?;
    if !params.sigma.is_finite() {
        return Err(ClusterRasterError::InvalidSigma(params.sigma));
    }
    let target = SpatialReference::resolve(params.target_epsg)?;
    info!("Target reference: {}", target);

    let features = read_feature_collection(&params.input)?;
    let raster = build_weight_raster(
        &features,
        params.target_epsg,
        &params.config,
        params.sigma,
        params.strict_clusters,
    )?;
    if raster.band_count() == 0 {
        return Err(ClusterRasterError::NoBands);
    }

    write_raster(&output.output_target, &raster, &params.write_options)?;
    Ok(raster)
}

use crate::error::{ClusterRasterError, Result};
use crate::geotransform::GeoTransform;
use log::debug;
use serde::Deserialize;
use std::path::Path;

/// Output raster configuration as supplied by the caller.
///
/// Every key is optional at parse time so a missing one can be reported as
/// `MissingConfig` rather than a JSON error. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RasterOutputConfig {
    #[serde(alias = "out_file")]
    pub output_target: Option<String>,
    pub size: Option<[usize; 2]>,
    pub geotransform: Option<[f64; 6]>,
}

/// Validated output configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RasterOutputSpec {
    pub output_target: String,
    pub width: usize,
    pub height: usize,
    pub geotransform: GeoTransform,
}

impl RasterOutputConfig {
    pub fn new(output_target: impl Into<String>, size: [usize; 2], geotransform: [f64; 6]) -> Self {
        Self {
            output_target: Some(output_target.into()),
            size: Some(size),
            geotransform: Some(geotransform),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading raster output config from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check that all required keys are present and usable.
    pub fn validate(&self) -> Result<RasterOutputSpec> {
        let output_target = self
            .output_target
            .clone()
            .ok_or(ClusterRasterError::MissingConfig("outputTarget"))?;
        let [width, height] = self.size.ok_or(ClusterRasterError::MissingConfig("size"))?;
        let coeffs = self
            .geotransform
            .ok_or(ClusterRasterError::MissingConfig("geotransform"))?;

        if width == 0 || height == 0 || width.checked_mul(height).is_none() {
            return Err(ClusterRasterError::InvalidDimensions(width, height));
        }

        Ok(RasterOutputSpec {
            output_target,
            width,
            height,
            geotransform: GeoTransform::from_gdal(coeffs),
        })
    }
}

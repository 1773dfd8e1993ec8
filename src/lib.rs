// Library exports for testing and reuse

pub mod cli;
pub mod config;
pub mod crs;
pub mod error;
pub mod features;
pub mod geotransform;
pub mod io;
pub mod pipeline;
pub mod raster;
pub mod rasterize;
pub mod reproject;
pub mod smoothing;

// Re-export commonly used types
pub use config::{RasterOutputConfig, RasterOutputSpec};
pub use crs::{transform_between, CoordinateTransform, PointTransform, SpatialReference};
pub use error::{ClusterRasterError, Result};
pub use features::{AttributeValue, Feature, FeatureCollection, FieldType};
pub use geotransform::GeoTransform;
pub use raster::{Raster, RasterSpec};
pub use rasterize::{rasterize, validate_cluster_indices};
pub use reproject::{reproject, reproject_with};
pub use smoothing::{smooth, DEFAULT_SIGMA};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClusterRasterError {
    #[error("Invalid projection EPSG:{code}: {reason}")]
    InvalidProjection { code: i32, reason: String },

    #[error("Input vector source not found or unreadable: {0}")]
    MissingSource(String),

    #[error("Raster output configuration is missing required key '{0}'")]
    MissingConfig(&'static str),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Output raster has invalid dimensions: {0}x{1}")]
    InvalidDimensions(usize, usize),

    #[error("Geotransform cannot be inverted: {0:?}")]
    InvalidGeoTransform([f64; 6]),

    #[error("Invalid sigma: {0} (must be finite)")]
    InvalidSigma(f64),

    #[error("Unsupported geometry type in feature {feature}: {kind}")]
    UnsupportedGeometry { feature: usize, kind: String },

    #[error("Feature {feature} has no integer 'cluster' attribute")]
    MissingClusterField { feature: usize },

    #[error("Feature {feature} has cluster index {index}, expected 0..{count}")]
    InvalidClusterIndex {
        feature: usize,
        index: i64,
        count: usize,
    },

    #[error("Cluster index {0} is used by more than one feature")]
    DuplicateCluster(i64),

    #[error("Feature attributes do not match the collection schema: {0}")]
    SchemaMismatch(String),

    #[error("Raster has no bands to write")]
    NoBands,

    #[error("Invalid compression type: {0}")]
    InvalidCompression(String),

    #[error("Invalid tile size: {0} (must be multiple of 16)")]
    InvalidTileSize(usize),
}

pub type Result<T> = std::result::Result<T, ClusterRasterError>;

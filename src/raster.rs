use crate::crs::SpatialReference;
use crate::geotransform::GeoTransform;
use ndarray::{Array3, ArrayView2, Axis};

/// Shape and georeferencing of a weight raster
#[derive(Debug, Clone, PartialEq)]
pub struct RasterSpec {
    pub width: usize,
    pub height: usize,
    pub geotransform: GeoTransform,
    pub spatial_ref: SpatialReference,
    pub band_count: usize,
}

/// Multi-band `f32` raster indexed `[band, row, col]`
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pub spec: RasterSpec,
    pub data: Array3<f32>,
}

impl Raster {
    /// All-zero raster matching `spec`
    pub fn zeros(spec: RasterSpec) -> Self {
        let data = Array3::zeros((spec.band_count, spec.height, spec.width));
        Self { spec, data }
    }

    pub fn band_count(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    pub fn band(&self, index: usize) -> ArrayView2<'_, f32> {
        self.data.index_axis(Axis(0), index)
    }
}

use crate::crs::{SpatialReference, SOURCE_EPSG};
use crate::error::{ClusterRasterError, Result};
use crate::features::{AttributeValue, Feature, FeatureCollection, FieldType};
use crate::raster::Raster;
use gdal::cpl::CslStringList;
use gdal::vector::{FieldValue, LayerAccess, OGRFieldType};
use gdal::{Dataset, DriverManager, Metadata};
use geo_types::{Geometry, MultiPolygon};
use log::{debug, info, warn};
use ndarray::Axis;
use std::collections::HashMap;

const VALID_COMPRESSIONS: [&str; 4] = ["DEFLATE", "LZW", "ZSTD", "NONE"];

/// GTiff creation options for the weight raster
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteOptions {
    pub compression: Option<String>,
    pub tile_size: Option<usize>,
}

impl WriteOptions {
    pub fn validate(&self) -> Result<()> {
        if let Some(compression) = &self.compression {
            if !VALID_COMPRESSIONS.contains(&compression.as_str()) {
                return Err(ClusterRasterError::InvalidCompression(compression.clone()));
            }
        }
        if let Some(tile_size) = self.tile_size {
            if tile_size == 0 || tile_size % 16 != 0 {
                return Err(ClusterRasterError::InvalidTileSize(tile_size));
            }
        }
        Ok(())
    }

    pub fn creation_options(&self) -> Vec<String> {
        let mut options = Vec::new();
        if let Some(compression) = &self.compression {
            options.push(format!("COMPRESS={}", compression));
        }
        if let Some(tile_size) = self.tile_size {
            options.push("TILED=YES".to_string());
            options.push(format!("BLOCKXSIZE={}", tile_size));
            options.push(format!("BLOCKYSIZE={}", tile_size));
        }
        if !options.is_empty() {
            options.push("BIGTIFF=IF_SAFER".to_string());
        }
        options
    }
}

/// Read the cluster polygons of the first layer of an OGR data source.
///
/// Input coordinates are taken to be EPSG:4326 whatever the layer declares.
pub fn read_feature_collection(path: &str) -> Result<FeatureCollection> {
    info!("Opening cluster vector source: {}", path);
    let dataset =
        Dataset::open(path).map_err(|_| ClusterRasterError::MissingSource(path.to_string()))?;
    let mut layer = dataset
        .layer(0)
        .map_err(|_| ClusterRasterError::MissingSource(path.to_string()))?;

    if let Some(srs) = layer.spatial_ref() {
        match srs.auth_code() {
            Ok(code) if code == SOURCE_EPSG => {}
            Ok(code) => warn!(
                "Layer declares EPSG:{}, coordinates are treated as EPSG:{}",
                code, SOURCE_EPSG
            ),
            Err(_) => debug!("Layer reference has no authority code"),
        }
    }

    let schema: Vec<(String, FieldType)> = layer
        .defn()
        .fields()
        .map(|field| {
            let field_type = match field.field_type() {
                OGRFieldType::OFTInteger | OGRFieldType::OFTInteger64 => FieldType::Integer,
                OGRFieldType::OFTReal => FieldType::Real,
                _ => FieldType::String,
            };
            (field.name(), field_type)
        })
        .collect();
    debug!("Layer schema: {:?}", schema);

    let mut collection = FeatureCollection::new(schema, SpatialReference::source()?);

    for (idx, feature) in layer.features().enumerate() {
        let geometry = match feature.geometry() {
            Some(geometry) => to_multipolygon(idx, geometry.to_geo()?)?,
            None => {
                return Err(ClusterRasterError::UnsupportedGeometry {
                    feature: idx,
                    kind: "empty".to_string(),
                })
            }
        };

        let attributes: HashMap<String, AttributeValue> = feature
            .fields()
            .map(|(name, value)| (name, attribute_value(value)))
            .collect();

        collection.push(Feature {
            geometry,
            attributes,
        })?;
    }

    info!("Read {} cluster features", collection.len());
    Ok(collection)
}

fn to_multipolygon(feature: usize, geometry: Geometry<f64>) -> Result<MultiPolygon<f64>> {
    match geometry {
        Geometry::MultiPolygon(mp) => Ok(mp),
        Geometry::Polygon(p) => Ok(MultiPolygon(vec![p])),
        other => Err(ClusterRasterError::UnsupportedGeometry {
            feature,
            kind: geometry_kind(&other).to_string(),
        }),
    }
}

fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPolygon(_) => "MultiPolygon",
    }
}

fn attribute_value(value: Option<FieldValue>) -> AttributeValue {
    match value {
        None => AttributeValue::Null,
        Some(FieldValue::IntegerValue(v)) => AttributeValue::Integer(i64::from(v)),
        Some(FieldValue::Integer64Value(v)) => AttributeValue::Integer(v),
        Some(FieldValue::RealValue(v)) => AttributeValue::Real(v),
        Some(FieldValue::StringValue(v)) => AttributeValue::String(v),
        Some(other) => other
            .into_string()
            .map(AttributeValue::String)
            .unwrap_or(AttributeValue::Null),
    }
}

/// Write the weight raster as a multi-band float32 GeoTIFF.
pub fn write_raster(path: &str, raster: &Raster, options: &WriteOptions) -> Result<()> {
    let spec = &raster.spec;
    if raster.band_count() == 0 {
        return Err(ClusterRasterError::NoBands);
    }
    options.validate()?;

    info!("Creating output raster: {}", path);
    let driver = DriverManager::get_driver_by_name("GTiff")?;

    let creation_options = options.creation_options();
    let mut dataset = if creation_options.is_empty() {
        driver.create_with_band_type::<f32, _>(path, spec.width, spec.height, raster.band_count())?
    } else {
        let mut gdal_options = CslStringList::new();
        for opt in creation_options {
            gdal_options.add_string(&opt)?;
        }
        driver.create_with_band_type_with_options::<f32, _>(
            path,
            spec.width,
            spec.height,
            raster.band_count(),
            &gdal_options,
        )?
    };

    dataset.set_geo_transform(&spec.geotransform.to_gdal())?;
    dataset.set_projection(spec.spatial_ref.wkt())?;

    for (i, band_data) in raster.data.axis_iter(Axis(0)).enumerate() {
        let band_index = i + 1;
        debug!("Writing band {} for cluster {}", band_index, i);

        let mut raster_band = dataset.rasterband(band_index)?;
        // row-major iteration matches GDAL's scanline order
        let values: Vec<f32> = band_data.iter().copied().collect();
        let mut buffer = gdal::raster::Buffer::new((spec.width, spec.height), values);
        raster_band.write((0, 0), (spec.width, spec.height), &mut buffer)?;
        raster_band.set_description(&format!("cluster_{:02}", i))?;
    }

    info!("Successfully wrote {} bands to output", raster.band_count());
    Ok(())
}

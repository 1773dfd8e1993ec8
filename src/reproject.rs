use crate::crs::{transform_between, PointTransform, SpatialReference};
use crate::error::Result;
use crate::features::{Feature, FeatureCollection};
use geo_types::{Coord, LineString, MultiPolygon, Polygon};
use log::{debug, info};
use std::collections::HashMap;

/// Reproject a collection from EPSG:4326 into `target_epsg`.
///
/// The target is resolved before any geometry is touched. The input is left
/// untouched and a new collection carrying the target reference is returned.
pub fn reproject(features: &FeatureCollection, target_epsg: i32) -> Result<FeatureCollection> {
    let target = SpatialReference::resolve(target_epsg)?;
    let source = SpatialReference::source()?;
    let transform = transform_between(&source, &target)?;

    info!(
        "Reprojecting {} features from {} to {}",
        features.len(),
        source,
        target
    );
    reproject_with(features, &transform, target)
}

/// Reproject with an arbitrary point transform, labelling the result with `target`.
pub fn reproject_with<T: PointTransform + ?Sized>(
    features: &FeatureCollection,
    transform: &T,
    target: SpatialReference,
) -> Result<FeatureCollection> {
    let mut out = FeatureCollection::new(features.schema().to_vec(), target);

    for (idx, feature) in features.iter().enumerate() {
        let geometry = transform_multipolygon(&feature.geometry, transform)?;

        // copy by field name so schema order can never shuffle values
        let attributes: HashMap<_, _> = features
            .schema()
            .iter()
            .filter_map(|(name, _)| {
                feature
                    .attribute(name)
                    .map(|value| (name.clone(), value.clone()))
            })
            .collect();

        debug!(
            "Feature {}: {} polygons reprojected",
            idx,
            geometry.0.len()
        );
        out.push(Feature {
            geometry,
            attributes,
        })?;
    }

    Ok(out)
}

fn transform_multipolygon<T: PointTransform + ?Sized>(
    geometry: &MultiPolygon<f64>,
    transform: &T,
) -> Result<MultiPolygon<f64>> {
    let polygons = geometry
        .0
        .iter()
        .map(|polygon| {
            let exterior = transform_ring(polygon.exterior(), transform)?;
            let interiors = polygon
                .interiors()
                .iter()
                .map(|ring| transform_ring(ring, transform))
                .collect::<Result<Vec<_>>>()?;
            Ok(Polygon::new(exterior, interiors))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(MultiPolygon(polygons))
}

/// Transform every vertex of a ring in order, keeping a closed ring exactly closed.
fn transform_ring<T: PointTransform + ?Sized>(
    ring: &LineString<f64>,
    transform: &T,
) -> Result<LineString<f64>> {
    let mut xs: Vec<f64> = ring.0.iter().map(|c| c.x).collect();
    let mut ys: Vec<f64> = ring.0.iter().map(|c| c.y).collect();
    transform.transform_xy(&mut xs, &mut ys)?;

    let mut coords: Vec<Coord<f64>> = xs
        .into_iter()
        .zip(ys)
        .map(|(x, y)| Coord { x, y })
        .collect();

    if ring.is_closed() && coords.len() > 1 {
        let last = coords.len() - 1;
        coords[last] = coords[0];
    }

    Ok(LineString(coords))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClusterRasterError;
    use crate::features::{AttributeValue, FieldType, CLUSTER_FIELD};
    use approx::assert_relative_eq;
    use geo_types::{polygon, LineString};

    fn collection() -> FeatureCollection {
        let schema = vec![
            ("name".to_string(), FieldType::String),
            (CLUSTER_FIELD.to_string(), FieldType::Integer),
            ("weight".to_string(), FieldType::Real),
        ];
        let mut fc = FeatureCollection::new(schema, SpatialReference::source().unwrap());

        let with_hole = Polygon::new(
            LineString::from(vec![(2.0, 41.0), (3.0, 41.0), (3.0, 42.0), (2.0, 42.0), (2.0, 41.0)]),
            vec![LineString::from(vec![
                (2.4, 41.4),
                (2.6, 41.4),
                (2.6, 41.6),
                (2.4, 41.4),
            ])],
        );
        let plain = polygon![
            (x: 0.5, y: 40.0),
            (x: 1.5, y: 40.0),
            (x: 1.0, y: 40.7),
        ];

        fc.push(
            Feature::new(MultiPolygon(vec![with_hole]))
                .with_attribute("name", AttributeValue::String("coast".into()))
                .with_attribute(CLUSTER_FIELD, AttributeValue::Integer(0))
                .with_attribute("weight", AttributeValue::Real(0.25)),
        )
        .unwrap();
        fc.push(
            Feature::new(MultiPolygon(vec![plain]))
                .with_attribute("name", AttributeValue::Null)
                .with_attribute(CLUSTER_FIELD, AttributeValue::Integer(1))
                .with_attribute("weight", AttributeValue::Real(1.5)),
        )
        .unwrap();
        fc
    }

    fn assert_rings_closed(fc: &FeatureCollection) {
        for feature in fc.iter() {
            for polygon in &feature.geometry.0 {
                for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
                    assert_eq!(ring.0.first(), ring.0.last());
                }
            }
        }
    }

    #[test]
    fn test_identity_reprojection() {
        let input = collection();
        let output = reproject(&input, 4326).unwrap();

        assert_eq!(output.len(), input.len());
        assert_eq!(output.spatial_ref().epsg(), 4326);
        for (a, b) in input.iter().zip(output.iter()) {
            let ca: Vec<_> = a.geometry.0.iter().flat_map(|p| p.exterior().0.clone()).collect();
            let cb: Vec<_> = b.geometry.0.iter().flat_map(|p| p.exterior().0.clone()).collect();
            assert_eq!(ca.len(), cb.len());
            for (p, q) in ca.iter().zip(&cb) {
                assert_relative_eq!(p.x, q.x, epsilon = 1e-9);
                assert_relative_eq!(p.y, q.y, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_projected_target_keeps_closure_and_attributes() {
        let input = collection();
        for epsg in [3857, 25831, 32631] {
            let output = reproject(&input, epsg).unwrap();
            assert_eq!(output.spatial_ref().epsg(), epsg as u32);
            assert_eq!(output.schema(), input.schema());
            assert_rings_closed(&output);

            for (a, b) in input.iter().zip(output.iter()) {
                assert_eq!(a.attributes, b.attributes);
                assert_eq!(
                    a.attribute(CLUSTER_FIELD).unwrap().as_integer(),
                    b.attribute(CLUSTER_FIELD).unwrap().as_integer()
                );
            }
        }
    }

    #[test]
    fn test_invalid_target_fails_before_transform() {
        let input = collection();
        assert!(matches!(
            reproject(&input, 0),
            Err(ClusterRasterError::InvalidProjection { code: 0, .. })
        ));
        assert!(matches!(
            reproject(&input, -3857),
            Err(ClusterRasterError::InvalidProjection { .. })
        ));
    }

    #[test]
    fn test_drifting_transform_is_reclosed() {
        let input = collection();
        let counter = std::cell::Cell::new(0u32);
        // every call lands slightly off, so first and last vertices diverge
        let drifting = |x: f64, y: f64| {
            counter.set(counter.get() + 1);
            let eps = counter.get() as f64 * 1e-7;
            (x * 1000.0 + eps, y * 1000.0 - eps)
        };
        let target = SpatialReference::resolve(3857).unwrap();
        let output = reproject_with(&input, &drifting, target).unwrap();

        assert_rings_closed(&output);
        let ring = output.features()[0].geometry.0[0].exterior();
        assert_relative_eq!(ring.0[1].x, 3000.0, epsilon = 1e-3);
    }

    #[test]
    fn test_empty_collection() {
        let empty = FeatureCollection::new(
            vec![(CLUSTER_FIELD.to_string(), FieldType::Integer)],
            SpatialReference::source().unwrap(),
        );
        let output = reproject(&empty, 3857).unwrap();
        assert!(output.is_empty());
        assert_eq!(output.schema(), empty.schema());
        assert_eq!(output.spatial_ref().epsg(), 3857);
    }
}

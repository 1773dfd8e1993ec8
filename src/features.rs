//! In-memory vector model: multi-polygon features with a shared attribute schema

use crate::crs::SpatialReference;
use crate::error::{ClusterRasterError, Result};
use geo_types::MultiPolygon;
use std::collections::HashMap;

/// Name of the attribute holding the cluster index
pub const CLUSTER_FIELD: &str = "cluster";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Integer,
    Real,
    String,
}

/// Scalar attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Null,
    Integer(i64),
    Real(f64),
    String(String),
}

impl AttributeValue {
    /// Integral view of the value; reals are accepted only when they hold an exact integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(v) => Some(*v),
            AttributeValue::Real(v) if v.fract() == 0.0 && v.is_finite() => Some(*v as i64),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: MultiPolygon<f64>,
    pub attributes: HashMap<String, AttributeValue>,
}

impl Feature {
    pub fn new(geometry: MultiPolygon<f64>) -> Self {
        Self {
            geometry,
            attributes: HashMap::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_attribute(mut self, name: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn cluster(&self) -> Option<i64> {
        self.attribute(CLUSTER_FIELD).and_then(AttributeValue::as_integer)
    }
}

/// Ordered features sharing one schema and one reference system
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureCollection {
    schema: Vec<(String, FieldType)>,
    spatial_ref: SpatialReference,
    features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(schema: Vec<(String, FieldType)>, spatial_ref: SpatialReference) -> Self {
        Self {
            schema,
            spatial_ref,
            features: Vec::new(),
        }
    }

    /// Append a feature whose attribute names are exactly the schema's fields.
    pub fn push(&mut self, feature: Feature) -> Result<()> {
        if feature.attributes.len() != self.schema.len() {
            return Err(ClusterRasterError::SchemaMismatch(format!(
                "feature {} has {} attributes, schema has {} fields",
                self.features.len(),
                feature.attributes.len(),
                self.schema.len()
            )));
        }
        if let Some((name, _)) = self
            .schema
            .iter()
            .find(|(name, _)| !feature.attributes.contains_key(name))
        {
            return Err(ClusterRasterError::SchemaMismatch(format!(
                "feature {} lacks field '{}'",
                self.features.len(),
                name
            )));
        }
        self.features.push(feature);
        Ok(())
    }

    pub fn schema(&self) -> &[(String, FieldType)] {
        &self.schema
    }

    pub fn spatial_ref(&self) -> &SpatialReference {
        &self.spatial_ref
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{polygon, MultiPolygon};

    fn square() -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 1.0),
        ]])
    }

    fn schema() -> Vec<(String, FieldType)> {
        vec![
            (CLUSTER_FIELD.to_string(), FieldType::Integer),
            ("name".to_string(), FieldType::String),
        ]
    }

    #[test]
    fn test_push_enforces_schema() {
        let srs = SpatialReference::source().unwrap();
        let mut fc = FeatureCollection::new(schema(), srs);

        let ok = Feature::new(square())
            .with_attribute(CLUSTER_FIELD, AttributeValue::Integer(0))
            .with_attribute("name", AttributeValue::String("north".into()));
        assert!(fc.push(ok).is_ok());

        let missing = Feature::new(square()).with_attribute(CLUSTER_FIELD, AttributeValue::Integer(1));
        assert!(matches!(fc.push(missing), Err(ClusterRasterError::SchemaMismatch(_))));

        let renamed = Feature::new(square())
            .with_attribute(CLUSTER_FIELD, AttributeValue::Integer(1))
            .with_attribute("label", AttributeValue::Null);
        assert!(fc.push(renamed).is_err());

        assert_eq!(fc.len(), 1);
    }

    #[test]
    fn test_cluster_accessor() {
        let f = Feature::new(square()).with_attribute(CLUSTER_FIELD, AttributeValue::Real(3.0));
        assert_eq!(f.cluster(), Some(3));

        let f = Feature::new(square()).with_attribute(CLUSTER_FIELD, AttributeValue::Real(3.5));
        assert_eq!(f.cluster(), None);

        let f = Feature::new(square()).with_attribute(CLUSTER_FIELD, AttributeValue::String("2".into()));
        assert_eq!(f.cluster(), None);
    }
}

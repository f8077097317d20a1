//! GeoJSON input model
//!
//! Only what the viewer needs is modelled: a `FeatureCollection` whose
//! features carry a polygonal geometry and a free-form properties map.
//! Features are kept as raw JSON values until they are indexed so that a
//! single malformed feature degrades into a diagnostic instead of failing
//! the whole document.

use crate::{CullError, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;

/// Top-level collection, features not yet validated
#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    features: Vec<Value>,
}

#[derive(Deserialize)]
struct RawCollection {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    features: Vec<Value>,
}

/// A single GeoJSON feature
#[derive(Debug, Clone, Deserialize)]
pub struct GeoJsonFeature {
    #[serde(default)]
    pub geometry: Option<Geometry>,
    /// `null` and missing properties both become an empty map
    #[serde(default, deserialize_with = "nullable_properties")]
    pub properties: Map<String, Value>,
}

/// Geometry variants; everything that is not polygonal is unsupported
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Polygon {
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Vec<f64>>>>,
    },
    #[serde(other)]
    Unsupported,
}

fn nullable_properties<'de, D>(deserializer: D) -> std::result::Result<Map<String, Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

impl FeatureCollection {
    /// Build a collection directly from feature values
    pub fn from_features(features: Vec<Value>) -> Self {
        Self { features }
    }

    /// Number of features in the document, valid or not
    #[inline]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the document has no features
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Hand the raw features over to the loader
    pub fn into_features(self) -> Vec<Value> {
        self.features
    }
}

impl GeoJsonFeature {
    /// Decode one raw feature value
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Exterior ring of the feature as `[lon, lat]` pairs
    ///
    /// Holes are ignored; for multi-polygons the first polygon is used.
    pub fn exterior_ring(&self) -> Result<&[Vec<f64>]> {
        let ring = match &self.geometry {
            None => return Err(CullError::MissingGeometry),
            Some(Geometry::Polygon { coordinates }) => coordinates.first(),
            Some(Geometry::MultiPolygon { coordinates }) => {
                coordinates.first().and_then(|polygon| polygon.first())
            }
            Some(Geometry::Unsupported) => {
                return Err(CullError::UnsupportedGeometry(
                    "only Polygon and MultiPolygon are rendered".to_string(),
                ));
            }
        };
        ring.map(Vec::as_slice)
            .ok_or_else(|| CullError::InvalidGeometry("polygon without rings".to_string()))
    }
}

/// Parse GeoJSON text into a feature collection
pub fn parse_feature_collection(text: &str) -> Result<FeatureCollection> {
    #[cfg(feature = "profiling")]
    profiling::scope!("geojson::parse_feature_collection");

    let raw: RawCollection = serde_json::from_str(text)?;
    if raw.kind != "FeatureCollection" {
        return Err(CullError::NotFeatureCollection(raw.kind));
    }
    Ok(FeatureCollection {
        features: raw.features,
    })
}

/// Read and parse a GeoJSON file
pub fn read_feature_collection(path: impl AsRef<Path>) -> Result<FeatureCollection> {
    let text = std::fs::read_to_string(path.as_ref())?;
    let collection = parse_feature_collection(&text)?;
    tracing::info!(
        "Read {} features from {}",
        collection.len(),
        path.as_ref().display()
    );
    Ok(collection)
}

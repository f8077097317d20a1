//! Polygon feature storage
//!
//! This module provides the `Feature` struct holding a validated exterior ring
//! with its precomputed bounding box, and the `IndexEntry` stored in the
//! spatial index.

use crate::geojson::GeoJsonFeature;
use crate::rtree::Bounded;
use crate::{CullError, Result};
use geo::{BoundingRect, Coord, LineString, Rect};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Identifier assigned at load time: the feature's position in the input collection
pub type FeatureId = usize;

/// Property key under which the assigned identifier is recorded
pub const ID_PROPERTY: &str = "id";

/// A single polygon with immutable geometry and precomputed metadata
#[derive(Clone, Debug)]
pub struct Feature {
    /// Stable identifier (insertion order)
    id: FeatureId,
    /// Open exterior ring in (lon, lat), closing vertex dropped
    ring: LineString<f64>,
    /// Precomputed bounding box in (lon, lat)
    bounding_box: Rect<f64>,
    /// Original properties with the identifier attached
    properties: Map<String, Value>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Feature {
    /// Create a feature from an exterior ring
    ///
    /// The ring may be closed (first == last) or open. It must have at least
    /// three distinct vertices, finite coordinates and a bounding box with
    /// non-zero width and height.
    pub fn new(
        id: FeatureId,
        ring: Vec<Coord<f64>>,
        mut properties: Map<String, Value>,
    ) -> Result<Arc<Self>> {
        let ring = Self::normalize_ring(ring)?;
        let bounding_box = ring
            .bounding_rect()
            .ok_or_else(|| CullError::InvalidGeometry("empty ring".to_string()))?;

        if bounding_box.width() <= 0.0 || bounding_box.height() <= 0.0 {
            return Err(CullError::DegenerateBoundingBox {
                width: bounding_box.width(),
                height: bounding_box.height(),
            });
        }

        properties.insert(ID_PROPERTY.to_string(), Value::from(id));

        Ok(Arc::new(Feature {
            id,
            ring,
            bounding_box,
            properties,
        }))
    }

    /// Create a feature from a decoded GeoJSON feature
    pub fn from_geojson(id: FeatureId, feature: GeoJsonFeature) -> Result<Arc<Self>> {
        let positions = feature.exterior_ring()?;
        let mut ring = Vec::with_capacity(positions.len());
        for position in positions {
            match position.as_slice() {
                [lon, lat, ..] => ring.push(Coord { x: *lon, y: *lat }),
                _ => {
                    return Err(CullError::InvalidGeometry(format!(
                        "position with {} ordinates",
                        position.len()
                    )));
                }
            }
        }
        Self::new(id, ring, feature.properties)
    }

    /// Validate the vertices and drop the closing duplicate
    fn normalize_ring(mut ring: Vec<Coord<f64>>) -> Result<LineString<f64>> {
        if let Some(bad) = ring.iter().find(|c| !c.x.is_finite() || !c.y.is_finite()) {
            return Err(CullError::InvalidGeometry(format!(
                "non-finite coordinate ({}, {})",
                bad.x, bad.y
            )));
        }

        ring.dedup();
        while ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }

        let distinct = Self::distinct_vertices(&ring);
        if distinct < 3 {
            return Err(CullError::InvalidGeometry(format!(
                "ring has {distinct} distinct vertices, at least 3 required"
            )));
        }

        Ok(LineString::from(ring))
    }

    fn distinct_vertices(ring: &[Coord<f64>]) -> usize {
        let mut sorted = ring.to_vec();
        sorted.sort_unstable_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
        sorted.dedup();
        sorted.len()
    }

    /// Identifier assigned at load time
    #[inline]
    pub fn id(&self) -> FeatureId {
        self.id
    }

    /// Open exterior ring in (lon, lat)
    #[inline]
    pub fn ring(&self) -> &[Coord<f64>] {
        &self.ring.0
    }

    /// Bounding box in (lon, lat)
    #[inline]
    pub fn bounding_box(&self) -> Rect<f64> {
        self.bounding_box
    }

    /// Properties, including the assigned identifier
    #[inline]
    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    /// Number of ring vertices
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.ring.0.len()
    }
}

/// Spatial index entry: a bounding box and the feature it belongs to
///
/// Two entries are equal only when they refer to the same feature allocation.
#[derive(Clone, Debug)]
pub struct IndexEntry {
    bounding_box: Rect<f64>,
    feature: Arc<Feature>,
}

impl IndexEntry {
    pub fn new(feature: Arc<Feature>) -> Self {
        Self {
            bounding_box: feature.bounding_box(),
            feature,
        }
    }

    #[inline]
    pub fn feature(&self) -> &Arc<Feature> {
        &self.feature
    }

    #[inline]
    pub fn id(&self) -> FeatureId {
        self.feature.id()
    }
}

impl PartialEq for IndexEntry {
    fn eq(&self, other: &Self) -> bool {
        self.feature.id == other.feature.id && Arc::ptr_eq(&self.feature, &other.feature)
    }
}

impl Bounded for IndexEntry {
    #[inline]
    fn bounding_box(&self) -> Rect<f64> {
        self.bounding_box
    }
}

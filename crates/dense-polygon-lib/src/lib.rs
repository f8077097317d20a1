//! Dense Polygon Library - Core Data Structures for Overlap-Culled Polygon Rendering
//!
//! This library indexes large GeoJSON polygon collections and renders only what is
//! visible in a viewport, skipping polygons that are already hidden under others.
//! The core data structure is an rbush-style R-tree that is bulk-loaded in batches,
//! pruned once by a corner-coverage pass and then queried on every view change.
//!
//! # Architecture
//!
//! - **[`Feature`]**: Immutable polygon with precomputed bounding box
//! - **[`RTree`]**: Balanced bounding-box tree with packed bulk loading
//! - **[`PolygonCollection`]**: Batched loading, overlap elimination and viewport queries
//! - **[`FrameRenderer`]**: Project, clip, coverage-test and draw onto a [`Surface`]
//! - **[`CullContext`]**: Owns the collection and renderer, re-renders on view changes
//!
//! # Performance Characteristics
//!
//! - **Build Time**: O(N log N) per batch, feature preparation parallelized with rayon
//! - **Query Time**: O(log N + K) where K=results
//! - **Frame Time**: O(K × V) where V=vertices per visible polygon, plus one alpha read per polygon

mod collection;
mod context;
mod coverage;
mod feature;
pub mod geojson;
mod overlap;
mod render;
mod rtree;
mod screen;
mod surface;
pub mod utils;

// Public API exports
pub use collection::{
    CollectionInfo, Config, DrawOrder, LoadDiagnostic, LoadJob, LoadProgress, PolygonCollection,
};
pub use context::CullContext;
pub use coverage::{AlphaRegion, CoverageSample, PixelRect, sample_coverage};
pub use feature::{Feature, FeatureId, ID_PROPERTY, IndexEntry};
pub use geojson::{FeatureCollection, parse_feature_collection, read_feature_collection};
pub use overlap::{EliminationReport, eliminate_overlaps};
pub use render::{FrameRenderer, PolygonStyle, RenderOptions, RenderPhase, RenderStats};
pub use rtree::{Bounded, DEFAULT_MAX_ENTRIES, RTree};
pub use screen::{MercatorView, ScreenPolygon, TILE_SIZE, ViewTransform, clip_to_rect};
pub use surface::{Color, RasterSurface, Surface};

/// Error types for the library
#[derive(Debug, thiserror::Error)]
pub enum CullError {
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Expected a FeatureCollection, found {0:?}")]
    NotFeatureCollection(String),

    #[error("Feature has no geometry")]
    MissingGeometry,

    #[error("Unsupported geometry: {0}")]
    UnsupportedGeometry(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Degenerate bounding box ({width} x {height})")]
    DegenerateBoundingBox { width: f64, height: f64 },
}

pub type Result<T> = std::result::Result<T, CullError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_exports() {
        // Verify that all public types are accessible
        let _: fn(Config) -> PolygonCollection = PolygonCollection::new;
        let _: fn() -> Config = Config::default;
        let _: fn() -> RenderOptions = RenderOptions::default;
        let _: fn() -> RTree<IndexEntry> = RTree::new;
    }

    #[test]
    fn test_error_messages() {
        let err = CullError::DegenerateBoundingBox {
            width: 0.0,
            height: 1.5,
        };
        assert_eq!(err.to_string(), "Degenerate bounding box (0 x 1.5)");
        assert_eq!(
            CullError::NotFeatureCollection("Feature".to_string()).to_string(),
            "Expected a FeatureCollection, found \"Feature\""
        );
    }
}

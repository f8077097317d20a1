//! PolygonCollection - Top-level manager for features, the spatial index and queries
//!
//! This module provides the high-level API for loading a GeoJSON feature
//! collection in batches, pruning hidden features once loading is complete,
//! and executing viewport queries in painter's order.

use crate::feature::{Feature, FeatureId, IndexEntry};
use crate::geojson::{FeatureCollection, GeoJsonFeature};
use crate::overlap::{EliminationReport, eliminate_overlaps};
use crate::rtree::{DEFAULT_MAX_ENTRIES, RTree};
use crate::utils::rect_union;
use crate::Result;

use geo::Rect;
use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Configuration for the polygon collection
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// Number of features indexed per load step (default 500)
    pub batch_size: usize,
    /// Maximum children per R-tree node (default 9)
    pub max_node_entries: usize,
    /// Run overlap elimination once loading is complete (default true)
    pub eliminate_overlaps: bool,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Default for Config {
    fn default() -> Self {
        Self {
            batch_size: 500,
            max_node_entries: DEFAULT_MAX_ENTRIES,
            eliminate_overlaps: true,
        }
    }
}

/// Ordering of viewport query results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DrawOrder {
    /// Whatever order the index yields
    Natural,
    /// Ascending feature identifier, the order used by overlap elimination
    #[default]
    Identifier,
    /// Identifier order, then stably by bounding box lower-left corner
    /// (latitude first)
    ScreenRowMajor,
}

impl DrawOrder {
    pub const ALL: [DrawOrder; 3] = [
        DrawOrder::Natural,
        DrawOrder::Identifier,
        DrawOrder::ScreenRowMajor,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DrawOrder::Natural => "Index order",
            DrawOrder::Identifier => "Identifier",
            DrawOrder::ScreenRowMajor => "Lower-left corner",
        }
    }
}

/// A feature that was excluded while loading
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LoadDiagnostic {
    /// Position of the feature in the input collection
    pub index: usize,
    /// Human readable reason
    pub reason: String,
}

/// Information about the polygon collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CollectionInfo {
    /// Features that passed validation
    pub feature_count: usize,
    /// Features currently in the spatial index
    pub indexed_count: usize,
    /// Features rejected while loading
    pub excluded_count: usize,
    /// Features dropped by overlap elimination
    pub removed_overlaps: usize,
    /// Total ring vertices across valid features
    pub total_vertices: usize,
}

/// Progress of a cooperative load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadProgress {
    /// Input features consumed so far
    pub processed: usize,
    /// Input features in the document
    pub total: usize,
}

impl LoadProgress {
    /// Fraction in `[0, 1]`, 1 for an empty document
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.processed as f32 / self.total as f32
        }
    }
}

/// Cached statistics for the collection
///
/// These are updated incrementally as batches are indexed.
#[derive(Debug, Clone, Default)]
struct CachedStats {
    total_vertices: usize,
    /// Union of all feature boxes in (lon, lat), `None` if empty
    bounding_box: Option<Rect<f64>>,
}

/// Top-level manager for all features and queries
#[derive(Clone)]
pub struct PolygonCollection {
    /// Valid features in ascending identifier order
    features: Vec<Arc<Feature>>,
    /// Spatial index, pruned by overlap elimination
    index: RTree<IndexEntry>,
    /// Configuration settings
    config: Config,
    /// Features rejected while loading
    diagnostics: Vec<LoadDiagnostic>,
    /// Set once loading is complete
    elimination: Option<EliminationReport>,
    /// Cached statistics (incrementally updated)
    cached_stats: CachedStats,
}

/// Cooperative loader that indexes one batch per step
///
/// Batches are consumed strictly in input order. Once the last batch is
/// indexed the collection runs its post-load pass.
pub struct LoadJob {
    remaining: std::vec::IntoIter<Value>,
    batch_size: usize,
    progress: LoadProgress,
    finished: bool,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl LoadJob {
    /// Index the next batch into `collection`
    pub fn step(&mut self, collection: &mut PolygonCollection) -> LoadProgress {
        if self.finished {
            return self.progress;
        }

        let batch: Vec<Value> = self.remaining.by_ref().take(self.batch_size).collect();
        if !batch.is_empty() {
            let start = self.progress.processed;
            self.progress.processed += batch.len();
            collection.index_batch(start, batch);
        }

        if self.remaining.len() == 0 {
            collection.finish_load();
            self.finished = true;
        }
        self.progress
    }

    #[inline]
    pub fn progress(&self) -> LoadProgress {
        self.progress
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl PolygonCollection {
    /// Create an empty collection with the given configuration
    pub fn new(config: Config) -> Self {
        let index = RTree::with_max_entries(config.max_node_entries);
        Self {
            features: Vec::new(),
            index,
            config,
            diagnostics: Vec::new(),
            elimination: None,
            cached_stats: CachedStats::default(),
        }
    }

    /// Start loading a document, replacing any previous content
    ///
    /// Identifiers are positions in `collection`, so rejected features leave
    /// gaps in the identifier sequence.
    pub fn begin_load(&mut self, collection: FeatureCollection) -> LoadJob {
        self.clear();
        let total = collection.len();
        tracing::info!(
            "Loading {} features in batches of {}",
            total,
            self.config.batch_size
        );
        LoadJob {
            remaining: collection.into_features().into_iter(),
            batch_size: self.config.batch_size.max(1),
            progress: LoadProgress {
                processed: 0,
                total,
            },
            finished: false,
        }
    }

    /// Load a whole document synchronously
    pub fn load(&mut self, collection: FeatureCollection) -> EliminationReport {
        let mut job = self.begin_load(collection);
        while !job.is_finished() {
            job.step(self);
        }
        self.elimination.unwrap_or_default()
    }

    /// Parse and load GeoJSON text synchronously
    pub fn load_str(&mut self, text: &str) -> Result<EliminationReport> {
        let collection = crate::geojson::parse_feature_collection(text)?;
        Ok(self.load(collection))
    }

    /// Validate a batch in parallel, then merge it into the index
    fn index_batch(&mut self, start: usize, batch: Vec<Value>) {
        #[cfg(feature = "profiling")]
        profiling::scope!("collection::index_batch");

        let prepared: Vec<(usize, Result<Arc<Feature>>)> = batch
            .into_par_iter()
            .enumerate()
            .map(|(i, value)| {
                let id: FeatureId = start + i;
                let feature =
                    GeoJsonFeature::from_value(value).and_then(|f| Feature::from_geojson(id, f));
                (id, feature)
            })
            .collect();

        let mut entries = Vec::with_capacity(prepared.len());
        for (index, feature) in prepared {
            match feature {
                Ok(feature) => {
                    self.update_stats_for_added_feature(&feature);
                    entries.push(IndexEntry::new(feature.clone()));
                    self.features.push(feature);
                }
                Err(err) => {
                    tracing::warn!("Skipping feature {}: {}", index, err);
                    self.diagnostics.push(LoadDiagnostic {
                        index,
                        reason: err.to_string(),
                    });
                }
            }
        }

        tracing::debug!(
            "Indexed batch starting at {}: {} features",
            start,
            entries.len()
        );
        self.index.bulk_load(entries);
    }

    /// Post-load pass: overlap elimination when enabled
    pub fn finish_load(&mut self) -> EliminationReport {
        let report = if self.config.eliminate_overlaps {
            eliminate_overlaps(&mut self.index, self.config.max_node_entries)
        } else {
            EliminationReport {
                examined: self.index.len(),
                removed: 0,
                retained: self.index.len(),
            }
        };
        tracing::info!(
            "Loaded {} features ({} excluded, {} hidden by overlaps)",
            self.features.len(),
            self.diagnostics.len(),
            report.removed
        );
        self.elimination = Some(report);
        report
    }

    /// Features whose bounding box intersects `bounds` (lon, lat), in the requested order
    pub fn query_visible(&self, bounds: Rect<f64>, order: DrawOrder) -> Vec<Arc<Feature>> {
        #[cfg(feature = "profiling")]
        profiling::scope!("collection::query_visible");

        let mut hits = self.index.query(&bounds);
        match order {
            DrawOrder::Natural => {}
            DrawOrder::Identifier => hits.sort_unstable_by_key(|entry| entry.id()),
            DrawOrder::ScreenRowMajor => {
                hits.sort_unstable_by_key(|entry| entry.id());
                hits.sort_by(|a, b| {
                    let (a, b) = (a.feature().bounding_box(), b.feature().bounding_box());
                    a.min()
                        .y
                        .total_cmp(&b.min().y)
                        .then(a.min().x.total_cmp(&b.min().x))
                });
            }
        }
        hits.into_iter().map(|entry| entry.feature().clone()).collect()
    }

    /// Whether the post-load pass has run
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.elimination.is_some()
    }

    /// Number of valid features
    #[inline]
    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    /// Check if the collection is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Get a feature by identifier
    pub fn get_feature(&self, id: FeatureId) -> Option<&Arc<Feature>> {
        self.features
            .binary_search_by_key(&id, |feature| feature.id())
            .ok()
            .map(|pos| &self.features[pos])
    }

    /// All valid features, including those hidden by overlaps
    #[inline]
    pub fn features(&self) -> &[Arc<Feature>] {
        &self.features
    }

    /// Spatial index of drawable features
    #[inline]
    pub fn index(&self) -> &RTree<IndexEntry> {
        &self.index
    }

    #[inline]
    pub fn diagnostics(&self) -> &[LoadDiagnostic] {
        &self.diagnostics
    }

    #[inline]
    pub fn elimination_report(&self) -> Option<EliminationReport> {
        self.elimination
    }

    /// Get a reference to the configuration
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get collection information
    ///
    /// This is O(1) as all values are cached.
    pub fn get_info(&self) -> CollectionInfo {
        CollectionInfo {
            feature_count: self.features.len(),
            indexed_count: self.index.len(),
            excluded_count: self.diagnostics.len(),
            removed_overlaps: self.elimination.map_or(0, |report| report.removed),
            total_vertices: self.cached_stats.total_vertices,
        }
    }

    /// Clear all features from the collection
    pub fn clear(&mut self) {
        self.features.clear();
        self.index = RTree::with_max_entries(self.config.max_node_entries);
        self.diagnostics.clear();
        self.elimination = None;
        self.cached_stats = CachedStats::default();
    }

    /// Get the combined bounding box of all features in WGS84 coordinates (lat/lon)
    ///
    /// Returns `None` if there are no features loaded.
    /// Returns `Some((min_lat, min_lon, max_lat, max_lon))` otherwise.
    pub fn bounding_box_wgs84(&self) -> Option<(f64, f64, f64, f64)> {
        let bbox = self.cached_stats.bounding_box?;
        Some((bbox.min().y, bbox.min().x, bbox.max().y, bbox.max().x))
    }

    /// Get the center point of all features in WGS84 coordinates
    ///
    /// Returns `None` if there are no features loaded.
    /// Returns `Some((lat, lon))` otherwise.
    #[inline]
    pub fn center_wgs84(&self) -> Option<(f64, f64)> {
        self.bounding_box_wgs84()
            .map(|(min_lat, min_lon, max_lat, max_lon)| {
                ((min_lat + max_lat) / 2.0, (min_lon + max_lon) / 2.0)
            })
    }

    /// Update cached statistics when a feature is added
    #[inline]
    fn update_stats_for_added_feature(&mut self, feature: &Feature) {
        self.cached_stats.total_vertices += feature.vertex_count();
        let bbox = feature.bounding_box();
        self.cached_stats.bounding_box = Some(match self.cached_stats.bounding_box {
            Some(current) => rect_union(&current, &bbox),
            None => bbox,
        });
    }
}

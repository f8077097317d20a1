//! Application state management
//!
//! This module manages the application state including the polygon layer,
//! UI settings, and file loading operations.

use crate::app::plugin::{PolygonLayer, SharedLayer, lock_layer};
use crate::app::settings::Settings;
use dense_polygon_lib::{
    CollectionInfo, Color, CullContext, DrawOrder, FeatureCollection, LoadProgress,
    PolygonStyle, RenderOptions, RenderStats,
};
use std::path::PathBuf;
use tokio::sync::oneshot;

/// Main application state
pub struct AppState {
    /// Polygon layer shared with the map plugin
    pub layer: SharedLayer,

    /// Current UI settings
    pub ui_settings: UiSettings,

    /// File loading state
    pub file_loader: FileLoader,

    /// Statistics about loaded data
    pub stats: Stats,

    /// Fit the map to the data on the next frame
    pub pending_fit_bounds: bool,
}

/// UI-specific settings that can be adjusted at runtime
#[derive(Clone, Debug, PartialEq)]
pub struct UiSettings {
    /// Draw every visible polygon, skipping the coverage test
    pub render_all: bool,

    /// Painter's order of the visible polygons
    pub draw_order: DrawOrder,

    /// Outline width in pixels
    pub stroke_width: f32,

    /// Fill opacity (0.0-1.0)
    pub fill_opacity: f32,

    /// Map tiles provider
    pub tiles_provider: TilesProvider,

    /// Whether sidebar is open
    pub sidebar_open: bool,

    /// Current active tab in sidebar
    pub active_tab: SidebarTab,
}

/// Sidebar tabs
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SidebarTab {
    Layer,
    Settings,
}

/// Available map tile providers
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TilesProvider {
    OpenStreetMap,
    OpenTopoMap,
}

impl TilesProvider {
    pub fn attribution(&self) -> &'static str {
        match self {
            Self::OpenStreetMap => "© OpenStreetMap contributors",
            Self::OpenTopoMap => "© OpenTopoMap (CC-BY-SA)",
        }
    }

    pub fn all() -> &'static [Self] {
        &[Self::OpenStreetMap, Self::OpenTopoMap]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenStreetMap => "OpenStreetMap",
            Self::OpenTopoMap => "OpenTopoMap",
        }
    }
}

/// A file being read and parsed off the UI thread
pub struct ReadTask {
    pub path: PathBuf,
    receiver: oneshot::Receiver<Result<FeatureCollection, String>>,
}

/// File loading state and operations
#[derive(Default)]
pub struct FileLoader {
    /// File waiting to be read
    pub pending_file: Option<PathBuf>,

    /// File currently being read
    pub reading: Option<ReadTask>,

    /// Load errors
    pub errors: Vec<(PathBuf, String)>,

    /// File whose features are in the layer
    pub loaded_file: Option<PathBuf>,

    /// Show file picker dialog
    pub show_picker: bool,
}

/// Statistics about loaded data
#[derive(Default)]
pub struct Stats {
    /// Collection counters after the last completed load
    pub info: CollectionInfo,

    /// Counters of the last redraw
    pub last_frame: RenderStats,

    /// Duration of the last redraw in milliseconds
    pub last_render_ms: f64,

    /// Number of redraws so far
    pub redraws: usize,
}

impl AppState {
    /// Create new application state from CLI settings
    pub fn new(settings: &Settings) -> Self {
        Self::with_ui_settings(settings, UiSettings::from_settings(settings))
    }

    /// Create state with explicit UI settings (e.g. restored ones)
    pub fn with_ui_settings(settings: &Settings, ui_settings: UiSettings) -> Self {
        let context = CullContext::new(settings.library_config(), ui_settings.render_options());
        Self {
            layer: PolygonLayer::shared(context),
            ui_settings,
            file_loader: FileLoader {
                pending_file: settings.geojson_file.clone(),
                ..Default::default()
            },
            stats: Stats::default(),
            pending_fit_bounds: false,
        }
    }

    /// Queue a file, replacing any file still waiting
    pub fn queue_file(&mut self, path: PathBuf) {
        self.file_loader.pending_file = Some(path);
    }

    /// Start reading the pending file on the blocking pool
    ///
    /// Must be called from within the tokio runtime.
    pub fn start_pending_read(&mut self) {
        if self.file_loader.reading.is_some() {
            return;
        }
        let Some(path) = self.file_loader.pending_file.take() else {
            return;
        };

        tracing::info!("Reading {}", path.display());
        let (sender, receiver) = oneshot::channel();
        let read_path = path.clone();
        tokio::task::spawn_blocking(move || {
            profiling::scope!("read_feature_collection");
            let result = dense_polygon_lib::read_feature_collection(&read_path)
                .map_err(|e| e.to_string());
            let _ = sender.send(result);
        });
        self.file_loader.reading = Some(ReadTask { path, receiver });
    }

    /// Hand a finished read over to the layer; true while a read is running
    pub fn poll_read(&mut self) -> bool {
        let Some(task) = self.file_loader.reading.as_mut() else {
            return false;
        };
        let result = match task.receiver.try_recv() {
            Ok(result) => result,
            Err(oneshot::error::TryRecvError::Empty) => return true,
            Err(oneshot::error::TryRecvError::Closed) => Err("Reader task stopped".to_owned()),
        };
        let path = task.path.clone();
        self.file_loader.reading = None;

        match result {
            Ok(document) => {
                tracing::info!(
                    "Parsed {} features from {}",
                    document.len(),
                    path.display()
                );
                self.begin_load(path, document);
            }
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", path.display(), e);
                self.file_loader.errors.push((path, e));
            }
        }
        false
    }

    /// Replace the layer content with a parsed document
    pub fn begin_load(&mut self, path: PathBuf, document: FeatureCollection) {
        lock_layer(&self.layer).context.begin_load(document);
        self.file_loader.loaded_file = Some(path);
        self.stats = Stats::default();
    }

    /// Index one batch; returns the progress while a load is running
    pub fn pump_load(&mut self) -> Option<LoadProgress> {
        let mut layer = lock_layer(&self.layer);
        let progress = layer.context.pump_load()?;
        if !layer.context.is_loading() {
            self.stats.info = layer.context.collection().get_info();
            self.pending_fit_bounds = true;
            tracing::info!(
                "Layer ready: {} features indexed, {} overlaps removed, {} excluded",
                self.stats.info.indexed_count,
                self.stats.info.removed_overlaps,
                self.stats.info.excluded_count
            );
        }
        Some(progress)
    }

    pub fn load_progress(&self) -> Option<LoadProgress> {
        lock_layer(&self.layer).context.load_progress()
    }

    /// Whether a file is waiting, being read or being indexed
    pub fn is_busy(&self) -> bool {
        self.file_loader.is_busy() || lock_layer(&self.layer).context.is_loading()
    }

    /// Push the UI settings into the renderer
    pub fn apply_render_options(&mut self) {
        let options = self.ui_settings.render_options();
        lock_layer(&self.layer).context.set_options(options);
    }

    /// Copy the counters of the last redraw
    pub fn update_frame_stats(&mut self) {
        let layer = lock_layer(&self.layer);
        if let Some(stats) = layer.last_stats {
            self.stats.last_frame = stats;
        }
        self.stats.last_render_ms = layer.last_render_ms;
        self.stats.redraws = layer.redraws;
    }

    /// Bounding box of the loaded data as (min_lat, min_lon, max_lat, max_lon)
    pub fn data_bounds(&self) -> Option<(f64, f64, f64, f64)> {
        lock_layer(&self.layer).context.collection().bounding_box_wgs84()
    }

    /// Drop the loaded layer and any pending work
    pub fn clear_layer(&mut self) {
        lock_layer(&self.layer).reset();
        self.file_loader = FileLoader::default();
        self.stats = Stats::default();
    }
}

impl UiSettings {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            render_all: settings.render_all,
            stroke_width: settings.stroke_width,
            fill_opacity: settings.fill_opacity.clamp(0.0, 1.0),
            ..Default::default()
        }
    }

    /// Renderer options for these settings
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            coverage_culling: !self.render_all,
            draw_order: self.draw_order,
            style: PolygonStyle {
                fill: Color::BLUE.with_opacity(self.fill_opacity),
                stroke: Color::BLUE,
                stroke_width: self.stroke_width as f64,
            },
            ..Default::default()
        }
    }
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            render_all: false,
            draw_order: DrawOrder::default(),
            stroke_width: 1.0,
            fill_opacity: 0.1,
            tiles_provider: TilesProvider::OpenStreetMap,
            sidebar_open: true,
            active_tab: SidebarTab::Layer,
        }
    }
}

impl FileLoader {
    /// Check if a file is waiting or being read
    pub fn is_busy(&self) -> bool {
        self.pending_file.is_some() || self.reading.is_some()
    }
}

impl Stats {
    /// Share of the visible candidates skipped by the coverage test
    pub fn culled_fraction(&self) -> f32 {
        if self.last_frame.candidates == 0 {
            0.0
        } else {
            self.last_frame.culled as f32 / self.last_frame.candidates as f32
        }
    }
}

/// Helper to format numbers with comma separators
pub fn format_number_with_commas(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

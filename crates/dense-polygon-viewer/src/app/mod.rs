//! Application module
//!
//! This module provides the main application structure with a clean UI:
//! - Full-screen map view with the polygon layer drawn over the tiles
//! - Toggleable sidebar with tabs (Layer and Settings)
//! - Drag-and-drop support for GeoJSON files
//! - Responsive layout (sidebar from bottom on portrait displays)

mod plugin;
pub(crate) mod settings;
mod state;
mod ui_panels;

use crate::app::plugin::PolygonPlugin;
use crate::app::settings::Settings;
use crate::app::state::{AppState, SidebarTab, TilesProvider, UiSettings};
use dense_polygon_lib::DrawOrder;
use eframe::egui;
use walkers::{
    HttpTiles, Map, MapMemory, TileId,
    sources::{Attribution, OpenStreetMap, TileSource},
};

/// Initial map center (lat, lon) and zoom before any data is loaded
const HOME: (f64, f64) = (55.75, 37.6);
const HOME_ZOOM: f64 = 10.0;

/// Zoom range of the map
const MIN_ZOOM: f64 = 4.0;
const MAX_ZOOM: f64 = 18.0;

/// Zoom that shows a span of `max_span` degrees
fn zoom_for_span(max_span: f64) -> f64 {
    if max_span > 0.0 {
        ((4.0 * 360.0 / max_span).log2() - 0.5).clamp(MIN_ZOOM, MAX_ZOOM)
    } else {
        12.0
    }
}

/// Custom OpenTopoMap tile source
pub struct OpenTopoMap;

impl TileSource for OpenTopoMap {
    fn tile_url(&self, tile_id: TileId) -> String {
        format!(
            "https://tile.opentopomap.org/{}/{}/{}.png",
            tile_id.zoom, tile_id.x, tile_id.y
        )
    }

    fn attribution(&self) -> Attribution {
        Attribution {
            text: "© OpenTopoMap (CC-BY-SA)",
            url: "https://opentopomap.org/",
            logo_light: None,
            logo_dark: None,
        }
    }

    fn max_zoom(&self) -> u8 {
        17
    }
}

/// Persisted settings (lightweight, no feature data)
#[derive(serde::Serialize, serde::Deserialize)]
struct PersistedSettings {
    render_all: bool,
    draw_order: DrawOrder,
    stroke_width: f32,
    fill_opacity: f32,
    sidebar_open: bool,
    active_tab: String,
    tiles_provider: String,
    /// File that was shown (will need to be reloaded)
    loaded_file_path: Option<String>,
}

impl PersistedSettings {
    fn from_state(state: &AppState) -> Self {
        let file = state
            .file_loader
            .loaded_file
            .as_ref()
            .or(state.file_loader.pending_file.as_ref())
            .or(state.file_loader.reading.as_ref().map(|task| &task.path));
        Self {
            render_all: state.ui_settings.render_all,
            draw_order: state.ui_settings.draw_order,
            stroke_width: state.ui_settings.stroke_width,
            fill_opacity: state.ui_settings.fill_opacity,
            sidebar_open: state.ui_settings.sidebar_open,
            active_tab: format!("{:?}", state.ui_settings.active_tab),
            tiles_provider: format!("{:?}", state.ui_settings.tiles_provider),
            loaded_file_path: file.map(|path| path.to_string_lossy().to_string()),
        }
    }

    fn ui_settings(&self) -> UiSettings {
        UiSettings {
            render_all: self.render_all,
            draw_order: self.draw_order,
            stroke_width: self.stroke_width,
            fill_opacity: self.fill_opacity.clamp(0.0, 1.0),
            tiles_provider: match self.tiles_provider.as_str() {
                "OpenTopoMap" => TilesProvider::OpenTopoMap,
                _ => TilesProvider::OpenStreetMap,
            },
            sidebar_open: self.sidebar_open,
            active_tab: match self.active_tab.as_str() {
                "Settings" => SidebarTab::Settings,
                _ => SidebarTab::Layer,
            },
        }
    }
}

/// Main application structure
pub struct DensePolygonViewerApp {
    /// Application state (layer, UI settings, etc.)
    state: AppState,

    /// Map tiles provider (OpenStreetMap)
    tiles_osm: HttpTiles,

    /// Map tiles provider (OpenTopoMap)
    tiles_otm: HttpTiles,

    /// Map state (camera position, zoom, etc.)
    map_memory: MapMemory,

    /// Show help overlay
    show_help: bool,
}

impl DensePolygonViewerApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let cli_args = Settings::from_cli();

        let mut state = if !cli_args.ignore_persisted {
            if let Some(storage) = cc.storage {
                Self::load_persisted_settings(storage, &cli_args)
            } else {
                AppState::new(&cli_args)
            }
        } else {
            tracing::info!("Ignoring persisted state (--ignore-persisted flag)");
            AppState::new(&cli_args)
        };

        // A file given on the command line takes priority
        if let Some(file) = &cli_args.geojson_file {
            state.queue_file(file.clone());
        }

        let tiles_osm = HttpTiles::new(OpenStreetMap, cc.egui_ctx.clone());
        let tiles_otm = HttpTiles::new(OpenTopoMap, cc.egui_ctx.clone());

        tracing::info!(
            "Initialized, pending file: {:?}",
            state.file_loader.pending_file
        );

        let mut map_memory = MapMemory::default();
        let _ = map_memory.set_zoom(HOME_ZOOM);

        Self {
            state,
            tiles_osm,
            tiles_otm,
            map_memory,
            show_help: false,
        }
    }

    /// Load persisted settings from storage (fast, no feature data)
    fn load_persisted_settings(storage: &dyn eframe::Storage, cli_args: &Settings) -> AppState {
        if let Some(json) = storage.get_string("persisted_settings")
            && !json.is_empty()
            && let Ok(settings) = serde_json::from_str::<PersistedSettings>(&json)
        {
            tracing::info!("Restored settings");
            let mut state = AppState::with_ui_settings(cli_args, settings.ui_settings());
            if let Some(path) = settings.loaded_file_path.map(std::path::PathBuf::from)
                && path.exists()
            {
                state.queue_file(path);
            }
            return state;
        }

        tracing::info!("No persisted settings found, starting fresh");
        AppState::new(cli_args)
    }

    /// Fit the map view to the bounding box of the loaded layer
    fn fit_to_bounds(&mut self) {
        if let Some((min_lat, min_lon, max_lat, max_lon)) = self.state.data_bounds() {
            let center_lat = (min_lat + max_lat) / 2.0;
            let center_lon = (min_lon + max_lon) / 2.0;

            let lat_span = (max_lat - min_lat).abs();
            let lon_span = (max_lon - min_lon).abs();
            let max_span = lat_span.max(lon_span);

            let zoom = zoom_for_span(max_span);

            self.map_memory
                .center_at(walkers::lat_lon(center_lat, center_lon));
            let _ = self.map_memory.set_zoom(zoom);

            tracing::debug!(
                "Fitted to bounds: ({:.4}, {:.4}) - ({:.4}, {:.4}), zoom: {:.1}",
                min_lat,
                min_lon,
                max_lat,
                max_lon,
                zoom
            );
        }
    }
}

#[profiling::all_functions]
impl eframe::App for DensePolygonViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.input(|i| {
            if i.key_pressed(egui::Key::F1) {
                self.show_help = !self.show_help;
            }
            if i.key_pressed(egui::Key::H) && i.modifiers.ctrl {
                self.show_help = !self.show_help;
            }
        });

        ui_panels::handle_drag_and_drop(ctx, &mut self.state);
        ui_panels::show_file_picker(&mut self.state);

        // Read off the UI thread, then index one batch per frame
        self.state.start_pending_read();
        let reading = self.state.poll_read();
        let indexing = self.state.pump_load().is_some();
        if reading || indexing {
            ctx.request_repaint();
        }

        if self.state.pending_fit_bounds {
            self.state.pending_fit_bounds = false;
            self.fit_to_bounds();
        }

        if self.show_help {
            ui_panels::help_overlay(ctx, &mut self.show_help);
        }

        ui_panels::render_sidebar(ctx, &mut self.state);
        self.state.apply_render_options();

        let layer = self.state.layer.clone();
        let tiles_provider = self.state.ui_settings.tiles_provider;
        let attribution_text = tiles_provider.attribution();

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                profiling::scope!("map_panel");

                let tiles: &mut HttpTiles = match tiles_provider {
                    TilesProvider::OpenStreetMap => &mut self.tiles_osm,
                    TilesProvider::OpenTopoMap => &mut self.tiles_otm,
                };

                let map = Map::new(
                    Some(tiles),
                    &mut self.map_memory,
                    walkers::lat_lon(HOME.0, HOME.1),
                )
                .with_plugin(PolygonPlugin::new(layer));

                ui.add(map);

                if self.map_memory.zoom() < MIN_ZOOM {
                    let _ = self.map_memory.set_zoom(MIN_ZOOM);
                }

                ui_panels::sidebar_toggle_button(ui, &mut self.state);

                let painter = ui.painter();
                let screen_rect = ui.max_rect();
                painter.text(
                    screen_rect.center_bottom() + egui::vec2(0.0, -5.0),
                    egui::Align2::CENTER_BOTTOM,
                    attribution_text,
                    egui::FontId::proportional(10.0),
                    egui::Color32::from_black_alpha(180),
                );
            });

        self.state.update_frame_stats();
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        let settings = PersistedSettings::from_state(&self.state);
        if let Ok(json) = serde_json::to_string(&settings) {
            storage.set_string("persisted_settings", json);
            tracing::debug!("Saved settings on exit");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_persisted_settings_roundtrip_ui() {
        let cli = Settings::parse_from(["dense-polygon-viewer", "blocks.geojson"]);
        let mut state = AppState::new(&cli);
        state.ui_settings.render_all = true;
        state.ui_settings.draw_order = DrawOrder::Natural;
        state.ui_settings.active_tab = SidebarTab::Settings;
        state.ui_settings.tiles_provider = TilesProvider::OpenTopoMap;

        let persisted = PersistedSettings::from_state(&state);
        assert_eq!(persisted.loaded_file_path.as_deref(), Some("blocks.geojson"));

        let json = serde_json::to_string(&persisted).unwrap();
        let restored: PersistedSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.ui_settings(), state.ui_settings);
    }

    #[test]
    fn test_zoom_for_span_stays_in_range() {
        assert_eq!(zoom_for_span(0.0), 12.0);
        assert_eq!(zoom_for_span(360.0), MIN_ZOOM);
        assert_eq!(zoom_for_span(1e-9), MAX_ZOOM);

        // A city-sized layer lands between the bounds
        let city = zoom_for_span(0.5);
        assert!(city > HOME_ZOOM && city < MAX_ZOOM);
    }

    #[test]
    fn test_unknown_persisted_names_fall_back() {
        let persisted = PersistedSettings {
            render_all: false,
            draw_order: DrawOrder::Identifier,
            stroke_width: 1.0,
            fill_opacity: 7.0,
            sidebar_open: true,
            active_tab: "Overview".to_owned(),
            tiles_provider: "CyclOSM".to_owned(),
            loaded_file_path: None,
        };
        let ui = persisted.ui_settings();
        assert_eq!(ui.active_tab, SidebarTab::Layer);
        assert_eq!(ui.tiles_provider, TilesProvider::OpenStreetMap);
        assert_eq!(ui.fill_opacity, 1.0);
    }
}

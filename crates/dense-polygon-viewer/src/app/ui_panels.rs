//! UI panels for the application
//!
//! This module provides reusable UI components for the sidebar design
//! with tabs, map controls, and drag-and-drop support.

use crate::app::plugin::lock_layer;
use crate::app::state::{AppState, SidebarTab, TilesProvider, format_number_with_commas};
use dense_polygon_lib::DrawOrder;
use egui::{Color32, RichText, Ui};

/// Diagnostics listed in the sidebar before truncating
const MAX_LISTED_DIAGNOSTICS: usize = 200;

fn is_geojson(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("geojson") || e.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// Render the sidebar toggle button (overlaid on top-right of map)
pub fn sidebar_toggle_button(ui: &mut Ui, state: &mut AppState) {
    let button_size = egui::vec2(40.0, 40.0);
    let margin = 10.0;

    let rect = ui.max_rect();
    let button_pos = rect.right_top() + egui::vec2(-button_size.x - margin, margin);
    let button_rect = egui::Rect::from_min_size(button_pos, button_size);

    let response = ui.allocate_rect(button_rect, egui::Sense::click());

    if response.clicked() {
        state.ui_settings.sidebar_open = !state.ui_settings.sidebar_open;
    }

    let bg_color = if response.hovered() {
        ui.visuals().widgets.hovered.bg_fill
    } else {
        ui.visuals().widgets.inactive.bg_fill
    };
    ui.painter().rect_filled(button_rect, 5.0, bg_color);

    let icon = if state.ui_settings.sidebar_open {
        "✕"
    } else {
        "☰"
    };
    ui.painter().text(
        button_rect.center(),
        egui::Align2::CENTER_CENTER,
        icon,
        egui::FontId::proportional(20.0),
        ui.visuals().text_color(),
    );
}

/// Render the main sidebar (responsive: side on landscape, bottom on portrait)
pub fn render_sidebar(ctx: &egui::Context, state: &mut AppState) {
    if !state.ui_settings.sidebar_open {
        return;
    }

    let screen_size = ctx.viewport_rect().size();
    if screen_size.y > screen_size.x {
        egui::TopBottomPanel::bottom("main_sidebar")
            .default_height(280.0)
            .min_height(180.0)
            .max_height(ctx.viewport_rect().height() * 0.6)
            .resizable(true)
            .show(ctx, |ui| render_sidebar_content(ui, state));
    } else {
        egui::SidePanel::right("main_sidebar")
            .default_width(300.0)
            .min_width(260.0)
            .max_width(450.0)
            .resizable(true)
            .show(ctx, |ui| render_sidebar_content(ui, state));
    }
}

fn render_sidebar_content(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui| {
        ui.selectable_value(
            &mut state.ui_settings.active_tab,
            SidebarTab::Layer,
            "📂 Layer",
        );
        ui.selectable_value(
            &mut state.ui_settings.active_tab,
            SidebarTab::Settings,
            "⚙ Settings",
        );
    });

    ui.separator();

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| match state.ui_settings.active_tab {
            SidebarTab::Layer => render_layer_tab(ui, state),
            SidebarTab::Settings => render_settings_tab(ui, state),
        });
}

/// Render the Layer tab
fn render_layer_tab(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal_wrapped(|ui| {
        if ui.button("📂 Open GeoJSON...").clicked() {
            state.file_loader.show_picker = true;
        }
        if ui.button("🎯 Fit to Data").clicked() {
            state.pending_fit_bounds = true;
        }
        if ui.button("🗑 Clear").clicked() {
            state.clear_layer();
        }
    });

    ui.add_space(8.0);

    if let Some(path) = &state.file_loader.loaded_file {
        ui.label(
            RichText::new(format!(
                "📄 {}",
                path.file_name().unwrap_or_default().to_string_lossy()
            ))
            .strong(),
        );
    }

    // Loading progress
    if let Some(task) = &state.file_loader.reading {
        ui.separator();
        ui.label(
            RichText::new(format!(
                "⏳ Reading {}...",
                task.path.file_name().unwrap_or_default().to_string_lossy()
            ))
            .strong()
            .color(ui.visuals().warn_fg_color),
        );
        ui.add(egui::ProgressBar::new(0.0).animate(true));
        ui.add_space(8.0);
    } else if let Some(progress) = state.load_progress() {
        ui.separator();
        ui.label(
            RichText::new(format!(
                "⏳ Indexing features... ({} / {})",
                format_number_with_commas(progress.processed),
                format_number_with_commas(progress.total)
            ))
            .strong()
            .color(ui.visuals().warn_fg_color),
        );
        ui.add(egui::ProgressBar::new(progress.fraction()).show_percentage());
        ui.add_space(8.0);
    }

    ui.separator();
    render_stats_section(ui, state);

    ui.add_space(8.0);
    ui.separator();

    if !state.file_loader.errors.is_empty() {
        ui.label(
            RichText::new(format!(
                "⚠ Errors ({} files)",
                state.file_loader.errors.len()
            ))
            .strong()
            .color(Color32::RED),
        );
        ui.add_space(4.0);

        egui::ScrollArea::vertical()
            .id_salt("errors_scroll")
            .max_height(100.0)
            .show(ui, |ui| {
                for (file, error) in &state.file_loader.errors {
                    ui.label(
                        RichText::new(format!(
                            "• {}: {}",
                            file.file_name().unwrap_or_default().to_string_lossy(),
                            error
                        ))
                        .small()
                        .color(Color32::RED),
                    );
                }
            });

        ui.add_space(4.0);
        if ui.button("Clear Errors").clicked() {
            state.file_loader.errors.clear();
        }

        ui.add_space(8.0);
        ui.separator();
    }

    render_diagnostics_section(ui, state);
}

/// Features excluded while loading
fn render_diagnostics_section(ui: &mut Ui, state: &AppState) {
    let layer = lock_layer(&state.layer);
    let diagnostics = layer.context.collection().diagnostics();
    if diagnostics.is_empty() {
        return;
    }

    ui.label(
        RichText::new(format!(
            "⚠ Skipped features ({})",
            format_number_with_commas(diagnostics.len())
        ))
        .strong()
        .color(ui.visuals().warn_fg_color),
    );
    ui.add_space(4.0);

    egui::ScrollArea::vertical()
        .id_salt("diagnostics_scroll")
        .max_height(ui.available_height().max(80.0) - 8.0)
        .show(ui, |ui| {
            for diagnostic in diagnostics.iter().take(MAX_LISTED_DIAGNOSTICS) {
                ui.label(
                    RichText::new(format!("• #{}: {}", diagnostic.index, diagnostic.reason))
                        .small(),
                );
            }
            if diagnostics.len() > MAX_LISTED_DIAGNOSTICS {
                ui.label(
                    RichText::new(format!(
                        "… and {} more",
                        diagnostics.len() - MAX_LISTED_DIAGNOSTICS
                    ))
                    .small()
                    .weak(),
                );
            }
        });
}

/// Render statistics section (used in Layer tab)
fn render_stats_section(ui: &mut Ui, state: &AppState) {
    ui.label(RichText::new("📊 Statistics").strong());
    ui.add_space(4.0);

    let stats = &state.stats;
    egui::Grid::new("stats_grid")
        .num_columns(2)
        .spacing([12.0, 4.0])
        .show(ui, |ui| {
            ui.label("Features:");
            ui.label(RichText::new(format_number_with_commas(stats.info.feature_count)).strong());
            ui.end_row();

            ui.label("Indexed:");
            ui.label(RichText::new(format_number_with_commas(stats.info.indexed_count)).strong());
            ui.end_row();

            ui.label("Overlaps Removed:");
            ui.label(
                RichText::new(format_number_with_commas(stats.info.removed_overlaps)).strong(),
            );
            ui.end_row();

            ui.label("Skipped:");
            ui.label(RichText::new(format_number_with_commas(stats.info.excluded_count)).strong());
            ui.end_row();

            ui.label("Vertices:");
            ui.label(RichText::new(format_number_with_commas(stats.info.total_vertices)).strong());
            ui.end_row();

            if stats.redraws > 0 {
                ui.separator();
                ui.separator();
                ui.end_row();

                ui.label("Render Time:");
                let time_color = if stats.last_render_ms < 16.0 {
                    Color32::GREEN
                } else if stats.last_render_ms < 50.0 {
                    Color32::YELLOW
                } else {
                    Color32::RED
                };
                ui.label(RichText::new(format!("{:.1} ms", stats.last_render_ms)).color(time_color));
                ui.end_row();

                ui.label("Visible:");
                ui.label(
                    RichText::new(format_number_with_commas(stats.last_frame.candidates)).strong(),
                );
                ui.end_row();

                ui.label("Drawn:");
                ui.label(RichText::new(format_number_with_commas(stats.last_frame.drawn)).strong());
                ui.end_row();

                ui.label("Culled:");
                ui.label(
                    RichText::new(format!(
                        "{} ({:.0}%)",
                        format_number_with_commas(stats.last_frame.culled),
                        stats.culled_fraction() * 100.0
                    ))
                    .strong(),
                );
                ui.end_row();

                ui.label("Redraws:");
                ui.label(format_number_with_commas(stats.redraws));
                ui.end_row();
            }
        });
}

/// Render the Settings tab
fn render_settings_tab(ui: &mut Ui, state: &mut AppState) {
    ui.label(RichText::new("🖌 Rendering").strong());
    ui.add_space(6.0);

    ui.checkbox(&mut state.ui_settings.render_all, "Render all");
    ui.label(
        RichText::new("Draw every visible polygon, even where the map is already painted")
            .small()
            .weak(),
    );
    ui.add_space(6.0);

    egui::Grid::new("rendering_grid")
        .num_columns(2)
        .spacing([12.0, 8.0])
        .show(ui, |ui| {
            ui.label("Draw Order:");
            egui::ComboBox::from_id_salt("draw_order")
                .selected_text(state.ui_settings.draw_order.label())
                .show_ui(ui, |ui| {
                    for order in DrawOrder::ALL {
                        ui.selectable_value(&mut state.ui_settings.draw_order, order, order.label());
                    }
                });
            ui.end_row();

            ui.label("Outline Width:");
            ui.add(
                egui::Slider::new(&mut state.ui_settings.stroke_width, 0.0..=8.0)
                    .suffix(" px")
                    .step_by(0.5),
            );
            ui.end_row();

            ui.label("Fill Opacity:");
            ui.add(egui::Slider::new(&mut state.ui_settings.fill_opacity, 0.0..=1.0).step_by(0.05));
            ui.end_row();
        });

    ui.add_space(12.0);
    ui.separator();
    ui.add_space(8.0);

    ui.label(RichText::new("🗺 Map Tiles").strong());
    ui.add_space(6.0);

    for provider in TilesProvider::all() {
        let selected = state.ui_settings.tiles_provider == *provider;
        if ui.selectable_label(selected, provider.name()).clicked() {
            state.ui_settings.tiles_provider = *provider;
        }
    }

    ui.add_space(4.0);
    ui.label(
        RichText::new(state.ui_settings.tiles_provider.attribution())
            .small()
            .italics()
            .weak(),
    );

    ui.add_space(12.0);
    ui.separator();
    ui.add_space(8.0);

    ui.label(RichText::new("ℹ About").strong());
    ui.add_space(4.0);
    ui.label(RichText::new("Dense Polygon Viewer").small());
    ui.label(
        RichText::new("Browse very large polygon layers with coverage culling")
            .small()
            .weak(),
    );
    ui.add_space(4.0);
    ui.label(RichText::new("Keyboard shortcuts:").small());
    ui.label(RichText::new("  F1 / Ctrl+H - Toggle help").small().weak());
}

/// Show file picker dialog
pub fn show_file_picker(state: &mut AppState) {
    if state.file_loader.show_picker {
        state.file_loader.show_picker = false;

        if let Some(path) = rfd::FileDialog::new()
            .add_filter("GeoJSON Files", &["geojson", "json"])
            .set_title("Select a GeoJSON FeatureCollection")
            .pick_file()
        {
            state.queue_file(path);
        }
    }
}

/// Help overlay
pub fn help_overlay(ctx: &egui::Context, show_help: &mut bool) {
    egui::Window::new("Help")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.heading("Dense Polygon Viewer");
            ui.add_space(8.0);

            ui.label("Shows large GeoJSON polygon layers, skipping polygons hidden under earlier ones.");
            ui.add_space(12.0);

            ui.label(RichText::new("Loading Data").strong());
            ui.label("• Click 'Open GeoJSON...' in the sidebar");
            ui.label("• Or drag and drop a .geojson file onto the window");
            ui.add_space(8.0);

            ui.label(RichText::new("Navigation").strong());
            ui.label("• Scroll wheel to zoom");
            ui.label("• Click and drag to pan");
            ui.label("• 'Fit to Data' to see the whole layer");
            ui.add_space(8.0);

            ui.label(RichText::new("Keyboard Shortcuts").strong());
            ui.label("• F1 or Ctrl+H - Toggle this help");
            ui.add_space(12.0);

            if ui.button("Close").clicked() {
                *show_help = false;
            }
        });
}

/// Handle drag and drop of GeoJSON files
pub fn handle_drag_and_drop(ctx: &egui::Context, state: &mut AppState) {
    let hovered_files = ctx.input(|i| !i.raw.hovered_files.is_empty());
    let dropped_files: Vec<_> = ctx.input(|i| i.raw.dropped_files.clone());

    if hovered_files {
        let painter = ctx.layer_painter(egui::LayerId::new(
            egui::Order::Foreground,
            egui::Id::new("drop_preview"),
        ));
        let screen_rect = ctx.content_rect();
        let bg_rect = egui::Rect::from_center_size(screen_rect.center(), egui::vec2(380.0, 80.0));
        painter.rect_filled(bg_rect, 16.0, egui::Color32::from_black_alpha(180));
        painter.text(
            screen_rect.center(),
            egui::Align2::CENTER_CENTER,
            "📂 Drop a GeoJSON file here",
            egui::FontId::proportional(28.0),
            egui::Color32::WHITE,
        );
    }

    // Only one document is shown at a time, the last dropped file wins
    if let Some(path) = dropped_files
        .into_iter()
        .filter_map(|file| file.path)
        .filter(|path| is_geojson(path))
        .last()
    {
        state.queue_file(path);
    }
}

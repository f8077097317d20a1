#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use dense_polygon_viewer::DensePolygonViewerApp;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

const APP_NAME: &str = "Dense Polygon Viewer";

fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        // SAFETY: no other thread exists yet
        unsafe { std::env::set_var("RUST_LOG", "info,eframe=warn,wgpu=warn") }
    }
    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(EnvFilter::from_default_env());
    tracing_subscriber::registry().with(fmt_layer).init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    // File parsing runs on the blocking pool of this runtime
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let _guard = rt.enter();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_title(APP_NAME)
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        APP_NAME,
        native_options,
        Box::new(|cc| Ok(Box::new(DensePolygonViewerApp::new(cc)))),
    )?;
    Ok(())
}

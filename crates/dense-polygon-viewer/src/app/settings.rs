use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Dense Polygon Viewer - Browse very large GeoJSON polygon layers on a slippy map
pub struct Settings {
    /// GeoJSON FeatureCollection to open on startup
    #[clap(value_name = "FILE")]
    pub geojson_file: Option<PathBuf>,

    /// Number of features indexed per UI frame while loading
    #[clap(long, default_value = "500")]
    pub batch_size: usize,

    /// Maximum entries per R-tree node
    #[clap(long, default_value = "9")]
    pub max_node_entries: usize,

    /// Keep features whose four corners are covered by earlier features
    #[clap(long, default_value = "false")]
    pub keep_overlaps: bool,

    /// Draw every visible polygon instead of skipping covered ones
    #[clap(long, default_value = "false")]
    pub render_all: bool,

    /// Polygon outline width in pixels
    #[clap(long, default_value = "1.0")]
    pub stroke_width: f32,

    /// Polygon fill opacity (0.0-1.0)
    #[clap(long, default_value = "0.1")]
    pub fill_opacity: f32,

    /// Ignore previously persisted state and start fresh
    #[clap(long, default_value = "false")]
    pub ignore_persisted: bool,
}

impl Settings {
    /// Parse the process arguments, exiting with usage on error
    pub fn from_cli() -> Self {
        match Settings::try_parse() {
            Ok(args) => args,
            Err(e) => e.exit(),
        }
    }

    /// Library configuration derived from the command line
    pub fn library_config(&self) -> dense_polygon_lib::Config {
        dense_polygon_lib::Config {
            batch_size: self.batch_size.max(1),
            max_node_entries: self.max_node_entries,
            eliminate_overlaps: !self.keep_overlaps,
        }
    }
}

//! Walkers plugin drawing the polygon layer over the map
//!
//! The layer is rasterized by the library into a `RasterSurface` the size of
//! the map widget, uploaded as a texture and painted over the tiles. The
//! raster is only refreshed when the view or the render options changed.

use dense_polygon_lib::{CullContext, RasterSurface, RenderStats, ViewTransform};
use egui::{Color32, TextureHandle, TextureOptions};
use geo::{Coord, Rect};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use walkers::{Plugin, Projector};

/// Everything the plugin needs across frames
pub struct PolygonLayer {
    pub context: CullContext,
    surface: RasterSurface,
    texture: Option<TextureHandle>,
    /// Counters of the most recent redraw
    pub last_stats: Option<RenderStats>,
    /// Duration of the most recent redraw
    pub last_render_ms: f64,
    /// Redraws since the layer was created
    pub redraws: usize,
}

pub type SharedLayer = Arc<Mutex<PolygonLayer>>;

impl PolygonLayer {
    pub fn new(context: CullContext) -> Self {
        Self {
            context,
            surface: RasterSurface::new(1, 1),
            texture: None,
            last_stats: None,
            last_render_ms: 0.0,
            redraws: 0,
        }
    }

    pub fn shared(context: CullContext) -> SharedLayer {
        Arc::new(Mutex::new(Self::new(context)))
    }

    /// Drop the document and the rendered texture
    pub fn reset(&mut self) {
        self.context.reset();
        self.texture = None;
        self.last_stats = None;
    }

    fn upload(&mut self, ctx: &egui::Context) {
        let size = [self.surface.width() as usize, self.surface.height() as usize];
        let image = egui::ColorImage::from_rgba_unmultiplied(size, self.surface.pixels());
        match &mut self.texture {
            Some(texture) => texture.set(image, TextureOptions::LINEAR),
            None => {
                self.texture = Some(ctx.load_texture("polygon_layer", image, TextureOptions::LINEAR));
            }
        }
    }
}

/// Lock the layer, recovering it if a previous holder panicked
pub fn lock_layer(layer: &SharedLayer) -> MutexGuard<'_, PolygonLayer> {
    layer.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Map projection as seen from the layer's raster
///
/// Pixel coordinates are relative to the top-left corner of the map widget.
pub struct WalkersView<'a> {
    projector: &'a Projector,
    origin: egui::Pos2,
    width: f64,
    height: f64,
}

impl<'a> WalkersView<'a> {
    pub fn new(projector: &'a Projector, rect: egui::Rect, width: u32, height: u32) -> Self {
        Self {
            projector,
            origin: rect.min,
            width: width as f64,
            height: height as f64,
        }
    }

    fn unproject(&self, x: f64, y: f64) -> Coord<f64> {
        let position = self.projector.unproject(egui::Vec2::new(
            self.origin.x + x as f32,
            self.origin.y + y as f32,
        ));
        Coord {
            x: position.x(),
            y: position.y(),
        }
    }
}

impl ViewTransform for WalkersView<'_> {
    fn project(&self, coord: Coord<f64>) -> Coord<f64> {
        let screen = self.projector.project(walkers::lat_lon(coord.y, coord.x));
        Coord {
            x: (screen.x - self.origin.x) as f64,
            y: (screen.y - self.origin.y) as f64,
        }
    }

    fn pixel_bounds(&self) -> Rect<f64> {
        Rect::new(
            Coord { x: 0.0, y: 0.0 },
            Coord {
                x: self.width,
                y: self.height,
            },
        )
    }

    fn geo_bounds(&self) -> Rect<f64> {
        Rect::new(self.unproject(0.0, 0.0), self.unproject(self.width, self.height))
    }
}

/// Plugin for rendering the polygon layer on the map
pub struct PolygonPlugin {
    layer: SharedLayer,
}

impl PolygonPlugin {
    pub fn new(layer: SharedLayer) -> Self {
        Self { layer }
    }
}

impl Plugin for PolygonPlugin {
    fn run(
        self: Box<Self>,
        ui: &mut egui::Ui,
        response: &egui::Response,
        projector: &Projector,
        _map_memory: &walkers::MapMemory,
    ) {
        profiling::scope!("PolygonPlugin::run");

        let viewport_rect = response.rect;
        let width = viewport_rect.width().round().max(1.0) as u32;
        let height = viewport_rect.height().round().max(1.0) as u32;

        let mut guard = lock_layer(&self.layer);
        let layer = &mut *guard;
        if layer.context.is_loading() || !layer.context.collection().is_ready() {
            return;
        }

        layer.surface.resize(width, height);
        let view = WalkersView::new(projector, viewport_rect, width, height);

        let start = instant::Instant::now();
        let rendered = {
            profiling::scope!("render_if_changed");
            layer.context.render_if_changed(&view, &mut layer.surface)
        };
        if let Some(stats) = rendered {
            layer.last_render_ms = start.elapsed().as_secs_f64() * 1000.0;
            layer.last_stats = Some(stats);
            layer.redraws += 1;
            tracing::trace!(
                "Redrew polygon layer: {} drawn, {} culled in {:.1} ms",
                stats.drawn,
                stats.culled,
                layer.last_render_ms
            );
            layer.upload(ui.ctx());
        }

        if let Some(texture) = &layer.texture {
            ui.painter().image(
                texture.id(),
                viewport_rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                Color32::WHITE,
            );
        }
    }
}

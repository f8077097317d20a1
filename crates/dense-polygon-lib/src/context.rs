//! CullContext - owns a collection, its loader and the renderer
//!
//! Hosts drive the context from their event loop: one `pump_load` per UI frame
//! while a document is loading, then `render_if_changed` on every frame, which
//! only touches the surface when the view or the render options changed.

use crate::collection::{Config, DrawOrder, LoadJob, LoadProgress, PolygonCollection};
use crate::geojson::FeatureCollection;
use crate::render::{FrameRenderer, PolygonStyle, RenderOptions, RenderStats};
use crate::screen::ViewTransform;
use crate::surface::Surface;
use geo::Rect;

/// What a rendered frame depended on
#[derive(Debug, Clone, Copy, PartialEq)]
struct FrameKey {
    geo_bounds: Rect<f64>,
    pixel_bounds: Rect<f64>,
    surface_size: (u32, u32),
}

pub struct CullContext {
    collection: PolygonCollection,
    renderer: FrameRenderer,
    load_job: Option<LoadJob>,
    last_frame: Option<FrameKey>,
}

impl Default for CullContext {
    fn default() -> Self {
        Self::new(Config::default(), RenderOptions::default())
    }
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl CullContext {
    pub fn new(config: Config, options: RenderOptions) -> Self {
        Self {
            collection: PolygonCollection::new(config),
            renderer: FrameRenderer::new(options),
            load_job: None,
            last_frame: None,
        }
    }

    #[inline]
    pub fn collection(&self) -> &PolygonCollection {
        &self.collection
    }

    #[inline]
    pub fn renderer(&self) -> &FrameRenderer {
        &self.renderer
    }

    #[inline]
    pub fn options(&self) -> &RenderOptions {
        self.renderer.options()
    }

    /// Start loading a document, dropping the current one
    pub fn begin_load(&mut self, document: FeatureCollection) {
        self.load_job = Some(self.collection.begin_load(document));
        self.invalidate();
    }

    /// Index the next batch; `None` when nothing is loading
    pub fn pump_load(&mut self) -> Option<LoadProgress> {
        let job = self.load_job.as_mut()?;
        let progress = job.step(&mut self.collection);
        if job.is_finished() {
            self.load_job = None;
            self.invalidate();
        }
        Some(progress)
    }

    #[inline]
    pub fn is_loading(&self) -> bool {
        self.load_job.is_some()
    }

    pub fn load_progress(&self) -> Option<LoadProgress> {
        self.load_job.as_ref().map(LoadJob::progress)
    }

    /// Toggle the coverage test ("render all" when off)
    pub fn set_coverage_culling(&mut self, enabled: bool) {
        self.set_options(RenderOptions {
            coverage_culling: enabled,
            ..*self.renderer.options()
        });
    }

    pub fn set_draw_order(&mut self, draw_order: DrawOrder) {
        self.set_options(RenderOptions {
            draw_order,
            ..*self.renderer.options()
        });
    }

    pub fn set_style(&mut self, style: PolygonStyle) {
        self.set_options(RenderOptions {
            style,
            ..*self.renderer.options()
        });
    }

    pub fn set_options(&mut self, options: RenderOptions) {
        if options != *self.renderer.options() {
            self.renderer.set_options(options);
            self.invalidate();
        }
    }

    /// Force the next `render_if_changed` to draw
    #[inline]
    pub fn invalidate(&mut self) {
        self.last_frame = None;
    }

    /// Render when the view, the surface or the options changed since the last frame
    ///
    /// Nothing is rendered while a document is still loading. Without a
    /// document the frame is still produced, which leaves the surface clear.
    pub fn render_if_changed<S: Surface + ?Sized>(
        &mut self,
        view: &impl ViewTransform,
        surface: &mut S,
    ) -> Option<RenderStats> {
        if self.is_loading() {
            return None;
        }

        let key = FrameKey {
            geo_bounds: view.geo_bounds(),
            pixel_bounds: view.pixel_bounds(),
            surface_size: surface.size(),
        };
        if self.last_frame == Some(key) {
            return None;
        }

        let stats = self.renderer.render(&self.collection, view, surface);
        self.last_frame = Some(key);
        Some(stats)
    }

    /// Drop the loaded document
    pub fn reset(&mut self) {
        self.load_job = None;
        self.collection.clear();
        self.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen::MercatorView;
    use crate::surface::RasterSurface;
    use geo::Coord;
    use serde_json::{Value, json};

    fn square_feature(min_x: f64, min_y: f64, size: f64) -> Value {
        let (max_x, max_y) = (min_x + size, min_y + size);
        json!({
            "type": "Feature",
            "properties": {"name": format!("{min_x},{min_y}")},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[min_x, min_y], [max_x, min_y], [max_x, max_y], [min_x, max_y], [min_x, min_y]]]
            }
        })
    }

    /// Moscow-sized blocks: one large block, one hidden inside it, one apart
    fn blocks() -> FeatureCollection {
        FeatureCollection::from_features(vec![
            square_feature(37.50, 55.70, 0.10),
            square_feature(37.52, 55.72, 0.02),
            square_feature(37.70, 55.80, 0.01),
        ])
    }

    fn loaded_context(config: Config) -> CullContext {
        let mut context = CullContext::new(config, RenderOptions::default());
        context.begin_load(blocks());
        while context.pump_load().is_some() {}
        context
    }

    fn fitted_view(context: &CullContext) -> MercatorView {
        let (min_lat, min_lon, max_lat, max_lon) =
            context.collection().bounding_box_wgs84().unwrap();
        let bounds = Rect::new(
            Coord {
                x: min_lon,
                y: min_lat,
            },
            Coord {
                x: max_lon,
                y: max_lat,
            },
        );
        MercatorView::fit_bounds(&bounds, 400.0, 300.0)
    }

    #[test]
    fn test_end_to_end() {
        let mut context = loaded_context(Config::default());
        assert!(!context.is_loading());
        assert_eq!(context.collection().get_info().removed_overlaps, 1);

        let view = fitted_view(&context);
        let mut surface = RasterSurface::new(400, 300);
        let stats = context.render_if_changed(&view, &mut surface).unwrap();
        assert_eq!(stats.candidates, 2);
        assert_eq!(stats.drawn, 2);

        assert!(surface.pixels().chunks_exact(4).any(|p| p[3] > 0));
    }

    #[test]
    fn test_unchanged_view_is_not_rendered_again() {
        let mut context = loaded_context(Config::default());
        let view = fitted_view(&context);
        let mut surface = RasterSurface::new(400, 300);

        assert!(context.render_if_changed(&view, &mut surface).is_some());
        assert!(context.render_if_changed(&view, &mut surface).is_none());

        let moved = MercatorView {
            center_lon: view.center_lon + 0.01,
            ..view
        };
        assert!(context.render_if_changed(&moved, &mut surface).is_some());
    }

    #[test]
    fn test_option_change_triggers_render() {
        let mut context = loaded_context(Config {
            eliminate_overlaps: false,
            ..Default::default()
        });
        let view = fitted_view(&context);
        let mut surface = RasterSurface::new(400, 300);

        let culled = context.render_if_changed(&view, &mut surface).unwrap();
        assert_eq!(culled.culled, 1);

        // Same value again is not a change
        context.set_coverage_culling(true);
        assert!(context.render_if_changed(&view, &mut surface).is_none());

        context.set_coverage_culling(false);
        let all = context.render_if_changed(&view, &mut surface).unwrap();
        assert_eq!(all.culled, 0);
        assert_eq!(all.drawn, 3);

        context.set_draw_order(DrawOrder::ScreenRowMajor);
        assert!(context.render_if_changed(&view, &mut surface).is_some());
    }

    #[test]
    fn test_no_render_while_loading() {
        let config = Config {
            batch_size: 1,
            ..Default::default()
        };
        let mut context = CullContext::new(config, RenderOptions::default());
        context.begin_load(blocks());
        let view = MercatorView::new(55.75, 37.6, 10.0, 400.0, 300.0);
        let mut surface = RasterSurface::new(400, 300);

        let progress = context.pump_load().unwrap();
        assert_eq!(progress.processed, 1);
        assert!(context.is_loading());
        assert_eq!(context.load_progress().map(|p| p.total), Some(3));
        assert!(context.render_if_changed(&view, &mut surface).is_none());

        while context.pump_load().is_some() {}
        assert!(context.render_if_changed(&view, &mut surface).is_some());
    }

    #[test]
    fn test_reset_clears_the_surface() {
        let mut context = loaded_context(Config::default());
        let view = fitted_view(&context);
        let mut surface = RasterSurface::new(400, 300);
        context.render_if_changed(&view, &mut surface).unwrap();
        assert!(surface.pixels().chunks_exact(4).any(|p| p[3] > 0));

        context.reset();
        assert!(context.collection().is_empty());
        assert!(context.pump_load().is_none());

        let stats = context.render_if_changed(&view, &mut surface).unwrap();
        assert_eq!(stats, RenderStats::default());
        assert!(surface.pixels().chunks_exact(4).all(|p| p[3] == 0));
        assert!(context.render_if_changed(&view, &mut surface).is_none());
    }
}

//! Per-frame rendering pipeline
//!
//! A frame queries the visible features, then for each one in painter's order
//! projects and clips it, checks whether the pixels under it are already
//! painted and only then issues the fill and stroke.

use crate::collection::{DrawOrder, PolygonCollection};
use crate::coverage::{PixelRect, sample_coverage};
use crate::screen::{ScreenPolygon, ViewTransform, project_and_clip};
use crate::surface::{Color, Surface};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Where the renderer is within a frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RenderPhase {
    #[default]
    Idle,
    Querying,
    Compositing,
}

/// Fill and stroke of every polygon
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PolygonStyle {
    pub fill: Color,
    pub stroke: Color,
    pub stroke_width: f64,
}

impl Default for PolygonStyle {
    fn default() -> Self {
        Self {
            fill: Color::BLUE.with_opacity(0.1),
            stroke: Color::BLUE,
            stroke_width: 1.0,
        }
    }
}

/// Options applied to every frame
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RenderOptions {
    /// Skip polygons whose samples are all painted already
    pub coverage_culling: bool,
    pub draw_order: DrawOrder,
    /// Growth of the clipped pixel box before the alpha read-back
    pub clip_buffer_px: f64,
    pub style: PolygonStyle,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            coverage_culling: true,
            draw_order: DrawOrder::Identifier,
            clip_buffer_px: 1.0,
            style: PolygonStyle::default(),
        }
    }
}

/// Counters of one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RenderStats {
    /// Features returned by the viewport query
    pub candidates: usize,
    /// Features with nothing left after clipping
    pub clipped_away: usize,
    /// Features skipped by the coverage test
    pub culled: usize,
    /// Features filled and stroked
    pub drawn: usize,
}

/// Renders a collection onto a surface, one frame at a time
#[derive(Debug, Clone, Default)]
pub struct FrameRenderer {
    options: RenderOptions,
    phase: RenderPhase,
    last_stats: RenderStats,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl FrameRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    #[inline]
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    #[inline]
    pub fn set_options(&mut self, options: RenderOptions) {
        self.options = options;
    }

    #[inline]
    pub fn phase(&self) -> RenderPhase {
        self.phase
    }

    #[inline]
    pub fn last_stats(&self) -> RenderStats {
        self.last_stats
    }

    /// Render a complete frame
    ///
    /// The whole surface is cleared first, so the result only depends on the
    /// collection, the view and the options.
    pub fn render<S: Surface + ?Sized>(
        &mut self,
        collection: &PolygonCollection,
        view: &impl ViewTransform,
        surface: &mut S,
    ) -> RenderStats {
        #[cfg(feature = "profiling")]
        profiling::scope!("render::frame");

        self.phase = RenderPhase::Querying;
        let candidates = collection.query_visible(view.geo_bounds(), self.options.draw_order);
        let mut stats = RenderStats {
            candidates: candidates.len(),
            ..Default::default()
        };

        self.phase = RenderPhase::Compositing;
        let (width, height) = surface.size();
        surface.clear(PixelRect::new(0, 0, width, height));

        let style = self.options.style;
        surface.set_fill_style(style.fill);
        surface.set_stroke_style(style.stroke, style.stroke_width);

        for feature in &candidates {
            let Some(polygon) = project_and_clip(feature, view, self.options.clip_buffer_px) else {
                stats.clipped_away += 1;
                continue;
            };

            if self.options.coverage_culling && Self::is_covered(&polygon, surface) {
                stats.culled += 1;
                continue;
            }

            Self::draw(&polygon, surface);
            stats.drawn += 1;
        }

        self.phase = RenderPhase::Idle;
        self.last_stats = stats;
        tracing::debug!(
            "Frame: {} candidates, {} clipped away, {} culled, {} drawn",
            stats.candidates,
            stats.clipped_away,
            stats.culled,
            stats.drawn
        );
        stats
    }

    /// Read back the polygon's buffered box and sample it
    fn is_covered<S: Surface + ?Sized>(polygon: &ScreenPolygon, surface: &S) -> bool {
        let region = surface.read_alpha(PixelRect::enclosing(&polygon.bounds));
        sample_coverage(&region, &polygon.points, polygon.centroid).is_fully_covered()
    }

    fn draw<S: Surface + ?Sized>(polygon: &ScreenPolygon, surface: &mut S) {
        let Some((first, rest)) = polygon.points.split_first() else {
            return;
        };
        surface.begin_path();
        surface.move_to(*first);
        for &point in rest {
            surface.line_to(point);
        }
        surface.close_path();
        surface.fill();
        surface.stroke();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::Config;
    use crate::coverage::AlphaRegion;
    use crate::geojson::FeatureCollection;
    use crate::surface::RasterSurface;
    use geo::{Coord, Rect};
    use serde_json::{Value, json};

    /// Pixel = (lon, lat) * 10 with y flipped, 100 x 100 viewport
    struct ScaledView {
        geo: Rect<f64>,
    }

    impl ScaledView {
        fn new() -> Self {
            Self {
                geo: Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 10.0, y: 10.0 }),
            }
        }
    }

    impl ViewTransform for ScaledView {
        fn project(&self, coord: Coord<f64>) -> Coord<f64> {
            Coord {
                x: (coord.x - self.geo.min().x) * 10.0,
                y: 100.0 - (coord.y - self.geo.min().y) * 10.0,
            }
        }

        fn pixel_bounds(&self) -> Rect<f64> {
            Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 100.0, y: 100.0 })
        }

        fn geo_bounds(&self) -> Rect<f64> {
            self.geo
        }
    }

    /// Counts drawing calls and answers read-backs with a fixed alpha
    struct RecordingSurface {
        alpha: u8,
        fills: usize,
        strokes: usize,
        clears: usize,
    }

    impl RecordingSurface {
        fn with_alpha(alpha: u8) -> Self {
            Self {
                alpha,
                fills: 0,
                strokes: 0,
                clears: 0,
            }
        }
    }

    impl Surface for RecordingSurface {
        fn size(&self) -> (u32, u32) {
            (100, 100)
        }
        fn clear(&mut self, _rect: PixelRect) {
            self.clears += 1;
        }
        fn begin_path(&mut self) {}
        fn move_to(&mut self, _point: Coord<f64>) {}
        fn line_to(&mut self, _point: Coord<f64>) {}
        fn close_path(&mut self) {}
        fn set_fill_style(&mut self, _color: Color) {}
        fn set_stroke_style(&mut self, _color: Color, _width: f64) {}
        fn fill(&mut self) {
            self.fills += 1;
        }
        fn stroke(&mut self) {
            self.strokes += 1;
        }
        fn read_alpha(&self, rect: PixelRect) -> AlphaRegion {
            let rect = rect.clamp_to_surface(100, 100);
            AlphaRegion {
                rect,
                alpha: vec![self.alpha; rect.area()],
            }
        }
    }

    fn square_feature(min_x: f64, min_y: f64, size: f64) -> Value {
        let (max_x, max_y) = (min_x + size, min_y + size);
        json!({
            "type": "Feature",
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[min_x, min_y], [max_x, min_y], [max_x, max_y], [min_x, max_y], [min_x, min_y]]]
            }
        })
    }

    fn collection_of(features: Vec<Value>, eliminate_overlaps: bool) -> PolygonCollection {
        let mut collection = PolygonCollection::new(Config {
            eliminate_overlaps,
            ..Default::default()
        });
        collection.load(FeatureCollection::from_features(features));
        collection
    }

    fn grid() -> PolygonCollection {
        collection_of(
            (0..4)
                .map(|i| square_feature(1.0 + i as f64 * 2.0, 1.0, 1.0))
                .collect(),
            true,
        )
    }

    #[test]
    fn test_render_options_default() {
        let options = RenderOptions::default();
        assert!(options.coverage_culling);
        assert_eq!(options.draw_order, DrawOrder::Identifier);
        assert_eq!(options.style.fill.a, 26);
        assert_eq!(options.style.stroke_width, 1.0);
    }

    #[test]
    fn test_fully_painted_samples_skip_draw() {
        let collection = grid();
        let mut renderer = FrameRenderer::new(RenderOptions::default());
        let mut surface = RecordingSurface::with_alpha(255);

        let stats = renderer.render(&collection, &ScaledView::new(), &mut surface);
        assert_eq!(stats.candidates, 4);
        assert_eq!(stats.culled, 4);
        assert_eq!(stats.drawn, 0);
        assert_eq!(surface.fills, 0);
        assert_eq!(surface.clears, 1);
    }

    #[test]
    fn test_transparent_samples_force_draw() {
        let collection = grid();
        let mut renderer = FrameRenderer::new(RenderOptions::default());
        let mut surface = RecordingSurface::with_alpha(0);

        let stats = renderer.render(&collection, &ScaledView::new(), &mut surface);
        assert_eq!(stats.drawn, 4);
        assert_eq!(surface.fills, 4);
        assert_eq!(surface.strokes, 4);
    }

    #[test]
    fn test_render_all_ignores_coverage() {
        let collection = grid();
        let mut renderer = FrameRenderer::new(RenderOptions {
            coverage_culling: false,
            ..Default::default()
        });
        let mut surface = RecordingSurface::with_alpha(255);

        let stats = renderer.render(&collection, &ScaledView::new(), &mut surface);
        assert_eq!(stats.culled, 0);
        assert_eq!(surface.fills, 4);
    }

    #[test]
    fn test_disjoint_viewport_draws_nothing() {
        let collection = grid();
        let mut renderer = FrameRenderer::default();
        let mut surface = RecordingSurface::with_alpha(0);
        let view = ScaledView {
            geo: Rect::new(Coord { x: 50.0, y: 50.0 }, Coord { x: 60.0, y: 60.0 }),
        };

        let stats = renderer.render(&collection, &view, &mut surface);
        assert_eq!(stats, RenderStats::default());
        assert_eq!(surface.fills + surface.strokes, 0);
        assert_eq!(renderer.phase(), RenderPhase::Idle);
    }

    #[test]
    fn test_candidate_outside_pixel_bounds_is_clipped_away() {
        // Geographic bounds wider than what the pixel viewport shows
        let collection = collection_of(vec![square_feature(12.0, 1.0, 1.0)], true);
        let view = ScaledView {
            geo: Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 20.0, y: 10.0 }),
        };
        let mut renderer = FrameRenderer::default();
        let mut surface = RecordingSurface::with_alpha(0);

        let stats = renderer.render(&collection, &view, &mut surface);
        assert_eq!(stats.candidates, 1);
        assert_eq!(stats.clipped_away, 1);
        assert_eq!(surface.fills, 0);
    }

    #[test]
    fn test_raster_surface_culls_hidden_polygon() {
        // Elimination off so the hidden square reaches the renderer
        let collection = collection_of(
            vec![
                square_feature(1.0, 1.0, 6.0),
                square_feature(2.0, 2.0, 2.0),
                square_feature(8.0, 8.0, 1.0),
            ],
            false,
        );
        let mut renderer = FrameRenderer::default();
        let mut surface = RasterSurface::new(100, 100);

        let stats = renderer.render(&collection, &ScaledView::new(), &mut surface);
        assert_eq!(stats.candidates, 3);
        assert_eq!(stats.culled, 1);
        assert_eq!(stats.drawn, 2);
        assert_eq!(renderer.last_stats(), stats);

        // Inside the first square, outside every square
        assert!(surface.pixel(40, 60).is_some_and(|c| c.a > 0));
        assert_eq!(surface.pixel(95, 50).map(|c| c.a), Some(0));
    }

    #[test]
    fn test_render_all_draws_hidden_polygon() {
        let collection = collection_of(
            vec![square_feature(1.0, 1.0, 6.0), square_feature(2.0, 2.0, 2.0)],
            false,
        );
        let mut renderer = FrameRenderer::new(RenderOptions {
            coverage_culling: false,
            ..Default::default()
        });
        let mut surface = RasterSurface::new(100, 100);

        let stats = renderer.render(&collection, &ScaledView::new(), &mut surface);
        assert_eq!(stats.drawn, 2);
        assert_eq!(stats.culled, 0);
    }

    #[test]
    fn test_frame_restarts_from_clear_surface() {
        let collection = grid();
        let mut renderer = FrameRenderer::default();
        let mut surface = RasterSurface::new(100, 100);
        let view = ScaledView::new();

        let first = renderer.render(&collection, &view, &mut surface);
        let second = renderer.render(&collection, &view, &mut surface);
        assert_eq!(first, second);
        assert_eq!(second.drawn, 4);
    }
}

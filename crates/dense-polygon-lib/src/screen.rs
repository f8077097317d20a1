//! Geographic to screen projection and viewport clipping
//!
//! Rings are projected vertex by vertex into pixel space, then clipped against
//! the viewport with Sutherland-Hodgman. Pixel space has its origin at the
//! top-left corner of the surface with y pointing down.

use crate::feature::Feature;
use crate::utils::{self, expand_rect, rect_contains, rects_intersect};
use geo::{Coord, Rect};

/// Side of a Web Mercator tile in pixels
pub const TILE_SIZE: f64 = 256.0;

/// Geographic to pixel transform of the current view
pub trait ViewTransform {
    /// Project a (lon, lat) coordinate to pixel space
    fn project(&self, coord: Coord<f64>) -> Coord<f64>;

    /// Pixel rectangle covered by the view, origin at the top-left
    fn pixel_bounds(&self) -> Rect<f64>;

    /// Geographic bounds of the view in (lon, lat)
    fn geo_bounds(&self) -> Rect<f64>;
}

/// Slippy-map style view: center, fractional zoom and pixel size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MercatorView {
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: f64,
    pub width: f64,
    pub height: f64,
}

impl MercatorView {
    pub fn new(center_lat: f64, center_lon: f64, zoom: f64, width: f64, height: f64) -> Self {
        Self {
            center_lat,
            center_lon,
            zoom,
            width,
            height,
        }
    }

    /// View centered on a (lon, lat) box at the largest zoom that shows all of it
    pub fn fit_bounds(bounds: &Rect<f64>, width: f64, height: f64) -> Self {
        let min = utils::wgs84_to_mercator(bounds.min().y, bounds.min().x);
        let max = utils::wgs84_to_mercator(bounds.max().y, bounds.max().x);
        let (center_lat, center_lon) =
            utils::mercator_to_wgs84((min.x() + max.x()) / 2.0, (min.y() + max.y()) / 2.0);

        // Fraction of the world covered by the box along each axis
        let span_x = ((max.x() - min.x()) / utils::EARTH_SIZE_METERS).max(f64::EPSILON);
        let span_y = ((max.y() - min.y()) / utils::EARTH_SIZE_METERS).max(f64::EPSILON);
        let zoom_x = (width / (TILE_SIZE * span_x)).log2();
        let zoom_y = (height / (TILE_SIZE * span_y)).log2();

        Self::new(center_lat, center_lon, zoom_x.min(zoom_y).max(0.0), width, height)
    }

    /// Size of the whole world in pixels at the current zoom
    #[inline]
    fn world_size(&self) -> f64 {
        TILE_SIZE * self.zoom.exp2()
    }

    /// (lat, lon) to world pixel coordinates
    #[inline]
    fn to_world(&self, lat: f64, lon: f64) -> Coord<f64> {
        let point = utils::wgs84_to_mercator(lat, lon);
        let scale = self.world_size() / utils::EARTH_SIZE_METERS;
        Coord {
            x: (point.x() - utils::EARTH_MERCATOR_MIN) * scale,
            y: (utils::EARTH_MERCATOR_MAX - point.y()) * scale,
        }
    }

    /// Pixel to (lon, lat)
    pub fn unproject(&self, pixel: Coord<f64>) -> Coord<f64> {
        let center = self.to_world(self.center_lat, self.center_lon);
        let world_x = pixel.x - self.width / 2.0 + center.x;
        let world_y = pixel.y - self.height / 2.0 + center.y;
        let scale = utils::EARTH_SIZE_METERS / self.world_size();
        let (lat, lon) = utils::mercator_to_wgs84(
            world_x * scale + utils::EARTH_MERCATOR_MIN,
            utils::EARTH_MERCATOR_MAX - world_y * scale,
        );
        Coord { x: lon, y: lat }
    }
}

impl ViewTransform for MercatorView {
    fn project(&self, coord: Coord<f64>) -> Coord<f64> {
        let center = self.to_world(self.center_lat, self.center_lon);
        let world = self.to_world(coord.y, coord.x);
        Coord {
            x: world.x - center.x + self.width / 2.0,
            y: world.y - center.y + self.height / 2.0,
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
        // Rect::new normalizes the flipped y axis
        Rect::new(
            self.unproject(Coord { x: 0.0, y: 0.0 }),
            self.unproject(Coord {
                x: self.width,
                y: self.height,
            }),
        )
    }
}

/// A feature ring in pixel space, clipped to the viewport
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenPolygon {
    /// Clipped ring, open
    pub points: Vec<Coord<f64>>,
    /// Bounding box of `points` grown by the clip buffer
    pub bounds: Rect<f64>,
    /// Signed-area centroid of `points`
    pub centroid: Coord<f64>,
}

/// Project every vertex, returning the pixel ring and its bounding box
pub fn project_ring(
    ring: &[Coord<f64>],
    view: &impl ViewTransform,
) -> (Vec<Coord<f64>>, Option<Rect<f64>>) {
    let points: Vec<Coord<f64>> = ring.iter().map(|&coord| view.project(coord)).collect();
    let bounds = bounds_of(&points);
    (points, bounds)
}

/// Bounding box of a pixel ring, `None` when empty
pub fn bounds_of(points: &[Coord<f64>]) -> Option<Rect<f64>> {
    let first = *points.first()?;
    let (min, max) = points.iter().fold((first, first), |(min, max), p| {
        (
            Coord {
                x: min.x.min(p.x),
                y: min.y.min(p.y),
            },
            Coord {
                x: max.x.max(p.x),
                y: max.y.max(p.y),
            },
        )
    });
    Some(Rect::new(min, max))
}

#[derive(Clone, Copy)]
enum Edge {
    Left(f64),
    Right(f64),
    Top(f64),
    Bottom(f64),
}

impl Edge {
    #[inline]
    fn inside(self, p: Coord<f64>) -> bool {
        match self {
            Edge::Left(x) => p.x >= x,
            Edge::Right(x) => p.x <= x,
            Edge::Top(y) => p.y >= y,
            Edge::Bottom(y) => p.y <= y,
        }
    }

    /// Point where segment `a`-`b` crosses the edge line
    #[inline]
    fn intersect(self, a: Coord<f64>, b: Coord<f64>) -> Coord<f64> {
        match self {
            Edge::Left(x) | Edge::Right(x) => {
                let t = (x - a.x) / (b.x - a.x);
                Coord {
                    x,
                    y: a.y + t * (b.y - a.y),
                }
            }
            Edge::Top(y) | Edge::Bottom(y) => {
                let t = (y - a.y) / (b.y - a.y);
                Coord {
                    x: a.x + t * (b.x - a.x),
                    y,
                }
            }
        }
    }
}

/// Sutherland-Hodgman clip of an open ring against a rectangle
///
/// Returns an empty ring when fewer than three vertices survive.
pub fn clip_to_rect(points: &[Coord<f64>], rect: &Rect<f64>) -> Vec<Coord<f64>> {
    let edges = [
        Edge::Left(rect.min().x),
        Edge::Right(rect.max().x),
        Edge::Top(rect.min().y),
        Edge::Bottom(rect.max().y),
    ];

    let mut output = points.to_vec();
    for edge in edges {
        if output.is_empty() {
            break;
        }
        let input = std::mem::take(&mut output);
        let mut previous = input[input.len() - 1];
        for &current in &input {
            match (edge.inside(current), edge.inside(previous)) {
                (true, true) => output.push(current),
                (true, false) => {
                    output.push(edge.intersect(previous, current));
                    output.push(current);
                }
                (false, true) => output.push(edge.intersect(previous, current)),
                (false, false) => {}
            }
            previous = current;
        }
    }

    if output.len() < 3 {
        output.clear();
    }
    output
}

/// Signed-area centroid, vertex mean when the ring has no area
pub fn centroid(points: &[Coord<f64>]) -> Coord<f64> {
    if points.is_empty() {
        return Coord::zero();
    }

    let mut twice_area = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        let cross = a.x * b.y - b.x * a.y;
        twice_area += cross;
        cx += (a.x + b.x) * cross;
        cy += (a.y + b.y) * cross;
    }

    if twice_area.abs() <= f64::EPSILON {
        let n = points.len() as f64;
        let (sx, sy) = points
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        return Coord {
            x: sx / n,
            y: sy / n,
        };
    }

    Coord {
        x: cx / (3.0 * twice_area),
        y: cy / (3.0 * twice_area),
    }
}

/// Project a feature and clip it to the view
///
/// Returns `None` when the feature is entirely outside the viewport or
/// nothing drawable is left after clipping.
pub fn project_and_clip(
    feature: &Feature,
    view: &impl ViewTransform,
    buffer_px: f64,
) -> Option<ScreenPolygon> {
    let viewport = view.pixel_bounds();
    let (points, bounds) = project_ring(feature.ring(), view);
    let bounds = bounds?;

    if !rects_intersect(&bounds, &viewport) {
        return None;
    }

    let (points, bounds) = if rect_contains(&viewport, &bounds) {
        (points, bounds)
    } else {
        let clipped = clip_to_rect(&points, &viewport);
        let clipped_bounds = bounds_of(&clipped)?;
        (clipped, clipped_bounds)
    };

    if points.len() < 3 {
        return None;
    }

    Some(ScreenPolygon {
        centroid: centroid(&points),
        bounds: expand_rect(&bounds, buffer_px),
        points,
    })
}

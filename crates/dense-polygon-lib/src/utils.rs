//! Utility functions for coordinate conversions and bounding box arithmetic

use geo::{Coord, Point, Rect};

/// Web Mercator bounds in meters (EPSG:3857)
pub const EARTH_MERCATOR_MAX: f64 = 20037508.34;
pub const EARTH_MERCATOR_MIN: f64 = -20037508.34;
pub const EARTH_SIZE_METERS: f64 = EARTH_MERCATOR_MAX - EARTH_MERCATOR_MIN;

/// Maximum latitude that can be represented in Web Mercator
pub const MAX_LATITUDE: f64 = 85.05112878;

/// Precomputed constant: EARTH_MERCATOR_MAX / 180.0
const LON_TO_X_FACTOR: f64 = EARTH_MERCATOR_MAX / 180.0;

/// Precomputed constant: EARTH_MERCATOR_MAX / PI
const Y_FACTOR: f64 = EARTH_MERCATOR_MAX / std::f64::consts::PI;

/// Precomputed constant: 180.0 / EARTH_MERCATOR_MAX
const X_TO_LON_FACTOR: f64 = 180.0 / EARTH_MERCATOR_MAX;

/// Precomputed constant: PI / EARTH_MERCATOR_MAX
const Y_TO_LAT_FACTOR: f64 = std::f64::consts::PI / EARTH_MERCATOR_MAX;

/// Convert WGS84 (lat, lon) to Web Mercator (x, y) in meters
///
/// # Arguments
/// * `lat` - Latitude in degrees (-85.05 to 85.05)
/// * `lon` - Longitude in degrees (-180 to 180)
///
/// # Returns
/// A `Point<f64>` with x (easting) and y (northing) in meters
#[inline(always)]
pub fn wgs84_to_mercator(lat: f64, lon: f64) -> Point<f64> {
    // Clamp latitude to valid Web Mercator range
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);

    let x = lon * LON_TO_X_FACTOR;

    let lat_rad = lat.to_radians();
    let y = (lat_rad.tan() + (1.0 / lat_rad.cos())).ln() * Y_FACTOR;

    Point::new(x, y)
}

/// Convert Web Mercator (x, y) in meters to WGS84 (lat, lon)
///
/// # Returns
/// A tuple of (latitude, longitude) in degrees
#[inline(always)]
pub fn mercator_to_wgs84(x: f64, y: f64) -> (f64, f64) {
    let lon = x * X_TO_LON_FACTOR;
    let lat =
        (std::f64::consts::PI / 2.0 - 2.0 * ((-y * Y_TO_LAT_FACTOR).exp()).atan()).to_degrees();
    (lat, lon)
}

/// A degenerate (zero-size) box located at a single coordinate
#[inline(always)]
pub fn point_rect(x: f64, y: f64) -> Rect<f64> {
    Rect::new(Coord { x, y }, Coord { x, y })
}

/// Closed-interval intersection test: boxes that only touch do intersect
#[inline(always)]
pub fn rects_intersect(a: &Rect<f64>, b: &Rect<f64>) -> bool {
    a.min().x <= b.max().x
        && a.min().y <= b.max().y
        && b.min().x <= a.max().x
        && b.min().y <= a.max().y
}

/// Whether `outer` fully contains `inner` (boundaries included)
#[inline(always)]
pub fn rect_contains(outer: &Rect<f64>, inner: &Rect<f64>) -> bool {
    outer.min().x <= inner.min().x
        && outer.min().y <= inner.min().y
        && inner.max().x <= outer.max().x
        && inner.max().y <= outer.max().y
}

/// Smallest box enclosing both inputs
#[inline(always)]
pub fn rect_union(a: &Rect<f64>, b: &Rect<f64>) -> Rect<f64> {
    Rect::new(
        Coord {
            x: a.min().x.min(b.min().x),
            y: a.min().y.min(b.min().y),
        },
        Coord {
            x: a.max().x.max(b.max().x),
            y: a.max().y.max(b.max().y),
        },
    )
}

/// Overlap of two boxes, `None` when they are disjoint
pub fn rect_intersection(a: &Rect<f64>, b: &Rect<f64>) -> Option<Rect<f64>> {
    if !rects_intersect(a, b) {
        return None;
    }
    Some(Rect::new(
        Coord {
            x: a.min().x.max(b.min().x),
            y: a.min().y.max(b.min().y),
        },
        Coord {
            x: a.max().x.min(b.max().x),
            y: a.max().y.min(b.max().y),
        },
    ))
}

/// Area of the overlap of two boxes (0 when disjoint)
#[inline]
pub fn intersection_area(a: &Rect<f64>, b: &Rect<f64>) -> f64 {
    rect_intersection(a, b).map_or(0.0, |r| r.width() * r.height())
}

/// Half perimeter, used as the split-axis metric of the R-tree
#[inline(always)]
pub fn rect_margin(r: &Rect<f64>) -> f64 {
    r.width() + r.height()
}

/// Area increase needed for `base` to also enclose `addition`
#[inline(always)]
pub fn enlarged_area(base: &Rect<f64>, addition: &Rect<f64>) -> f64 {
    let union = rect_union(base, addition);
    union.width() * union.height()
}

/// Grow a box by `amount` on every side
#[inline]
pub fn expand_rect(r: &Rect<f64>, amount: f64) -> Rect<f64> {
    Rect::new(
        Coord {
            x: r.min().x - amount,
            y: r.min().y - amount,
        },
        Coord {
            x: r.max().x + amount,
            y: r.max().y + amount,
        },
    )
}

//! Alpha read-back coverage heuristic
//!
//! A polygon is considered hidden when every sampled pixel (its clipped vertices
//! plus its centroid) already has non-zero alpha on the surface. The samples are
//! read from a single alpha region covering the polygon's buffered bounding box.

use geo::{Coord, Rect};

/// Integer pixel rectangle, `x`/`y` is the top-left corner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Smallest pixel rectangle enclosing a fractional pixel box
    pub fn enclosing(bounds: &Rect<f64>) -> Self {
        let min_x = bounds.min().x.floor();
        let min_y = bounds.min().y.floor();
        let max_x = bounds.max().x.ceil();
        let max_y = bounds.max().y.ceil();
        Self {
            x: min_x as i32,
            y: min_y as i32,
            width: (max_x - min_x).max(0.0) as u32,
            height: (max_y - min_y).max(0.0) as u32,
        }
    }

    /// Intersection with a `width` x `height` surface anchored at the origin
    pub fn clamp_to_surface(&self, width: u32, height: u32) -> Self {
        let min_x = i64::from(self.x).clamp(0, i64::from(width));
        let min_y = i64::from(self.y).clamp(0, i64::from(height));
        let max_x = (i64::from(self.x) + i64::from(self.width)).clamp(0, i64::from(width));
        let max_y = (i64::from(self.y) + i64::from(self.height)).clamp(0, i64::from(height));
        Self {
            x: min_x as i32,
            y: min_y as i32,
            width: (max_x - min_x).max(0) as u32,
            height: (max_y - min_y).max(0) as u32,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Exclusive right edge
    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    /// Exclusive bottom edge
    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && y >= self.y && x < self.right() && y < self.bottom()
    }
}

/// Alpha channel of a surface region, row-major
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlphaRegion {
    pub rect: PixelRect,
    pub alpha: Vec<u8>,
}

impl AlphaRegion {
    /// Region with no pixels
    pub fn empty() -> Self {
        Self::default()
    }

    /// Alpha at absolute surface coordinates, `None` outside the region
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<u8> {
        if !self.rect.contains(x, y) {
            return None;
        }
        let col = (x - self.rect.x) as usize;
        let row = (y - self.rect.y) as usize;
        self.alpha.get(row * self.rect.width as usize + col).copied()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rect.is_empty()
    }
}

/// Result of sampling a polygon against an alpha region
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoverageSample {
    /// Samples landing on a pixel with non-zero alpha
    pub painted: usize,
    /// Samples examined; the scan ends at the first unpainted one, so this
    /// is below `vertices + 1` for visible polygons
    pub total: usize,
}

impl CoverageSample {
    /// Every sample is painted; no samples means not covered
    #[inline]
    pub fn is_fully_covered(&self) -> bool {
        self.total > 0 && self.painted == self.total
    }
}

/// Round a pixel position and clamp it into the region
#[inline]
fn clamp_sample(point: Coord<f64>, rect: &PixelRect) -> (i32, i32) {
    let x = (point.x.round() as i64).clamp(i64::from(rect.x), i64::from(rect.right()) - 1);
    let y = (point.y.round() as i64).clamp(i64::from(rect.y), i64::from(rect.bottom()) - 1);
    (x as i32, y as i32)
}

/// Sample every vertex and the centroid of a screen polygon
///
/// Stops counting at the first unpainted sample since the polygon is then
/// known to be visible.
pub fn sample_coverage(
    region: &AlphaRegion,
    vertices: &[Coord<f64>],
    centroid: Coord<f64>,
) -> CoverageSample {
    let mut sample = CoverageSample::default();
    if region.is_empty() {
        return sample;
    }

    for point in vertices.iter().copied().chain(std::iter::once(centroid)) {
        let (x, y) = clamp_sample(point, &region.rect);
        sample.total += 1;
        match region.get(x, y) {
            Some(alpha) if alpha > 0 => sample.painted += 1,
            _ => break,
        }
    }
    sample
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(rect: PixelRect, fill: u8) -> AlphaRegion {
        AlphaRegion {
            rect,
            alpha: vec![fill; rect.area()],
        }
    }

    fn triangle() -> Vec<Coord<f64>> {
        vec![
            Coord { x: 2.0, y: 2.0 },
            Coord { x: 8.0, y: 2.0 },
            Coord { x: 5.0, y: 8.0 },
        ]
    }

    #[test]
    fn test_enclosing_rect() {
        let rect = PixelRect::enclosing(&Rect::new(
            Coord { x: 1.2, y: -0.5 },
            Coord { x: 4.1, y: 3.0 },
        ));
        assert_eq!(rect, PixelRect::new(1, -1, 4, 4));
    }

    #[test]
    fn test_clamp_to_surface() {
        let rect = PixelRect::new(-5, 10, 20, 20);
        assert_eq!(rect.clamp_to_surface(12, 25), PixelRect::new(0, 10, 12, 15));

        let outside = PixelRect::new(50, 50, 10, 10);
        assert!(outside.clamp_to_surface(12, 25).is_empty());
    }

    #[test]
    fn test_fully_painted_region_is_covered() {
        let region = region(PixelRect::new(0, 0, 10, 10), 255);
        let sample = sample_coverage(&region, &triangle(), Coord { x: 5.0, y: 4.0 });
        assert_eq!(sample.total, 4);
        assert!(sample.is_fully_covered());
    }

    #[test]
    fn test_transparent_sample_is_not_covered() {
        let mut region = region(PixelRect::new(0, 0, 10, 10), 255);
        // Pixel under the second vertex
        region.alpha[2 * 10 + 8] = 0;
        let sample = sample_coverage(&region, &triangle(), Coord { x: 5.0, y: 4.0 });
        assert!(!sample.is_fully_covered());
        assert_eq!(sample.painted, 1);
        // Third vertex and centroid are never read
        assert_eq!(sample.total, 2);
    }

    #[test]
    fn test_transparent_centroid_is_not_covered() {
        let mut region = region(PixelRect::new(0, 0, 10, 10), 40);
        region.alpha[4 * 10 + 5] = 0;
        let sample = sample_coverage(&region, &triangle(), Coord { x: 5.0, y: 4.0 });
        assert_eq!(sample.painted, 3);
        assert!(!sample.is_fully_covered());
    }

    #[test]
    fn test_samples_are_clamped_into_region() {
        // Vertices on the exclusive right/bottom edge land on the last pixel
        let region = region(PixelRect::new(2, 2, 7, 7), 1);
        let vertices = [
            Coord { x: 9.0, y: 9.0 },
            Coord { x: -3.0, y: 2.0 },
            Coord { x: 5.4, y: 100.0 },
        ];
        let sample = sample_coverage(&region, &vertices, Coord { x: 5.0, y: 5.0 });
        assert!(sample.is_fully_covered());
    }

    #[test]
    fn test_empty_region_is_not_covered() {
        let sample = sample_coverage(&AlphaRegion::empty(), &triangle(), Coord::zero());
        assert_eq!(sample, CoverageSample::default());
        assert!(!sample.is_fully_covered());
    }

    #[test]
    fn test_region_lookup_outside() {
        let region = region(PixelRect::new(3, 3, 2, 2), 9);
        assert_eq!(region.get(3, 3), Some(9));
        assert_eq!(region.get(5, 3), None);
        assert_eq!(region.get(2, 4), None);
    }
}

//! Drawing surface abstraction and a software RGBA implementation
//!
//! The renderer only talks to [`Surface`]: a canvas-like path API plus an alpha
//! read-back used by the coverage test. [`RasterSurface`] implements it on a
//! plain RGBA8 buffer so frames can be produced without a GPU and uploaded as a
//! texture by the viewer.

use crate::coverage::{AlphaRegion, PixelRect};
use geo::Coord;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Straight (unmultiplied) RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    /// Default polygon color
    pub const BLUE: Color = Color::rgba(0x33, 0x88, 0xff, 0xff);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Same color with alpha set from an opacity in `[0, 1]`
    pub fn with_opacity(self, opacity: f32) -> Self {
        Self {
            a: (opacity.clamp(0.0, 1.0) * 255.0).round() as u8,
            ..self
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLUE
    }
}

/// Canvas-like drawing target
pub trait Surface {
    /// Width and height in pixels
    fn size(&self) -> (u32, u32);

    /// Reset a region to fully transparent
    fn clear(&mut self, rect: PixelRect);

    fn begin_path(&mut self);
    fn move_to(&mut self, point: Coord<f64>);
    fn line_to(&mut self, point: Coord<f64>);
    fn close_path(&mut self);

    fn set_fill_style(&mut self, color: Color);
    fn set_stroke_style(&mut self, color: Color, width: f64);

    /// Fill the current path (even-odd)
    fn fill(&mut self);

    /// Stroke the current path
    fn stroke(&mut self);

    /// Alpha channel of a region, clamped to the surface
    fn read_alpha(&self, rect: PixelRect) -> AlphaRegion;
}

#[derive(Debug, Clone, Default)]
struct SubPath {
    points: Vec<Coord<f64>>,
    closed: bool,
}

/// Software RGBA8 surface
#[derive(Debug, Clone)]
pub struct RasterSurface {
    width: u32,
    height: u32,
    /// Row-major straight RGBA
    pixels: Vec<u8>,
    path: Vec<SubPath>,
    fill_color: Color,
    stroke_color: Color,
    stroke_width: f64,
}

/// Source-over blend of one straight-alpha pixel
#[inline]
fn blend_pixel(dst: &mut [u8], src: Color) {
    if src.a == 0 {
        return;
    }
    let sa = f32::from(src.a) / 255.0;
    let da = f32::from(dst[3]) / 255.0;
    let out_a = sa + da * (1.0 - sa);

    let channel = |s: u8, d: u8| {
        let c = (f32::from(s) * sa + f32::from(d) * da * (1.0 - sa)) / out_a;
        c.round().clamp(0.0, 255.0) as u8
    };
    dst[0] = channel(src.r, dst[0]);
    dst[1] = channel(src.g, dst[1]);
    dst[2] = channel(src.b, dst[2]);
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

impl RasterSurface {
    /// Create a fully transparent surface
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
            path: Vec::new(),
            fill_color: Color::default(),
            stroke_color: Color::default(),
            stroke_width: 1.0,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw straight RGBA bytes, row-major
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Resize, discarding the content when the size changes
    pub fn resize(&mut self, width: u32, height: u32) {
        if (width, height) != (self.width, self.height) {
            *self = Self {
                fill_color: self.fill_color,
                stroke_color: self.stroke_color,
                stroke_width: self.stroke_width,
                ..Self::new(width, height)
            };
        }
    }

    /// RGBA at a pixel, `None` outside the surface
    pub fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        let idx = self.pixel_index(x, y)?;
        let p = &self.pixels[idx..idx + 4];
        Some(Color::rgba(p[0], p[1], p[2], p[3]))
    }

    #[inline]
    fn pixel_index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * 4)
    }

    #[inline]
    fn blend_at(&mut self, x: i32, y: i32, color: Color) {
        if let Some(idx) = self.pixel_index(x, y) {
            blend_pixel(&mut self.pixels[idx..idx + 4], color);
        }
    }

    /// Vertical pixel-row range touched by the current path
    fn path_rows(&self) -> Option<(i32, i32)> {
        let (min_y, max_y) = self
            .path
            .iter()
            .flat_map(|sub| sub.points.iter())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p.y), hi.max(p.y))
            });
        if min_y > max_y {
            return None;
        }
        let first = (min_y.floor() as i64).max(0);
        let last = (max_y.ceil() as i64).min(i64::from(self.height));
        (first < last).then_some((first as i32, last as i32))
    }
}

impl Surface for RasterSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear(&mut self, rect: PixelRect) {
        let rect = rect.clamp_to_surface(self.width, self.height);
        if rect.is_empty() {
            return;
        }
        let row_bytes = self.width as usize * 4;
        for y in rect.y..rect.bottom() {
            let start = y as usize * row_bytes + rect.x as usize * 4;
            self.pixels[start..start + rect.width as usize * 4].fill(0);
        }
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn move_to(&mut self, point: Coord<f64>) {
        self.path.push(SubPath {
            points: vec![point],
            closed: false,
        });
    }

    fn line_to(&mut self, point: Coord<f64>) {
        match self.path.last_mut() {
            Some(sub) if !sub.closed => sub.points.push(point),
            _ => self.move_to(point),
        }
    }

    fn close_path(&mut self) {
        if let Some(sub) = self.path.last_mut() {
            sub.closed = true;
        }
    }

    fn set_fill_style(&mut self, color: Color) {
        self.fill_color = color;
    }

    fn set_stroke_style(&mut self, color: Color, width: f64) {
        self.stroke_color = color;
        self.stroke_width = width.max(0.0);
    }

    fn fill(&mut self) {
        #[cfg(feature = "profiling")]
        profiling::scope!("surface::fill");

        let Some((first_row, last_row)) = self.path_rows() else {
            return;
        };
        let color = self.fill_color;
        let mut crossings: Vec<f64> = Vec::new();

        for y in first_row..last_row {
            // Sample at the pixel center
            let yc = f64::from(y) + 0.5;
            crossings.clear();
            for sub in &self.path {
                let n = sub.points.len();
                if n < 2 {
                    continue;
                }
                for i in 0..n {
                    let a = sub.points[i];
                    let b = sub.points[(i + 1) % n];
                    if (a.y <= yc && yc < b.y) || (b.y <= yc && yc < a.y) {
                        crossings.push(a.x + (yc - a.y) * (b.x - a.x) / (b.y - a.y));
                    }
                }
            }
            crossings.sort_by(f64::total_cmp);

            for span in crossings.chunks_exact(2) {
                let start = ((span[0] - 0.5).ceil() as i64).max(0);
                let end = ((span[1] - 0.5).ceil() as i64).min(i64::from(self.width));
                for x in start..end {
                    self.blend_at(x as i32, y, color);
                }
            }
        }
    }

    fn stroke(&mut self) {
        #[cfg(feature = "profiling")]
        profiling::scope!("surface::stroke");

        if self.stroke_width <= 0.0 || self.stroke_color.a == 0 {
            return;
        }
        let half = (self.stroke_width / 2.0).max(0.5);

        // Mark pixels first so overlapping brush stamps blend once
        let mut marked: Vec<(i32, i32)> = Vec::new();
        let mut stamp = |p: Coord<f64>| {
            let x0 = (p.x - half - 0.5).ceil() as i32;
            let x1 = (p.x + half - 0.5).floor() as i32;
            let y0 = (p.y - half - 0.5).ceil() as i32;
            let y1 = (p.y + half - 0.5).floor() as i32;
            for y in y0..=y1 {
                for x in x0..=x1 {
                    marked.push((x, y));
                }
            }
        };

        for sub in &self.path {
            let n = sub.points.len();
            let segments = if sub.closed { n } else { n.saturating_sub(1) };
            if n == 1 {
                stamp(sub.points[0]);
            }
            for i in 0..segments {
                let a = sub.points[i];
                let b = sub.points[(i + 1) % n];
                let length = (b.x - a.x).hypot(b.y - a.y);
                let steps = (length / 0.5).ceil().max(1.0) as usize;
                for step in 0..=steps {
                    let t = step as f64 / steps as f64;
                    stamp(Coord {
                        x: a.x + (b.x - a.x) * t,
                        y: a.y + (b.y - a.y) * t,
                    });
                }
            }
        }

        marked.sort_unstable();
        marked.dedup();
        let color = self.stroke_color;
        for (x, y) in marked {
            self.blend_at(x, y, color);
        }
    }

    fn read_alpha(&self, rect: PixelRect) -> AlphaRegion {
        let rect = rect.clamp_to_surface(self.width, self.height);
        if rect.is_empty() {
            return AlphaRegion::empty();
        }
        let mut alpha = Vec::with_capacity(rect.area());
        for y in rect.y..rect.bottom() {
            for x in rect.x..rect.right() {
                let idx = (y as usize * self.width as usize + x as usize) * 4;
                alpha.push(self.pixels[idx + 3]);
            }
        }
        AlphaRegion { rect, alpha }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace(surface: &mut RasterSurface, points: &[(f64, f64)]) {
        surface.begin_path();
        for (i, &(x, y)) in points.iter().enumerate() {
            if i == 0 {
                surface.move_to(Coord { x, y });
            } else {
                surface.line_to(Coord { x, y });
            }
        }
        surface.close_path();
    }

    #[test]
    fn test_new_surface_is_transparent() {
        let surface = RasterSurface::new(4, 3);
        assert_eq!(surface.size(), (4, 3));
        assert_eq!(surface.pixels().len(), 48);
        assert!(surface.read_alpha(PixelRect::new(0, 0, 4, 3)).alpha.iter().all(|&a| a == 0));
    }

    #[test]
    fn test_fill_square() {
        let mut surface = RasterSurface::new(10, 10);
        surface.set_fill_style(Color::rgba(255, 0, 0, 255));
        trace(&mut surface, &[(2.0, 2.0), (6.0, 2.0), (6.0, 6.0), (2.0, 6.0)]);
        surface.fill();

        let region = surface.read_alpha(PixelRect::new(0, 0, 10, 10));
        let painted = region.alpha.iter().filter(|&&a| a > 0).count();
        assert_eq!(painted, 16);
        assert_eq!(surface.pixel(2, 2), Some(Color::rgba(255, 0, 0, 255)));
        assert_eq!(surface.pixel(6, 6), Some(Color::TRANSPARENT));
    }

    #[test]
    fn test_fill_even_odd_hole() {
        let mut surface = RasterSurface::new(10, 10);
        surface.set_fill_style(Color::rgba(0, 0, 0, 255));
        surface.begin_path();
        for ring in [
            [(0.0, 0.0), (9.0, 0.0), (9.0, 9.0), (0.0, 9.0)],
            [(3.0, 3.0), (6.0, 3.0), (6.0, 6.0), (3.0, 6.0)],
        ] {
            surface.move_to(Coord {
                x: ring[0].0,
                y: ring[0].1,
            });
            for &(x, y) in &ring[1..] {
                surface.line_to(Coord { x, y });
            }
            surface.close_path();
        }
        surface.fill();
        assert_eq!(surface.pixel(1, 1).map(|c| c.a), Some(255));
        assert_eq!(surface.pixel(4, 4).map(|c| c.a), Some(0));
    }

    #[test]
    fn test_translucent_fill_blends() {
        let mut surface = RasterSurface::new(4, 4);
        surface.set_fill_style(Color::BLUE.with_opacity(0.1));
        trace(&mut surface, &[(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)]);
        surface.fill();
        let once = surface.pixel(1, 1).map(|c| c.a).unwrap_or_default();
        assert_eq!(once, 26);

        surface.fill();
        let twice = surface.pixel(1, 1).map(|c| c.a).unwrap_or_default();
        assert!(twice > once);
        // Color is preserved when blending a color over itself
        assert_eq!(surface.pixel(1, 1).map(|c| c.b), Some(0xff));
    }

    #[test]
    fn test_stroke_outline() {
        let mut surface = RasterSurface::new(12, 12);
        surface.set_stroke_style(Color::rgba(0, 0, 0, 128), 1.0);
        trace(
            &mut surface,
            &[(2.5, 2.5), (8.5, 2.5), (8.5, 8.5), (2.5, 8.5)],
        );
        surface.stroke();

        assert!(surface.pixel(2, 2).is_some_and(|c| c.a > 0));
        assert!(surface.pixel(5, 2).is_some_and(|c| c.a > 0));
        assert!(surface.pixel(2, 5).is_some_and(|c| c.a > 0));
        // Interior untouched, each stamped pixel blended once
        assert_eq!(surface.pixel(5, 5).map(|c| c.a), Some(0));
        assert_eq!(surface.pixel(8, 5).map(|c| c.a), Some(128));
    }

    #[test]
    fn test_clear_region() {
        let mut surface = RasterSurface::new(6, 6);
        surface.set_fill_style(Color::rgba(1, 2, 3, 255));
        trace(&mut surface, &[(0.0, 0.0), (6.0, 0.0), (6.0, 6.0), (0.0, 6.0)]);
        surface.fill();

        surface.clear(PixelRect::new(-2, -2, 5, 5));
        assert_eq!(surface.pixel(2, 2).map(|c| c.a), Some(0));
        assert_eq!(surface.pixel(3, 3).map(|c| c.a), Some(255));
    }

    #[test]
    fn test_read_alpha_is_clamped() {
        let surface = RasterSurface::new(5, 5);
        let region = surface.read_alpha(PixelRect::new(3, -1, 10, 3));
        assert_eq!(region.rect, PixelRect::new(3, 0, 2, 2));
        assert_eq!(region.alpha.len(), 4);

        assert!(surface.read_alpha(PixelRect::new(9, 9, 2, 2)).is_empty());
    }

    #[test]
    fn test_resize_discards_content() {
        let mut surface = RasterSurface::new(2, 2);
        surface.set_fill_style(Color::rgba(9, 9, 9, 255));
        trace(&mut surface, &[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)]);
        surface.fill();

        surface.resize(2, 2);
        assert_eq!(surface.pixel(0, 0).map(|c| c.a), Some(255));
        surface.resize(3, 2);
        assert_eq!(surface.pixels().len(), 24);
        assert_eq!(surface.pixel(0, 0).map(|c| c.a), Some(0));
    }
}

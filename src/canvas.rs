//! Polyline rasteriser.
//!
//! Maps unit-disk coordinates onto a square RGBA image with a border and
//! draws segments between them with Bresenham's algorithm.
//!
//! ```text
//! pixel(v) = floor((v + 1) * S / 2) + B
//! ```
//!
//! where `S` is the side of the drawing area and `B = S / 16` the border.
//! The y axis is not flipped: larger `y` lands on a lower image row.

use crate::error::Result;
use crate::point::Point;
use image::{ImageFormat, Rgba, RgbaImage};
use std::path::Path;

/// Default side of the square drawing area in pixels
pub const SCALE: u32 = 1024;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// A square white canvas that points are sketched onto.
pub struct Canvas {
    image: RgbaImage,
    scale: u32,
    border: u32,
}

impl Canvas {
    /// Canvas with the default drawing area.
    #[cfg(test)]
    pub fn new() -> Self {
        Self::with_scale(SCALE)
    }

    /// Canvas with a drawing area of `scale` pixels and a border of
    /// `scale / 16` on every side.
    pub fn with_scale(scale: u32) -> Self {
        let border = scale / 16;
        let side = scale + 2 * border;
        Canvas {
            image: RgbaImage::from_pixel(side, side, WHITE),
            scale,
            border,
        }
    }

    /// Side length of the whole image in pixels
    pub fn side(&self) -> u32 {
        self.image.width()
    }

    #[cfg(test)]
    pub fn border(&self) -> u32 {
        self.border
    }

    #[cfg(test)]
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Map one unit-disk coordinate to a pixel index.
    pub fn pixel(&self, v: f64) -> i64 {
        self.position(v).floor() as i64
    }

    /// Unfloored image position of a unit-disk coordinate.
    fn position(&self, v: f64) -> f64 {
        (v + 1.0) * f64::from(self.scale) / 2.0 + f64::from(self.border)
    }

    /// Draw a black segment from `from` to `to`.
    ///
    /// The segment is clipped to the image before rasterising, so only
    /// pixels on the canvas are ever walked.
    pub fn line(&mut self, from: Point, to: Point) {
        let (x0, y0) = (self.position(from.x), self.position(from.y));
        let (x1, y1) = (self.position(to.x), self.position(to.y));
        let Some((x0, y0, x1, y1)) = self.clip(x0, y0, x1, y1) else {
            return;
        };
        self.bresenham(
            x0.floor() as i64,
            y0.floor() as i64,
            x1.floor() as i64,
            y1.floor() as i64,
        );
    }

    /// Liang-Barsky clip of a segment to `[-1, side]` on both axes, one pixel
    /// outside the image so rounding at the cut never loses an edge pixel.
    /// Returns `None` when nothing of the segment is near the image.
    fn clip(&self, x0: f64, y0: f64, x1: f64, y1: f64) -> Option<(f64, f64, f64, f64)> {
        if ![x0, y0, x1, y1].iter().all(|v| v.is_finite()) {
            return None;
        }
        let (min, max) = (-1.0, f64::from(self.side()));
        let (dx, dy) = (x1 - x0, y1 - y0);
        let (mut t0, mut t1) = (0.0_f64, 1.0_f64);

        for (p, q) in [(-dx, x0 - min), (dx, max - x0), (-dy, y0 - min), (dy, max - y0)] {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }

        Some((x0 + t0 * dx, y0 + t0 * dy, x0 + t1 * dx, y0 + t1 * dy))
    }

    /// Integer line plot covering every octant. Pixels outside the image are
    /// skipped.
    fn bresenham(&mut self, mut x0: i64, mut y0: i64, x1: i64, y1: i64) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.plot(x0, y0);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    fn plot(&mut self, x: i64, y: i64) {
        let side = i64::from(self.side());
        if (0..side).contains(&x) && (0..side).contains(&y) {
            self.image.put_pixel(x as u32, y as u32, BLACK);
        }
    }

    /// Encode the canvas as PNG at `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.image.save_with_format(path, ImageFormat::Png)?;
        Ok(())
    }
}

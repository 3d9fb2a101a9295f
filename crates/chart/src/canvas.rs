//! Minimal raster drawing on top of `image::RgbImage`. Everything is
//! computed per pixel from integer coordinates, so output is reproducible.

use image::{DynamicImage, ImageBuffer, Rgb, RgbImage};
use std::io::Cursor;

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const AXIS: Rgb<u8> = Rgb([96, 96, 96]);
pub const GRID: Rgb<u8> = Rgb([214, 214, 214]);

pub struct Canvas {
    img: RgbImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            img: ImageBuffer::from_pixel(width, height, WHITE),
        }
    }

    pub fn width(&self) -> u32 {
        self.img.width()
    }

    pub fn height(&self) -> u32 {
        self.img.height()
    }

    fn put(&mut self, x: i64, y: i64, color: Rgb<u8>) {
        if x >= 0 && y >= 0 && (x as u32) < self.img.width() && (y as u32) < self.img.height() {
            self.img.put_pixel(x as u32, y as u32, color);
        }
    }

    /// Fill every pixel for which `paint` returns a colour.
    pub fn paint<F>(&mut self, mut paint: F)
    where
        F: FnMut(u32, u32) -> Option<Rgb<u8>>,
    {
        for (x, y, px) in self.img.enumerate_pixels_mut() {
            if let Some(c) = paint(x, y) {
                *px = c;
            }
        }
    }

    /// Inclusive rectangle.
    pub fn fill_rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgb<u8>) {
        for y in y0.min(y1)..=y0.max(y1) {
            for x in x0.min(x1)..=x0.max(x1) {
                self.put(x, y, color);
            }
        }
    }

    pub fn hline(&mut self, y: i64, x0: i64, x1: i64, thickness: i64, color: Rgb<u8>) {
        self.fill_rect(x0, y, x1, y + thickness - 1, color);
    }

    pub fn vline(&mut self, x: i64, y0: i64, y1: i64, thickness: i64, color: Rgb<u8>) {
        self.fill_rect(x, y0, x + thickness - 1, y1, color);
    }

    pub fn dashed_hline(&mut self, y: i64, x0: i64, x1: i64, dash: i64, color: Rgb<u8>) {
        let mut x = x0;
        while x <= x1 {
            self.hline(y, x, (x + dash - 1).min(x1), 1, color);
            x += dash * 2;
        }
    }

    /// Segment of the given stroke width, painted wherever a pixel centre lies
    /// within half the width of the segment.
    pub fn segment(&mut self, from: (f64, f64), to: (f64, f64), width: f64, color: Rgb<u8>) {
        let half = width / 2.0;
        let (x0, x1) = (from.0.min(to.0) - half, from.0.max(to.0) + half);
        let (y0, y1) = (from.1.min(to.1) - half, from.1.max(to.1) + half);
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let len_sq = dx * dx + dy * dy;

        for y in (y0.floor() as i64)..=(y1.ceil() as i64) {
            for x in (x0.floor() as i64)..=(x1.ceil() as i64) {
                let (px, py) = (x as f64 + 0.5, y as f64 + 0.5);
                let t = if len_sq == 0.0 {
                    0.0
                } else {
                    (((px - from.0) * dx + (py - from.1) * dy) / len_sq).clamp(0.0, 1.0)
                };
                let (cx, cy) = (from.0 + t * dx, from.1 + t * dy);
                if (px - cx).powi(2) + (py - cy).powi(2) <= half * half {
                    self.put(x, y, color);
                }
            }
        }
    }

    pub fn fill_circle(&mut self, centre: (f64, f64), radius: f64, color: Rgb<u8>) {
        self.segment(centre, centre, radius * 2.0, color);
    }

    pub fn into_png(self) -> Result<Vec<u8>, image::ImageError> {
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(self.img).write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
        Ok(buf)
    }

    #[cfg(test)]
    pub fn pixel(&self, x: u32, y: u32) -> Rgb<u8> {
        *self.img.get_pixel(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_white() {
        let c = Canvas::new(4, 3);
        assert_eq!(c.pixel(0, 0), WHITE);
        assert_eq!(c.pixel(3, 2), WHITE);
    }

    #[test]
    fn fill_rect_clips_to_bounds() {
        let mut c = Canvas::new(4, 4);
        c.fill_rect(-5, -5, 1, 1, AXIS);
        assert_eq!(c.pixel(0, 0), AXIS);
        assert_eq!(c.pixel(1, 1), AXIS);
        assert_eq!(c.pixel(2, 2), WHITE);
    }

    #[test]
    fn horizontal_segment_covers_its_row() {
        let mut c = Canvas::new(10, 5);
        c.segment((0.0, 2.5), (10.0, 2.5), 1.0, AXIS);
        for x in 0..10 {
            assert_eq!(c.pixel(x, 2), AXIS);
        }
        assert_eq!(c.pixel(5, 0), WHITE);
        assert_eq!(c.pixel(5, 4), WHITE);
    }

    #[test]
    fn circle_is_filled_at_centre_only() {
        let mut c = Canvas::new(11, 11);
        c.fill_circle((5.5, 5.5), 2.0, AXIS);
        assert_eq!(c.pixel(5, 5), AXIS);
        assert_eq!(c.pixel(0, 0), WHITE);
    }

    #[test]
    fn png_has_magic_header() {
        let png = Canvas::new(2, 2).into_png().unwrap();
        assert_eq!(&png[..4], b"\x89PNG");
    }
}

// Persistent ink layer.
// Visual expectation: strokes stay on screen frame after frame until cleared,
// drawn over a half-transparent live camera image.

use image::{Rgb, RgbImage};
use imageproc::drawing::{BresenhamLineIter, draw_filled_circle_mut, draw_line_segment_mut};

use crate::error::Error;
use crate::types::{ColorRgb, Point2D};

pub struct StrokeCanvas {
    raster: RgbImage, // black = no ink
}

impl StrokeCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self { raster: RgbImage::new(width, height) }
    }

    pub fn raster(&self) -> &RgbImage {
        &self.raster
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.raster.dimensions()
    }

    /// Match the frame size. A size change reallocates a blank raster, which
    /// throws away every stroke drawn so far. Returns true when that happened.
    pub fn ensure_size(&mut self, width: u32, height: u32) -> bool {
        if self.raster.dimensions() == (width, height) {
            return false;
        }
        log::debug!(
            "Canvas resized {:?} -> {:?}, strokes cleared",
            self.raster.dimensions(),
            (width, height)
        );
        self.raster = RgbImage::new(width, height);
        true
    }

    /// Wipe all strokes.
    pub fn clear(&mut self) {
        for px in self.raster.pixels_mut() {
            *px = Rgb([0, 0, 0]);
        }
    }

    /// Draw a round-capped line segment `width` pixels thick.
    pub fn append(&mut self, from: Point2D, to: Point2D, color: ColorRgb, width: u32) {
        let px = color.to_pixel();
        let start = (from.x as f32, from.y as f32);
        let end = (to.x as f32, to.y as f32);
        if width <= 1 {
            draw_line_segment_mut(&mut self.raster, start, end, px);
            return;
        }
        // Stamp a disc on every pixel of the thin line for a thick one.
        let radius = (width / 2) as i32;
        for (x, y) in BresenhamLineIter::new(start, end) {
            draw_filled_circle_mut(&mut self.raster, (x, y), radius, px);
        }
    }

    /// Frame and ink mixed 50/50 into a new image; the canvas is untouched.
    pub fn composite(&self, frame: &RgbImage) -> Result<RgbImage, Error> {
        blend_half(frame, &self.raster)
    }
}

/// Per-channel (a + b) / 2, rounded; cannot overflow a byte.
pub fn blend_half(a: &RgbImage, b: &RgbImage) -> Result<RgbImage, Error> {
    if a.dimensions() != b.dimensions() {
        return Err(Error::DimensionMismatch(format!(
            "blend: {:?} vs {:?}",
            a.dimensions(),
            b.dimensions()
        )));
    }
    let mut out = RgbImage::new(a.width(), a.height());
    for ((o, pa), pb) in out.pixels_mut().zip(a.pixels()).zip(b.pixels()) {
        for c in 0..3 {
            let sum = pa[c] as u16 + pb[c] as u16;
            o[c] = ((sum + 1) / 2).min(255) as u8;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ink(c: &StrokeCanvas) -> usize {
        c.raster().pixels().filter(|p| p.0 != [0, 0, 0]).count()
    }

    #[test]
    fn append_draws_between_the_points() {
        let mut c = StrokeCanvas::new(50, 50);
        c.append(Point2D::new(10, 10), Point2D::new(20, 20), ColorRgb::RED, 5);
        assert_eq!(c.raster().get_pixel(10, 10).0, [255, 0, 0]);
        assert_eq!(c.raster().get_pixel(15, 15).0, [255, 0, 0]);
        assert_eq!(c.raster().get_pixel(20, 20).0, [255, 0, 0]);
        assert_eq!(c.raster().get_pixel(40, 10).0, [0, 0, 0]);
        // Thick: neighbours of the centre line are inked too.
        assert_eq!(c.raster().get_pixel(17, 15).0, [255, 0, 0]);
    }

    #[test]
    fn thin_line_and_out_of_bounds_points_are_fine() {
        let mut c = StrokeCanvas::new(20, 20);
        c.append(Point2D::new(-10, 5), Point2D::new(30, 5), ColorRgb::GREEN, 1);
        assert_eq!(c.raster().get_pixel(0, 5).0, [0, 255, 0]);
        assert_eq!(c.raster().get_pixel(19, 5).0, [0, 255, 0]);
        assert_eq!(c.raster().get_pixel(10, 6).0, [0, 0, 0]);
    }

    #[test]
    fn ensure_size_same_dimensions_keeps_strokes() {
        let mut c = StrokeCanvas::new(40, 30);
        c.append(Point2D::new(1, 1), Point2D::new(30, 20), ColorRgb::BLUE, 3);
        let before = ink(&c);
        assert!(!c.ensure_size(40, 30));
        assert_eq!(ink(&c), before);
        assert!(before > 0);
    }

    #[test]
    fn ensure_size_new_dimensions_clears() {
        let mut c = StrokeCanvas::new(40, 30);
        c.append(Point2D::new(1, 1), Point2D::new(30, 20), ColorRgb::BLUE, 3);
        assert!(c.ensure_size(64, 48));
        assert_eq!(c.dimensions(), (64, 48));
        assert_eq!(ink(&c), 0);
    }

    #[test]
    fn clear_wipes_everything() {
        let mut c = StrokeCanvas::new(20, 20);
        c.append(Point2D::new(0, 0), Point2D::new(19, 19), ColorRgb::WHITE, 5);
        c.clear();
        assert_eq!(ink(&c), 0);
    }

    #[test]
    fn composite_is_half_and_half_and_leaves_canvas_alone() {
        let mut c = StrokeCanvas::new(4, 4);
        c.append(Point2D::new(0, 0), Point2D::new(0, 0), ColorRgb::WHITE, 1);
        let snapshot = c.raster().clone();
        let frame = RgbImage::from_pixel(4, 4, Rgb([255, 100, 0]));
        let out = c.composite(&frame).unwrap();
        assert_eq!(out.get_pixel(0, 0).0, [255, 178, 128]);
        assert_eq!(out.get_pixel(3, 3).0, [128, 50, 0]);
        assert_eq!(c.raster(), &snapshot);
    }

    #[test]
    fn composite_rejects_mismatched_frame() {
        let c = StrokeCanvas::new(4, 4);
        assert!(c.composite(&RgbImage::new(5, 4)).is_err());
    }
}

// Core types shared by the whole pipeline.

use image::{GrayImage, Rgb, RgbImage};

/// Binary hand-presence raster; any non-zero pixel counts as "hand".
/// Same dimensions as the frame it was classified from, rebuilt every tick.
pub type HandMask = GrayImage;

/// Closed boundary of a connected mask region, in traversal order.
pub type Contour = Vec<Point2D>;

/// Integer pixel coordinate (x to the right, y downwards).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point2D {
    pub x: i32,
    pub y: i32,
}

impl Point2D {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point2D) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        (dx * dx + dy * dy).sqrt()
    }
}

/// Pen colour in RGB order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorRgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl ColorRgb {
    pub const RED: ColorRgb = ColorRgb::new(255, 0, 0);
    pub const GREEN: ColorRgb = ColorRgb::new(0, 255, 0);
    pub const BLUE: ColorRgb = ColorRgb::new(0, 0, 255);
    pub const LIGHT_GREY: ColorRgb = ColorRgb::new(200, 200, 200);
    pub const WHITE: ColorRgb = ColorRgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_pixel(self) -> Rgb<u8> {
        Rgb([self.r, self.g, self.b])
    }
}

/// Whether finger-tip motion currently leaves ink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureMode {
    #[default]
    Idle,
    Drawing,
}

/// How the canvas layer is presented before compositing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    #[default]
    Flat,
    Perspective,
}

impl RenderMode {
    pub fn toggled(self) -> Self {
        match self {
            RenderMode::Flat => RenderMode::Perspective,
            RenderMode::Perspective => RenderMode::Flat,
        }
    }
}

/// What a hand observer saw on one tick.
#[derive(Debug, Clone, Default)]
pub struct Observation {
    /// 0 when no hand is observed, otherwise 1..=6 for the contour variant
    /// and 0..=5 for the landmark variant.
    pub finger_count: u8,
    /// Only published when `finger_count == 1`.
    pub fingertip: Option<Point2D>,
    /// Selected boundary, for drawing only.
    pub silhouette: Option<Contour>,
    /// Per-pixel classification used by the area-coverage hit test.
    pub mask: Option<HandMask>,
}

impl Observation {
    /// "No hand observed": zero fingers, no fingertip.
    pub fn none() -> Self {
        Self::default()
    }
}

/// Display buffer for the window.
#[derive(Clone)]
pub struct FrameBuffer {
    pub width: usize,      // how wide the frame is on screen (pixels)
    pub height: usize,     // how tall the frame is on screen (pixels)
    pub pixels: Vec<u32>,  // each entry is 0x00RRGGBB for minifb
}

impl FrameBuffer {
    /// Pack an RGB raster into 0x00RRGGBB words.
    pub fn from_rgb(img: &RgbImage) -> Self {
        let (w, h) = img.dimensions();
        let pixels = img
            .pixels()
            .map(|p| ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32)
            .collect();
        Self { width: w as usize, height: h as usize, pixels }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framebuffer_packs_rgb() {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(1, 0, Rgb([0x12, 0x34, 0x56]));
        let fb = FrameBuffer::from_rgb(&img);
        assert_eq!(fb.width, 2);
        assert_eq!(fb.height, 1);
        assert_eq!(fb.pixels, vec![0, 0x0012_3456]);
    }

    #[test]
    fn render_mode_toggles_back_and_forth() {
        let m = RenderMode::default();
        assert_eq!(m.toggled(), RenderMode::Perspective);
        assert_eq!(m.toggled().toggled(), RenderMode::Flat);
    }
}

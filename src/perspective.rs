// Pseudo-3D presentation of the ink layer.
// Visual expectation: dragging with the mouse tilts the drawing like a sheet
// of paper seen at an angle; "relief" adds a stacked, embossed look.
// Both stages are pure: same input image and angles, same output image.

use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp};

use crate::config::{RELIEF_ITERATIONS, RELIEF_WEIGHT, ROTATION_GAIN};

/// Accumulated tilt in degrees. Unbounded: no wraparound, no clamping.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RotationState {
    pub angle_x: f32,
    pub angle_y: f32,
}

impl RotationState {
    /// Vertical drag tilts around X, horizontal drag around Y.
    pub fn apply_drag(&mut self, dx: f32, dy: f32) {
        self.angle_x += dy * ROTATION_GAIN;
        self.angle_y += dx * ROTATION_GAIN;
    }
}

/// Fixed per-corner nudges (TL, TR, BR, BL) that give the resting view its
/// slightly uneven trapezoid.
const CORNER_MARGINS: [(f32, f32); 4] = [(20.0, 20.0), (-20.0, 40.0), (-40.0, -20.0), (40.0, -40.0)];

/// Direction each corner moves for a positive tilt: (x sign, y sign).
const CORNER_TILT: [(f32, f32); 4] = [(1.0, 1.0), (-1.0, -1.0), (1.0, 1.0), (-1.0, -1.0)];

/// Where the canvas corners (TL, TR, BR, BL) land for the given tilt.
pub fn destination_corners(width: u32, height: u32, angle_x: f32, angle_y: f32) -> [(f32, f32); 4] {
    let (w, h) = (width as f32, height as f32);
    let shift_x = angle_y.to_radians().tan() * w / 2.0;
    let shift_y = angle_x.to_radians().tan() * h / 2.0;
    let src = source_corners(width, height);
    let mut dst = [(0.0, 0.0); 4];
    for i in 0..4 {
        dst[i] = (
            src[i].0 + CORNER_MARGINS[i].0 + CORNER_TILT[i].0 * shift_x,
            src[i].1 + CORNER_MARGINS[i].1 + CORNER_TILT[i].1 * shift_y,
        );
    }
    dst
}

fn source_corners(width: u32, height: u32) -> [(f32, f32); 4] {
    let (w, h) = (width as f32, height as f32);
    [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)]
}

/// Resample `canvas` through the 4-corner projection. Output has the canvas's
/// dimensions; uncovered pixels are black. A tilt whose corners are not finite,
/// or whose corner mapping has no projective solution, yields an all-black image.
pub fn warp_canvas(canvas: &RgbImage, angle_x: f32, angle_y: f32) -> RgbImage {
    let (w, h) = canvas.dimensions();
    if w == 0 || h == 0 {
        return canvas.clone();
    }
    warp_onto(canvas, destination_corners(w, h, angle_x, angle_y))
}

/// Map the canvas corners (TL, TR, BR, BL) onto `dst`; black when that is impossible.
fn warp_onto(canvas: &RgbImage, dst: [(f32, f32); 4]) -> RgbImage {
    let (w, h) = canvas.dimensions();
    if dst.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
        return RgbImage::new(w, h);
    }
    match Projection::from_control_points(source_corners(w, h), dst) {
        Some(projection) => warp(canvas, &projection, Interpolation::Bilinear, Rgb([0, 0, 0])),
        None => RgbImage::new(w, h),
    }
}

/// Copy of `img` rolled by (dx, dy) pixels with wraparound.
fn roll(img: &RgbImage, dx: u32, dy: u32) -> RgbImage {
    let (w, h) = img.dimensions();
    RgbImage::from_fn(w, h, |x, y| {
        let sx = (x + w - dx % w) % w;
        let sy = (y + h - dy % h) % h;
        *img.get_pixel(sx, sy)
    })
}

/// Stacked-shadow emboss: ten copies rolled by 1..=10 px diagonally, each
/// added at 0.3 weight into an accumulator (saturating per step), then the
/// accumulator added onto the original.
pub fn relief(img: &RgbImage) -> RgbImage {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return img.clone();
    }
    let mut acc = RgbImage::new(w, h);
    for offset in 1..=RELIEF_ITERATIONS {
        let shifted = roll(img, offset, offset);
        for (a, s) in acc.pixels_mut().zip(shifted.pixels()) {
            for c in 0..3 {
                let v = a[c] as f32 + s[c] as f32 * RELIEF_WEIGHT;
                a[c] = v.round().min(255.0) as u8;
            }
        }
    }
    let mut out = img.clone();
    for (o, a) in out.pixels_mut().zip(acc.pixels()) {
        for c in 0..3 {
            o[c] = o[c].saturating_add(a[c]);
        }
    }
    out
}

// Frame -> binary hand mask.
// Visual expectation: white where the camera sees skin, black everywhere else.
// Two flavours share one trait: a fixed HSV range, and a range measured from
// the user's own hand during the first seconds of the run.

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::contrast::{ThresholdType, threshold};
use imageproc::filter::gaussian_blur_f32;
use imageproc::rect::Rect;

use crate::config::{
    CALIBRATION_LOWER_PERCENTILE, CALIBRATION_REGION_SIZE, CALIBRATION_SAMPLE_FRAMES,
    CALIBRATION_UPPER_PERCENTILE, CALIBRATION_WARMUP_FRAMES, MASK_BINARY_CUTOFF, MASK_BLUR_SIGMA,
};
use crate::error::Error;
use crate::types::HandMask;

/// HSV in the 8-bit convention: H in 0..180 (degrees / 2), S and V in 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Hsv8 {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

/// Convert one RGB pixel to 8-bit HSV.
pub fn rgb_to_hsv8(px: &Rgb<u8>) -> Hsv8 {
    let r = px[0] as f32;
    let g = px[1] as f32;
    let b = px[2] as f32;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let s = if max == 0.0 { 0.0 } else { 255.0 * delta / max };

    let mut h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    if h < 0.0 {
        h += 360.0;
    }

    // Halve hue so it fits a byte; 360 wraps back to 0.
    let h8 = ((h / 2.0).round() as u32 % 180) as u8;
    Hsv8 { h: h8, s: s.round() as u8, v: max as u8 }
}

/// Inclusive per-channel HSV range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HsvBounds {
    pub lower: Hsv8,
    pub upper: Hsv8,
}

impl HsvBounds {
    pub fn new(lower: Hsv8, upper: Hsv8) -> Result<Self, Error> {
        if lower.h > upper.h || lower.s > upper.s || lower.v > upper.v {
            return Err(Error::Config(format!(
                "HSV lower bound {lower:?} exceeds upper bound {upper:?}"
            )));
        }
        Ok(Self { lower, upper })
    }

    #[inline]
    pub fn contains(&self, hsv: Hsv8) -> bool {
        (self.lower.h..=self.upper.h).contains(&hsv.h)
            && (self.lower.s..=self.upper.s).contains(&hsv.s)
            && (self.lower.v..=self.upper.v).contains(&hsv.v)
    }
}

/// Anything that turns a frame into a hand mask of the same size.
pub trait FrameClassifier {
    fn classify(&mut self, frame: &RgbImage) -> HandMask;

    /// Region the user should hold their hand in while the classifier is
    /// still learning; `None` once it is ready (or if it never needs to learn).
    fn pending_region(&self) -> Option<Rect> {
        None
    }
}

/// Raw in-range test: 255 inside the bounds, 0 outside.
pub fn threshold_hsv(frame: &RgbImage, bounds: &HsvBounds) -> GrayImage {
    let (w, h) = frame.dimensions();
    let mut mask = GrayImage::new(w, h);
    for (x, y, px) in frame.enumerate_pixels() {
        if bounds.contains(rgb_to_hsv8(px)) {
            mask.put_pixel(x, y, Luma([255]));
        }
    }
    mask
}

/// Threshold, smooth the edges, then cut back to 0/255 at mid-grey so that
/// ragged single-pixel gaps close up without the blur halo counting as hand.
pub fn classify_with(frame: &RgbImage, bounds: &HsvBounds) -> HandMask {
    let raw = threshold_hsv(frame, bounds);
    if raw.width() == 0 || raw.height() == 0 {
        return raw;
    }
    let smooth = gaussian_blur_f32(&raw, MASK_BLUR_SIGMA);
    threshold(&smooth, MASK_BINARY_CUTOFF, ThresholdType::Binary)
}

/// Classifier with a range fixed for the whole run.
pub struct ThresholdClassifier {
    bounds: HsvBounds,
}

impl ThresholdClassifier {
    pub fn new(bounds: HsvBounds) -> Self {
        Self { bounds }
    }
}

impl FrameClassifier for ThresholdClassifier {
    fn classify(&mut self, frame: &RgbImage) -> HandMask {
        classify_with(frame, &self.bounds)
    }
}

/* ------------------------------- Calibration ------------------------------- */

/// Square of `size` pixels centred in a `width` x `height` frame, clipped to it.
pub fn sampling_region(width: u32, height: u32, size: u32) -> Option<Rect> {
    let side_w = size.min(width);
    let side_h = size.min(height);
    if side_w == 0 || side_h == 0 {
        return None;
    }
    let left = ((width - side_w) / 2) as i32;
    let top = ((height - side_h) / 2) as i32;
    Some(Rect::at(left, top).of_size(side_w, side_h))
}

/// Value at percentile `p` (0..=100) of an ascending slice, linearly
/// interpolated between neighbours and rounded to the nearest byte.
pub fn percentile(sorted: &[u8], p: f64) -> Option<u8> {
    if sorted.is_empty() {
        return None;
    }
    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    let v = sorted[lo] as f64 + (sorted[hi] as f64 - sorted[lo] as f64) * frac;
    Some(v.round().clamp(0.0, 255.0) as u8)
}

/// Collects HSV samples from a fixed region and reduces them to a range.
#[derive(Default)]
pub struct Calibrator {
    hues: Vec<u8>,
    sats: Vec<u8>,
    vals: Vec<u8>,
}

impl Calibrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every pixel of `region` in `frame` to the sample set.
    pub fn sample(&mut self, frame: &RgbImage, region: Rect) {
        let x0 = region.left().max(0) as u32;
        let y0 = region.top().max(0) as u32;
        let x1 = (region.right() + 1).max(0) as u32;
        let y1 = (region.bottom() + 1).max(0) as u32;
        for y in y0..y1.min(frame.height()) {
            for x in x0..x1.min(frame.width()) {
                let hsv = rgb_to_hsv8(frame.get_pixel(x, y));
                self.hues.push(hsv.h);
                self.sats.push(hsv.s);
                self.vals.push(hsv.v);
            }
        }
    }

    pub fn sample_count(&self) -> usize {
        self.hues.len()
    }

    /// 5th..95th percentile range per channel; `None` without samples.
    pub fn bounds(&self) -> Option<HsvBounds> {
        let channel = |values: &[u8]| {
            let mut sorted = values.to_vec();
            sorted.sort_unstable();
            Some((
                percentile(&sorted, CALIBRATION_LOWER_PERCENTILE)?,
                percentile(&sorted, CALIBRATION_UPPER_PERCENTILE)?,
            ))
        };
        let (h_lo, h_hi) = channel(&self.hues)?;
        let (s_lo, s_hi) = channel(&self.sats)?;
        let (v_lo, v_hi) = channel(&self.vals)?;
        HsvBounds::new(Hsv8 { h: h_lo, s: s_lo, v: v_lo }, Hsv8 { h: h_hi, s: s_hi, v: v_hi }).ok()
    }
}

/// Classifier whose range is learnt from the central box of the first frames.
/// Until the range exists every mask is empty ("no hand observed"); once it
/// exists it never changes again.
pub struct CalibratedClassifier {
    warmup_left: u32,
    samples_left: u32,
    calibrator: Calibrator,
    region: Option<Rect>,
    bounds: Option<HsvBounds>,
}

impl CalibratedClassifier {
    pub fn new() -> Self {
        Self::with_schedule(CALIBRATION_WARMUP_FRAMES, CALIBRATION_SAMPLE_FRAMES)
    }

    /// Custom warm-up and sampling lengths, in frames.
    pub fn with_schedule(warmup_frames: u32, sample_frames: u32) -> Self {
        Self {
            warmup_left: warmup_frames,
            samples_left: sample_frames.max(1),
            calibrator: Calibrator::new(),
            region: None,
            bounds: None,
        }
    }

    pub fn bounds(&self) -> Option<HsvBounds> {
        self.bounds
    }

    fn learn(&mut self, frame: &RgbImage) {
        let region = sampling_region(frame.width(), frame.height(), CALIBRATION_REGION_SIZE);
        self.region = region;
        if self.warmup_left > 0 {
            self.warmup_left -= 1;
            return;
        }
        let Some(region) = region else { return };

        self.calibrator.sample(frame, region);
        self.samples_left -= 1;
        if self.samples_left == 0 {
            self.bounds = self.calibrator.bounds();
            match self.bounds {
                Some(b) => log::info!(
                    "Calibration done from {} samples: lower {:?}, upper {:?}",
                    self.calibrator.sample_count(),
                    b.lower,
                    b.upper
                ),
                None => {
                    // Nothing usable was sampled; try again with fresh frames.
                    log::warn!("Calibration produced no range, sampling again");
                    self.calibrator = Calibrator::new();
                    self.samples_left = CALIBRATION_SAMPLE_FRAMES.max(1);
                }
            }
        }
    }
}

impl Default for CalibratedClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClassifier for CalibratedClassifier {
    fn classify(&mut self, frame: &RgbImage) -> HandMask {
        match self.bounds {
            Some(bounds) => classify_with(frame, &bounds),
            None => {
                self.learn(frame);
                GrayImage::new(frame.width(), frame.height())
            }
        }
    }

    fn pending_region(&self) -> Option<Rect> {
        if self.bounds.is_some() { None } else { self.region }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SKIN: Rgb<u8> = Rgb([220, 160, 130]);

    fn skin_range() -> HsvBounds {
        HsvBounds::new(Hsv8 { h: 0, s: 20, v: 70 }, Hsv8 { h: 20, s: 255, v: 255 }).unwrap()
    }

    #[test]
    fn hsv_of_primaries() {
        assert_eq!(rgb_to_hsv8(&Rgb([255, 0, 0])), Hsv8 { h: 0, s: 255, v: 255 });
        assert_eq!(rgb_to_hsv8(&Rgb([0, 255, 0])), Hsv8 { h: 60, s: 255, v: 255 });
        assert_eq!(rgb_to_hsv8(&Rgb([0, 0, 255])), Hsv8 { h: 120, s: 255, v: 255 });
        assert_eq!(rgb_to_hsv8(&Rgb([0, 0, 0])), Hsv8 { h: 0, s: 0, v: 0 });
        assert_eq!(rgb_to_hsv8(&Rgb([128, 128, 128])), Hsv8 { h: 0, s: 0, v: 128 });
    }

    #[test]
    fn skin_tone_is_in_the_default_range() {
        assert!(skin_range().contains(rgb_to_hsv8(&SKIN)));
        assert!(!skin_range().contains(rgb_to_hsv8(&Rgb([30, 60, 200]))));
    }

    #[test]
    fn mask_has_frame_dimensions_and_marks_skin() {
        let mut frame = RgbImage::from_pixel(40, 30, Rgb([10, 10, 200]));
        for y in 10..20 {
            for x in 10..30 {
                frame.put_pixel(x, y, SKIN);
            }
        }
        let mask = ThresholdClassifier::new(skin_range()).classify(&frame);
        assert_eq!(mask.dimensions(), (40, 30));
        assert!(mask.get_pixel(20, 15)[0] > 0);
        assert_eq!(mask.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn mask_is_strictly_binary() {
        let mut frame = RgbImage::from_pixel(60, 60, Rgb([10, 10, 200]));
        for y in 20..40 {
            for x in 15..45 {
                frame.put_pixel(x, y, SKIN);
            }
        }
        let mask = ThresholdClassifier::new(skin_range()).classify(&frame);
        assert!(mask.pixels().all(|p| p[0] == 0 || p[0] == 255));
        // No halo: every hand pixel lies inside the skin block.
        for (x, y, p) in mask.enumerate_pixels() {
            if p[0] == 255 {
                assert!((15..45).contains(&x) && (20..40).contains(&y), "halo at ({x}, {y})");
            }
        }
        assert_eq!(mask.get_pixel(30, 30)[0], 255);
        assert_eq!(mask.get_pixel(15, 30)[0], 255);
    }

    #[test]
    fn under_a_fifth_of_skin_on_a_button_does_not_press_it() {
        use crate::hotzone::{Command, HotZone, ZoneRect, hit_coverage};
        use crate::types::ColorRgb;

        let zones = [HotZone {
            rect: ZoneRect::new(10, 10, 150, 150),
            command: Command::Clear,
            fill: ColorRgb::LIGHT_GREY,
            label: "CLEAR",
        }];
        // 100 x 38 = 3800 skin pixels, 19.4% of the 19600 px zone.
        let mut frame = RgbImage::from_pixel(300, 300, Rgb([10, 10, 200]));
        for y in 40..78 {
            for x in 30..130 {
                frame.put_pixel(x, y, SKIN);
            }
        }
        let mut classifier = ThresholdClassifier::new(skin_range());
        assert_eq!(hit_coverage(&zones, &classifier.classify(&frame)), Command::None);

        // Two more rows: 4000 pixels, 20.4%.
        for y in 78..80 {
            for x in 30..130 {
                frame.put_pixel(x, y, SKIN);
            }
        }
        assert_eq!(hit_coverage(&zones, &classifier.classify(&frame)), Command::Clear);
    }

    #[test]
    fn percentile_interpolates() {
        let v: Vec<u8> = (0..=100).collect();
        assert_eq!(percentile(&v, 5.0), Some(5));
        assert_eq!(percentile(&v, 95.0), Some(95));
        assert_eq!(percentile(&[7], 50.0), Some(7));
        assert_eq!(percentile(&[], 50.0), None);
    }

    #[test]
    fn calibrator_without_samples_has_no_bounds() {
        assert!(Calibrator::new().bounds().is_none());
    }

    #[test]
    fn calibrated_classifier_is_blind_until_bounds_exist() {
        let frame = RgbImage::from_pixel(200, 200, SKIN);
        let mut c = CalibratedClassifier::with_schedule(2, 1);

        // Warm-up: empty masks, prompt region visible.
        for _ in 0..2 {
            let mask = c.classify(&frame);
            assert!(mask.pixels().all(|p| p[0] == 0));
            assert!(c.pending_region().is_some());
        }
        // Sampling tick: still empty, but bounds get frozen.
        let mask = c.classify(&frame);
        assert!(mask.pixels().all(|p| p[0] == 0));
        let learnt = c.bounds().expect("bounds after sampling");
        assert!(learnt.contains(rgb_to_hsv8(&SKIN)));
        assert!(c.pending_region().is_none());

        // From now on skin is classified, and the range stays put.
        let other = RgbImage::from_pixel(200, 200, Rgb([0, 0, 255]));
        let _ = c.classify(&other);
        assert_eq!(c.bounds(), Some(learnt));
        assert!(c.classify(&frame).get_pixel(100, 100)[0] > 0);
    }

    #[test]
    fn sampling_region_is_centred_and_clipped() {
        let r = sampling_region(640, 480, 100).unwrap();
        assert_eq!((r.left(), r.top(), r.width(), r.height()), (270, 190, 100, 100));
        let small = sampling_region(50, 40, 100).unwrap();
        assert_eq!((small.width(), small.height()), (50, 40));
        assert!(sampling_region(0, 10, 100).is_none());
    }
}

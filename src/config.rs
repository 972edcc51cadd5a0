// Command line flags plus the tuning constants the detector and presenter run on.
// Every magic number lives here so it can be read, tuned and tested in one place.

use clap::{Parser, ValueEnum};

use crate::classify::{Hsv8, HsvBounds};
use crate::error::Error;

/* ---------------------------- Finger detection ---------------------------- */

/// A convexity defect only counts as a finger gap when the angle at its
/// deepest point is at most this wide (degrees).
pub const MAX_GAP_ANGLE_DEG: f64 = 90.0;

/// Minimum defect depth in pixels. The classic detector compares against
/// 10000 in 1/256-pixel fixed point, i.e. ~39 px. It is absolute, so finger
/// detection depends on camera resolution and hand distance.
pub const DEFAULT_MIN_DEFECT_DEPTH: f64 = 10_000.0 / 256.0;

/// Added to the qualifying-gap count unconditionally, standing in for a thumb
/// that is assumed visible. Overcounts by one when the thumb is tucked away.
pub const ASSUMED_THUMB: u8 = 1;

/// Upper bound for a reported finger count (five gaps + thumb).
pub const MAX_FINGER_COUNT: u8 = 6;

/// Default skin range (H 0..180, S/V 0..255).
pub const DEFAULT_HSV_LOWER: Hsv8 = Hsv8 { h: 0, s: 20, v: 70 };
pub const DEFAULT_HSV_UPPER: Hsv8 = Hsv8 { h: 20, s: 255, v: 255 };

/// Gaussian smoothing applied to the raw mask (matches a 5x5 kernel).
pub const MASK_BLUR_SIGMA: f32 = 1.1;
/// Smoothed mask values above this are hand (255), the rest background (0).
pub const MASK_BINARY_CUTOFF: u8 = 127;

/* ------------------------------- Calibration ------------------------------ */

/// Percentiles taken over the sampled pixels for the lower/upper bound.
pub const CALIBRATION_LOWER_PERCENTILE: f64 = 5.0;
pub const CALIBRATION_UPPER_PERCENTILE: f64 = 95.0;
/// Side of the square sampled at the frame centre.
pub const CALIBRATION_REGION_SIZE: u32 = 100;
/// Frames ignored before sampling starts (time to put the hand in the box).
pub const CALIBRATION_WARMUP_FRAMES: u32 = 90;
/// Frames sampled once warm-up is over.
pub const CALIBRATION_SAMPLE_FRAMES: u32 = 30;

/* --------------------------------- Drawing -------------------------------- */

pub const DEFAULT_STROKE_WIDTH: u32 = 5;

/// Area-coverage hit test fires above this share of the zone area (strict).
/// Kept as a ratio of integers so the comparison stays exact.
pub const COVERAGE_NUMERATOR: u64 = 1;
pub const COVERAGE_DENOMINATOR: u64 = 5;

/* ------------------------------ Presentation ------------------------------ */

/// Degrees of rotation per pixel of pointer drag.
pub const ROTATION_GAIN: f32 = 0.5;
pub const RELIEF_ITERATIONS: u32 = 10;
pub const RELIEF_WEIGHT: f32 = 0.3;

/* ---------------------------------- Input --------------------------------- */

/// Pointer events buffered between two ticks before new ones are dropped.
pub const EVENT_QUEUE_CAPACITY: usize = 256;

pub const QUIT_KEY: char = 'q';

/// Which hand-observation strategy runs this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ObserverKind {
    /// Fixed HSV skin range from the command line.
    Fixed,
    /// HSV range measured from the user's hand at startup.
    Calibrated,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Draw in the air with one finger", long_about = None)]
pub struct Args {
    /// Camera device index
    #[arg(short, long, default_value_t = 0)]
    pub camera: u32,

    /// Requested capture width (the camera may pick a close match)
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Requested capture height
    #[arg(long, default_value_t = 720)]
    pub height: u32,

    /// Hand observation strategy
    #[arg(short, long, value_enum, default_value_t = ObserverKind::Fixed)]
    pub observer: ObserverKind,

    /// Lower HSV skin bound as h,s,v (H 0-179, S/V 0-255)
    #[arg(long, default_value = "0,20,70")]
    pub hsv_lower: String,

    /// Upper HSV skin bound as h,s,v
    #[arg(long, default_value = "20,255,255")]
    pub hsv_upper: String,

    /// Stroke width in pixels
    #[arg(long, default_value_t = DEFAULT_STROKE_WIDTH)]
    pub stroke_width: u32,

    /// Minimum convexity-defect depth (pixels) for a finger gap
    #[arg(long, default_value_t = DEFAULT_MIN_DEFECT_DEPTH)]
    pub min_defect_depth: f64,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,
}

impl Args {
    /// Validated skin range from `--hsv-lower` / `--hsv-upper`.
    pub fn hsv_bounds(&self) -> Result<HsvBounds, Error> {
        let lower = parse_hsv(&self.hsv_lower)?;
        let upper = parse_hsv(&self.hsv_upper)?;
        HsvBounds::new(lower, upper)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.stroke_width == 0 {
            return Err(Error::Config("stroke width must be at least 1".into()));
        }
        if !(self.min_defect_depth.is_finite() && self.min_defect_depth >= 0.0) {
            return Err(Error::Config(format!(
                "min defect depth must be a non-negative number, got {}",
                self.min_defect_depth
            )));
        }
        self.hsv_bounds().map(|_| ())
    }
}

/// Parse "h,s,v" with H in 0..180 and S, V in 0..=255.
pub fn parse_hsv(text: &str) -> Result<Hsv8, Error> {
    let parts: Vec<&str> = text.split(',').map(str::trim).collect();
    let [h, s, v] = parts.as_slice() else {
        return Err(Error::Config(format!("expected h,s,v but got '{text}'")));
    };
    let channel = |name: &str, raw: &str| {
        raw.parse::<u8>()
            .map_err(|e| Error::Config(format!("bad {name} value '{raw}' in '{text}': {e}")))
    };
    let hsv = Hsv8 { h: channel("hue", *h)?, s: channel("saturation", *s)?, v: channel("value", *v)? };
    if hsv.h >= 180 {
        return Err(Error::Config(format!("hue must be below 180, got {}", hsv.h)));
    }
    Ok(hsv)
}

// One capability, several hand-observation strategies.
// The tick loop only ever sees `HandObserver::observe`; which strategy runs
// (fixed skin range, calibrated skin range, landmark model) is picked once at
// startup.

use image::RgbImage;
use imageproc::rect::Rect;

use crate::classify::FrameClassifier;
use crate::contour::ContourAnalyzer;
use crate::types::{Observation, Point2D};

/// Frame in, finger count + fingertip out.
pub trait HandObserver {
    fn observe(&mut self, frame: &RgbImage) -> Observation;

    /// Screen region to prompt the user with while the observer is not ready.
    fn pending_region(&self) -> Option<Rect> {
        None
    }
}

/// Contour variant: classify skin, then read fingers off the silhouette.
pub struct MaskObserver<C> {
    classifier: C,
    analyzer: ContourAnalyzer,
}

impl<C: FrameClassifier> MaskObserver<C> {
    pub fn new(classifier: C, analyzer: ContourAnalyzer) -> Self {
        Self { classifier, analyzer }
    }
}

impl<C: FrameClassifier> HandObserver for MaskObserver<C> {
    fn observe(&mut self, frame: &RgbImage) -> Observation {
        let mask = self.classifier.classify(frame);
        match self.analyzer.analyze(&mask) {
            Some(shape) => Observation {
                finger_count: shape.finger_count,
                fingertip: shape.fingertip,
                silhouette: Some(shape.contour),
                mask: Some(mask),
            },
            None => Observation { mask: Some(mask), ..Observation::none() },
        }
    }

    fn pending_region(&self) -> Option<Rect> {
        self.classifier.pending_region()
    }
}

/* ------------------------------ Landmark variant ------------------------------ */

/// Hand landmark indices (21-point hand skeleton convention).
pub mod landmarks {
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_FINGER_PIP: usize = 6;
    pub const INDEX_FINGER_TIP: usize = 8;
    pub const MIDDLE_FINGER_PIP: usize = 10;
    pub const MIDDLE_FINGER_TIP: usize = 12;
    pub const RING_FINGER_PIP: usize = 14;
    pub const RING_FINGER_TIP: usize = 16;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_TIP: usize = 20;
    pub const COUNT: usize = 21;
}

/// A single landmark, normalised to the image: (0,0) top-left, (1,1) bottom-right.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

/// All 21 landmarks of one hand.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HandLandmarks {
    pub points: [Landmark; landmarks::COUNT],
}

impl HandLandmarks {
    /// Thumb counts when its tip is right of its IP joint; the other four
    /// fingers count when the tip sits above (smaller y than) the PIP joint.
    pub fn extended_fingers(&self) -> u8 {
        use landmarks::*;
        let p = &self.points;
        let thumb = p[THUMB_TIP].x > p[THUMB_IP].x;
        let others = [
            (INDEX_FINGER_TIP, INDEX_FINGER_PIP),
            (MIDDLE_FINGER_TIP, MIDDLE_FINGER_PIP),
            (RING_FINGER_TIP, RING_FINGER_PIP),
            (PINKY_TIP, PINKY_PIP),
        ];
        let raised = others.iter().filter(|&&(tip, pip)| p[tip].y < p[pip].y).count();
        raised as u8 + u8::from(thumb)
    }

    /// Index fingertip in pixel coordinates of a `width` x `height` frame.
    pub fn index_tip_px(&self, width: u32, height: u32) -> Point2D {
        let tip = self.points[landmarks::INDEX_FINGER_TIP];
        Point2D::new((tip.x * width as f32) as i32, (tip.y * height as f32) as i32)
    }
}

/// Whatever produces hand landmarks from a frame (a pose model, a replay file...).
pub trait LandmarkSource {
    fn detect(&mut self, frame: &RgbImage) -> Option<HandLandmarks>;
}

/// Landmark variant: finger count from joint ordering, pen at the index tip.
pub struct LandmarkObserver<S> {
    source: S,
}

impl<S: LandmarkSource> LandmarkObserver<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }
}

impl<S: LandmarkSource> HandObserver for LandmarkObserver<S> {
    fn observe(&mut self, frame: &RgbImage) -> Observation {
        let Some(hand) = self.source.detect(frame) else {
            return Observation::none();
        };
        let finger_count = hand.extended_fingers();
        let fingertip = (finger_count == 1).then(|| hand.index_tip_px(frame.width(), frame.height()));
        Observation { finger_count, fingertip, silhouette: None, mask: None }
    }
}

// Finger count sequence -> drawing mode + stroke segments.
// Visual expectation: open hand (5) turns the pen on, closed fist (0) turns it
// off, one finger moves the pen. Any other count lifts the pen so a stroke
// never jumps across a frame where the hand looked different.

use crate::types::{GestureMode, Point2D};

/// Result of feeding one tick into the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GestureStep {
    /// Line segment to append to the canvas this tick.
    pub segment: Option<(Point2D, Point2D)>,
    /// Fingertip for the UI hit test (published whenever one finger is up).
    pub pointer: Option<Point2D>,
    /// Set when this tick changed the mode.
    pub transition: Option<GestureMode>,
}

/// Owns the mode and the pen-up memory; nothing else writes them.
#[derive(Debug, Default)]
pub struct GestureStateMachine {
    mode: GestureMode,
    last_point: Option<Point2D>,
}

impl GestureStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> GestureMode {
        self.mode
    }

    pub fn last_point(&self) -> Option<Point2D> {
        self.last_point
    }

    /// Advance by one tick.
    pub fn step(&mut self, finger_count: u8, fingertip: Option<Point2D>) -> GestureStep {
        let mut out = GestureStep::default();

        // Mode changes re-fire on every qualifying tick; they are idempotent.
        let target = match finger_count {
            5 => Some(GestureMode::Drawing),
            0 => Some(GestureMode::Idle),
            _ => None,
        };
        if let Some(mode) = target {
            if self.mode != mode {
                log::debug!("Gesture mode {:?} -> {:?}", self.mode, mode);
                out.transition = Some(mode);
            }
            self.mode = mode;
            self.last_point = None;
        }

        if finger_count != 1 {
            self.last_point = None;
            return out;
        }

        out.pointer = fingertip;
        if self.mode == GestureMode::Drawing {
            // No fingertip (zero-area hull): keep the previous pen position.
            if let Some(tip) = fingertip {
                out.segment = self.last_point.map(|prev| (prev, tip));
                self.last_point = Some(tip);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: Point2D = Point2D::new(10, 10);
    const B: Point2D = Point2D::new(20, 20);

    #[test]
    fn starts_idle() {
        let g = GestureStateMachine::new();
        assert_eq!(g.mode(), GestureMode::Idle);
        assert!(g.last_point().is_none());
    }

    #[test]
    fn five_three_zero_runs_idle_drawing_drawing_idle() {
        let mut g = GestureStateMachine::new();
        let s = g.step(5, None);
        assert_eq!(g.mode(), GestureMode::Drawing);
        assert_eq!(s.transition, Some(GestureMode::Drawing));
        assert!(g.last_point().is_none());

        let s = g.step(3, None);
        assert_eq!(g.mode(), GestureMode::Drawing);
        assert_eq!(s.transition, None);

        let s = g.step(0, None);
        assert_eq!(g.mode(), GestureMode::Idle);
        assert_eq!(s.transition, Some(GestureMode::Idle));
        assert!(g.last_point().is_none());
    }

    #[test]
    fn repeated_five_is_harmless_and_clears_pen() {
        let mut g = GestureStateMachine::new();
        g.step(5, None);
        g.step(1, Some(A));
        assert_eq!(g.last_point(), Some(A));
        let s = g.step(5, None);
        assert_eq!(s.transition, None);
        assert_eq!(g.mode(), GestureMode::Drawing);
        assert!(g.last_point().is_none());
    }

    #[test]
    fn two_consecutive_fingertips_make_one_segment() {
        let mut g = GestureStateMachine::new();
        g.step(5, None);
        let first = g.step(1, Some(A));
        assert_eq!(first.segment, None);
        let second = g.step(1, Some(B));
        assert_eq!(second.segment, Some((A, B)));
        assert_eq!(g.last_point(), Some(B));
    }

    #[test]
    fn other_count_between_fingertips_prevents_bridging() {
        let mut g = GestureStateMachine::new();
        g.step(5, None);
        g.step(1, Some(A));
        let gap = g.step(2, None);
        assert_eq!(gap.segment, None);
        assert!(g.last_point().is_none());
        let after = g.step(1, Some(B));
        assert_eq!(after.segment, None);
    }

    #[test]
    fn pointer_is_published_even_when_idle() {
        let mut g = GestureStateMachine::new();
        let s = g.step(1, Some(A));
        assert_eq!(s.pointer, Some(A));
        assert_eq!(s.segment, None);
        assert!(g.last_point().is_none());
        assert_eq!(g.step(2, Some(A)).pointer, None);
    }

    #[test]
    fn missing_fingertip_keeps_pen_position() {
        let mut g = GestureStateMachine::new();
        g.step(5, None);
        g.step(1, Some(A));
        let s = g.step(1, None);
        assert_eq!(s.segment, None);
        assert_eq!(g.last_point(), Some(A));
        assert_eq!(g.step(1, Some(B)).segment, Some((A, B)));
    }
}

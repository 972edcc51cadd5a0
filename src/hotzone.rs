// Toolbar hit testing.
// A `HotZone` is a fixed rectangle bound to a `Command`. The tester is a
// pair of pure functions over an ordered zone list; the first zone that
// matches wins. Applying the command is the session's job.

use crate::config::{COVERAGE_DENOMINATOR, COVERAGE_NUMERATOR};
use crate::types::{ColorRgb, HandMask, Point2D};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SetColor(ColorRgb),
    Clear,
    ToggleRenderMode,
    ToggleRelief,
    None,
}

/// Axis-aligned rectangle; both corners are part of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneRect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl ZoneRect {
    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn contains(&self, p: Point2D) -> bool {
        (self.x0..=self.x1).contains(&p.x) && (self.y0..=self.y1).contains(&p.y)
    }

    /// Corner-to-corner area, (x1 - x0) * (y1 - y0).
    pub fn area(&self) -> u64 {
        let w = (self.x1 - self.x0).max(0) as u64;
        let h = (self.y1 - self.y0).max(0) as u64;
        w * h
    }

    pub fn width(&self) -> u32 {
        (self.x1 - self.x0).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        (self.y1 - self.y0).max(0) as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotZone {
    pub rect: ZoneRect,
    pub command: Command,
    /// Button face colour.
    pub fill: ColorRgb,
    pub label: &'static str,
}

/// The toolbar along the top edge: three pens, clear, 3D view, relief.
pub fn default_layout() -> Vec<HotZone> {
    let zone = |i: i32, command, fill, label| HotZone {
        rect: ZoneRect::new(10 + 150 * i, 10, 150 + 150 * i, 150),
        command,
        fill,
        label,
    };
    vec![
        zone(0, Command::SetColor(ColorRgb::RED), ColorRgb::RED, ""),
        zone(1, Command::SetColor(ColorRgb::GREEN), ColorRgb::GREEN, ""),
        zone(2, Command::SetColor(ColorRgb::BLUE), ColorRgb::BLUE, ""),
        zone(3, Command::Clear, ColorRgb::LIGHT_GREY, "CLEAR"),
        zone(4, Command::ToggleRenderMode, ColorRgb::new(90, 90, 90), "3D"),
        zone(5, Command::ToggleRelief, ColorRgb::new(150, 110, 60), "RELIEF"),
    ]
}

/// Command of the first zone containing `p`.
pub fn hit_point(zones: &[HotZone], p: Point2D) -> Command {
    zones
        .iter()
        .find(|z| z.rect.contains(p))
        .map_or(Command::None, |z| z.command)
}

/// True when `covered` pixels are strictly more than 20% of `area`.
pub fn coverage_exceeds(covered: u64, area: u64) -> bool {
    area > 0 && covered * COVERAGE_DENOMINATOR > area * COVERAGE_NUMERATOR
}

/// Non-zero mask pixels inside `rect` (x0..x1, y0..y1, far edges excluded so
/// the count is bounded by `rect.area()`).
pub fn covered_pixels(mask: &HandMask, rect: &ZoneRect) -> u64 {
    let x0 = rect.x0.max(0) as u32;
    let y0 = rect.y0.max(0) as u32;
    let x1 = (rect.x1.max(0) as u32).min(mask.width());
    let y1 = (rect.y1.max(0) as u32).min(mask.height());
    let mut n = 0;
    for y in y0..y1 {
        for x in x0..x1 {
            if mask.get_pixel(x, y)[0] > 0 {
                n += 1;
            }
        }
    }
    n
}

/// Command of the first zone whose area the mask covers by more than 20%.
pub fn hit_coverage(zones: &[HotZone], mask: &HandMask) -> Command {
    zones
        .iter()
        .find(|z| coverage_exceeds(covered_pixels(mask, &z.rect), z.rect.area()))
        .map_or(Command::None, |z| z.command)
}

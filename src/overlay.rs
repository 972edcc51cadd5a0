// Everything drawn on top of the blended frame.
// Visual effects provided here:
// 1) The toolbar: filled buttons along the top, the active pen outlined white.
// 2) The hand silhouette in green and a yellow ring on the fingertip.
// 3) "DRAW MODE ON/OFF" banners and a one-line HUD, in a tiny 5x7 bitmap font.
// 4) The calibration prompt box while skin colour is being sampled.
// Nothing here feeds back into the pipeline.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use crate::hotzone::{Command, HotZone};
use crate::session::SessionState;
use crate::types::{ColorRgb, GestureMode, Observation, Point2D, RenderMode};

const SILHOUETTE: Rgb<u8> = Rgb([0, 255, 0]);
const MARKER: Rgb<u8> = Rgb([255, 204, 51]);
const CALIBRATION_BOX: Rgb<u8> = Rgb([0, 255, 255]);
const TEXT: Rgb<u8> = Rgb([255, 255, 255]);

/// Per-tick inputs to [`decorate`].
pub struct Scene<'a> {
    pub session: &'a SessionState,
    pub observation: &'a Observation,
    /// Fingertip the hit tester saw (one finger up).
    pub pointer: Option<Point2D>,
    /// Region the calibrating classifier is sampling, if it still is.
    pub pending_region: Option<Rect>,
    pub fps: f32,
}

/// Draw every overlay, back to front.
pub fn decorate(img: &mut RgbImage, scene: &Scene<'_>) {
    draw_toolbar(img, scene.session.zones(), scene.session.color());

    if let Some(contour) = &scene.observation.silhouette {
        draw_silhouette(img, contour, SILHOUETTE);
    }
    if let Some(tip) = scene.pointer {
        draw_hollow_circle_mut(img, (tip.x, tip.y), 8, MARKER);
        draw_hollow_circle_mut(img, (tip.x, tip.y), 9, MARKER);
    }

    match scene.observation.finger_count {
        5 => draw_banner(img, "DRAW MODE ON", ColorRgb::GREEN),
        0 => draw_banner(img, "DRAW MODE OFF", ColorRgb::RED),
        _ => {}
    }

    if let Some(region) = scene.pending_region {
        draw_hollow_rect_mut(img, region, CALIBRATION_BOX);
        let outer = Rect::at(region.left() - 1, region.top() - 1).of_size(region.width() + 2, region.height() + 2);
        draw_hollow_rect_mut(img, outer, CALIBRATION_BOX);
        draw_text_5x7(img, region.left(), region.bottom() + 8, "CALIBRATING: HOLD HAND IN BOX", TEXT, 2);
    }

    let hud = hud_line(scene.session, scene.observation.finger_count, scene.fps);
    let y = img.height() as i32 - 7 * 2 - 10;
    draw_text_5x7(img, 10, y, &hud, TEXT, 2);
}

/// e.g. "DRAWING | 3D | RELIEF | FINGERS: 1 | FPS: 29.7"
pub fn hud_line(session: &SessionState, finger_count: u8, fps: f32) -> String {
    let mode = match session.mode() {
        GestureMode::Idle => "IDLE",
        GestureMode::Drawing => "DRAWING",
    };
    let view = match session.render_mode() {
        RenderMode::Flat => "FLAT",
        RenderMode::Perspective => "3D",
    };
    let relief = if session.relief_enabled() { " | RELIEF" } else { "" };
    format!("{mode} | {view}{relief} | FINGERS: {finger_count} | FPS: {fps:.1}")
}

/// Filled buttons with centred labels; the current pen button gets a white frame.
pub fn draw_toolbar(img: &mut RgbImage, zones: &[HotZone], current: ColorRgb) {
    for zone in zones {
        let (w, h) = (zone.rect.width(), zone.rect.height());
        if w == 0 || h == 0 {
            continue;
        }
        let rect = Rect::at(zone.rect.x0, zone.rect.y0).of_size(w, h);
        draw_filled_rect_mut(img, rect, zone.fill.to_pixel());

        if zone.command == Command::SetColor(current) {
            for inset in 0..3 {
                let frame = Rect::at(zone.rect.x0 + inset, zone.rect.y0 + inset)
                    .of_size(w.saturating_sub(2 * inset as u32).max(1), h.saturating_sub(2 * inset as u32).max(1));
                draw_hollow_rect_mut(img, frame, TEXT);
            }
        }

        if !zone.label.is_empty() {
            let scale = 2;
            let text_w = zone.label.chars().count() as i32 * 6 * scale;
            let x = zone.rect.x0 + (w as i32 - text_w) / 2;
            let y = zone.rect.y0 + (h as i32 - 7 * scale) / 2;
            draw_text_5x7(img, x, y, zone.label, TEXT, scale);
        }
    }
}

/// Closed outline, 2 px wide.
pub fn draw_silhouette(img: &mut RgbImage, contour: &[Point2D], color: Rgb<u8>) {
    if contour.len() < 2 {
        return;
    }
    let next = contour.iter().skip(1).chain(contour.first());
    for (a, b) in contour.iter().zip(next) {
        for (ox, oy) in [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)] {
            draw_line_segment_mut(
                img,
                (a.x as f32 + ox, a.y as f32 + oy),
                (b.x as f32 + ox, b.y as f32 + oy),
                color,
            );
        }
    }
}

/// Large centred text just under the toolbar.
pub fn draw_banner(img: &mut RgbImage, text: &str, color: ColorRgb) {
    let scale = 4;
    let text_w = text.chars().count() as i32 * 6 * scale;
    let x = (img.width() as i32 - text_w) / 2;
    draw_text_5x7(img, x, 170, text, color.to_pixel(), scale);
}

/* ---------- 5x7 bitmap font ---------- */

/// Put a pixel if (x,y) is inside bounds.
#[inline]
fn put_pixel(img: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>) {
    if x < 0 || y < 0 || x >= img.width() as i32 || y >= img.height() as i32 {
        return;
    }
    img.put_pixel(x as u32, y as u32, color);
}

/// Return a 5x7 glyph bitmap. Each u8 is a row; the low 5 bits are the pixels
/// (bit 4 = leftmost). Lowercase is drawn as uppercase.
fn glyph5x7(ch: char) -> Option<[u8; 7]> {
    macro_rules! g { ($a:expr,$b:expr,$c:expr,$d:expr,$e:expr,$f:expr,$g:expr) => {
        Some([$a,$b,$c,$d,$e,$f,$g])
    }; }

    match ch.to_ascii_uppercase() {
        '0' => g!(0b01110,0b10001,0b10011,0b10101,0b11001,0b10001,0b01110),
        '1' => g!(0b00100,0b01100,0b00100,0b00100,0b00100,0b00100,0b01110),
        '2' => g!(0b01110,0b10001,0b00001,0b00010,0b00100,0b01000,0b11111),
        '3' => g!(0b11110,0b00001,0b00001,0b01110,0b00001,0b00001,0b11110),
        '4' => g!(0b00010,0b00110,0b01010,0b10010,0b11111,0b00010,0b00010),
        '5' => g!(0b11111,0b10000,0b11110,0b00001,0b00001,0b10001,0b01110),
        '6' => g!(0b00110,0b01000,0b10000,0b11110,0b10001,0b10001,0b01110),
        '7' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b01000,0b01000),
        '8' => g!(0b01110,0b10001,0b10001,0b01110,0b10001,0b10001,0b01110),
        '9' => g!(0b01110,0b10001,0b10001,0b01111,0b00001,0b00010,0b01100),

        'A' => g!(0b01110,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'B' => g!(0b11110,0b10001,0b10001,0b11110,0b10001,0b10001,0b11110),
        'C' => g!(0b01110,0b10001,0b10000,0b10000,0b10000,0b10001,0b01110),
        'D' => g!(0b11100,0b10010,0b10001,0b10001,0b10001,0b10010,0b11100),
        'E' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b11111),
        'F' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b10000),
        'G' => g!(0b01110,0b10001,0b10000,0b10111,0b10001,0b10001,0b01111),
        'H' => g!(0b10001,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'I' => g!(0b01110,0b00100,0b00100,0b00100,0b00100,0b00100,0b01110),
        'J' => g!(0b00111,0b00010,0b00010,0b00010,0b00010,0b10010,0b01100),
        'K' => g!(0b10001,0b10010,0b10100,0b11000,0b10100,0b10010,0b10001),
        'L' => g!(0b10000,0b10000,0b10000,0b10000,0b10000,0b10000,0b11111),
        'M' => g!(0b10001,0b11011,0b10101,0b10101,0b10001,0b10001,0b10001),
        'N' => g!(0b10001,0b10001,0b11001,0b10101,0b10011,0b10001,0b10001),
        'O' => g!(0b01110,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'P' => g!(0b11110,0b10001,0b10001,0b11110,0b10000,0b10000,0b10000),
        'Q' => g!(0b01110,0b10001,0b10001,0b10001,0b10101,0b10010,0b01101),
        'R' => g!(0b11110,0b10001,0b10001,0b11110,0b10100,0b10010,0b10001),
        'S' => g!(0b01111,0b10000,0b10000,0b01110,0b00001,0b00001,0b11110),
        'T' => g!(0b11111,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        'U' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'V' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b01010,0b00100),
        'W' => g!(0b10001,0b10001,0b10001,0b10101,0b10101,0b10101,0b01010),
        'X' => g!(0b10001,0b10001,0b01010,0b00100,0b01010,0b10001,0b10001),
        'Y' => g!(0b10001,0b10001,0b01010,0b00100,0b00100,0b00100,0b00100),
        'Z' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b10000,0b11111),

        ' ' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00000,0b00000),
        '|' => g!(0b00100,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        ':' => g!(0b00000,0b00100,0b00000,0b00000,0b00100,0b00000,0b00000),
        '.' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00100,0b00000),
        '-' => g!(0b00000,0b00000,0b00000,0b11111,0b00000,0b00000,0b00000),

        _ => None,
    }
}

/// One glyph with a black drop shadow, each font pixel drawn `scale` x `scale`.
fn draw_char_5x7(img: &mut RgbImage, x: i32, y: i32, ch: char, color: Rgb<u8>, scale: i32) {
    let Some(rows) = glyph5x7(ch) else { return };
    for (offset, c) in [(scale.max(1) / 2 + 1, Rgb([0, 0, 0])), (0, color)] {
        for (ry, rowbits) in rows.iter().enumerate() {
            for rx in 0..5 {
                if rowbits & (1 << (4 - rx)) == 0 {
                    continue;
                }
                for sy in 0..scale {
                    for sx in 0..scale {
                        put_pixel(
                            img,
                            x + rx * scale + sx + offset,
                            y + ry as i32 * scale + sy + offset,
                            c,
                        );
                    }
                }
            }
        }
    }
}

/// Text with 5x7 glyphs and one font pixel of spacing.
pub fn draw_text_5x7(img: &mut RgbImage, mut x: i32, y: i32, text: &str, color: Rgb<u8>, scale: i32) {
    let scale = scale.max(1);
    for ch in text.chars() {
        draw_char_5x7(img, x, y, ch, color, scale);
        x += 6 * scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotzone::default_layout;

    fn lit(img: &RgbImage) -> usize {
        img.pixels().filter(|p| p.0 != [0, 0, 0]).count()
    }

    #[test]
    fn text_lights_pixels_and_clips_at_edges() {
        let mut img = RgbImage::new(40, 10);
        draw_text_5x7(&mut img, 1, 1, "HI", TEXT, 1);
        assert!(lit(&img) > 0);
        assert_eq!(img.get_pixel(1, 1).0, [255, 255, 255]); // top-left of 'H'

        let mut edge = RgbImage::new(10, 10);
        draw_text_5x7(&mut edge, -3, 8, "W", TEXT, 3);
    }

    #[test]
    fn unknown_glyphs_are_skipped() {
        let mut img = RgbImage::new(20, 10);
        draw_text_5x7(&mut img, 0, 0, "#~", TEXT, 1);
        assert_eq!(lit(&img), 0);
    }

    #[test]
    fn every_label_and_banner_has_glyphs() {
        let texts = ["DRAW MODE ON", "DRAW MODE OFF", "CALIBRATING: HOLD HAND IN BOX", "DRAWING | 3D | RELIEF"];
        for t in texts.iter().copied().chain(default_layout().iter().map(|z| z.label)) {
            for ch in t.chars() {
                assert!(glyph5x7(ch).is_some(), "missing glyph {ch:?}");
            }
        }
    }

    #[test]
    fn toolbar_fills_buttons_and_frames_current_pen() {
        let mut img = RgbImage::new(1000, 200);
        let zones = default_layout();
        draw_toolbar(&mut img, &zones, ColorRgb::BLUE);
        assert_eq!(img.get_pixel(80, 80).0, [255, 0, 0]);
        assert_eq!(img.get_pixel(200, 80).0, [0, 255, 0]);
        // Blue button is current: white frame on its edge, blue inside.
        assert_eq!(img.get_pixel(310, 80).0, [255, 255, 255]);
        assert_eq!(img.get_pixel(380, 40).0, [0, 0, 255]);
        assert_eq!(img.get_pixel(10, 80).0, [255, 0, 0]);
        assert_eq!(img.get_pixel(950, 80).0, [0, 0, 0]);
    }

    #[test]
    fn sliver_buttons_still_draw() {
        use crate::hotzone::ZoneRect;

        let mut img = RgbImage::new(60, 60);
        let zones = [
            HotZone {
                rect: ZoneRect::new(10, 10, 13, 40),
                command: Command::SetColor(ColorRgb::RED),
                fill: ColorRgb::RED,
                label: "",
            },
            HotZone {
                rect: ZoneRect::new(20, 10, 21, 11),
                command: Command::SetColor(ColorRgb::GREEN),
                fill: ColorRgb::GREEN,
                label: "X",
            },
        ];
        draw_toolbar(&mut img, &zones, ColorRgb::RED);
        draw_toolbar(&mut img, &zones, ColorRgb::GREEN);
        assert!(lit(&img) > 0);
    }

    #[test]
    fn silhouette_is_a_closed_outline() {
        let mut img = RgbImage::new(50, 50);
        let square = vec![
            Point2D::new(10, 10),
            Point2D::new(30, 10),
            Point2D::new(30, 30),
            Point2D::new(10, 30),
        ];
        draw_silhouette(&mut img, &square, SILHOUETTE);
        assert_eq!(img.get_pixel(20, 10).0, [0, 255, 0]);
        assert_eq!(img.get_pixel(20, 11).0, [0, 255, 0]); // 2 px thick
        assert_eq!(img.get_pixel(10, 20).0, [0, 255, 0]); // closing edge
        assert_eq!(img.get_pixel(20, 20).0, [0, 0, 0]);
    }

    #[test]
    fn hud_reports_session_state() {
        let s = SessionState::default();
        assert_eq!(hud_line(&s, 3, 29.66), "IDLE | FLAT | FINGERS: 3 | FPS: 29.7");
    }
}

// The on-screen window.
// Visual effects provided here:
// 1) A window that shows the finished frame (camera + ink + overlays).
// 2) Mouse presses/drags on it become pointer events (clicks and tilt drags).
// 3) Keys pressed in it become single characters for the key map.

use crate::error::Error;
use crate::input::{PointerEvent, PointerSender};
use crate::session::{DisplaySink, InputSource};
use crate::types::FrameBuffer;
use image::RgbImage;
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

pub struct Drawer {
    window: Window,     // the on-screen window you see
    mouse_down: bool,   // left button state seen on the previous poll
    last_mouse: Option<(f32, f32)>,
}

impl Drawer {
    /// Create a window sized to the camera feed.
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self, Error> {
        let window = Window::new(title, width, height, WindowOptions::default())
            .map_err(|e| Error::WindowInit(e.to_string()))?;
        Ok(Self { window, mouse_down: false, last_mouse: None })
    }

    /// Current mouse position in window pixel coordinates (clamped to the window).
    fn mouse_pos(&self) -> Option<(f32, f32)> {
        self.window
            .get_mouse_pos(MouseMode::Clamp)
            .map(|(x, y)| (x.max(0.0), y.max(0.0)))
    }

    /// Turn this poll's button state into press/move/release events.
    fn poll_mouse(&mut self, pointer: &PointerSender) {
        let down = self.window.get_mouse_down(MouseButton::Left);
        let pos = self.mouse_pos();
        for event in mouse_events(self.mouse_down, down, self.last_mouse, pos) {
            pointer.send(event);
        }
        self.mouse_down = down;
        if pos.is_some() {
            self.last_mouse = pos;
        }
    }
}

/// Events implied by going from (`was_down`, `last`) to (`down`, `pos`).
fn mouse_events(
    was_down: bool,
    down: bool,
    last: Option<(f32, f32)>,
    pos: Option<(f32, f32)>,
) -> Vec<PointerEvent> {
    match (was_down, down, pos) {
        (false, true, Some((x, y))) => vec![PointerEvent::Press { x, y }],
        (true, true, Some((x, y))) if last != Some((x, y)) => vec![PointerEvent::Move { x, y }],
        (true, false, _) => vec![PointerEvent::Release],
        _ => Vec::new(),
    }
}

/// Character a key stands for in the key map.
fn key_char(key: Key) -> Option<char> {
    match key {
        Key::Q => Some('q'),
        Key::Escape => Some('\u{1b}'),
        Key::C => Some('c'),
        Key::M => Some('m'),
        Key::E => Some('e'),
        _ => None,
    }
}

impl DisplaySink for Drawer {
    /// Push the finished frame to the screen.
    fn present(&mut self, image: &RgbImage) -> Result<(), Error> {
        let fb = FrameBuffer::from_rgb(image);
        self.window
            .update_with_buffer(&fb.pixels, fb.width, fb.height)
            .map_err(|e| Error::WindowUpdate(e.to_string()))
    }

    /// Returns false when the user closes the window (so we can stop the loop).
    fn is_open(&self) -> bool {
        self.window.is_open()
    }
}

impl InputSource for Drawer {
    fn poll(&mut self, pointer: &PointerSender) -> Option<char> {
        self.poll_mouse(pointer);
        self.window
            .get_keys_pressed(KeyRepeat::No)
            .into_iter()
            .find_map(key_char)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_edges_become_press_and_release() {
        assert_eq!(
            mouse_events(false, true, None, Some((3.0, 4.0))),
            vec![PointerEvent::Press { x: 3.0, y: 4.0 }]
        );
        assert_eq!(
            mouse_events(true, false, Some((3.0, 4.0)), Some((3.0, 4.0))),
            vec![PointerEvent::Release]
        );
    }

    #[test]
    fn moves_only_while_held_and_moved() {
        assert_eq!(
            mouse_events(true, true, Some((3.0, 4.0)), Some((5.0, 4.0))),
            vec![PointerEvent::Move { x: 5.0, y: 4.0 }]
        );
        assert!(mouse_events(true, true, Some((3.0, 4.0)), Some((3.0, 4.0))).is_empty());
        assert!(mouse_events(false, false, Some((3.0, 4.0)), Some((9.0, 9.0))).is_empty());
    }

    #[test]
    fn mapped_keys() {
        assert_eq!(key_char(Key::Q), Some('q'));
        assert_eq!(key_char(Key::Escape), Some('\u{1b}'));
        assert_eq!(key_char(Key::E), Some('e'));
        assert_eq!(key_char(Key::Space), None);
    }
}

// Pointer and keyboard plumbing.
// Pointer events arrive whenever the window is polled; the tick loop drains
// them once per tick. Clicks are coalesced (latest press wins), drag steps
// are all kept, in order, so rotation never depends on tick timing.

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};

use crate::config::{EVENT_QUEUE_CAPACITY, QUIT_KEY};
use crate::hotzone::Command;
use crate::types::Point2D;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Press { x: f32, y: f32 },
    Move { x: f32, y: f32 },
    Release,
}

/// Producer half of the pointer queue.
#[derive(Clone)]
pub struct PointerSender {
    tx: Sender<PointerEvent>,
}

impl PointerSender {
    /// Queue an event; when the consumer has fallen behind the event is dropped.
    pub fn send(&self, event: PointerEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(ev)) => log::warn!("Pointer queue full, dropping {ev:?}"),
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}

/// What the pointer contributed to one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointerInput {
    /// Most recent press since the last drain.
    pub click: Option<Point2D>,
    /// Drag steps (dx, dy) in arrival order.
    pub drags: Vec<(f32, f32)>,
}

/// Consumer half: turns raw events into clicks and drag deltas. Keeps the
/// button state across drains so a drag may span many ticks.
pub struct PointerQueue {
    rx: Receiver<PointerEvent>,
    dragging_from: Option<(f32, f32)>,
}

/// Bounded single-producer/single-consumer pointer channel.
pub fn pointer_channel() -> (PointerSender, PointerQueue) {
    let (tx, rx) = bounded(EVENT_QUEUE_CAPACITY);
    (PointerSender { tx }, PointerQueue { rx, dragging_from: None })
}

impl PointerQueue {
    pub fn drain(&mut self) -> PointerInput {
        let mut input = PointerInput::default();
        for event in self.rx.try_iter() {
            match event {
                PointerEvent::Press { x, y } => {
                    input.click = Some(Point2D::new(x as i32, y as i32));
                    self.dragging_from = Some((x, y));
                }
                PointerEvent::Move { x, y } => {
                    if let Some((lx, ly)) = self.dragging_from {
                        if (x, y) != (lx, ly) {
                            input.drags.push((x - lx, y - ly));
                        }
                        self.dragging_from = Some((x, y));
                    }
                }
                PointerEvent::Release => self.dragging_from = None,
            }
        }
        input
    }
}

/// What a key press asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    Apply(Command),
}

pub fn key_action(key: char) -> Option<KeyAction> {
    match key.to_ascii_lowercase() {
        k if k == QUIT_KEY => Some(KeyAction::Quit),
        '\u{1b}' => Some(KeyAction::Quit),
        'c' => Some(KeyAction::Apply(Command::Clear)),
        'm' => Some(KeyAction::Apply(Command::ToggleRenderMode)),
        'e' => Some(KeyAction::Apply(Command::ToggleRelief)),
        _ => None,
    }
}

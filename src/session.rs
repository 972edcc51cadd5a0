// Session state and the per-tick pipeline.
// Everything that survives from one tick to the next (mode, pen memory,
// canvas, tilt, colour, view toggles) lives in `SessionState` and is only
// touched by `SessionState::tick` on the loop thread. `run` wires a
// frame source, a hand observer and a display into that loop and reports
// why it stopped.

use std::borrow::Cow;
use std::time::{Duration, Instant};

use image::RgbImage;

use crate::canvas::{StrokeCanvas, blend_half};
use crate::config::DEFAULT_STROKE_WIDTH;
use crate::error::Error;
use crate::gesture::{GestureStateMachine, GestureStep};
use crate::hotzone::{Command, HotZone, default_layout, hit_coverage, hit_point};
use crate::input::{KeyAction, PointerInput, PointerSender, key_action, pointer_channel};
use crate::observer::HandObserver;
use crate::overlay;
use crate::perspective::{RotationState, relief, warp_canvas};
use crate::types::{ColorRgb, GestureMode, Observation, RenderMode};

/// Delivers one frame per tick; `Ok(None)` means the stream is over.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>, Error>;
}

/// Shows one finished image per tick.
pub trait DisplaySink {
    fn present(&mut self, image: &RgbImage) -> Result<(), Error>;

    /// False once the user has closed the output.
    fn is_open(&self) -> bool {
        true
    }
}

/// Polled once per tick: forwards pointer events, returns at most one key.
pub trait InputSource {
    fn poll(&mut self, pointer: &PointerSender) -> Option<char>;
}

/// Why the loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// The frame source has no more frames.
    StreamEnded,
    /// Quit key pressed or window closed.
    UserQuit,
    /// The frame source failed; the message says how.
    SourceFailed(String),
}

/// What one tick produced.
pub struct TickOutput {
    /// Frame and (presented) canvas blended together, before overlays.
    pub image: RgbImage,
    pub step: GestureStep,
    /// Commands applied this tick, in application order.
    pub applied: Vec<Command>,
}

pub struct SessionState {
    gesture: GestureStateMachine,
    canvas: StrokeCanvas,
    rotation: RotationState,
    color: ColorRgb,
    stroke_width: u32,
    render_mode: RenderMode,
    relief: bool,
    zones: Vec<HotZone>,
    /// Gesture command seen on the previous tick (edge trigger).
    last_gesture_command: Command,
}

impl SessionState {
    pub fn new(stroke_width: u32) -> Self {
        Self::with_zones(stroke_width, default_layout())
    }

    pub fn with_zones(stroke_width: u32, zones: Vec<HotZone>) -> Self {
        Self {
            gesture: GestureStateMachine::new(),
            canvas: StrokeCanvas::new(0, 0),
            rotation: RotationState::default(),
            color: ColorRgb::BLUE,
            stroke_width: stroke_width.max(1),
            render_mode: RenderMode::Flat,
            relief: false,
            zones,
            last_gesture_command: Command::None,
        }
    }

    pub fn mode(&self) -> GestureMode {
        self.gesture.mode()
    }

    pub fn color(&self) -> ColorRgb {
        self.color
    }

    pub fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    pub fn relief_enabled(&self) -> bool {
        self.relief
    }

    pub fn rotation(&self) -> RotationState {
        self.rotation
    }

    pub fn canvas(&self) -> &StrokeCanvas {
        &self.canvas
    }

    pub fn zones(&self) -> &[HotZone] {
        &self.zones
    }

    /// One full pass: gesture step, ink, UI commands, tilt, compositing.
    pub fn tick(
        &mut self,
        frame: &RgbImage,
        obs: &Observation,
        pointer: &PointerInput,
        key_commands: &[Command],
    ) -> Result<TickOutput, Error> {
        let (w, h) = frame.dimensions();
        self.canvas.ensure_size(w, h);

        let step = self.gesture.step(obs.finger_count, obs.fingertip);
        if let Some((from, to)) = step.segment {
            self.canvas.append(from, to, self.color, self.stroke_width);
        }

        let mut applied = Vec::new();

        // At most one click per tick: the latest press.
        if let Some(click) = pointer.click {
            let cmd = hit_point(&self.zones, click);
            if cmd != Command::None {
                applied.push(cmd);
            }
        }

        // Hand over the toolbar: fingertip if one finger is up, otherwise how
        // much of each button the hand covers. Fires once per entry.
        let gesture_cmd = match step.pointer {
            Some(tip) => hit_point(&self.zones, tip),
            None => obs.mask.as_ref().map_or(Command::None, |m| hit_coverage(&self.zones, m)),
        };
        if gesture_cmd != self.last_gesture_command && gesture_cmd != Command::None {
            applied.push(gesture_cmd);
        }
        self.last_gesture_command = gesture_cmd;

        applied.extend(key_commands.iter().copied().filter(|c| *c != Command::None));
        for cmd in &applied {
            self.apply(*cmd);
        }

        for &(dx, dy) in &pointer.drags {
            self.rotation.apply_drag(dx, dy);
        }

        let image = match self.presented_layer() {
            Cow::Borrowed(_) => self.canvas.composite(frame)?,
            Cow::Owned(layer) => blend_half(frame, &layer)?,
        };
        Ok(TickOutput { image, step, applied })
    }

    fn apply(&mut self, cmd: Command) {
        log::debug!("Applying {cmd:?}");
        match cmd {
            Command::SetColor(c) => self.color = c,
            Command::Clear => self.canvas.clear(),
            Command::ToggleRenderMode => self.render_mode = self.render_mode.toggled(),
            Command::ToggleRelief => self.relief = !self.relief,
            Command::None => {}
        }
    }

    /// Canvas as it should be shown: flat or tilted, with or without relief.
    pub fn presented_layer(&self) -> Cow<'_, RgbImage> {
        let mut layer = Cow::Borrowed(self.canvas.raster());
        if self.render_mode == RenderMode::Perspective {
            layer = Cow::Owned(warp_canvas(&layer, self.rotation.angle_x, self.rotation.angle_y));
        }
        if self.relief {
            layer = Cow::Owned(relief(&layer));
        }
        layer
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(DEFAULT_STROKE_WIDTH)
    }
}

/// Frames per second, refreshed once a second.
struct FpsCounter {
    since: Instant,
    frames: u32,
    fps: f32,
}

impl FpsCounter {
    fn new() -> Self {
        Self { since: Instant::now(), frames: 0, fps: 0.0 }
    }

    fn tick(&mut self) {
        self.frames += 1;
        let elapsed = self.since.elapsed();
        if elapsed >= Duration::from_secs(1) {
            self.fps = self.frames as f32 / elapsed.as_secs_f32();
            log::info!("FPS: {:.1}", self.fps);
            self.frames = 0;
            self.since = Instant::now();
        }
    }
}

/// Drive the pipeline until the stream ends, the user quits, or the source
/// fails. Display errors are returned as `Err`.
pub fn run<S, D, O>(
    source: &mut S,
    display: &mut D,
    observer: &mut O,
    session: &mut SessionState,
) -> Result<Termination, Error>
where
    S: FrameSource + ?Sized,
    D: DisplaySink + InputSource + ?Sized,
    O: HandObserver + ?Sized,
{
    let (pointer_tx, mut pointer_rx) = pointer_channel();
    let mut fps = FpsCounter::new();

    loop {
        if !display.is_open() {
            return Ok(Termination::UserQuit);
        }

        let mut key_commands = Vec::new();
        match display.poll(&pointer_tx).and_then(key_action) {
            Some(KeyAction::Quit) => return Ok(Termination::UserQuit),
            Some(KeyAction::Apply(cmd)) => key_commands.push(cmd),
            None => {}
        }

        let frame = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => return Ok(Termination::StreamEnded),
            Err(e) => return Ok(Termination::SourceFailed(e.to_string())),
        };

        let obs = observer.observe(&frame);
        let pointer = pointer_rx.drain();
        let out = session.tick(&frame, &obs, &pointer, &key_commands)?;

        let mut image = out.image;
        overlay::decorate(
            &mut image,
            &overlay::Scene {
                session,
                observation: &obs,
                pointer: out.step.pointer,
                pending_region: observer.pending_region(),
                fps: fps.fps,
            },
        );
        display.present(&image)?;
        fps.tick();
    }
}

// Air canvas: draw on a live camera feed with one finger.
// Per tick: classify skin → find the hand silhouette and count fingers →
// advance the draw/idle state machine → append ink → hit-test the toolbar →
// present the canvas (flat or tilted, optionally embossed) over the frame.

pub mod camera;
pub mod canvas;
pub mod classify;
pub mod config;
pub mod contour;
pub mod draw;
pub mod error;
pub mod gesture;
pub mod hotzone;
pub mod input;
pub mod observer;
pub mod overlay;
pub mod perspective;
pub mod session;
pub mod types;

pub use error::Error;
pub use session::{DisplaySink, FrameSource, InputSource, SessionState, Termination, run};

// What you SEE:
// • Live mirrored camera with a toolbar along the top.
// • Open hand (5 fingers) = DRAW MODE ON, no hand / fist-to-zero = OFF.
// • One finger up moves the pen; touching a button picks a colour, clears, or
//   toggles the 3D view / relief. Drag with the mouse to tilt the 3D view.
// • Keys: Q/ESC quit, C clear, M 3D view, E relief.

use air_canvas::camera::CameraCapture;
use air_canvas::classify::{CalibratedClassifier, ThresholdClassifier};
use air_canvas::config::{Args, ObserverKind};
use air_canvas::contour::{AnalyzerConfig, ContourAnalyzer};
use air_canvas::draw::Drawer;
use air_canvas::observer::{HandObserver, MaskObserver};
use air_canvas::{SessionState, Termination, run};
use anyhow::{Context, Result};
use clap::Parser;

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.debug { log::LevelFilter::Debug } else { log::LevelFilter::Info };
    env_logger::Builder::from_default_env().filter_level(level).init();

    args.validate().context("Invalid command line")?;

    log::info!("Air canvas starting...");
    log::info!("Camera: {} at {}x{}", args.camera, args.width, args.height);
    log::info!("Observer: {:?}", args.observer);
    log::info!("Stroke width: {} px, min defect depth: {} px", args.stroke_width, args.min_defect_depth);

    let analyzer = ContourAnalyzer::new(AnalyzerConfig {
        min_defect_depth: args.min_defect_depth,
        ..AnalyzerConfig::default()
    });
    let mut observer: Box<dyn HandObserver> = match args.observer {
        ObserverKind::Fixed => {
            let bounds = args.hsv_bounds().context("Invalid skin range")?;
            Box::new(MaskObserver::new(ThresholdClassifier::new(bounds), analyzer))
        }
        ObserverKind::Calibrated => Box::new(MaskObserver::new(CalibratedClassifier::new(), analyzer)),
    };

    let mut cam = CameraCapture::new(args.camera, args.width, args.height)
        .context("Failed to open camera")?;
    let (w, h) = cam.resolution();
    let mut drawer = Drawer::new("Air Canvas", w as usize, h as usize)
        .context("Failed to open window")?;

    let mut session = SessionState::new(args.stroke_width);
    let termination = run(&mut cam, &mut drawer, observer.as_mut(), &mut session)
        .context("Display error")?;

    match termination {
        Termination::StreamEnded => log::info!("Camera stream ended"),
        Termination::UserQuit => log::info!("Quit requested"),
        Termination::SourceFailed(reason) => {
            log::error!("Camera failed: {reason}");
            anyhow::bail!("camera failed: {reason}");
        }
    }
    Ok(())
}

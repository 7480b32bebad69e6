//! Headless preview: drives the full controller against synthetic clips
//! and a scripted pointer, logging loop transitions and printing a
//! summary. Useful for eyeballing tuning changes without a host app.
//!
//! ```text
//! preview [--frames N] [--config path/to/tunables.json]
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use mirage::controller::BackdropController;
use mirage::kinematics::PointerEvent;
use mirage::looper::LoopEvent;
use mirage::media::{BufferId, SyntheticClip};
use mirage::stage::{Rect, RecordingStage};
use mirage::Tunables;

const FRAME_SECS: f64 = 1.0 / 60.0;
const CLIP_SECS: f64 = 12.0;

struct Options {
    frames: u64,
    config: Option<PathBuf>,
}

fn parse_args() -> Result<Options> {
    let mut options = Options {
        frames: 3600,
        config: None,
    };
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--frames" => {
                let value = args.next().context("--frames needs a value")?;
                options.frames = value.parse().context("--frames must be an integer")?;
            }
            "--config" => {
                let value = args.next().context("--config needs a path")?;
                options.config = Some(PathBuf::from(value));
            }
            other => bail!("unknown argument: {other}"),
        }
    }
    Ok(options)
}

/// Scripted pointer: a rightward sweep, a pause, a leftward scrub, then
/// the pointer leaves. Repeats every 10 seconds.
fn scripted_pointer(frame: u64, bounds: Rect) -> Option<PointerEvent> {
    let timestamp_ms = frame as f64 * FRAME_SECS * 1000.0;
    let phase = frame % 600;
    match phase {
        0..=149 => {
            let t = phase as f32 / 149.0;
            Some(PointerEvent::Move {
                x: bounds.left + bounds.width * (0.1 + 0.8 * t),
                y: bounds.top + bounds.height * 0.5,
                timestamp_ms,
            })
        }
        150..=269 => None,
        270..=389 => {
            let t = (phase - 270) as f32 / 119.0;
            Some(PointerEvent::Move {
                x: bounds.left + bounds.width * (0.9 - 0.7 * t),
                y: bounds.top + bounds.height * (0.5 - 0.3 * t),
                timestamp_ms,
            })
        }
        390 => Some(PointerEvent::Leave),
        _ => None,
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let options = parse_args()?;
    let tunables = match &options.config {
        Some(path) => Tunables::load_path(path)
            .with_context(|| format!("loading tunables from {}", path.display()))?,
        None => Tunables::load(),
    };

    let bounds = Rect::new(0.0, 0.0, 1280.0, 720.0);
    let (mut controller, pointer_tx) = BackdropController::mount(
        RecordingStage::new(bounds),
        SyntheticClip::new(Some(CLIP_SECS)),
        SyntheticClip::new(Some(CLIP_SECS)),
        &tunables,
    );

    let mut swaps = 0u64;
    let mut crossfades = 0u64;
    let mut peak_rate = f64::MIN;
    let mut min_rate = f64::MAX;

    for frame in 0..options.frames {
        if let Some(event) = scripted_pointer(frame, bounds) {
            let _ = pointer_tx.try_send(event);
        }
        for id in [BufferId::A, BufferId::B] {
            controller.looper_mut().buffer_mut(id).advance(FRAME_SECS);
        }
        for event in controller.frame() {
            match event {
                LoopEvent::CrossfadeStarted { outgoing, incoming } => {
                    crossfades += 1;
                    log::info!(
                        "frame {frame}: crossfade {outgoing} -> {incoming}"
                    );
                }
                LoopEvent::Swapped { new_active } => {
                    swaps += 1;
                    log::info!("frame {frame}: swapped, {new_active} now active");
                }
                LoopEvent::None => {}
            }
        }
        let info = controller.loop_info();
        peak_rate = peak_rate.max(info.rate);
        min_rate = min_rate.min(info.rate);
    }

    let info = controller.loop_info();
    let transform = controller.stage().last;
    println!("frames:      {}", options.frames);
    println!("crossfades:  {crossfades}");
    println!("swaps:       {swaps}");
    println!("rate range:  {min_rate:.3} .. {peak_rate:.3}");
    println!(
        "final state: {:?}, active {} at {:.2}s, rate {:.3}",
        info.state, info.active, info.active_position, info.rate
    );
    println!(
        "final transform: rot ({:.2}, {:.2})deg scale {:.3} xy ({:.1}, {:.1})px",
        transform.rotate_x_deg,
        transform.rotate_y_deg,
        transform.scale,
        transform.translate_x,
        transform.translate_y
    );

    controller.teardown();
    Ok(())
}

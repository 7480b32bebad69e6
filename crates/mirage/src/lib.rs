//! Pointer-reactive seamless video loop controller for ambient login
//! backgrounds.
//!
//! Three cooperating pieces, composed by [`controller::BackdropController`]
//! into one per-refresh control loop:
//!
//! - [`looper::LoopSwapController`] — two interchangeable media buffers,
//!   crossfaded near end-of-media so playback appears infinite
//! - [`kinematics::PointerKinematicsSampler`] — raw pointer events in,
//!   a bounded position vector and horizontal velocity estimate out
//! - [`modulator::ReactiveModulator`] — per-frame smoothing of both,
//!   deriving a playback rate and a parallax transform
//!
//! The host hands the controller two playable handles (anything
//! implementing [`media::MediaHandle`]) and a tracked container
//! ([`stage::Stage`]), feeds pointer events through a channel, calls
//! `frame()` once per display refresh, and tears the whole thing down on
//! navigation. There is no persisted state and no error channel: the one
//! failure mode, a blocked play attempt, degrades to a motionless frame.

pub mod config;
pub mod controller;
pub mod filter;
pub mod kinematics;
pub mod looper;
pub mod media;
pub mod modulator;
pub mod stage;

pub use config::Tunables;
pub use controller::BackdropController;
pub use kinematics::PointerEvent;
pub use looper::{LoopEvent, LoopState};
pub use media::{BufferId, MediaHandle, PlayOutcome};
pub use stage::{Rect, Stage, Transform};

//! Pointer kinematics: raw move/leave events in, one bounded position
//! vector and one bounded horizontal velocity estimate out.
//!
//! The sampler is pull-based — it never drives animation. The frame
//! loop reads [`PointerKinematicsSampler::sample`] once per tick and
//! intermediate events between two ticks collapse to the latest value.

use glam::Vec2;

use crate::config::Tunables;
use crate::stage::Rect;

/// A pointer event over the tracked container, client coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Move { x: f32, y: f32, timestamp_ms: f64 },
    Leave,
}

/// Latest sampled kinematics, consumed once per frame.
/// `velocity` is `Some` only when a fresh estimate was produced since
/// the previous call to `sample`; the smoothing downstream keeps its
/// own target between fresh samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawKinematics {
    pub position: Vec2,
    pub velocity: Option<f32>,
}

pub struct PointerKinematicsSampler {
    bounds: Rect,
    position: Vec2,
    pending_velocity: Option<f32>,
    /// Last event admitted into the velocity estimate: (x, timestamp_ms).
    last_sample: Option<(f32, f64)>,
    min_gap_ms: f64,
    velocity_scale: f32,
}

impl PointerKinematicsSampler {
    pub fn new(bounds: Rect, tunables: &Tunables) -> Self {
        Self {
            bounds,
            position: Vec2::ZERO,
            pending_velocity: None,
            last_sample: None,
            min_gap_ms: tunables.min_sample_gap_ms,
            velocity_scale: tunables.velocity_scale,
        }
    }

    /// Track container layout changes.
    pub fn set_bounds(&mut self, bounds: Rect) {
        self.bounds = bounds;
    }

    pub fn handle(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Move { x, y, timestamp_ms } => self.on_move(x, y, timestamp_ms),
            PointerEvent::Leave => self.on_leave(),
        }
    }

    fn on_move(&mut self, x: f32, y: f32, timestamp_ms: f64) {
        // Position updates on every event.
        self.position = self.bounds.normalized(x, y);

        // Velocity only on events spaced far enough apart to keep the
        // denominator meaningful.
        match self.last_sample {
            None => self.last_sample = Some((x, timestamp_ms)),
            Some((last_x, last_t)) => {
                let dt = timestamp_ms - last_t;
                if dt >= self.min_gap_ms {
                    let dx = x - last_x;
                    let raw = (dx / dt.max(1.0) as f32) * self.velocity_scale;
                    self.pending_velocity = Some(raw.clamp(-1.0, 1.0));
                    self.last_sample = Some((x, timestamp_ms));
                }
            }
        }
    }

    fn on_leave(&mut self) {
        // Targets reset to zero; the smoothed values downstream decay
        // through their normal filters rather than snapping.
        self.position = Vec2::ZERO;
        self.pending_velocity = Some(0.0);
        self.last_sample = None;
    }

    /// Read the latest kinematics. The velocity estimate is taken:
    /// a second call in the same frame sees `velocity: None`.
    pub fn sample(&mut self) -> RawKinematics {
        RawKinematics {
            position: self.position,
            velocity: self.pending_velocity.take(),
        }
    }
}

//! Per-frame modulation: smoothed pointer kinematics in, playback rate,
//! rewind nudges, and a parallax transform out.
//!
//! Everything lives in one explicit state value stepped by
//! [`ReactiveModulator::tick`], so the control law is testable without a
//! running display loop. Filter factors are per-frame at a 60 Hz
//! reference (see `filter`).

use glam::Vec2;

use crate::config::Tunables;
use crate::filter::{CoastSmoother, Smoother, lerp_toward};
use crate::kinematics::RawKinematics;
use crate::stage::Transform;

/// What the frame loop applies after one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModulatorOutput {
    /// Playback rate for both buffers, already clamped and smoothed.
    pub rate: f64,
    /// Discrete backward seek, seconds. Simulated rewind: issued while
    /// the rate stays at a slow forward crawl.
    pub seek_back: Option<f64>,
    /// Transform for the visual container, double-smoothed.
    pub transform: Transform,
}

/// Read-only snapshot for diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct ModulatorInfo {
    pub smoothed_position: Vec2,
    pub smoothed_velocity: f32,
    pub rate: f64,
}

pub struct ReactiveModulator {
    cfg: Tunables,
    pos_x: Smoother,
    pos_y: Smoother,
    velocity: CoastSmoother,
    rate: f64,
    transform: Transform,
}

impl ReactiveModulator {
    pub fn new(tunables: &Tunables) -> Self {
        Self {
            cfg: tunables.clone(),
            pos_x: Smoother::new(tunables.pos_lerp),
            pos_y: Smoother::new(tunables.pos_lerp),
            velocity: CoastSmoother::new(tunables.vel_lerp, tunables.vel_decay),
            rate: tunables.base_rate,
            transform: Transform::IDENTITY,
        }
    }

    /// Advance one frame from the latest sampled kinematics.
    pub fn tick(&mut self, raw: RawKinematics) -> ModulatorOutput {
        let px = self.pos_x.step(raw.position.x);
        let py = self.pos_y.step(raw.position.y);

        if let Some(v) = raw.velocity {
            self.velocity.retarget(v);
        }
        let vel = self.velocity.step();

        let (target_rate, seek_back) = self.derive_rate(vel);
        self.rate += (target_rate - self.rate) * self.cfg.rate_lerp;

        self.chase_transform(Vec2::new(px, py));

        ModulatorOutput {
            rate: self.rate,
            seek_back,
            transform: self.transform,
        }
    }

    /// Rate law: dead-zone at rest, gain above it rightward, simulated
    /// rewind leftward. Always clamped to the configured band.
    fn derive_rate(&self, vel: f32) -> (f64, Option<f64>) {
        let cfg = &self.cfg;
        let mut seek_back = None;
        let target = if vel > cfg.velocity_dead_zone {
            cfg.base_rate + f64::from(vel.abs()) * cfg.rate_gain
        } else if vel < -cfg.velocity_dead_zone {
            seek_back = Some(f64::from(vel.abs()) * cfg.rewind_seek_gain);
            cfg.rewind_crawl_rate
        } else {
            cfg.base_rate
        };
        (target.clamp(cfg.min_rate, cfg.max_rate), seek_back)
    }

    /// Second smoothing stage: each transform component chases its
    /// target with its own factor, independent of the position filter.
    fn chase_transform(&mut self, pos: Vec2) {
        let cfg = &self.cfg;
        let dist = pos.length();
        let target = Transform {
            rotate_x_deg: -pos.y * cfg.rotate_gain_deg,
            rotate_y_deg: pos.x * cfg.rotate_gain_deg,
            scale: 1.0 + dist * cfg.scale_gain,
            translate_x: pos.x * cfg.translate_gain_px,
            translate_y: pos.y * cfg.translate_gain_px,
        };
        let k = cfg.transform_lerp;
        let t = &mut self.transform;
        t.rotate_x_deg = lerp_toward(t.rotate_x_deg, target.rotate_x_deg, k);
        t.rotate_y_deg = lerp_toward(t.rotate_y_deg, target.rotate_y_deg, k);
        t.scale = lerp_toward(t.scale, target.scale, k);
        t.translate_x = lerp_toward(t.translate_x, target.translate_x, k);
        t.translate_y = lerp_toward(t.translate_y, target.translate_y, k);
    }

    pub fn info(&self) -> ModulatorInfo {
        ModulatorInfo {
            smoothed_position: Vec2::new(self.pos_x.value(), self.pos_y.value()),
            smoothed_velocity: self.velocity.value(),
            rate: self.rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn still() -> RawKinematics {
        RawKinematics {
            position: Vec2::ZERO,
            velocity: None,
        }
    }

    fn moving(pos: Vec2, vel: f32) -> RawKinematics {
        RawKinematics {
            position: pos,
            velocity: Some(vel),
        }
    }

    #[test]
    fn idle_input_holds_baseline_rate() {
        let cfg = Tunables::default();
        let mut m = ReactiveModulator::new(&cfg);
        for _ in 0..60 {
            let out = m.tick(still());
            assert!((out.rate - cfg.base_rate).abs() < 1e-9);
            assert_eq!(out.seek_back, None);
        }
    }

    #[test]
    fn rightward_velocity_raises_rate_above_baseline() {
        let cfg = Tunables::default();
        let mut m = ReactiveModulator::new(&cfg);
        let mut out = m.tick(moving(Vec2::new(0.5, 0.0), 0.8));
        for _ in 0..30 {
            out = m.tick(moving(Vec2::new(0.5, 0.0), 0.8));
        }
        assert!(out.rate > cfg.base_rate + 0.1);
        assert_eq!(out.seek_back, None);
    }

    #[test]
    fn leftward_velocity_crawls_and_seeks_back() {
        let cfg = Tunables::default();
        let mut m = ReactiveModulator::new(&cfg);
        let mut saw_seek = false;
        let mut out = m.tick(moving(Vec2::ZERO, -0.9));
        for _ in 0..30 {
            out = m.tick(moving(Vec2::ZERO, -0.9));
            if let Some(d) = out.seek_back {
                assert!(d > 0.0);
                saw_seek = true;
            }
        }
        assert!(saw_seek);
        // Rate settles toward the crawl, never negative.
        assert!(out.rate < cfg.base_rate);
        assert!(out.rate > 0.0);
    }

    #[test]
    fn dead_zone_suppresses_tiny_velocity() {
        let cfg = Tunables::default();
        let mut m = ReactiveModulator::new(&cfg);
        for _ in 0..120 {
            let out = m.tick(moving(Vec2::ZERO, cfg.velocity_dead_zone * 0.5));
            assert!((out.rate - cfg.base_rate).abs() < 1e-6);
            assert_eq!(out.seek_back, None);
        }
    }

    #[test]
    fn extreme_velocity_stays_inside_rate_band() {
        let cfg = Tunables::default();
        let mut m = ReactiveModulator::new(&cfg);
        for _ in 0..300 {
            // Way outside the sampler's clamp, fed directly.
            let out = m.tick(moving(Vec2::new(1.0, 0.0), 1000.0));
            assert!(out.rate <= cfg.max_rate + 1e-9);
            assert!(out.rate >= cfg.min_rate - 1e-9);
        }
    }

    #[test]
    fn single_impulse_decays_back_to_baseline() {
        let cfg = Tunables::default();
        let mut m = ReactiveModulator::new(&cfg);
        m.tick(moving(Vec2::ZERO, 1.0));

        let mut frames_to_settle = None;
        for frame in 0..200 {
            let out = m.tick(still());
            if (out.rate - cfg.base_rate).abs() < 1e-3
                && m.info().smoothed_velocity.abs() < 1e-3
            {
                frames_to_settle = Some(frame);
                break;
            }
        }
        assert!(
            frames_to_settle.is_some(),
            "velocity and rate must converge within 200 frames"
        );
    }

    #[test]
    fn smoothed_velocity_decays_monotonically_toward_zero() {
        let cfg = Tunables::default();
        let mut m = ReactiveModulator::new(&cfg);
        m.tick(moving(Vec2::ZERO, 1.0));
        // Let the chase reach its peak first.
        let mut prev = f32::MIN;
        let mut peaked = false;
        for _ in 0..200 {
            m.tick(still());
            let v = m.info().smoothed_velocity;
            if !peaked && v < prev {
                peaked = true;
            } else if peaked {
                assert!(v <= prev + 1e-6);
            }
            prev = v;
        }
        assert!(prev.abs() < 1e-2);
    }

    #[test]
    fn transform_follows_position_then_returns_to_identity() {
        let cfg = Tunables::default();
        let mut m = ReactiveModulator::new(&cfg);
        let corner = Vec2::new(1.0, 1.0);
        let mut out = m.tick(moving(corner, 0.0));
        for _ in 0..240 {
            out = m.tick(moving(corner, 0.0));
        }
        assert!(out.transform.rotate_y_deg > 1.0);
        assert!(out.transform.rotate_x_deg < -1.0);
        assert!(out.transform.scale > 1.01);
        assert!(out.transform.translate_x > 5.0);

        // Pointer leaves: targets go to zero, the emitted transform
        // decays through both filter stages.
        for _ in 0..600 {
            out = m.tick(moving(Vec2::ZERO, 0.0));
        }
        assert!(out.transform.rotate_x_deg.abs() < 0.05);
        assert!(out.transform.rotate_y_deg.abs() < 0.05);
        assert!((out.transform.scale - 1.0).abs() < 0.01);
        assert!(out.transform.translate_x.abs() < 0.1);
        assert!(out.transform.translate_y.abs() < 0.1);
    }

    #[test]
    fn emitted_transform_lags_its_target() {
        let cfg = Tunables::default();
        let mut m = ReactiveModulator::new(&cfg);
        let out = m.tick(moving(Vec2::new(1.0, 0.0), 0.0));
        // One frame in, the first stage has barely moved and the second
        // stage has moved even less than the first would alone.
        let single_stage = cfg.pos_lerp * cfg.translate_gain_px;
        assert!(out.transform.translate_x < single_stage);
        assert!(out.transform.translate_x > 0.0);
    }
}

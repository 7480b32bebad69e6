//! Screen-lifetime composition: one owner for the looper, the sampler,
//! and the modulator, driven by a single per-refresh callback.
//!
//! Pointer events arrive over a bounded channel (the host's input
//! thread never touches controller state). Each `frame()` drains the
//! channel in arrival order, pumps media notifications, runs one
//! modulator tick, and writes rate + transform out. Teardown pauses
//! both buffers and disconnects the channel; dropping the controller
//! does the same.

use crossbeam_channel::{Receiver, Sender};

use crate::config::Tunables;
use crate::kinematics::{PointerEvent, PointerKinematicsSampler};
use crate::looper::{LoopEvent, LoopInfo, LoopSwapController};
use crate::media::MediaHandle;
use crate::modulator::{ModulatorInfo, ReactiveModulator};
use crate::stage::Stage;

/// Pointer events queued between two frames. Only the latest values
/// matter, but draining in order keeps velocity timestamps sane.
const POINTER_QUEUE_DEPTH: usize = 64;

pub struct BackdropController<M: MediaHandle, S: Stage> {
    looper: LoopSwapController<M>,
    sampler: PointerKinematicsSampler,
    modulator: ReactiveModulator,
    stage: S,
    pointer_rx: Option<Receiver<PointerEvent>>,
}

impl<M: MediaHandle, S: Stage> BackdropController<M, S> {
    /// Construct the whole subsystem and start playback of buffer A.
    /// Returns the controller and the sender the host feeds pointer
    /// events into.
    pub fn mount(stage: S, a: M, b: M, tunables: &Tunables) -> (Self, Sender<PointerEvent>) {
        let tunables = tunables.clone().sanitized();
        let (pointer_tx, pointer_rx) = crossbeam_channel::bounded(POINTER_QUEUE_DEPTH);

        let controller = Self {
            looper: LoopSwapController::new(a, b, &tunables),
            sampler: PointerKinematicsSampler::new(stage.bounds(), &tunables),
            modulator: ReactiveModulator::new(&tunables),
            stage,
            pointer_rx: Some(pointer_rx),
        };
        log::info!("backdrop mounted");
        (controller, pointer_tx)
    }

    /// The once-per-display-refresh callback. Returns the loop
    /// transitions that fired, for observability.
    pub fn frame(&mut self) -> Vec<LoopEvent> {
        let Some(pointer_rx) = &self.pointer_rx else {
            return Vec::new();
        };

        // Strictly ordered drain; last value wins across the frame.
        self.sampler.set_bounds(self.stage.bounds());
        while let Ok(event) = pointer_rx.try_recv() {
            self.sampler.handle(event);
        }

        let events = self.looper.pump();

        let raw = self.sampler.sample();
        let out = self.modulator.tick(raw);

        if let Some(secs) = out.seek_back {
            self.looper.nudge_back(secs);
        }
        self.looper.set_rate(out.rate);
        self.stage.apply_transform(&out.transform);

        events
    }

    /// Stop playback and disconnect the pointer channel. Idempotent;
    /// also runs on drop.
    pub fn teardown(&mut self) {
        if self.pointer_rx.take().is_none() {
            return;
        }
        self.looper.halt();
        log::info!("backdrop torn down");
    }

    pub fn loop_info(&self) -> LoopInfo {
        self.looper.info()
    }

    pub fn modulator_info(&self) -> ModulatorInfo {
        self.modulator.info()
    }

    pub fn stage(&self) -> &S {
        &self.stage
    }

    /// Direct access to the owned buffers, for drivers that simulate
    /// media playback (preview binary, tests).
    pub fn looper_mut(&mut self) -> &mut LoopSwapController<M> {
        &mut self.looper
    }
}

impl<M: MediaHandle, S: Stage> Drop for BackdropController<M, S> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Tunables;
    use crate::media::{BufferId, SyntheticClip};
    use crate::stage::{Rect, RecordingStage, Transform};

    const FRAME_MS: f64 = 1000.0 / 60.0;

    fn mount() -> (
        BackdropController<SyntheticClip, RecordingStage>,
        Sender<PointerEvent>,
    ) {
        BackdropController::mount(
            RecordingStage::new(Rect::new(0.0, 0.0, 1280.0, 720.0)),
            SyntheticClip::new(Some(12.0)),
            SyntheticClip::new(Some(12.0)),
            &Tunables::default(),
        )
    }

    fn advance_media(c: &mut BackdropController<SyntheticClip, RecordingStage>) {
        for id in [BufferId::A, BufferId::B] {
            c.looper_mut().buffer_mut(id).advance(FRAME_MS / 1000.0);
        }
    }

    #[test]
    fn idle_frames_hold_baseline_and_identity() {
        let cfg = Tunables::default();
        let (mut c, _tx) = mount();
        for _ in 0..30 {
            advance_media(&mut c);
            c.frame();
        }
        let info = c.loop_info();
        assert!((info.rate - cfg.base_rate).abs() < 1e-9);
        assert_eq!(c.stage().last, Transform::IDENTITY);
        assert_eq!(c.stage().writes, 30);
    }

    #[test]
    fn pointer_sweep_raises_rate_then_decays_to_baseline() {
        let cfg = Tunables::default();
        let (mut c, tx) = mount();

        // 20 frames of steady rightward motion across the container.
        let mut t = 0.0;
        let mut x = 100.0;
        let mut peak_rate: f64 = 0.0;
        let mut peak_translate: f32 = 0.0;
        for _ in 0..20 {
            tx.send(PointerEvent::Move { x, y: 360.0, timestamp_ms: t }).unwrap();
            advance_media(&mut c);
            c.frame();
            let info = c.loop_info();
            peak_rate = peak_rate.max(info.rate);
            peak_translate = peak_translate.max(c.stage().last.translate_x.abs());
            x += 40.0;
            t += FRAME_MS;
        }
        assert!(peak_rate > cfg.base_rate, "rate must rise during motion");
        assert!(peak_translate > 0.0);

        // Pointer leaves; everything relaxes.
        tx.send(PointerEvent::Leave).unwrap();
        for _ in 0..600 {
            advance_media(&mut c);
            c.frame();
        }
        let info = c.loop_info();
        assert!((info.rate - cfg.base_rate).abs() < 1e-2);
        let t = c.stage().last;
        assert!(t.rotate_x_deg.abs() < 0.05);
        assert!(t.rotate_y_deg.abs() < 0.05);
        assert!((t.scale - 1.0).abs() < 0.01);
        assert!(t.translate_x.abs() < 0.1);
        assert!(t.translate_y.abs() < 0.1);
    }

    #[test]
    fn leftward_sweep_nudges_playback_backward() {
        let (mut c, tx) = mount();

        // Get some media time on the clock first.
        let active = c.loop_info().active;
        c.looper_mut().buffer_mut(active).set_position(5.0);

        let mut t = 0.0;
        let mut x = 1200.0;
        for _ in 0..40 {
            tx.send(PointerEvent::Move { x, y: 360.0, timestamp_ms: t }).unwrap();
            c.frame();
            x -= 30.0;
            t += FRAME_MS;
        }
        // No media advancement happened, so any position drop came from
        // rewind nudges.
        let position = c.loop_info().active_position;
        assert!(position < 5.0, "position={position}");
    }

    #[test]
    fn rate_stays_synchronized_through_a_swap() {
        let (mut c, tx) = mount();
        let mut t = 0.0;
        let mut x = 100.0;
        // Push the active buffer near its end so a swap happens while
        // the pointer keeps the rate away from baseline.
        let active = c.loop_info().active;
        c.looper_mut().buffer_mut(active).set_position(11.3);

        let mut saw_swap = false;
        for _ in 0..400 {
            tx.send(PointerEvent::Move { x, y: 200.0, timestamp_ms: t }).unwrap();
            advance_media(&mut c);
            for event in c.frame() {
                if matches!(event, LoopEvent::Swapped { .. }) {
                    saw_swap = true;
                }
            }
            let a = c.looper_mut().buffer(BufferId::A).rate();
            let b = c.looper_mut().buffer(BufferId::B).rate();
            assert_eq!(a, b, "buffer rates diverged");
            x = if x > 1200.0 { 100.0 } else { x + 25.0 };
            t += FRAME_MS;
        }
        assert!(saw_swap, "expected at least one swap");
    }

    #[test]
    fn teardown_pauses_everything_and_disconnects() {
        let (mut c, tx) = mount();
        for _ in 0..5 {
            advance_media(&mut c);
            c.frame();
        }
        c.teardown();

        assert!(!c.looper_mut().buffer(BufferId::A).is_playing());
        assert!(!c.looper_mut().buffer(BufferId::B).is_playing());
        assert!(tx.send(PointerEvent::Leave).is_err(), "channel must disconnect");

        // Frames after teardown are inert.
        let writes = c.stage().writes;
        assert!(c.frame().is_empty());
        assert_eq!(c.stage().writes, writes);

        // Idempotent.
        c.teardown();
    }
}

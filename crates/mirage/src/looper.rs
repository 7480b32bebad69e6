//! Dual-buffer seamless loop: two interchangeable media handles, one
//! active and one standby, crossfaded near end-of-media so playback
//! appears infinite.
//!
//! The controller is driven by the buffers' own notifications
//! ([`MediaEvent`]), pumped once per frame. It owns both handles and is
//! their only writer.

use crate::config::Tunables;
use crate::media::{BufferId, MediaEvent, MediaHandle, PlayOutcome};

/// Controller state. The swap itself is instantaneous: completing a
/// crossfade re-enters `Playing` with the roles exchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Active buffer advancing, standby idle at its start.
    Playing,
    /// Both buffers live, opacities diverging.
    Crossfading,
}

/// Observable transitions, for logging and the preview summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEvent {
    None,
    CrossfadeStarted {
        outgoing: BufferId,
        incoming: BufferId,
    },
    Swapped {
        new_active: BufferId,
    },
}

/// Read-only snapshot.
#[derive(Debug, Clone, Copy)]
pub struct LoopInfo {
    pub state: LoopState,
    pub active: BufferId,
    pub active_position: f64,
    pub active_opacity: f32,
    pub standby_opacity: f32,
    pub rate: f64,
}

pub struct LoopSwapController<M: MediaHandle> {
    a: M,
    b: M,
    active: BufferId,
    state: LoopState,
    rate: f64,
    crossfade_window: f64,
    swap_epsilon: f64,
    standby_start_slack: f64,
}

/// Absorbs float noise on the remaining-time comparisons so a position
/// landing exactly on the boundary still counts.
const BOUNDARY_SLACK: f64 = 1e-9;

impl<M: MediaHandle> LoopSwapController<M> {
    /// Take ownership of both buffers and start the loop: A active and
    /// playing (fire and forget), B parked at its start.
    pub fn new(mut a: M, mut b: M, tunables: &Tunables) -> Self {
        let rate = tunables.base_rate;

        a.set_opacity(1.0);
        a.set_rate(rate);
        if a.play() == PlayOutcome::Blocked {
            log::warn!("buffer A: playback blocked at mount, leaving paused");
        }

        b.pause();
        b.set_position(0.0);
        b.set_opacity(0.0);
        b.set_rate(rate);

        Self {
            a,
            b,
            active: BufferId::A,
            state: LoopState::Playing,
            rate,
            crossfade_window: tunables.crossfade_window_secs,
            swap_epsilon: tunables.swap_epsilon_secs,
            standby_start_slack: tunables.standby_start_slack_secs,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn active(&self) -> BufferId {
        self.active
    }

    pub fn buffer(&self, id: BufferId) -> &M {
        match id {
            BufferId::A => &self.a,
            BufferId::B => &self.b,
        }
    }

    pub fn buffer_mut(&mut self, id: BufferId) -> &mut M {
        match id {
            BufferId::A => &mut self.a,
            BufferId::B => &mut self.b,
        }
    }

    /// Drain both buffers' queued notifications, oldest first, and feed
    /// them through the state machine. Returns the transitions that
    /// fired this frame.
    pub fn pump(&mut self) -> Vec<LoopEvent> {
        let mut events = Vec::new();
        for id in [BufferId::A, BufferId::B] {
            while let Some(media_event) = self.buffer_mut(id).poll_event() {
                let event = match media_event {
                    MediaEvent::PositionAdvance => self.on_position_advance(id),
                    MediaEvent::PlaybackEnd => self.on_playback_end(id),
                };
                if event != LoopEvent::None {
                    events.push(event);
                }
            }
        }
        events
    }

    /// Position-update handler. Standby advances are ignored; active
    /// advances drive the crossfade threshold and completion checks.
    pub fn on_position_advance(&mut self, id: BufferId) -> LoopEvent {
        if id != self.active {
            return LoopEvent::None;
        }
        // Unknown or unbounded duration: no position-based crossfade is
        // possible, only the playback-end safety net applies.
        let Some(duration) = self.buffer(id).duration() else {
            return LoopEvent::None;
        };
        let window = self.crossfade_window.min(duration / 2.0);
        let remaining = duration - self.buffer(id).position();

        match self.state {
            LoopState::Playing => {
                if remaining > 0.0 && remaining <= window + BOUNDARY_SLACK {
                    self.begin_crossfade(window, remaining)
                } else {
                    LoopEvent::None
                }
            }
            LoopState::Crossfading => {
                if remaining <= self.swap_epsilon + BOUNDARY_SLACK {
                    self.complete_swap()
                } else {
                    self.update_opacities(window, remaining);
                    LoopEvent::None
                }
            }
        }
    }

    /// Safety net: a buffer finished playing outright (the position
    /// threshold was missed, e.g. a suspended tab). Swaps regardless of
    /// current state.
    pub fn on_playback_end(&mut self, id: BufferId) -> LoopEvent {
        if id != self.active {
            log::debug!("standby buffer {id} ended, ignoring");
            return LoopEvent::None;
        }
        log::debug!("buffer {id} reported playback end, forcing swap");
        self.complete_swap()
    }

    /// Apply one rate to both buffers. Mid-crossfade both are visible,
    /// so the rate must never diverge between them.
    pub fn set_rate(&mut self, rate: f64) {
        self.rate = rate;
        self.a.set_rate(rate);
        self.b.set_rate(rate);
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Discrete backward seek of the active buffer, clamped at 0.
    pub fn nudge_back(&mut self, secs: f64) {
        let active = self.active;
        let buffer = self.buffer_mut(active);
        let position = (buffer.position() - secs).max(0.0);
        buffer.set_position(position);
    }

    /// Stop both buffers. Used at teardown.
    pub fn halt(&mut self) {
        self.a.pause();
        self.b.pause();
    }

    pub fn info(&self) -> LoopInfo {
        let active = self.buffer(self.active);
        let standby = self.buffer(self.active.other());
        LoopInfo {
            state: self.state,
            active: self.active,
            active_position: active.position(),
            active_opacity: active.opacity(),
            standby_opacity: standby.opacity(),
            rate: self.rate,
        }
    }

    /// One-shot crossfade setup. Only reachable from `Playing`, so a
    /// burst of position updates cannot restart the standby twice.
    fn begin_crossfade(&mut self, window: f64, remaining: f64) -> LoopEvent {
        let outgoing = self.active;
        let incoming = self.active.other();

        let slack = self.standby_start_slack;
        let standby = self.buffer_mut(incoming);
        if !standby.is_playing() || standby.position() > slack {
            standby.set_position(0.0);
        }
        if !standby.is_playing() && standby.play() == PlayOutcome::Blocked {
            log::debug!("buffer {incoming}: play blocked at crossfade start");
        }

        self.state = LoopState::Crossfading;
        self.update_opacities(window, remaining);
        log::debug!("crossfade started: {outgoing} -> {incoming} ({remaining:.3}s left)");
        LoopEvent::CrossfadeStarted { outgoing, incoming }
    }

    /// Opacity ramp: active fades out exactly as the standby fades in.
    fn update_opacities(&mut self, window: f64, remaining: f64) {
        let progress = (1.0 - remaining / window).clamp(0.0, 1.0) as f32;
        let active = self.active;
        self.buffer_mut(active).set_opacity(1.0 - progress);
        self.buffer_mut(active.other()).set_opacity(progress);
    }

    /// Snap opacities, park the old active at its start, exchange roles.
    fn complete_swap(&mut self) -> LoopEvent {
        let outgoing = self.active;
        let incoming = self.active.other();

        let old = self.buffer_mut(outgoing);
        old.set_opacity(0.0);
        old.pause();
        old.set_position(0.0);

        let new = self.buffer_mut(incoming);
        new.set_opacity(1.0);
        if !new.is_playing() && new.play() == PlayOutcome::Blocked {
            log::warn!("buffer {incoming}: play blocked at swap, background will freeze");
        }

        self.active = incoming;
        self.state = LoopState::Playing;
        log::debug!("loop swap complete: {outgoing} -> {incoming}");
        LoopEvent::Swapped { new_active: incoming }
    }
}

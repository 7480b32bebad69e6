//! Deterministic in-memory media handle for the preview binary and the
//! test suite. Playback is simulated: the driver calls [`SyntheticClip::advance`]
//! with elapsed wall time and the clip moves `rate * dt` seconds of media
//! time, queueing the same notifications a real handle would raise.

use std::collections::VecDeque;

use super::{MediaEvent, MediaHandle, PlayOutcome};

#[derive(Debug)]
pub struct SyntheticClip {
    playing: bool,
    position: f64,
    duration: Option<f64>,
    rate: f64,
    opacity: f32,
    /// Simulates a platform autoplay restriction.
    block_play: bool,
    events: VecDeque<MediaEvent>,
}

impl SyntheticClip {
    pub fn new(duration: Option<f64>) -> Self {
        Self {
            playing: false,
            position: 0.0,
            duration,
            rate: 1.0,
            opacity: 1.0,
            block_play: false,
            events: VecDeque::new(),
        }
    }

    /// A clip whose `play()` is rejected, as under autoplay policies.
    pub fn blocked(duration: Option<f64>) -> Self {
        Self {
            block_play: true,
            ..Self::new(duration)
        }
    }

    /// Advance simulated playback by `dt` seconds of wall time.
    /// Reaching the end clamps, stops, and queues `PlaybackEnd` once.
    pub fn advance(&mut self, dt: f64) {
        if !self.playing || dt <= 0.0 {
            return;
        }
        self.position += self.rate * dt;
        if let Some(duration) = self.duration
            && self.position >= duration
        {
            self.position = duration;
            self.playing = false;
            self.events.push_back(MediaEvent::PositionAdvance);
            self.events.push_back(MediaEvent::PlaybackEnd);
            return;
        }
        self.events.push_back(MediaEvent::PositionAdvance);
    }
}

impl MediaHandle for SyntheticClip {
    fn play(&mut self) -> PlayOutcome {
        if self.block_play {
            return PlayOutcome::Blocked;
        }
        self.playing = true;
        PlayOutcome::Started
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn position(&self) -> f64 {
        self.position
    }

    fn set_position(&mut self, secs: f64) {
        let max = self.duration.unwrap_or(f64::INFINITY);
        self.position = secs.clamp(0.0, max);
    }

    fn duration(&self) -> Option<f64> {
        self.duration
    }

    fn rate(&self) -> f64 {
        self.rate
    }

    fn set_rate(&mut self, rate: f64) {
        self.rate = rate;
    }

    fn opacity(&self) -> f32 {
        self.opacity
    }

    fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    fn poll_event(&mut self) -> Option<MediaEvent> {
        self.events.pop_front()
    }
}

//! Tuning constants for the loop, kinematics, and modulation filters.
//!
//! Every behavioral knob lives here as a named constant, grouped into
//! [`Tunables`] so a deployment can override the defaults from a JSON
//! file without touching control flow.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Baseline playback rate when the pointer is idle.
pub const BASE_RATE: f64 = 0.55;
/// Lower clamp on the derived playback rate.
pub const MIN_RATE: f64 = 0.15;
/// Upper clamp on the derived playback rate.
pub const MAX_RATE: f64 = 3.0;
/// Trailing span of active-buffer media time over which both buffers blend.
pub const CROSSFADE_WINDOW_SECS: f64 = 0.5;
/// Remaining media time at which the crossfade snaps and roles swap.
pub const SWAP_EPSILON_SECS: f64 = 0.05;
/// A standby buffer further from its start than this gets rewound
/// before a crossfade starts.
pub const STANDBY_START_SLACK_SECS: f64 = 0.25;

/// Per-frame chase factor for the smoothed pointer position.
pub const POS_LERP: f32 = 0.035;
/// Per-frame chase factor for the smoothed velocity.
pub const VEL_LERP: f32 = 0.12;
/// Per-frame decay applied to the velocity target itself.
pub const VEL_DECAY: f32 = 0.05;
/// Per-frame chase factor for the applied playback rate.
pub const RATE_LERP: f64 = 0.18;
/// Per-frame chase factor for each transform component.
pub const TRANSFORM_LERP: f32 = 0.08;

/// Smoothed velocity magnitude below which no directional response fires.
pub const VELOCITY_DEAD_ZONE: f32 = 0.04;
/// Rate gained per unit of rightward smoothed velocity.
pub const RATE_GAIN: f64 = 2.4;
/// Forward rate held while rewind seeks are being issued.
pub const REWIND_CRAWL_RATE: f64 = 0.2;
/// Seconds seeked backward per unit of leftward smoothed velocity, per frame.
pub const REWIND_SEEK_GAIN: f64 = 0.08;

/// Minimum spacing between velocity samples; closer events update
/// position only.
pub const MIN_SAMPLE_GAP_MS: f64 = 16.0;
/// Scale from px/ms horizontal speed to the normalized velocity unit.
pub const VELOCITY_SCALE: f32 = 0.9;

/// Degrees of rotation per unit of smoothed position.
pub const ROTATE_GAIN_DEG: f32 = 3.0;
/// Extra uniform scale per unit of smoothed-position distance from center.
pub const SCALE_GAIN: f32 = 0.06;
/// Pixels of translation per unit of smoothed position.
pub const TRANSLATE_GAIN_PX: f32 = 14.0;

#[derive(Debug, Error)]
pub enum TunablesError {
    #[error("failed to read tunables file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse tunables file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// All tuning knobs in one value. `Default` mirrors the named constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tunables {
    pub base_rate: f64,
    pub min_rate: f64,
    pub max_rate: f64,
    pub crossfade_window_secs: f64,
    pub swap_epsilon_secs: f64,
    pub standby_start_slack_secs: f64,
    pub pos_lerp: f32,
    pub vel_lerp: f32,
    pub vel_decay: f32,
    pub rate_lerp: f64,
    pub transform_lerp: f32,
    pub velocity_dead_zone: f32,
    pub rate_gain: f64,
    pub rewind_crawl_rate: f64,
    pub rewind_seek_gain: f64,
    pub min_sample_gap_ms: f64,
    pub velocity_scale: f32,
    pub rotate_gain_deg: f32,
    pub scale_gain: f32,
    pub translate_gain_px: f32,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            base_rate: BASE_RATE,
            min_rate: MIN_RATE,
            max_rate: MAX_RATE,
            crossfade_window_secs: CROSSFADE_WINDOW_SECS,
            swap_epsilon_secs: SWAP_EPSILON_SECS,
            standby_start_slack_secs: STANDBY_START_SLACK_SECS,
            pos_lerp: POS_LERP,
            vel_lerp: VEL_LERP,
            vel_decay: VEL_DECAY,
            rate_lerp: RATE_LERP,
            transform_lerp: TRANSFORM_LERP,
            velocity_dead_zone: VELOCITY_DEAD_ZONE,
            rate_gain: RATE_GAIN,
            rewind_crawl_rate: REWIND_CRAWL_RATE,
            rewind_seek_gain: REWIND_SEEK_GAIN,
            min_sample_gap_ms: MIN_SAMPLE_GAP_MS,
            velocity_scale: VELOCITY_SCALE,
            rotate_gain_deg: ROTATE_GAIN_DEG,
            scale_gain: SCALE_GAIN,
            translate_gain_px: TRANSLATE_GAIN_PX,
        }
    }
}

impl Tunables {
    /// Load from the default config path, falling back to defaults on
    /// any failure. A missing or unreadable file is not an error.
    pub fn load() -> Self {
        let Some(config_dir) = dirs::config_dir() else {
            return Self::default();
        };
        let path = config_dir.join("mirage").join("tunables.json");
        match Self::load_path(&path) {
            Ok(t) => t,
            Err(TunablesError::Io(_)) => Self::default(),
            Err(e) => {
                log::warn!("ignoring malformed tunables at {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Load from an explicit path. Values are sanitized after parsing.
    pub fn load_path(path: &Path) -> Result<Self, TunablesError> {
        let json = std::fs::read_to_string(path)?;
        let parsed: Self = serde_json::from_str(&json)?;
        Ok(parsed.sanitized())
    }

    pub fn save(&self) {
        let Some(config_dir) = dirs::config_dir() else {
            return;
        };
        let dir = config_dir.join("mirage");
        let _ = std::fs::create_dir_all(&dir);
        let path = dir.join("tunables.json");
        if let Ok(json) = serde_json::to_string_pretty(self) {
            let _ = std::fs::write(path, json);
        }
    }

    /// Clamp every knob into a range the control loop can tolerate.
    /// An inverted rate band collapses onto the baseline.
    pub fn sanitized(mut self) -> Self {
        self.base_rate = self.base_rate.clamp(0.01, 16.0);
        if self.min_rate > self.max_rate {
            self.min_rate = self.base_rate;
            self.max_rate = self.base_rate;
        }
        self.min_rate = self.min_rate.clamp(0.01, 16.0);
        self.max_rate = self.max_rate.clamp(self.min_rate, 16.0);
        self.crossfade_window_secs = self.crossfade_window_secs.max(0.01);
        self.swap_epsilon_secs = self
            .swap_epsilon_secs
            .clamp(0.0, self.crossfade_window_secs);
        self.standby_start_slack_secs = self.standby_start_slack_secs.max(0.0);
        self.pos_lerp = self.pos_lerp.clamp(0.0, 1.0);
        self.vel_lerp = self.vel_lerp.clamp(0.0, 1.0);
        self.vel_decay = self.vel_decay.clamp(0.0, 1.0);
        self.rate_lerp = self.rate_lerp.clamp(0.0, 1.0);
        self.transform_lerp = self.transform_lerp.clamp(0.0, 1.0);
        self.velocity_dead_zone = self.velocity_dead_zone.clamp(0.0, 1.0);
        self.min_sample_gap_ms = self.min_sample_gap_ms.max(0.0);
        self
    }
}

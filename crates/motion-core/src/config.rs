//! Tuning parameters for the rig engines.
//!
//! Every field has a default, so a tuning file only needs to name the
//! values it overrides.

use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use mimic_common::{MimicError, MimicResult};
use mimic_rig_model::TimingMode;

/// Eye and neck gaze tuning. Angles are degrees, speeds degrees per second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GazeConfig {
    /// Linear angular speed of the eyes.
    pub eyes_rot_speed: f32,

    /// Eye yaw the eyes absorb before the neck takes over.
    pub eyes_max_yaw: f32,

    /// Eye pitch the eyes absorb before the neck takes over.
    pub eyes_max_pitch: f32,

    pub neck_max_pitch: f32,
    pub neck_min_pitch: f32,
    pub neck_max_yaw: f32,
    pub neck_min_yaw: f32,

    /// Time the neck takes to absorb an eye overflow.
    pub neck_rot_time: f32,

    /// Cap on the neck's angular speed.
    pub neck_rot_max_speed: f32,

    /// Weight of the pull back to a straight neck, in `(0, 1]`.
    pub neck_rest_tendency_strength: f32,

    /// Whether eye overflow turns the neck.
    pub enable_neck_rotation: bool,

    /// Horizontal-plane normal of the rest pose.
    pub up: [f32; 3],

    /// Angle deltas below this are treated as zero.
    pub delta_epsilon: f32,
}

impl Default for GazeConfig {
    fn default() -> Self {
        Self {
            eyes_rot_speed: 1000.0,
            eyes_max_yaw: 30.0,
            eyes_max_pitch: 12.0,
            neck_max_pitch: 45.0,
            neck_min_pitch: -40.0,
            neck_max_yaw: 60.0,
            neck_min_yaw: -60.0,
            neck_rot_time: 0.1,
            neck_rot_max_speed: 135.0,
            neck_rest_tendency_strength: 0.25,
            enable_neck_rotation: true,
            up: [0.0, 1.0, 0.0],
            delta_epsilon: 1e-4,
        }
    }
}

impl GazeConfig {
    pub fn up_vector(&self) -> Vec3 {
        Vec3::from_array(self.up)
    }

    pub fn validate(&self) -> MimicResult<()> {
        positive("gaze.eyes_rot_speed", self.eyes_rot_speed)?;
        positive("gaze.eyes_max_yaw", self.eyes_max_yaw)?;
        positive("gaze.eyes_max_pitch", self.eyes_max_pitch)?;
        positive("gaze.neck_max_pitch", self.neck_max_pitch)?;
        positive("gaze.neck_max_yaw", self.neck_max_yaw)?;
        negative("gaze.neck_min_pitch", self.neck_min_pitch)?;
        negative("gaze.neck_min_yaw", self.neck_min_yaw)?;
        positive("gaze.neck_rot_time", self.neck_rot_time)?;
        positive("gaze.neck_rot_max_speed", self.neck_rot_max_speed)?;

        let strength = self.neck_rest_tendency_strength;
        if !(strength > 0.0 && strength <= 1.0) {
            return Err(MimicError::config(format!(
                "gaze.neck_rest_tendency_strength must be in (0, 1], got {strength}"
            )));
        }
        if !(self.delta_epsilon >= 0.0) {
            return Err(MimicError::config("gaze.delta_epsilon must be non-negative"));
        }
        if self.up_vector().length_squared() < 1e-12 {
            return Err(MimicError::config("gaze.up must be a non-zero vector"));
        }
        Ok(())
    }
}

/// Blink cycle tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlinkConfig {
    /// Eyelid closing rate (weight per second).
    pub close_speed: f32,

    /// Eyelid opening rate (weight per second).
    pub open_speed: f32,

    /// Shortest pause between blinks (seconds).
    pub min_delay_secs: f32,

    /// Longest pause between blinks (seconds).
    pub max_delay_secs: f32,

    /// Number of eyelid channels the weight is broadcast to.
    pub channels: usize,

    /// Blink on a timer. When false, blinks only happen on request.
    pub automatic: bool,
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            close_speed: 8.0,
            open_speed: 10.0,
            min_delay_secs: 4.0,
            max_delay_secs: 8.0,
            channels: 2,
            automatic: true,
        }
    }
}

impl BlinkConfig {
    /// Schedule blinks every `average_secs`, give or take `width` of it
    /// (`0.5` = ±50%).
    pub fn around(average_secs: f32, width: f32) -> Self {
        let width = width.clamp(0.0, 1.0);
        Self {
            min_delay_secs: average_secs * (1.0 - width),
            max_delay_secs: average_secs * (1.0 + width),
            ..Self::default()
        }
    }

    pub fn average_interval_secs(&self) -> f32 {
        (self.min_delay_secs + self.max_delay_secs) * 0.5
    }

    /// Half-range of the delay relative to the average.
    pub fn interval_width(&self) -> f32 {
        let sum = self.min_delay_secs + self.max_delay_secs;
        if sum > 0.0 {
            (self.max_delay_secs - self.min_delay_secs) / sum
        } else {
            0.0
        }
    }

    pub fn validate(&self) -> MimicResult<()> {
        positive("blink.close_speed", self.close_speed)?;
        positive("blink.open_speed", self.open_speed)?;
        if !(self.min_delay_secs >= 0.0) {
            return Err(MimicError::config("blink.min_delay_secs must be non-negative"));
        }
        if !(self.max_delay_secs >= self.min_delay_secs) {
            return Err(MimicError::config(format!(
                "blink.max_delay_secs ({}) is below blink.min_delay_secs ({})",
                self.max_delay_secs, self.min_delay_secs
            )));
        }
        if self.channels == 0 {
            return Err(MimicError::config("blink.channels must be at least 1"));
        }
        Ok(())
    }
}

/// Speech viseme sequencing tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    /// Fraction of a viseme's duration spent ramping it up.
    pub ramp_up_proportion: f32,

    pub min_ramp_speed: f32,
    pub max_ramp_speed: f32,

    /// Ramp-down speed as a multiple of the ramp-up speed.
    pub ramp_down_proportion: f32,

    /// Ramp speeds before the first viseme of an utterance.
    pub initial_ramp_up_speed: f32,
    pub initial_ramp_down_speed: f32,

    /// Lookahead so shapes form before the nominal phoneme boundary.
    pub anticipation_secs: f32,

    /// Duration assumed for the final viseme.
    pub default_viseme_duration_secs: f32,

    /// Time after the last timestamp before playback counts as finished.
    pub end_grace_secs: f32,

    /// Interpretation of the durations report time field.
    pub timing: TimingMode,

    /// Custom viseme set (JSON). `None` uses the built-in set.
    pub visemes: Option<PathBuf>,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            ramp_up_proportion: 0.5,
            min_ramp_speed: 8.0,
            max_ramp_speed: 12.0,
            ramp_down_proportion: 1.5,
            initial_ramp_up_speed: 10.0,
            initial_ramp_down_speed: 15.0,
            anticipation_secs: 0.3,
            default_viseme_duration_secs: 0.2,
            end_grace_secs: 1.0,
            timing: TimingMode::Cumulative,
            visemes: None,
        }
    }
}

impl SequencerConfig {
    pub fn validate(&self) -> MimicResult<()> {
        positive("speech.ramp_up_proportion", self.ramp_up_proportion)?;
        positive("speech.min_ramp_speed", self.min_ramp_speed)?;
        positive("speech.ramp_down_proportion", self.ramp_down_proportion)?;
        positive("speech.initial_ramp_up_speed", self.initial_ramp_up_speed)?;
        positive("speech.initial_ramp_down_speed", self.initial_ramp_down_speed)?;
        positive(
            "speech.default_viseme_duration_secs",
            self.default_viseme_duration_secs,
        )?;
        if !(self.max_ramp_speed >= self.min_ramp_speed) {
            return Err(MimicError::config(format!(
                "speech.max_ramp_speed ({}) is below speech.min_ramp_speed ({})",
                self.max_ramp_speed, self.min_ramp_speed
            )));
        }
        if !(self.anticipation_secs >= 0.0) {
            return Err(MimicError::config("speech.anticipation_secs must be non-negative"));
        }
        if !(self.end_grace_secs >= 0.0) {
            return Err(MimicError::config("speech.end_grace_secs must be non-negative"));
        }
        Ok(())
    }
}

/// How weights are handed to the host mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Host blend-shape range (e.g. 100 for a 0-100 mesh).
    pub blendshape_range: f32,

    /// Articulation multiplier for mouth weights.
    pub mouth_gain: f32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            blendshape_range: 100.0,
            mouth_gain: 1.0,
        }
    }
}

/// Complete rig tuning file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    pub gaze: GazeConfig,
    pub blink: BlinkConfig,
    pub speech: SequencerConfig,
    pub output: OutputConfig,
}

impl RigConfig {
    /// Load and validate a tuning file.
    pub fn load(path: &Path) -> MimicResult<Self> {
        if !path.exists() {
            return Err(MimicError::file_not_found(path));
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded rig config");
        Ok(config)
    }

    pub fn validate(&self) -> MimicResult<()> {
        self.gaze.validate()?;
        self.blink.validate()?;
        self.speech.validate()?;
        positive("output.blendshape_range", self.output.blendshape_range)?;
        if !(self.output.mouth_gain >= 0.0) {
            return Err(MimicError::config("output.mouth_gain must be non-negative"));
        }
        Ok(())
    }
}

fn positive(name: &str, value: f32) -> MimicResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(MimicError::config(format!("{name} must be positive, got {value}")))
    }
}

fn negative(name: &str, value: f32) -> MimicResult<()> {
    if value < 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(MimicError::config(format!("{name} must be negative, got {value}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(RigConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: RigConfig = serde_json::from_str(
            r#"{"gaze":{"eyes_rot_speed":500},"speech":{"timing":"segment"}}"#,
        )
        .unwrap();
        assert_eq!(config.gaze.eyes_rot_speed, 500.0);
        assert_eq!(config.gaze.eyes_max_yaw, 30.0);
        assert_eq!(config.speech.timing, TimingMode::Segment);
        assert_eq!(config.blink, BlinkConfig::default());
        assert_eq!(config.output.blendshape_range, 100.0);
    }

    #[test]
    fn test_inconsistent_values_are_rejected() {
        let mut config = RigConfig::default();
        config.blink.min_delay_secs = 9.0;
        assert!(matches!(config.validate(), Err(MimicError::Config { .. })));

        let mut config = RigConfig::default();
        config.gaze.neck_min_yaw = 10.0;
        assert!(config.validate().is_err());

        let mut config = RigConfig::default();
        config.gaze.neck_rest_tendency_strength = 1.5;
        assert!(config.validate().is_err());

        let mut config = RigConfig::default();
        config.blink.channels = 0;
        assert!(config.validate().is_err());

        let mut config = RigConfig::default();
        config.speech.min_ramp_speed = 20.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blink_schedule_around_average() {
        let config = BlinkConfig::around(6.0, 0.5);
        assert_eq!(config.min_delay_secs, 3.0);
        assert_eq!(config.max_delay_secs, 9.0);
        assert_eq!(config.average_interval_secs(), 6.0);
        assert!((config.interval_width() - 0.5).abs() < 1e-6);

        // Defaults are 6 s +/- a third
        let default = BlinkConfig::default();
        assert_eq!(default.average_interval_secs(), 6.0);
        assert!((default.interval_width() - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join("mimic-rig-config-missing.json");
        assert!(matches!(
            RigConfig::load(&path),
            Err(MimicError::FileNotFound { .. })
        ));
    }
}

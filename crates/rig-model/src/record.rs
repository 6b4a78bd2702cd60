//! Per-frame rig output records.
//!
//! A recording is JSONL: a `#`-prefixed header line carrying
//! [`RecordingHeader`], then one [`RigFrame`] object per line.

use serde::{Deserialize, Serialize};

/// Current schema version of the JSONL recording format.
pub const RECORDING_SCHEMA_VERSION: &str = "1.0";

/// Everything the host applies for one frame. Weights are in `[0, 1]`
/// unless the frame was produced by [`RigFrame::scaled`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigFrame {
    /// Clock reading (seconds) the frame was computed for.
    #[serde(rename = "t")]
    pub time_secs: f32,

    /// Eye-direction weights, ordered as `EYE_GAZE_CHANNELS`.
    pub eyes: [f32; 4],

    /// New neck local rotation as `[x, y, z, w]`, or `None` when neck
    /// rotation is disabled and the host keeps its current rotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neck: Option<[f32; 4]>,

    /// Eyelid closure weights, one per configured eyelid channel.
    pub eyelids: Vec<f32>,

    /// Mouth viseme weights, ordered as the rig's viseme set.
    pub mouth: Vec<f32>,

    /// Whether an utterance is being played back.
    pub speaking: bool,
}

impl RigFrame {
    /// Eyelid weight (all channels carry the same value).
    pub fn blink(&self) -> f32 {
        self.eyelids.first().copied().unwrap_or(0.0)
    }

    /// Convert to the host's blend-shape range. `mouth_gain` amplifies or
    /// attenuates articulation; scaled mouth weights never exceed `range`.
    pub fn scaled(&self, range: f32, mouth_gain: f32) -> RigFrame {
        let scale = |w: f32| w * range;
        RigFrame {
            time_secs: self.time_secs,
            eyes: self.eyes.map(scale),
            neck: self.neck,
            eyelids: self.eyelids.iter().copied().map(scale).collect(),
            mouth: self
                .mouth
                .iter()
                .map(|w| (w * mouth_gain).clamp(0.0, 1.0) * range)
                .collect(),
            speaking: self.speaking,
        }
    }
}

/// Metadata written at the top of a recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingHeader {
    /// Schema version for forward compatibility.
    pub schema_version: String,

    /// Wall-clock time at recording start (ISO 8601).
    pub epoch_wall: String,

    /// Nominal frame rate of the host loop.
    pub fps: u32,

    /// Blend-shape range weights were scaled to (1.0 = unscaled).
    #[serde(default = "default_range")]
    pub blendshape_range: f32,

    pub eye_channels: Vec<String>,
    pub eyelid_channels: Vec<String>,
    pub mouth_channels: Vec<String>,
}

fn default_range() -> f32 {
    1.0
}

/// Render the header as a comment line (no trailing newline).
pub fn header_line(header: &RecordingHeader) -> Result<String, serde_json::Error> {
    Ok(format!("# {}", serde_json::to_string(header)?))
}

/// Parse the header from a recording, if its first non-empty line carries one.
pub fn parse_header(jsonl: &str) -> Option<RecordingHeader> {
    let first = jsonl.lines().map(str::trim).find(|l| !l.is_empty())?;
    let json = first.strip_prefix('#')?.trim();
    serde_json::from_str(json).ok()
}

/// Parse frames from JSONL content (one JSON object per line).
pub fn parse_frames(jsonl: &str) -> Result<Vec<RigFrame>, serde_json::Error> {
    jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}

/// Serialize frames to JSONL format.
pub fn serialize_frames(frames: &[RigFrame]) -> Result<String, serde_json::Error> {
    let mut output = String::new();
    for frame in frames {
        output.push_str(&serde_json::to_string(frame)?);
        output.push('\n');
    }
    Ok(output)
}

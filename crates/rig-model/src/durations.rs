//! Parser for TTS "realized durations" reports.
//!
//! One phoneme per line, three whitespace-separated fields:
//!
//! ```text
//! #
//! 0.095 125 _
//! 0.180 125 h
//! 0.245 125 @
//! ```
//!
//! Field 0 is the phoneme's time in seconds, field 1 is ignored, field 2
//! is the phoneme symbol. Blank lines and `#` comments are skipped.

use serde::{Deserialize, Serialize};

use mimic_common::{MimicError, MimicResult};

/// Fields expected on every data line.
const FIELDS_PER_LINE: usize = 3;

/// One parsed line of a durations report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhonemeSegment {
    /// Time in seconds (cumulative end time, or segment length; see
    /// [`crate::timeline::TimingMode`]).
    pub time_secs: f32,
    /// Phoneme symbol as emitted by the TTS engine.
    pub phoneme: String,
}

impl PhonemeSegment {
    pub fn new(time_secs: f32, phoneme: impl Into<String>) -> Self {
        Self {
            time_secs,
            phoneme: phoneme.into(),
        }
    }
}

/// Parse a full report. All-or-nothing: the first malformed line fails the
/// whole parse.
pub fn parse_realized_durations(report: &str) -> MimicResult<Vec<PhonemeSegment>> {
    let mut segments = Vec::new();

    for (idx, raw) in report.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != FIELDS_PER_LINE {
            return Err(MimicError::parse(
                line_no,
                format!(
                    "expected {FIELDS_PER_LINE} fields, found {}: '{line}'",
                    fields.len()
                ),
            ));
        }

        let time_secs: f32 = fields[0].parse().map_err(|_| {
            MimicError::parse(line_no, format!("invalid time value '{}'", fields[0]))
        })?;
        if !time_secs.is_finite() {
            return Err(MimicError::parse(
                line_no,
                format!("time value '{}' is not finite", fields[0]),
            ));
        }

        segments.push(PhonemeSegment::new(time_secs, fields[2]));
    }

    tracing::debug!(phonemes = segments.len(), "Parsed realized durations");
    Ok(segments)
}

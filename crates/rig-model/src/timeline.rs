//! Speech timelines: a parsed utterance resolved against a viseme set.

use serde::{Deserialize, Serialize};

use mimic_common::MimicResult;

use crate::durations::{parse_realized_durations, PhonemeSegment};
use crate::viseme::{MouthShape, VisemeSet};

/// How the time field of a durations report is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingMode {
    /// Each value is already the cumulative time of the phoneme boundary.
    #[default]
    Cumulative,
    /// Each value is the length of its own segment; timestamps are the
    /// running sum.
    Segment,
}

/// One timed mouth shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// Cumulative time (seconds from utterance start).
    pub time_secs: f32,
    /// Source phoneme symbol.
    pub phoneme: String,
    /// Resolved mouth shape.
    pub shape: MouthShape,
}

/// An immutable, ordered utterance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeechTimeline {
    entries: Vec<TimelineEntry>,
}

impl SpeechTimeline {
    /// Resolve parsed segments against `visemes`.
    pub fn from_segments(
        segments: &[PhonemeSegment],
        visemes: &VisemeSet,
        timing: TimingMode,
    ) -> Self {
        let mut running = 0.0f32;
        let entries = segments
            .iter()
            .map(|segment| {
                let time_secs = match timing {
                    TimingMode::Cumulative => segment.time_secs,
                    TimingMode::Segment => {
                        running += segment.time_secs;
                        running
                    }
                };
                let shape = visemes.shape_for(&segment.phoneme);
                tracing::trace!(
                    phoneme = %segment.phoneme,
                    viseme = visemes.shape_label(shape),
                    time_secs,
                    "Mapped phoneme"
                );
                TimelineEntry {
                    time_secs,
                    phoneme: segment.phoneme.clone(),
                    shape,
                }
            })
            .collect();

        Self { entries }
    }

    /// Parse a durations report and resolve it in one step.
    pub fn from_report(report: &str, visemes: &VisemeSet, timing: TimingMode) -> MimicResult<Self> {
        let segments = parse_realized_durations(report)?;
        Ok(Self::from_segments(&segments, visemes, timing))
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&TimelineEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Timestamp of the final entry, 0 for an empty timeline.
    pub fn last_time(&self) -> f32 {
        self.entries.last().map(|e| e.time_secs).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_report_maps_visemes() {
        let set = VisemeSet::builtin();
        let timeline =
            SpeechTimeline::from_report("0.10 x a\n0.25 x b\n0.40 x _\n", set, TimingMode::Cumulative)
                .unwrap();

        assert_eq!(timeline.len(), 3);
        assert_eq!(
            timeline.entries()[0].shape,
            MouthShape::Channel(set.channel_index("phoneme_a_01").unwrap())
        );
        assert_eq!(
            timeline.entries()[1].shape,
            MouthShape::Channel(set.channel_index("phoneme_b_02").unwrap())
        );
        assert_eq!(timeline.entries()[2].shape, MouthShape::Silence);
        assert!((timeline.last_time() - 0.40).abs() < 1e-6);
    }

    #[test]
    fn test_segment_timing_accumulates() {
        let segments = vec![
            PhonemeSegment::new(0.1, "a"),
            PhonemeSegment::new(0.15, "m"),
            PhonemeSegment::new(0.2, "_"),
        ];
        let timeline =
            SpeechTimeline::from_segments(&segments, VisemeSet::builtin(), TimingMode::Segment);
        let times: Vec<f32> = timeline.entries().iter().map(|e| e.time_secs).collect();
        assert!((times[0] - 0.1).abs() < 1e-6);
        assert!((times[1] - 0.25).abs() < 1e-6);
        assert!((times[2] - 0.45).abs() < 1e-6);
    }

    #[test]
    fn test_empty_timeline() {
        let timeline = SpeechTimeline::default();
        assert!(timeline.is_empty());
        assert_eq!(timeline.last_time(), 0.0);
        assert!(timeline.get(0).is_none());
    }
}

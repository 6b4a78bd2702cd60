//! Speech viseme sequencing.
//!
//! The sequencer walks a [`SpeechTimeline`] against the clock and ramps
//! mouth weights toward the active viseme. A timeline can be published from
//! another task through a [`TimelineLoader`]; the sequencer picks it up on
//! its next update, so the per-frame path never holds the lock while it
//! moves weights.

use std::sync::Arc;

use parking_lot::Mutex;

use mimic_common::{MimicError, MimicResult};
use mimic_rig_model::{
    parse_realized_durations, MouthShape, PhonemeSegment, SpeechTimeline, TimingMode, VisemeSet,
};

use crate::config::SequencerConfig;
use crate::ramp::ramp_weight;

#[derive(Debug, Default)]
struct Published {
    generation: u64,
    timeline: Option<Arc<SpeechTimeline>>,
}

/// Cloneable handle for replacing the sequencer's timeline from any thread.
///
/// Reports are parsed before the lock is taken, and a report that fails to
/// parse publishes nothing.
#[derive(Debug, Clone)]
pub struct TimelineLoader {
    published: Arc<Mutex<Published>>,
    visemes: Arc<VisemeSet>,
    timing: TimingMode,
}

impl TimelineLoader {
    fn new(visemes: Arc<VisemeSet>, timing: TimingMode) -> Self {
        Self {
            published: Arc::new(Mutex::new(Published::default())),
            visemes,
            timing,
        }
    }

    /// Parse a realized-durations report and publish it.
    pub fn load_report(&self, report: &str) -> MimicResult<Arc<SpeechTimeline>> {
        let segments = parse_realized_durations(report)?;
        Ok(self.load_segments(&segments))
    }

    /// Resolve parsed segments and publish them.
    pub fn load_segments(&self, segments: &[PhonemeSegment]) -> Arc<SpeechTimeline> {
        let timeline = SpeechTimeline::from_segments(segments, &self.visemes, self.timing);
        self.publish(timeline)
    }

    /// Publish an already resolved timeline.
    pub fn publish(&self, timeline: SpeechTimeline) -> Arc<SpeechTimeline> {
        let timeline = Arc::new(timeline);
        let mut published = self.published.lock();
        published.generation += 1;
        published.timeline = Some(Arc::clone(&timeline));
        tracing::debug!(
            phonemes = timeline.len(),
            generation = published.generation,
            "Speech timeline loaded"
        );
        timeline
    }

    /// Number of timelines published so far.
    pub fn generation(&self) -> u64 {
        self.published.lock().generation
    }

    pub fn visemes(&self) -> &VisemeSet {
        &self.visemes
    }

    fn snapshot(&self) -> (u64, Option<Arc<SpeechTimeline>>) {
        let published = self.published.lock();
        (published.generation, published.timeline.clone())
    }
}

/// Drives the mouth viseme channels from a speech timeline.
#[derive(Debug)]
pub struct SpeechVisemeSequencer {
    config: SequencerConfig,
    loader: TimelineLoader,
    generation: u64,
    timeline: Option<Arc<SpeechTimeline>>,
    ready: bool,
    last_time: Option<f32>,
    start_time: f32,
    position: usize,
    active: MouthShape,
    ramp_up_speed: f32,
    ramp_down_speed: f32,
}

impl SpeechVisemeSequencer {
    /// Sequencer over the built-in viseme set.
    pub fn new(config: SequencerConfig) -> MimicResult<Self> {
        Self::with_visemes(config, VisemeSet::shared_builtin())
    }

    pub fn with_visemes(config: SequencerConfig, visemes: Arc<VisemeSet>) -> MimicResult<Self> {
        config.validate()?;
        Ok(Self {
            loader: TimelineLoader::new(visemes, config.timing),
            ramp_up_speed: config.initial_ramp_up_speed,
            ramp_down_speed: config.initial_ramp_down_speed,
            config,
            generation: 0,
            timeline: None,
            ready: false,
            last_time: None,
            start_time: 0.0,
            position: 0,
            active: MouthShape::Silence,
        })
    }

    /// Handle for publishing timelines from elsewhere.
    pub fn loader(&self) -> TimelineLoader {
        self.loader.clone()
    }

    /// Load an utterance and arm playback from its start.
    pub fn load_timeline(&mut self, segments: &[PhonemeSegment]) {
        self.loader.load_segments(segments);
        self.sync_timeline();
    }

    /// Parse and load a realized-durations report. On a parse error the
    /// previous timeline stays loaded.
    pub fn load_report(&mut self, report: &str) -> MimicResult<()> {
        self.loader.load_report(report)?;
        self.sync_timeline();
        Ok(())
    }

    /// Rewind to replay the loaded timeline.
    pub fn reset_timers(&mut self) {
        self.last_time = None;
        self.start_time = 0.0;
        self.position = 0;
        self.active = MouthShape::Silence;
        self.ramp_up_speed = self.config.initial_ramp_up_speed;
        self.ramp_down_speed = self.config.initial_ramp_down_speed;
        self.ready = self.timeline.is_some();
    }

    /// Stop playback; updates leave the weights alone until new speech is
    /// loaded or the timers are reset.
    pub fn stop_sequencer(&mut self) {
        if self.ready {
            tracing::debug!(position = self.position, "Sequencer stopped");
        }
        self.ready = false;
    }

    pub fn is_speaking(&self) -> bool {
        self.ready
    }

    pub fn timeline(&self) -> Option<&SpeechTimeline> {
        self.timeline.as_deref()
    }

    pub fn active_shape(&self) -> MouthShape {
        self.active
    }

    /// Index of the next timeline entry to activate.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn visemes(&self) -> &VisemeSet {
        self.loader.visemes()
    }

    pub fn channel_count(&self) -> usize {
        self.visemes().channel_count()
    }

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    /// Advance to clock reading `now`, moving `weights` toward the active
    /// viseme.
    ///
    /// `weights` must have one entry per channel of the viseme set. The first
    /// update after a load only marks the utterance start.
    pub fn update(&mut self, now: f32, weights: &mut [f32]) -> MimicResult<()> {
        let expected = self.channel_count();
        if weights.len() != expected {
            return Err(MimicError::invalid_argument(format!(
                "viseme buffer has {} channels, expected {expected}",
                weights.len()
            )));
        }

        self.sync_timeline();
        if !self.ready {
            return Ok(());
        }
        let Some(timeline) = self.timeline.clone() else {
            self.ready = false;
            return Ok(());
        };

        let Some(last) = self.last_time.replace(now) else {
            self.start_time = now;
            self.position = 0;
            return Ok(());
        };
        let dt = (now - last).max(0.0);
        let elapsed = now - self.start_time + self.config.anticipation_secs;

        if self.position < timeline.len() {
            self.advance(&timeline, elapsed);
        } else {
            self.active = MouthShape::Silence;
            if elapsed > timeline.last_time() + self.config.end_grace_secs {
                self.ready = false;
                tracing::debug!(elapsed, "Utterance finished");
            }
        }

        let active = self.active.channel();
        for (i, weight) in weights.iter_mut().enumerate() {
            *weight = ramp_weight(
                *weight,
                active == Some(i),
                self.ramp_up_speed,
                self.ramp_down_speed,
                dt,
            );
        }
        Ok(())
    }

    /// Activate every entry whose timestamp `elapsed` has reached.
    fn advance(&mut self, timeline: &SpeechTimeline, elapsed: f32) {
        let entries = timeline.entries();
        while let Some(entry) = entries.get(self.position) {
            if elapsed < entry.time_secs {
                break;
            }
            self.position += 1;
            self.active = entry.shape;

            let duration = entries
                .get(self.position)
                .map(|next| next.time_secs - entry.time_secs)
                .unwrap_or(self.config.default_viseme_duration_secs);
            self.ramp_up_speed = (1.0 / (duration * self.config.ramp_up_proportion))
                .clamp(self.config.min_ramp_speed, self.config.max_ramp_speed);
            self.ramp_down_speed = self.ramp_up_speed * self.config.ramp_down_proportion;

            tracing::trace!(
                phoneme = %entry.phoneme,
                viseme = self.visemes().shape_label(entry.shape),
                elapsed,
                ramp_up = self.ramp_up_speed,
                "Viseme switch"
            );
        }
    }

    /// Adopt a newly published timeline, restarting playback.
    fn sync_timeline(&mut self) {
        let (generation, timeline) = self.loader.snapshot();
        if generation == self.generation {
            return;
        }
        self.generation = generation;
        self.timeline = timeline;
        self.reset_timers();
    }
}

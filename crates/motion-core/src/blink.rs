//! Eyelid blink cycle.
//!
//! `Waiting → Closing → Opening → Waiting`. The pause before each blink is
//! drawn uniformly from `[min_delay, max_delay)` when the cycle returns to
//! `Waiting`; the first blink fires on the first eligible frame.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use mimic_common::{MimicError, MimicResult};

use crate::config::BlinkConfig;

/// Phase of the blink cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlinkPhase {
    Waiting,
    Closing,
    Opening,
}

/// Blink timer producing one eyelid weight broadcast to every channel.
///
/// The random source is injected so runs can be replayed from a seed.
#[derive(Debug, Clone)]
pub struct Blinker<R: Rng = StdRng> {
    config: BlinkConfig,
    rng: R,
    phase: BlinkPhase,
    weight: f32,
    last_time: Option<f32>,
    next_blink_time: f32,
}

impl Blinker<StdRng> {
    /// Blinker seeded from OS entropy.
    pub fn new(config: BlinkConfig) -> MimicResult<Self> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn seeded(config: BlinkConfig, seed: u64) -> MimicResult<Self> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Blinker<R> {
    pub fn with_rng(config: BlinkConfig, rng: R) -> MimicResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            rng,
            phase: BlinkPhase::Waiting,
            weight: 0.0,
            last_time: None,
            next_blink_time: 0.0,
        })
    }

    /// Advance to clock reading `now` and return the eyelid weight.
    ///
    /// The first call only records `now`. A reading earlier than the
    /// previous one is treated as no elapsed time.
    pub fn update(&mut self, now: f32) -> f32 {
        let Some(last) = self.last_time.replace(now) else {
            return self.weight;
        };
        let dt = (now - last).max(0.0);

        match self.phase {
            BlinkPhase::Waiting => {
                if self.config.automatic && now >= self.next_blink_time {
                    self.enter(BlinkPhase::Closing, now);
                }
            }
            BlinkPhase::Closing => {
                self.weight += self.config.close_speed * dt;
                if self.weight >= 1.0 {
                    self.weight = 1.0;
                    self.enter(BlinkPhase::Opening, now);
                }
            }
            BlinkPhase::Opening => {
                self.weight -= self.config.open_speed * dt;
                if self.weight <= 0.0 {
                    self.weight = 0.0;
                    self.next_blink_time = now + self.draw_delay();
                    self.enter(BlinkPhase::Waiting, now);
                }
            }
        }

        self.weight
    }

    /// Start a blink now, unless one is already under way.
    pub fn blink(&mut self) -> bool {
        if self.phase != BlinkPhase::Waiting {
            return false;
        }
        tracing::debug!("Blink requested");
        let now = self.last_time.unwrap_or(0.0);
        self.enter(BlinkPhase::Closing, now);
        true
    }

    /// Write the current weight to every eyelid channel.
    pub fn write_channels(&self, out: &mut [f32]) -> MimicResult<()> {
        if out.len() != self.config.channels {
            return Err(MimicError::invalid_argument(format!(
                "eyelid buffer has {} channels, expected {}",
                out.len(),
                self.config.channels
            )));
        }
        out.fill(self.weight);
        Ok(())
    }

    pub fn phase(&self) -> BlinkPhase {
        self.phase
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn next_blink_time(&self) -> f32 {
        self.next_blink_time
    }

    pub fn channel_count(&self) -> usize {
        self.config.channels
    }

    pub fn config(&self) -> &BlinkConfig {
        &self.config
    }

    pub fn set_automatic(&mut self, automatic: bool) {
        self.config.automatic = automatic;
    }

    pub fn is_automatic(&self) -> bool {
        self.config.automatic
    }

    /// Replace the delay range. Takes effect from the next drawn delay.
    pub fn set_delay_range(&mut self, min_secs: f32, max_secs: f32) -> MimicResult<()> {
        if !(min_secs >= 0.0 && max_secs >= min_secs) {
            return Err(MimicError::invalid_argument(format!(
                "invalid blink delay range [{min_secs}, {max_secs}]"
            )));
        }
        self.config.min_delay_secs = min_secs;
        self.config.max_delay_secs = max_secs;
        Ok(())
    }

    /// Move the average pause, keeping the relative spread.
    pub fn set_average_interval(&mut self, average_secs: f32) -> MimicResult<()> {
        if !(average_secs > 0.0 && average_secs.is_finite()) {
            return Err(MimicError::invalid_argument(format!(
                "blink interval must be positive, got {average_secs}"
            )));
        }
        let width = self.config.interval_width();
        self.set_delay_range(average_secs * (1.0 - width), average_secs * (1.0 + width))
    }

    pub fn set_blinks_per_minute(&mut self, blinks_per_minute: f32) -> MimicResult<()> {
        if !(blinks_per_minute > 0.0) {
            return Err(MimicError::invalid_argument(format!(
                "blinks per minute must be positive, got {blinks_per_minute}"
            )));
        }
        self.set_average_interval(60.0 / blinks_per_minute)
    }

    fn draw_delay(&mut self) -> f32 {
        let (min, max) = (self.config.min_delay_secs, self.config.max_delay_secs);
        min + (max - min) * self.rng.gen::<f32>()
    }

    fn enter(&mut self, phase: BlinkPhase, now: f32) {
        tracing::debug!(from = ?self.phase, to = ?phase, now, "Blink phase change");
        self.phase = phase;
    }
}

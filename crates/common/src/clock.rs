//! Clock and timing utilities for driving the rig.
//!
//! Every engine is stepped by the host with a monotonically increasing
//! reading `now` (seconds) and the elapsed frame time `dt`. This module
//! provides two sources for those readings:
//! - [`SessionClock`]: real monotonic time anchored at session start
//! - [`FrameClock`]: a fixed-step simulated clock for headless runs and tests

use std::time::Instant;

/// A session clock that provides monotonic seconds relative to a fixed
/// epoch (the moment the session started).
#[derive(Debug, Clone)]
pub struct SessionClock {
    /// The instant the session started.
    epoch: Instant,

    /// Wall-clock time at epoch (ISO 8601 string).
    epoch_wall: String,
}

impl SessionClock {
    /// Create a new session clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Seconds elapsed since session start.
    pub fn now_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Wall-clock time at session start.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }
}

/// One tick of a clock: the current reading and the time since the previous tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    /// Zero-based frame index.
    pub frame: u64,
    /// Current time in seconds.
    pub now: f32,
    /// Elapsed seconds since the previous tick (0 for the first tick).
    pub dt: f32,
}

/// Fixed-step clock. Readings are computed from the frame index rather
/// than accumulated, so long runs do not drift.
#[derive(Debug, Clone)]
pub struct FrameClock {
    fps: u32,
    frame: u64,
    last_now: Option<f32>,
}

impl FrameClock {
    /// Create a clock ticking at `fps` frames per second. Zero is treated as 1.
    pub fn new(fps: u32) -> Self {
        Self {
            fps: fps.max(1),
            frame: 0,
            last_now: None,
        }
    }

    /// Nominal seconds per frame.
    pub fn frame_duration(&self) -> f32 {
        1.0 / self.fps as f32
    }

    /// Number of frames needed to cover `secs` seconds (inclusive of frame 0).
    pub fn frames_for(&self, secs: f64) -> u64 {
        (secs.max(0.0) * self.fps as f64).round() as u64 + 1
    }

    /// Advance one frame and return the tick.
    pub fn tick(&mut self) -> FrameTick {
        let now = (self.frame as f64 / self.fps as f64) as f32;
        let dt = self.last_now.map(|last| now - last).unwrap_or(0.0);
        let tick = FrameTick {
            frame: self.frame,
            now,
            dt,
        };
        self.last_now = Some(now);
        self.frame += 1;
        tick
    }
}

impl Iterator for FrameClock {
    type Item = FrameTick;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.tick())
    }
}

//! Mimic Motion Core: the avatar's autonomous behaviours
//!
//! Frame-stepped numeric engines that turn a clock tick plus a few host
//! samples into blend-shape weights and bone rotations:
//! - **Gaze:** Eye/head coordination toward a 3D target point
//! - **Blink:** Three-phase eyelid cycle with randomized intervals
//! - **Speech:** Mouth viseme sequencing from a TTS durations timeline
//! - **Rig:** Host-side composition of the three into one per-frame call
//!
//! No I/O besides loading tuning files.

pub mod blink;
pub mod config;
pub mod gaze;
pub mod ramp;
pub mod rig;
pub mod speech;

pub use blink::{BlinkPhase, Blinker};
pub use config::{BlinkConfig, GazeConfig, OutputConfig, RigConfig, SequencerConfig};
pub use gaze::{EyePose, GazeCoordinator, GazeOutput, GazeState, GazeTarget, RestPose};
pub use rig::{AvatarRig, HostFrame};
pub use speech::{SpeechVisemeSequencer, TimelineLoader};

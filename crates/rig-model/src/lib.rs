//! Mimic Rig Model
//!
//! Defines the data contracts shared by the motion engines and their hosts:
//! - **Frame:** The rest-pose reference axes all gaze angles are measured in
//! - **Visemes:** Named blend-shape channel tables and the phoneme map
//! - **Durations:** Parser for TTS "realized durations" reports
//! - **Timeline:** A parsed utterance, ready to be sequenced
//! - **Record:** Per-frame rig output, serializable as JSONL
//!
//! All blend-shape weights are in `[0.0, 1.0]`; hosts scale them to their
//! own range (e.g. `0..100`) when applying them to a mesh.

pub mod durations;
pub mod frame;
pub mod record;
pub mod timeline;
pub mod viseme;

pub use durations::*;
pub use frame::*;
pub use record::*;
pub use timeline::*;
pub use viseme::*;

//! Host-side composition of the rig engines.
//!
//! The engines share no state; [`AvatarRig`] only sequences them within one
//! frame and collects their outputs into a [`RigFrame`].

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use mimic_common::MimicResult;
use mimic_rig_model::{RigFrame, VisemeSet};

use crate::blink::Blinker;
use crate::config::{OutputConfig, RigConfig};
use crate::gaze::{EyePose, GazeCoordinator, RestPose};
use crate::speech::SpeechVisemeSequencer;

/// What the host samples each frame.
#[derive(Debug, Clone, Copy)]
pub struct HostFrame {
    /// Monotonic clock reading (seconds).
    pub now: f32,
    /// Seconds since the previous frame.
    pub dt: f32,
    pub eyes: EyePose,
}

/// Gaze, blink and speech engines of one avatar.
#[derive(Debug)]
pub struct AvatarRig<R: Rng = StdRng> {
    gaze: GazeCoordinator,
    blinker: Blinker<R>,
    speech: SpeechVisemeSequencer,
    output: OutputConfig,
    eyelids: Vec<f32>,
    mouth: Vec<f32>,
}

impl AvatarRig<StdRng> {
    /// Build a rig whose blink schedule draws from OS entropy. Loads the
    /// custom viseme set if the config names one.
    pub fn new(rest: RestPose, config: &RigConfig) -> MimicResult<Self> {
        Self::with_rng(rest, config, StdRng::from_entropy())
    }

    pub fn seeded(rest: RestPose, config: &RigConfig, seed: u64) -> MimicResult<Self> {
        Self::with_rng(rest, config, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> AvatarRig<R> {
    pub fn with_rng(rest: RestPose, config: &RigConfig, rng: R) -> MimicResult<Self> {
        let visemes = match &config.speech.visemes {
            Some(path) => Arc::new(VisemeSet::from_file(path)?),
            None => VisemeSet::shared_builtin(),
        };
        let speech = SpeechVisemeSequencer::with_visemes(config.speech.clone(), visemes)?;
        Ok(Self::from_parts(
            GazeCoordinator::new(rest, config.gaze.clone())?,
            Blinker::with_rng(config.blink.clone(), rng)?,
            speech,
            config.output.clone(),
        ))
    }

    pub fn from_parts(
        gaze: GazeCoordinator,
        blinker: Blinker<R>,
        speech: SpeechVisemeSequencer,
        output: OutputConfig,
    ) -> Self {
        Self {
            eyelids: vec![0.0; blinker.channel_count()],
            mouth: vec![0.0; speech.channel_count()],
            gaze,
            blinker,
            speech,
            output,
        }
    }

    /// Run every engine for one frame.
    pub fn update(&mut self, frame: &HostFrame) -> MimicResult<RigFrame> {
        let gaze = self.gaze.update(&frame.eyes, frame.dt);

        self.blinker.update(frame.now);
        self.blinker.write_channels(&mut self.eyelids)?;

        self.speech.update(frame.now, &mut self.mouth)?;

        Ok(RigFrame {
            time_secs: frame.now,
            eyes: gaze.eye_weights,
            neck: gaze.neck_rotation.map(|q| q.to_array()),
            eyelids: self.eyelids.clone(),
            mouth: self.mouth.clone(),
            speaking: self.speech.is_speaking(),
        })
    }

    /// Convert a frame to the host's blend-shape range.
    pub fn to_host(&self, frame: &RigFrame) -> RigFrame {
        frame.scaled(self.output.blendshape_range, self.output.mouth_gain)
    }

    pub fn gaze(&self) -> &GazeCoordinator {
        &self.gaze
    }

    pub fn gaze_mut(&mut self) -> &mut GazeCoordinator {
        &mut self.gaze
    }

    pub fn blinker(&self) -> &Blinker<R> {
        &self.blinker
    }

    pub fn blinker_mut(&mut self) -> &mut Blinker<R> {
        &mut self.blinker
    }

    pub fn speech(&self) -> &SpeechVisemeSequencer {
        &self.speech
    }

    pub fn speech_mut(&mut self) -> &mut SpeechVisemeSequencer {
        &mut self.speech
    }

    pub fn output(&self) -> &OutputConfig {
        &self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn rest() -> RestPose {
        RestPose::with_eyes(Vec3::new(-0.03, 1.6, 0.0), Vec3::new(0.03, 1.6, 0.0))
    }

    #[test]
    fn test_update_collects_all_engines() {
        let rest = rest();
        let mut rig = AvatarRig::seeded(rest, &RigConfig::default(), 5).unwrap();
        rig.gaze_mut().look_at_point(Vec3::new(-1.0, 1.8, 2.0));
        rig.speech_mut().load_report("0.10 x a\n0.25 x b\n0.40 x _\n").unwrap();

        let mut frames = Vec::new();
        for i in 0..30 {
            let host = HostFrame {
                now: i as f32 / 60.0,
                dt: if i == 0 { 0.0 } else { 1.0 / 60.0 },
                eyes: rest.eyes(),
            };
            frames.push(rig.update(&host).unwrap());
        }
        let last = frames.last().unwrap();

        assert_eq!(last.eyelids.len(), 2);
        assert_eq!(last.mouth.len(), 27);
        assert!(last.neck.is_some());
        assert!(last.speaking);
        assert!(last.eyes.iter().any(|&w| w > 0.0));

        // The first blink fires right after priming and is over by frame 30.
        assert!(frames.iter().any(|f| f.blink() == 1.0));
        assert_eq!(last.blink(), 0.0);
        assert!(rig.blinker().next_blink_time() >= 4.0);
        assert!(frames.iter().any(|f| f.mouth.iter().any(|&w| w > 0.0)));
    }

    #[test]
    fn test_to_host_scales_to_range() {
        let rig = AvatarRig::seeded(rest(), &RigConfig::default(), 0).unwrap();
        let frame = RigFrame {
            time_secs: 0.0,
            eyes: [0.5, 0.0, 0.0, 0.25],
            neck: None,
            eyelids: vec![1.0, 1.0],
            mouth: vec![0.5; 27],
            speaking: false,
        };
        let host = rig.to_host(&frame);
        assert_eq!(host.eyes, [50.0, 0.0, 0.0, 25.0]);
        assert_eq!(host.eyelids, vec![100.0, 100.0]);
        assert_eq!(host.mouth[0], 50.0);
    }

    #[test]
    fn test_missing_viseme_file_is_reported() {
        let mut config = RigConfig::default();
        config.speech.visemes = Some(std::env::temp_dir().join("mimic-no-such-visemes.json"));
        assert!(AvatarRig::seeded(rest(), &config, 0).is_err());
    }

    #[test]
    fn test_invalid_engine_config_is_reported() {
        let mut config = RigConfig::default();
        config.gaze.neck_min_yaw = 70.0;
        assert!(matches!(
            AvatarRig::seeded(rest(), &config, 0),
            Err(mimic_common::MimicError::Config { .. })
        ));

        let mut config = RigConfig::default();
        config.speech.min_ramp_speed = 20.0;
        assert!(AvatarRig::seeded(rest(), &config, 0).is_err());

        let mut config = RigConfig::default();
        config.blink.channels = 0;
        assert!(AvatarRig::seeded(rest(), &config, 0).is_err());
    }
}

use glam::Vec3;
use proptest::prelude::*;

use mimic_motion_core::{
    BlinkConfig, Blinker, GazeConfig, GazeCoordinator, RestPose, SequencerConfig,
    SpeechVisemeSequencer,
};
use mimic_rig_model::{EyeChannel, PhonemeSegment, TimingMode};

fn rest() -> RestPose {
    RestPose::with_eyes(Vec3::new(-0.03, 1.6, 0.0), Vec3::new(0.03, 1.6, 0.0))
}

fn target() -> impl Strategy<Value = Vec3> {
    (-4.0f32..4.0, -2.0f32..5.0, -4.0f32..4.0).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

proptest! {
    #[test]
    fn gaze_stays_within_limits(
        targets in prop::collection::vec(target(), 1..6),
        frames_per_target in 1usize..90,
        dt in 0.0f32..0.1,
        neck in any::<bool>(),
    ) {
        let rest = rest();
        let mut config = GazeConfig::default();
        config.enable_neck_rotation = neck;
        let mut gaze = GazeCoordinator::new(rest, config).unwrap();

        for point in targets {
            gaze.look_at_point(point);
            for _ in 0..frames_per_target {
                let out = gaze.update(&rest.eyes(), dt);
                let state = gaze.state();

                prop_assert!((-30.0..=30.0).contains(&state.eyes_yaw));
                prop_assert!((-12.0..=12.0).contains(&state.eyes_pitch));
                prop_assert!((-60.0..=60.0).contains(&state.neck_yaw));
                prop_assert!((-40.0..=45.0).contains(&state.neck_pitch));
                prop_assert!(out.eye_weights.iter().all(|w| (0.0..=1.0).contains(w)));

                let w = out.eye_weights;
                prop_assert!(w[EyeChannel::Up.index()] == 0.0 || w[EyeChannel::Down.index()] == 0.0);
                prop_assert!(w[EyeChannel::Left.index()] == 0.0 || w[EyeChannel::Right.index()] == 0.0);
                prop_assert_eq!(out.neck_rotation.is_some(), neck);
            }
        }
    }

    #[test]
    fn gaze_settles_on_a_fixed_target(point in target()) {
        let rest = rest();
        let mut gaze = GazeCoordinator::new(rest, GazeConfig::default()).unwrap();
        gaze.look_at_point(point);

        for _ in 0..120 {
            gaze.update(&rest.eyes(), 1.0 / 60.0);
        }
        let settled = gaze.state();
        gaze.update(&rest.eyes(), 1.0 / 60.0);
        let after = gaze.state();
        prop_assert_eq!(settled.eyes_yaw, after.eyes_yaw);
        prop_assert_eq!(settled.eyes_pitch, after.eyes_pitch);
    }

    #[test]
    fn blink_weight_stays_in_unit_range(seed in any::<u64>(), dt in 0.001f32..0.2) {
        let mut blinker = Blinker::seeded(BlinkConfig::default(), seed).unwrap();
        for i in 0..2000 {
            let w = blinker.update(i as f32 * dt);
            prop_assert!((0.0..=1.0).contains(&w));
        }
    }

    #[test]
    fn mouth_weights_stay_in_unit_range(
        utterance in prop::collection::vec((0.01f32..0.4, 0usize..7), 1..20),
        dt in 0.001f32..0.1,
    ) {
        let symbols = ["a", "m", "o", "f", "l", "h", "_"];
        let segments: Vec<PhonemeSegment> = utterance
            .iter()
            .map(|&(duration, i)| PhonemeSegment::new(duration, symbols[i]))
            .collect();

        let mut config = SequencerConfig::default();
        config.timing = TimingMode::Segment;
        let mut seq = SpeechVisemeSequencer::new(config).unwrap();
        seq.load_timeline(&segments);

        let mut weights = vec![0.0; seq.channel_count()];
        let mut frames = 0;
        while seq.is_speaking() && frames < 20_000 {
            seq.update(frames as f32 * dt, &mut weights).unwrap();
            prop_assert!(weights.iter().all(|w| (0.0..=1.0).contains(w)));
            frames += 1;
        }
        prop_assert!(!seq.is_speaking());
    }
}

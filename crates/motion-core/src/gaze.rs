//! Eye/head gaze coordination.
//!
//! # Algorithm
//!
//! 1. **Angles**: the target is moved into rest-pose eye space (the current
//!    eye rotation's delta from rest is removed), then split into yaw around
//!    the up axis and pitch against the horizontal plane.
//! 2. **Eyes** follow the desired angles with a linear increment.
//! 3. **Overflow** beyond the eye limits is clipped and handed to the neck
//!    through a rate-limited increment, while a weaker increment keeps
//!    pulling the neck back to straight.
//! 4. **Output**: eye blend-shape weights scale linearly with the clipped
//!    eye angles; the neck angles are recomposed into a local rotation by
//!    quaternion composition around the rest pose.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use mimic_common::MimicResult;
use mimic_rig_model::{angle_deg, EyeChannel, ReferenceFrame};

use crate::config::GazeConfig;
use crate::ramp::{linear_inc, smooth_inc};

/// Eye pitch (degrees) that maps to half weight on the up/down channel.
pub const EYE_PITCH_HALF_WEIGHT_DEG: f32 = 45.0;

/// Eye yaw (degrees) that maps to half weight on the left/right channel.
pub const EYE_YAW_HALF_WEIGHT_DEG: f32 = 52.0;

/// Where the avatar is looking.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GazeTarget {
    /// No fixation point; every angle relaxes toward 0.
    #[default]
    NoTarget,
    /// Fixate this world-space point.
    TargetAt(Vec3),
}

/// World-space eye and neck transforms captured in the rest pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RestPose {
    pub left_eye_position: Vec3,
    pub right_eye_position: Vec3,
    pub left_eye_rotation: Quat,
    pub right_eye_rotation: Quat,
    /// Absolute neck rotation.
    pub neck_rotation: Quat,
    /// Neck rotation relative to its parent bone.
    pub neck_local_rotation: Quat,
}

impl RestPose {
    /// Rest pose with all rotations at identity.
    pub fn with_eyes(left_eye_position: Vec3, right_eye_position: Vec3) -> Self {
        Self {
            left_eye_position,
            right_eye_position,
            left_eye_rotation: Quat::IDENTITY,
            right_eye_rotation: Quat::IDENTITY,
            neck_rotation: Quat::IDENTITY,
            neck_local_rotation: Quat::IDENTITY,
        }
    }

    /// The eye sample the host would report while standing in this pose.
    pub fn eyes(&self) -> EyePose {
        EyePose {
            left_position: self.left_eye_position,
            right_position: self.right_eye_position,
            left_rotation: self.left_eye_rotation,
            right_rotation: self.right_eye_rotation,
        }
    }
}

/// Per-frame world-space eye transforms sampled by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyePose {
    pub left_position: Vec3,
    pub right_position: Vec3,
    pub left_rotation: Quat,
    pub right_rotation: Quat,
}

impl EyePose {
    pub fn midpoint(&self) -> Vec3 {
        (self.left_position + self.right_position) * 0.5
    }

    /// Rigidly move the whole head sample by `rotation` about the origin.
    pub fn rotated(&self, rotation: Quat) -> Self {
        Self {
            left_position: rotation * self.left_position,
            right_position: rotation * self.right_position,
            left_rotation: rotation * self.left_rotation,
            right_rotation: rotation * self.right_rotation,
        }
    }
}

/// Result of one gaze update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazeOutput {
    /// Eye-direction weights, indexed by [`EyeChannel`].
    pub eye_weights: [f32; 4],

    /// New neck local rotation, `None` while neck rotation is disabled.
    pub neck_rotation: Option<Quat>,
}

/// Read-only snapshot of the coordinator's angles (degrees).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GazeState {
    pub eyes_yaw: f32,
    pub eyes_pitch: f32,
    pub neck_yaw: f32,
    pub neck_pitch: f32,
    /// Current fixation point, if any.
    pub target: Option<[f32; 3]>,
}

/// Coordinates eyes and neck toward a fixation point.
#[derive(Debug, Clone)]
pub struct GazeCoordinator {
    config: GazeConfig,
    frame: ReferenceFrame,
    rest: RestPose,
    /// Neck orientation of the rest pose relative to the neck's parent.
    neck_parent: Quat,
    target: GazeTarget,
    eyes_yaw: f32,
    eyes_pitch: f32,
    neck_yaw: f32,
    neck_pitch: f32,
}

impl GazeCoordinator {
    /// Create a coordinator, deriving the reference frame from the rest eye
    /// positions and the configured up axis.
    pub fn new(rest: RestPose, config: GazeConfig) -> MimicResult<Self> {
        config.validate()?;
        let frame = ReferenceFrame::from_eye_positions(
            rest.left_eye_position,
            rest.right_eye_position,
            config.up_vector(),
        );
        Self::with_frame(rest, frame, config)
    }

    /// Create a coordinator with explicit reference axes. Fails with
    /// `MimicError::Config` when the tuning is inconsistent.
    pub fn with_frame(
        rest: RestPose,
        frame: ReferenceFrame,
        config: GazeConfig,
    ) -> MimicResult<Self> {
        config.validate()?;
        Ok(Self {
            neck_parent: rest.neck_rotation * rest.neck_local_rotation.inverse(),
            config,
            frame,
            rest,
            target: GazeTarget::NoTarget,
            eyes_yaw: 0.0,
            eyes_pitch: 0.0,
            neck_yaw: 0.0,
            neck_pitch: 0.0,
        })
    }

    pub fn set_target(&mut self, target: GazeTarget) {
        self.target = target;
    }

    pub fn look_at_point(&mut self, point: Vec3) {
        self.set_target(GazeTarget::TargetAt(point));
    }

    pub fn stop_looking(&mut self) {
        self.set_target(GazeTarget::NoTarget);
    }

    pub fn target(&self) -> GazeTarget {
        self.target
    }

    /// Enable or disable neck participation. Neck angles are kept, so
    /// re-enabling resumes from where the neck was left.
    pub fn set_neck_rotation(&mut self, enabled: bool) {
        self.config.enable_neck_rotation = enabled;
    }

    pub fn is_neck_rotation_enabled(&self) -> bool {
        self.config.enable_neck_rotation
    }

    pub fn config(&self) -> &GazeConfig {
        &self.config
    }

    pub fn frame(&self) -> &ReferenceFrame {
        &self.frame
    }

    pub fn state(&self) -> GazeState {
        GazeState {
            eyes_yaw: self.eyes_yaw,
            eyes_pitch: self.eyes_pitch,
            neck_yaw: self.neck_yaw,
            neck_pitch: self.neck_pitch,
            target: match self.target {
                GazeTarget::NoTarget => None,
                GazeTarget::TargetAt(p) => Some(p.to_array()),
            },
        }
    }

    /// Desired `(yaw, pitch)` for the current target, before any limit.
    pub fn desired_angles(&self, eyes: &EyePose) -> (f32, f32) {
        match self.target {
            GazeTarget::NoTarget => (0.0, 0.0),
            GazeTarget::TargetAt(point) => {
                // Both eyes turn together; the left one stands in for the head.
                let to_rest = self.rest.left_eye_rotation * eyes.left_rotation.inverse();
                let local = to_rest * point - to_rest * eyes.midpoint();
                target_angles(&self.frame, local)
            }
        }
    }

    /// Advance one frame. `dt` below zero is treated as zero.
    pub fn update(&mut self, eyes: &EyePose, dt: f32) -> GazeOutput {
        let dt = dt.max(0.0);
        let (yaw, pitch) = self.desired_angles(eyes);

        let speed = self.config.eyes_rot_speed;
        self.eyes_yaw += linear_inc(yaw - self.eyes_yaw, speed, dt);
        self.eyes_pitch += linear_inc(pitch - self.eyes_pitch, speed, dt);

        let pitch_excess = clip_to_limit(&mut self.eyes_pitch, self.config.eyes_max_pitch);
        let yaw_excess = clip_to_limit(&mut self.eyes_yaw, self.config.eyes_max_yaw);

        if self.config.enable_neck_rotation {
            let c = &self.config;
            self.neck_pitch = step_neck(c, self.neck_pitch, pitch_excess, dt)
                .clamp(c.neck_min_pitch, c.neck_max_pitch);
            self.neck_yaw =
                step_neck(c, self.neck_yaw, yaw_excess, dt).clamp(c.neck_min_yaw, c.neck_max_yaw);
        }

        GazeOutput {
            eye_weights: eye_weights(self.eyes_yaw, self.eyes_pitch),
            neck_rotation: self
                .config
                .enable_neck_rotation
                .then(|| self.neck_local_rotation()),
        }
    }

    /// Neck local rotation for the current neck angles.
    pub fn neck_local_rotation(&self) -> Quat {
        let rotation = Quat::from_axis_angle(self.frame.up(), (-self.neck_yaw).to_radians())
            * Quat::from_axis_angle(self.frame.right(), (-self.neck_pitch).to_radians());
        self.neck_parent.inverse() * rotation * self.neck_parent * self.rest.neck_local_rotation
    }
}

/// Split an eye-space vector into signed `(yaw, pitch)` degrees.
///
/// Pitch is positive above the horizontal plane. Yaw is positive when the
/// horizontal projection lies against the right axis.
pub fn target_angles(frame: &ReferenceFrame, v: Vec3) -> (f32, f32) {
    let horizontal = frame.horizontal_projection(v);

    let mut pitch = angle_deg(v, horizontal);
    if v.dot(frame.up()) < 0.0 {
        pitch = -pitch;
    }

    let mut yaw = angle_deg(frame.forward(), horizontal);
    if horizontal.dot(frame.right()) > 0.0 {
        yaw = -yaw;
    }

    (yaw, pitch)
}

/// Eye weights for clipped eye angles. Only one channel of each pair is
/// ever nonzero.
pub fn eye_weights(yaw: f32, pitch: f32) -> [f32; 4] {
    let mut weights = [0.0; 4];

    let pitch_weight = 0.5 * pitch / EYE_PITCH_HALF_WEIGHT_DEG;
    if pitch_weight >= 0.0 {
        weights[EyeChannel::Up.index()] = pitch_weight.min(1.0);
    } else {
        weights[EyeChannel::Down.index()] = (-pitch_weight).min(1.0);
    }

    let yaw_weight = 0.5 * yaw / EYE_YAW_HALF_WEIGHT_DEG;
    if yaw_weight >= 0.0 {
        weights[EyeChannel::Right.index()] = yaw_weight.min(1.0);
    } else {
        weights[EyeChannel::Left.index()] = (-yaw_weight).min(1.0);
    }

    weights
}

/// Clamp `angle` to `±limit`, returning the amount cut off.
fn clip_to_limit(angle: &mut f32, limit: f32) -> f32 {
    let clipped = angle.clamp(-limit, limit);
    let excess = *angle - clipped;
    *angle = clipped;
    excess
}

fn step_neck(config: &GazeConfig, neck: f32, excess: f32, dt: f32) -> f32 {
    let eps = config.delta_epsilon;
    let strength = config.neck_rest_tendency_strength;

    let mut neck = neck
        + smooth_inc(
            excess,
            config.neck_rot_time,
            config.neck_rot_max_speed,
            dt,
            eps,
        );
    neck += smooth_inc(
        -neck,
        config.neck_rot_time / strength,
        config.neck_rot_max_speed * strength,
        dt,
        eps,
    );
    neck
}

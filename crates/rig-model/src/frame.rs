//! Rest-pose reference frame and angle helpers.
//!
//! The frame is captured once, from the avatar standing in its rest
//! (A-)pose, and never changes afterwards. Gaze yaw is measured around
//! `up`, pitch against the horizontal plane whose normal is `up`.

use glam::Vec3;

/// Accepted deviation (degrees) of the right/up angle from 90 before the
/// frame is reported as skewed.
pub const ORTHOGONALITY_TOLERANCE_DEG: f32 = 0.01;

/// Below this squared-length product two vectors are treated as degenerate.
const ANGLE_EPSILON_SQ: f32 = 1e-15;

/// Forward, up and right directions of the avatar in its rest pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceFrame {
    forward: Vec3,
    up: Vec3,
    right: Vec3,
}

impl ReferenceFrame {
    /// Build a frame from explicit axes. Axes are normalized; a skewed
    /// right/up pair is logged but accepted.
    pub fn new(forward: Vec3, up: Vec3, right: Vec3) -> Self {
        let frame = Self {
            forward: forward.normalize_or_zero(),
            up: up.normalize_or_zero(),
            right: right.normalize_or_zero(),
        };
        frame.check_orthogonality();
        frame
    }

    /// Derive the frame from the rest positions of the eyes:
    /// `right = right_eye - left_eye`, `forward = right x up`.
    pub fn from_eye_positions(left_eye: Vec3, right_eye: Vec3, up: Vec3) -> Self {
        let right = right_eye - left_eye;
        let forward = right.cross(up);
        Self::new(forward, up, right)
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    /// The horizontal-plane normal.
    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    /// Angle (degrees) between the right and up axes. 90 for a valid frame.
    pub fn right_up_angle_deg(&self) -> f32 {
        angle_deg(self.right, self.up)
    }

    /// Whether right and up are perpendicular within tolerance.
    pub fn is_orthogonal(&self) -> bool {
        (self.right_up_angle_deg() - 90.0).abs() <= ORTHOGONALITY_TOLERANCE_DEG
    }

    /// Project `v` onto the horizontal plane.
    pub fn horizontal_projection(&self, v: Vec3) -> Vec3 {
        v - self.up * v.dot(self.up)
    }

    fn check_orthogonality(&self) {
        let angle = self.right_up_angle_deg();
        tracing::debug!(
            angle_deg = angle,
            forward = ?self.forward,
            right = ?self.right,
            "Reference frame captured"
        );
        if !self.is_orthogonal() {
            tracing::warn!(
                angle_deg = angle,
                "Right and up axes are not perpendicular; gaze angles will be approximate"
            );
        }
    }
}

/// Unsigned angle between two vectors in degrees, in `[0, 180]`.
///
/// Degenerate (zero-length) inputs yield 0 rather than NaN.
pub fn angle_deg(a: Vec3, b: Vec3) -> f32 {
    let denominator = (a.length_squared() * b.length_squared()).sqrt();
    if denominator < ANGLE_EPSILON_SQ {
        return 0.0;
    }
    let cos = (a.dot(b) / denominator).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

//! Bounded per-frame increments.
//!
//! Every engine moves its scalars with one of these instead of springs or
//! exponential decay: the value reaches its target in finite time and stays
//! there.

/// Step toward `delta` at a fixed `speed`, never overshooting.
///
/// Returns the increment to add, `min(speed * dt, |delta|)` in the sign of
/// `delta`.
pub fn linear_inc(delta: f32, speed: f32, dt: f32) -> f32 {
    (speed * dt).min(delta.abs()) * delta.signum()
}

/// Rate-limited approach: cover `delta` in `time` seconds, capped at
/// `max_speed`. Deltas below `epsilon` yield no movement, which keeps
/// near-zero angles from jittering.
pub fn smooth_inc(delta: f32, time: f32, max_speed: f32, dt: f32, epsilon: f32) -> f32 {
    if delta.abs() < epsilon {
        return 0.0;
    }

    let speed = (delta / time).clamp(-max_speed, max_speed);
    let inc = speed * dt;
    if inc.abs() > delta.abs() {
        tracing::trace!(delta, inc, "Rate-limited increment overshoots its delta");
    }
    inc
}

/// Move a blend-shape weight toward 1 (`rising`) or 0, clamped to `[0, 1]`.
pub fn ramp_weight(current: f32, rising: bool, up_speed: f32, down_speed: f32, dt: f32) -> f32 {
    let next = if rising {
        current + up_speed * dt
    } else {
        current - down_speed * dt
    };
    next.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_inc_caps_at_delta() {
        assert_eq!(linear_inc(5.0, 1000.0, 0.1), 5.0);
        assert_eq!(linear_inc(-5.0, 1000.0, 0.1), -5.0);
        assert!((linear_inc(50.0, 100.0, 0.1) - 10.0).abs() < 1e-5);
        assert_eq!(linear_inc(0.0, 100.0, 0.1), 0.0);
        assert_eq!(linear_inc(3.0, 100.0, 0.0), 0.0);
    }

    #[test]
    fn test_smooth_inc_rate_limits() {
        // 10 deg over 0.1 s would be 100 deg/s, under the cap
        assert!((smooth_inc(10.0, 0.1, 135.0, 0.01, 1e-4) - 1.0).abs() < 1e-5);
        // 30 deg over 0.1 s would be 300 deg/s, capped to 135
        assert!((smooth_inc(30.0, 0.1, 135.0, 0.01, 1e-4) - 1.35).abs() < 1e-5);
        assert!((smooth_inc(-30.0, 0.1, 135.0, 0.01, 1e-4) + 1.35).abs() < 1e-5);
    }

    #[test]
    fn test_smooth_inc_ignores_tiny_deltas() {
        assert_eq!(smooth_inc(5e-5, 0.1, 135.0, 0.01, 1e-4), 0.0);
        assert_eq!(smooth_inc(-5e-5, 0.1, 135.0, 0.01, 1e-4), 0.0);
    }

    #[test]
    fn test_ramp_weight_clamps() {
        assert_eq!(ramp_weight(0.95, true, 10.0, 15.0, 0.1), 1.0);
        assert_eq!(ramp_weight(0.05, false, 10.0, 15.0, 0.1), 0.0);
        assert!((ramp_weight(0.5, true, 10.0, 15.0, 0.01) - 0.6).abs() < 1e-6);
        assert!((ramp_weight(0.5, false, 10.0, 15.0, 0.01) - 0.35).abs() < 1e-6);
        assert_eq!(ramp_weight(1.7, true, 10.0, 15.0, 0.0), 1.0);
    }
}

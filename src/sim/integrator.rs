//! Straight-line advance and cloth friction

use glam::DVec2;

use super::body::Body;
use crate::settings::Settings;

/// Move a body along its current velocity. Does not touch the version:
/// predictions already assume exactly this motion.
#[inline]
pub fn advance(body: &mut Body, dt: f64) {
    body.pos += body.vel * dt;
}

/// Apply sliding friction for `dt` seconds
///
/// Constant deceleration of (1 + μ)·g against the direction of travel. The
/// body stops dead when the decrement would overshoot zero or leaves it below
/// `min_speed`. Returns whether the velocity changed; if so the version has
/// been bumped and the body needs re-prediction.
pub fn apply_friction(body: &mut Body, dt: f64, settings: &Settings) -> bool {
    let speed = body.speed();
    if speed == 0.0 || dt <= 0.0 {
        return false;
    }

    let decrement = settings.friction_deceleration() * dt;
    let new_speed = speed - decrement;

    let vel = if new_speed <= 0.0 || new_speed < settings.min_speed {
        DVec2::ZERO
    } else {
        body.vel * (new_speed / speed)
    };

    if vel == body.vel {
        return false;
    }
    body.set_velocity(vel);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::body::BodyId;
    use proptest::prelude::*;

    fn moving(vx: f64, vy: f64) -> Body {
        Body::new(BodyId(1), DVec2::ZERO, DVec2::new(vx, vy), 1.0, 0.17)
    }

    #[test]
    fn test_advance_is_straight_line() {
        let mut b = moving(3.0, -4.0);
        advance(&mut b, 0.5);
        assert_eq!(b.pos(), DVec2::new(1.5, -2.0));
        assert_eq!(b.version(), 0);
    }

    #[test]
    fn test_friction_decelerates_along_velocity() {
        let settings = Settings::default();
        let mut b = moving(30.0, 40.0);
        let changed = apply_friction(&mut b, 0.1, &settings);

        assert!(changed);
        assert_eq!(b.version(), 1);
        let expected = 50.0 - settings.friction_deceleration() * 0.1;
        assert!((b.speed() - expected).abs() < 1e-12);
        // Direction preserved
        assert!((b.vel().normalize() - DVec2::new(0.6, 0.8)).length() < 1e-12);
    }

    #[test]
    fn test_friction_snaps_below_threshold() {
        let settings = Settings {
            min_speed: 1.0,
            ..Settings::default()
        };
        // One tick at 60 Hz removes ~0.196 px/s; 1.1 -> ~0.9 < threshold
        let mut b = moving(1.1, 0.0);
        assert!(apply_friction(&mut b, 1.0 / 60.0, &settings));
        assert_eq!(b.vel(), DVec2::ZERO);
        assert!(!b.is_moving());
    }

    #[test]
    fn test_friction_never_reverses() {
        let settings = Settings::default();
        let mut b = moving(-2.0, 0.0);
        // A huge dt would overshoot far past zero
        apply_friction(&mut b, 100.0, &settings);
        assert_eq!(b.vel(), DVec2::ZERO);
    }

    #[test]
    fn test_friction_on_resting_body_is_noop() {
        let settings = Settings::default();
        let mut b = moving(0.0, 0.0);
        assert!(!apply_friction(&mut b, 1.0, &settings));
        assert_eq!(b.version(), 0);
    }

    proptest! {
        #[test]
        fn prop_friction_monotonic_to_zero(
            vx in -400.0..400.0f64,
            vy in -400.0..400.0f64,
            dt in 0.01..0.1f64,
        ) {
            let settings = Settings::default();
            let mut b = moving(vx, vy);
            let dir = b.vel();
            let mut last = b.speed();

            for _ in 0..10_000 {
                if !b.is_moving() {
                    break;
                }
                apply_friction(&mut b, dt, &settings);
                let speed = b.speed();
                prop_assert!(speed < last || speed == 0.0);
                // Never flips against the original heading
                prop_assert!(b.vel().dot(dir) >= 0.0);
                last = speed;
            }
            prop_assert!(!b.is_moving());
        }
    }
}

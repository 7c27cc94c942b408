//! Easing and steering helpers shared by the boss behaviors.

use glam::Vec2;

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Where `x` sits between `from` and `to`, clamped to 0..1.
/// A degenerate range yields 1 once `x` reaches it.
pub fn inverse_lerp(from: f32, to: f32, x: f32) -> f32 {
    if (to - from).abs() <= f32::EPSILON {
        return if x >= to { 1.0 } else { 0.0 };
    }
    ((x - from) / (to - from)).clamp(0.0, 1.0)
}

/// Rises from 0 to 1 over `a..b`, holds, and falls back to 0 over `c..d`.
pub fn bump(a: f32, b: f32, c: f32, d: f32, x: f32) -> f32 {
    inverse_lerp(a, b, x) * (1.0 - inverse_lerp(c, d, x))
}

pub fn ease_in_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) * 0.5
    }
}

/// Unit vector along `v`, or `fallback` when `v` is (nearly) zero.
pub fn direction_or(v: Vec2, fallback: Vec2) -> Vec2 {
    v.try_normalize().unwrap_or(fallback)
}

/// Unsigned angle between two vectors, in radians. Zero vectors count as aligned.
pub fn angle_between(a: Vec2, b: Vec2) -> f32 {
    match (a.try_normalize(), b.try_normalize()) {
        (Some(a), Some(b)) => a.dot(b).clamp(-1.0, 1.0).acos(),
        _ => 0.0,
    }
}

/// Unit vector at `angle` radians from +x.
pub fn from_angle(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Steer toward `destination`, easing in as the gap closes.
///
/// `sharpness` is how fast velocity turns toward the ideal; `smoothness`
/// scales the ideal velocity down (1.0 would never move).
pub fn smooth_fly_near(center: Vec2, velocity: &mut Vec2, destination: Vec2, sharpness: f32, smoothness: f32) {
    let ideal = (destination - center) * (1.0 - smoothness);
    *velocity = velocity.lerp(ideal, sharpness);
}

/// [`smooth_fly_near`] that also stops pushing inside `slowdown_radius`.
pub fn smooth_fly_near_with_slowdown(
    center: Vec2,
    velocity: &mut Vec2,
    destination: Vec2,
    sharpness: f32,
    smoothness: f32,
    slowdown_radius: f32,
) {
    let distance = center.distance(destination);
    let slowdown = inverse_lerp(slowdown_radius, slowdown_radius * 1.3, distance);
    let ideal = (destination - center) * (1.0 - smoothness) * slowdown;
    *velocity = velocity.lerp(ideal, sharpness);
}

/// Rotate `velocity` toward `destination` at constant speed, lerping the
/// heading by `turn` per call.
pub fn steer_toward(center: Vec2, velocity: &mut Vec2, destination: Vec2, speed: f32, turn: f32) {
    let desired = direction_or(destination - center, Vec2::ZERO) * speed;
    *velocity = velocity.lerp(desired, turn);
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn inverse_lerp_clamps_and_handles_degenerate_ranges() {
        assert!((inverse_lerp(10.0, 20.0, 15.0) - 0.5).abs() < EPS);
        assert_eq!(inverse_lerp(10.0, 20.0, 30.0), 1.0);
        assert_eq!(inverse_lerp(10.0, 20.0, 0.0), 0.0);
        assert_eq!(inverse_lerp(5.0, 5.0, 4.0), 0.0);
        assert_eq!(inverse_lerp(5.0, 5.0, 5.0), 1.0);
    }

    #[test]
    fn bump_rises_holds_and_falls() {
        assert_eq!(bump(0.0, 10.0, 20.0, 30.0, -1.0), 0.0);
        assert!((bump(0.0, 10.0, 20.0, 30.0, 5.0) - 0.5).abs() < EPS);
        assert_eq!(bump(0.0, 10.0, 20.0, 30.0, 15.0), 1.0);
        assert_eq!(bump(0.0, 10.0, 20.0, 30.0, 40.0), 0.0);
    }

    #[test]
    fn cubic_ease_hits_endpoints() {
        assert!(ease_in_out_cubic(0.0).abs() < EPS);
        assert!((ease_in_out_cubic(1.0) - 1.0).abs() < EPS);
        assert!((ease_in_out_cubic(0.5) - 0.5).abs() < EPS);
        assert!(ease_in_out_cubic(0.25) < 0.25);
    }

    #[test]
    fn angle_between_is_unsigned() {
        assert!((angle_between(Vec2::X, Vec2::Y) - std::f32::consts::FRAC_PI_2).abs() < EPS);
        assert!((angle_between(Vec2::X, -Vec2::X) - std::f32::consts::PI).abs() < 1e-3);
        assert_eq!(angle_between(Vec2::ZERO, Vec2::Y), 0.0);
    }

    #[test]
    fn smooth_fly_converges_on_destination() {
        let mut center = Vec2::ZERO;
        let mut velocity = Vec2::ZERO;
        let destination = Vec2::new(300.0, -200.0);
        for _ in 0..200 {
            smooth_fly_near(center, &mut velocity, destination, 0.2, 0.9);
            center += velocity;
        }
        assert!(center.distance(destination) < 1.0);
    }

    #[test]
    fn slowdown_radius_stops_pushing_when_close() {
        let mut velocity = Vec2::ZERO;
        smooth_fly_near_with_slowdown(Vec2::ZERO, &mut velocity, Vec2::new(50.0, 0.0), 1.0, 0.5, 100.0);
        assert_eq!(velocity, Vec2::ZERO);
    }
}

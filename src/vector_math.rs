//! Horizontal-plane geometry helpers.
//!
//! Agents walk on the XZ plane with Y pinned to a ground height, so most
//! distance and heading calculations ignore the vertical axis. Yaw is measured
//! about +Y with a yaw of zero facing +Z, matching `Quat::from_rotation_y`.
use glam::{Quat, Vec3};
use std::f32::consts::{PI, TAU};

/// Returns `vector` with its vertical component removed.
#[must_use]
pub const fn flatten(vector: Vec3) -> Vec3 {
    Vec3::new(vector.x, 0.0, vector.z)
}

/// Distance between two points measured on the XZ plane.
///
/// # Examples
/// ```
/// use glam::Vec3;
/// use menagerie::vector_math::horizontal_distance;
/// let d = horizontal_distance(Vec3::new(0.0, 5.0, 0.0), Vec3::new(3.0, -2.0, 4.0));
/// assert!((d - 5.0).abs() < 1e-6);
/// ```
#[must_use]
pub fn horizontal_distance(from: Vec3, to: Vec3) -> f32 {
    flatten(to - from).length()
}

/// Unit vector on the XZ plane pointing from `from` to `to`.
///
/// Returns `None` when the points coincide horizontally or any component is
/// not finite.
#[must_use]
pub fn horizontal_direction(from: Vec3, to: Vec3) -> Option<Vec3> {
    let delta = flatten(to - from);
    if !delta.is_finite() {
        return None;
    }
    delta.try_normalize()
}

/// Returns the unit vector of `vector`, or zero when it cannot be normalised.
///
/// # Examples
///
/// ```
/// use glam::Vec3;
/// use menagerie::vector_math::safe_normalize;
/// assert_eq!(safe_normalize(Vec3::new(0.0, 0.0, 2.0)), Vec3::Z);
/// assert_eq!(safe_normalize(Vec3::new(f32::NAN, 1.0, 0.0)), Vec3::ZERO);
/// ```
#[must_use]
pub fn safe_normalize(vector: Vec3) -> Vec3 {
    if !vector.is_finite() {
        return Vec3::ZERO;
    }
    vector.try_normalize().unwrap_or(Vec3::ZERO)
}

/// Yaw angle, in radians, of a horizontal direction.
#[must_use]
pub fn yaw_of(direction: Vec3) -> f32 {
    direction.x.atan2(direction.z)
}

/// Horizontal unit vector facing along `yaw`.
#[must_use]
pub fn direction_from_yaw(yaw: f32) -> Vec3 {
    Vec3::new(yaw.sin(), 0.0, yaw.cos())
}

/// Rotates `direction` about +Y by `angle` radians.
#[must_use]
pub fn rotate_yaw(direction: Vec3, angle: f32) -> Vec3 {
    Quat::from_rotation_y(angle) * direction
}

/// Wraps an angle into the half-open interval `(-PI, PI]`.
#[must_use]
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Interpolates between two yaw angles along the shortest arc.
#[must_use]
pub fn lerp_angle(from: f32, to: f32, t: f32) -> f32 {
    let delta = wrap_angle(to - from);
    wrap_angle(from + delta * t.clamp(0.0, 1.0))
}

/// Cubic ease-in/ease-out curve over `[0, 1]`.
///
/// # Examples
/// ```
/// use menagerie::vector_math::ease_in_out;
/// assert_eq!(ease_in_out(0.0), 0.0);
/// assert_eq!(ease_in_out(1.0), 1.0);
/// assert!((ease_in_out(0.5) - 0.5).abs() < 1e-6);
/// ```
#[must_use]
pub fn ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;
    use std::f32::consts::FRAC_PI_2;

    #[rstest]
    #[case(Vec3::Z, 0.0)]
    #[case(Vec3::X, FRAC_PI_2)]
    #[case(Vec3::NEG_X, -FRAC_PI_2)]
    fn yaw_round_trips_through_direction(#[case] direction: Vec3, #[case] yaw: f32) {
        assert_relative_eq!(yaw_of(direction), yaw, epsilon = 1e-6);
        let back = direction_from_yaw(yaw);
        assert_relative_eq!(back.x, direction.x, epsilon = 1e-6);
        assert_relative_eq!(back.z, direction.z, epsilon = 1e-6);
    }

    #[rstest]
    fn rotate_yaw_agrees_with_direction_from_yaw() {
        let rotated = rotate_yaw(Vec3::Z, 0.3);
        let expected = direction_from_yaw(0.3);
        assert_relative_eq!(rotated.x, expected.x, epsilon = 1e-6);
        assert_relative_eq!(rotated.z, expected.z, epsilon = 1e-6);
    }

    #[rstest]
    fn lerp_angle_takes_short_way_round() {
        let from = 170_f32.to_radians();
        let to = -170_f32.to_radians();
        let mid = lerp_angle(from, to, 0.5);
        assert_relative_eq!(mid.abs(), PI, epsilon = 1e-5);
    }

    #[rstest]
    #[case(3.0 * PI, PI)]
    #[case(-PI, PI)]
    #[case(0.25, 0.25)]
    fn wrap_angle_normalises(#[case] input: f32, #[case] expected: f32) {
        assert_relative_eq!(wrap_angle(input), expected, epsilon = 1e-5);
    }

    #[rstest]
    fn horizontal_direction_ignores_height() {
        let dir = horizontal_direction(Vec3::ZERO, Vec3::new(0.0, 9.0, 2.0));
        assert_eq!(dir, Some(Vec3::Z));
        assert_eq!(horizontal_direction(Vec3::ZERO, Vec3::Y), None);
    }
}

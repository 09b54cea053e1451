//! Frame-rate independent interpolation and small geometry helpers.
//!
//! The `*_interp_to` family moves a value toward a target by
//! `clamp(dt * speed, 0, 1)` of the remaining difference per call, snapping
//! to the target once the difference is negligible. A non-positive speed
//! snaps immediately.

use nalgebra::{Matrix3, Rotation3, UnitQuaternion, Vector3};

/// Tolerance for "nearly zero" distances and angles.
pub const KINDA_SMALL_NUMBER: f32 = 1.0e-4;

/// Tolerance for squared magnitudes.
pub const SMALL_NUMBER: f32 = 1.0e-8;

#[inline]
fn interp_alpha(dt: f32, speed: f32) -> f32 {
    (dt * speed).clamp(0.0, 1.0)
}

/// Angle interpolation (degrees) along the shortest arc.
pub fn angle_interp_to(current: f32, target: f32, dt: f32, speed: f32) -> f32 {
    if speed <= 0.0 {
        return target;
    }
    let delta = normalize_axis(target - current);
    if delta.abs() < KINDA_SMALL_NUMBER {
        return target;
    }
    normalize_axis(current + delta * interp_alpha(dt, speed))
}

/// Vector interpolation toward `target`.
pub fn vinterp_to(
    current: Vector3<f32>,
    target: Vector3<f32>,
    dt: f32,
    speed: f32,
) -> Vector3<f32> {
    if speed <= 0.0 {
        return target;
    }
    let dist = target - current;
    if dist.norm_squared() < KINDA_SMALL_NUMBER {
        return target;
    }
    current + dist * interp_alpha(dt, speed)
}

/// Rotation interpolation toward `target` by spherical interpolation.
pub fn qinterp_to(
    current: UnitQuaternion<f32>,
    target: UnitQuaternion<f32>,
    dt: f32,
    speed: f32,
) -> UnitQuaternion<f32> {
    if speed <= 0.0 {
        return target;
    }
    if current.angle_to(&target) < KINDA_SMALL_NUMBER {
        return target;
    }
    current
        .try_slerp(&target, interp_alpha(dt, speed), SMALL_NUMBER)
        .unwrap_or(target)
}

/// Linearly remap `value` from `[in_a, in_b]` to `[out_a, out_b]`, clamping
/// to the output range.
pub fn map_range_clamped(value: f32, in_a: f32, in_b: f32, out_a: f32, out_b: f32) -> f32 {
    let span = in_b - in_a;
    if span.abs() < SMALL_NUMBER {
        return if value < in_a { out_a } else { out_b };
    }
    let t = ((value - in_a) / span).clamp(0.0, 1.0);
    out_a + (out_b - out_a) * t
}

/// Wrap an angle in degrees into (-180, 180].
pub fn normalize_axis(degrees: f32) -> f32 {
    let mut angle = degrees % 360.0;
    if angle > 180.0 {
        angle -= 360.0;
    } else if angle <= -180.0 {
        angle += 360.0;
    }
    angle
}

pub fn is_nearly_zero(v: &Vector3<f32>, tolerance: f32) -> bool {
    v.x.abs() <= tolerance && v.y.abs() <= tolerance && v.z.abs() <= tolerance
}

/// Angle between two directions in degrees. Zero vectors give 90 degrees.
pub fn angle_between_degrees(a: &Vector3<f32>, b: &Vector3<f32>) -> f32 {
    let (Some(a), Some(b)) = (a.try_normalize(SMALL_NUMBER), b.try_normalize(SMALL_NUMBER)) else {
        return 90.0;
    };
    a.dot(&b).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Heading of `rotation` about world Z, in degrees.
pub fn yaw_degrees(rotation: &UnitQuaternion<f32>) -> f32 {
    let forward = rotation * Vector3::x();
    forward.y.atan2(forward.x).to_degrees()
}

/// Rotation whose local Z axis is `z` and whose local X axis is as close to
/// `x` as possible.
pub fn rotation_from_zx(z: &Vector3<f32>, x: &Vector3<f32>) -> UnitQuaternion<f32> {
    let Some(new_z) = z.try_normalize(SMALL_NUMBER) else {
        return UnitQuaternion::identity();
    };
    let mut hint = x.try_normalize(SMALL_NUMBER).unwrap_or_else(Vector3::x);
    if new_z.dot(&hint).abs() > 1.0 - KINDA_SMALL_NUMBER {
        hint = if new_z.z.abs() < 1.0 - KINDA_SMALL_NUMBER {
            Vector3::z()
        } else {
            Vector3::x()
        };
    }
    let new_y = new_z.cross(&hint).normalize();
    let new_x = new_y.cross(&new_z);
    let basis = Matrix3::from_columns(&[new_x, new_y, new_z]);
    UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(basis))
}

/// Mean of `points`. Empty input averages to zero.
pub fn average(points: &[Vector3<f32>]) -> Vector3<f32> {
    if points.is_empty() {
        return Vector3::zeros();
    }
    points.iter().sum::<Vector3<f32>>() / points.len() as f32
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

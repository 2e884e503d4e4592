//! Quaternion and matrix helpers shared by the skeleton and the interpolators
//!
//! `glam` supplies the vector types; this module adds the few operations the
//! animation code needs that `glam` leaves out: logarithm/exponential maps,
//! hemisphere alignment and normalization with a defined fallback.

use glam::{Mat4, Quat, Vec3};

/// Lengths below this are treated as zero
pub const EPSILON: f32 = 1e-6;

/// Direction used for bones whose end joint coincides with their start joint
pub const FALLBACK_DIRECTION: Vec3 = Vec3::Y;

/// Normalize a quaternion, returning identity for zero or non-finite input
pub fn normalize_quat(q: Quat) -> Quat {
    let len = q.length();
    if len > EPSILON && len.is_finite() {
        q * (1.0 / len)
    } else {
        Quat::IDENTITY
    }
}

/// Normalize a direction, returning `None` when it has no usable length
pub fn try_direction(v: Vec3) -> Option<Vec3> {
    v.try_normalize()
}

/// Flip `q` into the same 4D hemisphere as `reference`
///
/// `q` and `-q` describe the same rotation; keeping neighbours on the same
/// side makes slerp and the log map take the short way round.
pub fn align_hemisphere(reference: Quat, q: Quat) -> Quat {
    if reference.dot(q) < 0.0 { -q } else { q }
}

/// Logarithm of a unit quaternion, as a pure quaternion stored in a `Vec3`
///
/// The result is `axis * half_angle`.
pub fn quat_log(q: Quat) -> Vec3 {
    let q = normalize_quat(q);
    let v = Vec3::new(q.x, q.y, q.z);
    let sin_half = v.length();
    if sin_half < EPSILON {
        return Vec3::ZERO;
    }
    let half_angle = sin_half.atan2(q.w);
    v * (half_angle / sin_half)
}

/// Exponential of a pure quaternion (inverse of [`quat_log`])
pub fn quat_exp(v: Vec3) -> Quat {
    let half_angle = v.length();
    if half_angle < EPSILON {
        return normalize_quat(Quat::from_xyzw(v.x, v.y, v.z, 1.0));
    }
    let s = half_angle.sin() / half_angle;
    Quat::from_xyzw(v.x * s, v.y * s, v.z * s, half_angle.cos())
}

/// Rotation matrix of a quaternion, normalizing it first
pub fn rotation_matrix(q: Quat) -> Mat4 {
    Mat4::from_quat(normalize_quat(q))
}

/// Translation column of an affine matrix
pub fn translation_of(m: &Mat4) -> Vec3 {
    m.w_axis.truncate()
}

/// Whether two quaternions describe the same rotation within `tolerance`
pub fn same_rotation(a: Quat, b: Quat, tolerance: f32) -> bool {
    1.0 - a.dot(b).abs() <= tolerance
}

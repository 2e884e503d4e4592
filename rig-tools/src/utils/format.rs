//! Formatting utilities

use glam::{Quat, Vec3};

/// Format a vector with three decimals
pub fn format_vec3(v: Vec3) -> String {
    format!("({:.3}, {:.3}, {:.3})", v.x, v.y, v.z)
}

/// Format a rotation as angle in degrees about an axis
pub fn format_rotation(q: Quat) -> String {
    let (axis, angle) = q.normalize().to_axis_angle();
    let degrees = angle.to_degrees();
    if degrees.abs() < 0.05 {
        "identity".to_string()
    } else {
        format!("{degrees:.1}° about {}", format_vec3(axis))
    }
}

/// Format a duration in seconds
pub fn format_seconds(seconds: f32) -> String {
    format!("{seconds:.3} s")
}

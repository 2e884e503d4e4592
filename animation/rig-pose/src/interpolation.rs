//! Keyframe interpolation
//!
//! Time is measured in keyframe units: `t = 2.5` lies halfway between
//! keyframes 2 and 3. Rotations are interpolated per bone slot, the root
//! offset always linearly.

use glam::Quat;
use serde::{Deserialize, Serialize};

use crate::keyframe::Keyframe;
use crate::math::{align_hemisphere, normalize_quat, quat_exp, quat_log};

/// Rotation interpolation scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationMode {
    /// Spherical linear interpolation between the two bracketing keyframes
    #[default]
    Linear,
    /// Spherical quadrangle (squad) interpolation through four control poses
    Spline,
}

impl InterpolationMode {
    /// Flip between linear and spline
    pub fn toggled(self) -> Self {
        match self {
            Self::Linear => Self::Spline,
            Self::Spline => Self::Linear,
        }
    }
}

impl std::fmt::Display for InterpolationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Linear => write!(f, "linear"),
            Self::Spline => write!(f, "spline"),
        }
    }
}

/// The four keyframes around a segment `from -> to`
///
/// At the ends of the sequence the missing neighbour is the segment end
/// itself, so `before == from` on the first segment and `after == to` on
/// the last one.
#[derive(Debug, Clone, Copy)]
pub struct ControlPoses<'a> {
    pub before: &'a Keyframe,
    pub from: &'a Keyframe,
    pub to: &'a Keyframe,
    pub after: &'a Keyframe,
}

impl<'a> ControlPoses<'a> {
    /// Control poses of the segment starting at keyframe `segment`
    ///
    /// Returns `None` unless both `segment` and `segment + 1` exist.
    pub fn around(keyframes: &'a [Keyframe], segment: usize) -> Option<Self> {
        let from = keyframes.get(segment)?;
        let to = keyframes.get(segment + 1)?;
        let before = segment
            .checked_sub(1)
            .and_then(|i| keyframes.get(i))
            .unwrap_or(from);
        let after = keyframes.get(segment + 2).unwrap_or(to);
        Some(Self {
            before,
            from,
            to,
            after,
        })
    }
}

/// Slerp every rotation and lerp the root offset
pub fn interpolate_linear(from: &Keyframe, to: &Keyframe, tau: f32) -> Keyframe {
    let rotations = from
        .rotations
        .iter()
        .zip(&to.rotations)
        .map(|(a, b)| normalize_quat(a.slerp(*b, tau)))
        .collect();
    Keyframe::new(rotations, from.root.lerp(to.root, tau))
}

/// Squad through the control poses; the root offset stays linear
pub fn interpolate_spline(poses: &ControlPoses<'_>, tau: f32) -> Keyframe {
    let rotations = poses
        .before
        .rotations
        .iter()
        .zip(&poses.from.rotations)
        .zip(&poses.to.rotations)
        .zip(&poses.after.rotations)
        .map(|(((q0, q1), q2), q3)| squad_segment(*q0, *q1, *q2, *q3, tau))
        .collect();
    Keyframe::new(rotations, poses.from.root.lerp(poses.to.root, tau))
}

/// Interpolate a segment with the given scheme
pub fn interpolate(mode: InterpolationMode, poses: &ControlPoses<'_>, tau: f32) -> Keyframe {
    match mode {
        InterpolationMode::Linear => interpolate_linear(poses.from, poses.to, tau),
        InterpolationMode::Spline => interpolate_spline(poses, tau),
    }
}

/// Pose at time `t` over a keyframe sequence
///
/// Valid times are `0 <= t <= len - 1`; `t == len - 1` evaluates the last
/// segment at its end. A single keyframe is only defined at `t == 0`.
/// Anything else yields `None`.
pub fn sample(mode: InterpolationMode, keyframes: &[Keyframe], t: f32) -> Option<Keyframe> {
    if !t.is_finite() || t < 0.0 {
        return None;
    }

    match keyframes.len() {
        0 => None,
        1 => {
            if t > 0.0 {
                None
            } else {
                keyframes.first().cloned()
            }
        }
        len => {
            let last = (len - 1) as f32;
            if t > last {
                return None;
            }
            let segment = (t.floor() as usize).min(len - 2);
            let tau = t - segment as f32;
            let poses = ControlPoses::around(keyframes, segment)?;
            Some(interpolate(mode, &poses, tau))
        }
    }
}

/// Intermediate control quaternion `s_i` for the squad curve
fn inner_control(prev: Quat, current: Quat, next: Quat) -> Quat {
    let inverse = current.conjugate();
    let to_next = quat_log(inverse * next);
    let to_prev = quat_log(inverse * prev);
    normalize_quat(current * quat_exp(-(to_next + to_prev) * 0.25))
}

fn squad_segment(q0: Quat, q1: Quat, q2: Quat, q3: Quat, tau: f32) -> Quat {
    let q1 = normalize_quat(q1);
    let q0 = align_hemisphere(q1, normalize_quat(q0));
    let q2 = align_hemisphere(q1, normalize_quat(q2));
    let q3 = align_hemisphere(q2, normalize_quat(q3));

    let s1 = inner_control(q0, q1, q2);
    let s2 = align_hemisphere(s1, inner_control(q1, q2, q3));

    let outer = q1.slerp(q2, tau);
    let inner = s1.slerp(s2, tau);
    normalize_quat(outer.slerp(inner, 2.0 * tau * (1.0 - tau)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::same_rotation;
    use glam::Vec3;
    use proptest::prelude::*;
    use std::f32::consts::FRAC_PI_2;
    use test_case::test_case;

    fn turn(angle: f32) -> Keyframe {
        Keyframe::new(
            vec![Quat::IDENTITY, Quat::from_rotation_z(angle)],
            Vec3::new(angle, 0.0, 0.0),
        )
    }

    fn sequence() -> Vec<Keyframe> {
        vec![turn(0.0), turn(0.5), turn(1.5), turn(1.0)]
    }

    #[test]
    fn test_empty_sequence() {
        assert!(sample(InterpolationMode::Linear, &[], 0.0).is_none());
    }

    #[test]
    fn test_single_keyframe_only_at_zero() {
        let keyframes = vec![turn(0.3)];
        assert_eq!(
            sample(InterpolationMode::Spline, &keyframes, 0.0),
            Some(turn(0.3))
        );
        assert!(sample(InterpolationMode::Spline, &keyframes, 0.5).is_none());
    }

    #[test_case(-0.1 ; "negative")]
    #[test_case(3.01 ; "past the end")]
    #[test_case(f32::NAN ; "nan")]
    fn test_out_of_range_time(t: f32) {
        assert!(sample(InterpolationMode::Linear, &sequence(), t).is_none());
        assert!(sample(InterpolationMode::Spline, &sequence(), t).is_none());
    }

    #[test_case(InterpolationMode::Linear ; "linear")]
    #[test_case(InterpolationMode::Spline ; "spline")]
    fn test_hits_keyframes_exactly(mode: InterpolationMode) {
        let keyframes = sequence();
        for (i, expected) in keyframes.iter().enumerate() {
            let pose = sample(mode, &keyframes, i as f32).unwrap();
            for (a, e) in pose.rotations.iter().zip(&expected.rotations) {
                assert!(same_rotation(*a, *e, 1e-5), "keyframe {i}: {a:?} vs {e:?}");
            }
            assert!(pose.root.abs_diff_eq(expected.root, 1e-5));
        }
    }

    #[test]
    fn test_linear_halfway() {
        let keyframes = vec![turn(0.0), turn(FRAC_PI_2)];
        let pose = sample(InterpolationMode::Linear, &keyframes, 0.5).unwrap();
        assert!(same_rotation(
            pose.rotations[1],
            Quat::from_rotation_z(FRAC_PI_2 / 2.0),
            1e-6
        ));
        assert!((pose.root.x - FRAC_PI_2 / 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_linear_takes_short_path() {
        let a = Keyframe::new(vec![Quat::from_rotation_z(0.2)], Vec3::ZERO);
        let b = Keyframe::new(vec![-Quat::from_rotation_z(0.4)], Vec3::ZERO);
        let pose = interpolate_linear(&a, &b, 0.5);
        assert!(same_rotation(pose.rotations[0], Quat::from_rotation_z(0.3), 1e-5));
    }

    #[test]
    fn test_spline_on_uniform_turn_matches_linear_inside() {
        let keyframes = vec![turn(0.0), turn(1.0), turn(2.0), turn(3.0)];
        let linear = sample(InterpolationMode::Linear, &keyframes, 1.3).unwrap();
        let spline = sample(InterpolationMode::Spline, &keyframes, 1.3).unwrap();
        assert!(same_rotation(linear.rotations[1], spline.rotations[1], 1e-5));
        assert!(same_rotation(
            spline.rotations[1],
            Quat::from_rotation_z(1.3),
            1e-5
        ));
    }

    #[test_case(1 ; "first interior keyframe")]
    #[test_case(2 ; "second interior keyframe")]
    fn test_spline_segments_meet_at_keyframe(k: usize) {
        let keyframes = sequence();
        let entering = ControlPoses::around(&keyframes, k - 1).unwrap();
        let leaving = ControlPoses::around(&keyframes, k).unwrap();
        let end = interpolate_spline(&entering, 1.0);
        let start = interpolate_spline(&leaving, 0.0);
        for pose in [&end, &start] {
            for (a, e) in pose.rotations.iter().zip(&keyframes[k].rotations) {
                assert!(same_rotation(*a, *e, 1e-5), "keyframe {k}: {a:?} vs {e:?}");
            }
            assert!(pose.root.abs_diff_eq(keyframes[k].root, 1e-5));
        }
    }

    #[test]
    fn test_spline_root_is_linear() {
        let keyframes = sequence();
        let pose = sample(InterpolationMode::Spline, &keyframes, 1.25).unwrap();
        assert!((pose.root.x - 0.75).abs() < 1e-5);
    }

    #[test]
    fn test_control_poses_clamp_at_ends() {
        let keyframes = sequence();
        let first = ControlPoses::around(&keyframes, 0).unwrap();
        assert_eq!(first.before, first.from);
        let last = ControlPoses::around(&keyframes, 2).unwrap();
        assert_eq!(last.after, last.to);
        assert!(ControlPoses::around(&keyframes, 3).is_none());
    }

    #[test]
    fn test_toggle() {
        assert_eq!(InterpolationMode::Linear.toggled(), InterpolationMode::Spline);
        assert_eq!(InterpolationMode::Spline.toggled(), InterpolationMode::Linear);
    }

    proptest! {
        #[test]
        fn prop_spline_is_continuous_across_keyframes(k in 1usize..3, eps in 1e-4f32..1e-3) {
            let keyframes = sequence();
            let t = k as f32;
            let left = sample(InterpolationMode::Spline, &keyframes, t - eps).unwrap();
            let right = sample(InterpolationMode::Spline, &keyframes, t + eps).unwrap();
            prop_assert!(same_rotation(left.rotations[1], right.rotations[1], 1e-4));
        }

        #[test]
        fn prop_samples_are_unit_quaternions(t in 0.0f32..3.0) {
            for mode in [InterpolationMode::Linear, InterpolationMode::Spline] {
                let pose = sample(mode, &sequence(), t).unwrap();
                for q in pose.rotations {
                    prop_assert!((q.length() - 1.0).abs() < 1e-4);
                }
            }
        }
    }
}

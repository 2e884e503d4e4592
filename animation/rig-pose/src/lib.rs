//! Skeletal transform and keyframe animation for linear-blend skinned meshes
//!
//! A [`Mesh`] owns a [`Skeleton`] (joints plus the bones between them), one
//! two-joint [`SkinBinding`] per vertex and a [`Timeline`] of keyframes.
//! Poses are edited bone by bone, captured into keyframes, interpolated
//! linearly or with a quaternion spline, and committed into a
//! [`PoseCache`] the renderer reads.
//!
//! ```no_run
//! use rig_pose::{Mesh, RigDescription};
//! use glam::Quat;
//!
//! let rig = RigDescription::from_path("stick.json")?;
//! let mut mesh = Mesh::load(&rig)?;
//!
//! mesh.capture_keyframe();
//! mesh.skeleton_mut().rotate_bone(1, Quat::from_rotation_z(0.5))?;
//! mesh.capture_keyframe();
//!
//! mesh.update_animation(Some(0.5))?;
//! let pose = mesh.current_pose();
//! println!("joint 1 at {:?}", pose.translations()[1]);
//! # Ok::<(), rig_pose::RigError>(())
//! ```

pub mod animation_file;
pub mod error;
pub mod interpolation;
pub mod keyframe;
pub mod loader;
pub mod math;
pub mod mesh;
pub mod options;
pub mod skeleton;
pub mod skinning;

// Re-export common types
pub use error::{Result, RigError};
pub use interpolation::{ControlPoses, InterpolationMode, sample};
pub use keyframe::{Keyframe, Timeline};
pub use loader::{Geometry, Material, ModelSource, RigDescription};
pub use mesh::{Bounds, Mesh};
pub use options::AnimationOptions;
pub use skeleton::{Bone, Joint, JointRecord, PoseCache, Skeleton};
pub use skinning::{SkinBinding, SkinBindings, SkinTuple, skin_position};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

use std::io;
use thiserror::Error;

/// Error types for skeleton construction, pose editing and animation I/O
#[derive(Error, Debug)]
pub enum RigError {
    /// I/O Error during reading or writing
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed JSON in an animation or rig file
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Joint index outside the skeleton
    #[error("Joint index {index} out of range (skeleton has {count} joints)")]
    JointOutOfRange { index: usize, count: usize },

    /// Bone index outside the bone arena
    #[error("Bone index {index} out of range (skeleton has {count} bone slots)")]
    BoneOutOfRange { index: usize, count: usize },

    /// The slot exists but belongs to a root joint, so no bone ends there
    #[error("Joint {0} is a root and has no incoming bone")]
    MissingBone(usize),

    /// Root-only operation applied to a joint that has a parent
    #[error("Joint {0} is not a root joint")]
    NotARoot(usize),

    /// Loader supplied a parent that is not an earlier joint
    #[error("Joint {joint} references parent {parent}, which is not an earlier joint")]
    InvalidParent { joint: usize, parent: usize },

    /// Keyframe index outside the timeline
    #[error("Keyframe index {index} out of range (timeline has {len} keyframes)")]
    KeyframeOutOfRange { index: usize, len: usize },

    /// Keyframe rotation count does not match the skeleton
    #[error("Keyframe has {actual} rotations, skeleton expects {expected}")]
    KeyframeSizeMismatch { expected: usize, actual: usize },

    /// Skin tuple references a vertex that does not exist
    #[error("Vertex index {index} out of range (mesh has {count} vertices)")]
    VertexOutOfRange { index: usize, count: usize },

    /// Structurally valid JSON that does not describe an animation
    #[error("Invalid animation data: {0}")]
    InvalidAnimation(String),
}

/// Result type using RigError
pub type Result<T> = std::result::Result<T, RigError>;

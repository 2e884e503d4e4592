//! Two-joint linear-blend skin bindings
//!
//! Every vertex is influenced by at most two joints. The binding stores the
//! vertex position relative to each joint's bind position, so skinning at
//! any pose is `w0 (t[j0] + r[j0] v0) + (1 - w0) (t[j1] + r[j1] v1)` over
//! the pose cache translations `t` and rotations `r`.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RigError};
use crate::skeleton::{Joint, PoseCache};

/// Raw skin weight record from a loader
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkinTuple {
    /// Vertex index
    pub vertex: usize,
    /// First influencing joint
    pub joint0: usize,
    /// Second influencing joint
    pub joint1: usize,
    /// Weight of the first joint; the second gets `1 - weight0`
    pub weight0: f32,
}

impl SkinTuple {
    /// Create a skin tuple
    pub const fn new(vertex: usize, joint0: usize, joint1: usize, weight0: f32) -> Self {
        Self {
            vertex,
            joint0,
            joint1,
            weight0,
        }
    }
}

/// Per-vertex binding ready for skinning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkinBinding {
    pub joint0: usize,
    pub joint1: usize,
    pub weight0: f32,
    /// Vertex minus the bind position of `joint0`
    pub offset0: Vec3,
    /// Vertex minus the bind position of `joint1`
    pub offset1: Vec3,
}

impl SkinBinding {
    /// Bind `vertex` to the joints named by `tuple`
    pub fn new(tuple: &SkinTuple, vertex: Vec3, joints: &[Joint]) -> Result<Self> {
        let origin = |index: usize| {
            joints
                .get(index)
                .map(Joint::init_position)
                .ok_or(RigError::JointOutOfRange {
                    index,
                    count: joints.len(),
                })
        };
        let origin0 = origin(tuple.joint0)?;
        let origin1 = origin(tuple.joint1)?;

        let weight0 = if (0.0..=1.0).contains(&tuple.weight0) {
            tuple.weight0
        } else {
            log::warn!(
                "Vertex {} has weight {} outside [0, 1], clamping",
                tuple.vertex,
                tuple.weight0
            );
            if tuple.weight0.is_nan() {
                1.0
            } else {
                tuple.weight0.clamp(0.0, 1.0)
            }
        };

        Ok(Self {
            joint0: tuple.joint0,
            joint1: tuple.joint1,
            weight0,
            offset0: vertex - origin0,
            offset1: vertex - origin1,
        })
    }

    /// Full weight on joint 0, used for vertices the loader left unbound
    pub fn rigid(vertex: Vec3, joints: &[Joint]) -> Self {
        let origin = joints.first().map_or(Vec3::ZERO, Joint::init_position);
        Self {
            joint0: 0,
            joint1: 0,
            weight0: 1.0,
            offset0: vertex - origin,
            offset1: vertex - origin,
        }
    }

    /// Weight of the second joint
    pub fn weight1(&self) -> f32 {
        1.0 - self.weight0
    }
}

/// Deformed position of a bound vertex under `pose`
///
/// A joint missing from the cache counts as untransformed.
pub fn skin_position(binding: &SkinBinding, pose: &PoseCache) -> Vec3 {
    let place = |joint: usize, offset: Vec3| {
        let translation = pose.translation(joint).unwrap_or(Vec3::ZERO);
        let rotation = pose.rotation(joint).unwrap_or(Quat::IDENTITY);
        translation + rotation * offset
    };
    place(binding.joint0, binding.offset0) * binding.weight0
        + place(binding.joint1, binding.offset1) * binding.weight1()
}

/// One binding per mesh vertex
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkinBindings {
    bindings: Vec<SkinBinding>,
}

impl SkinBindings {
    /// Build bindings for every vertex from the loader's tuples
    ///
    /// Vertices without a tuple get full weight on joint 0. A later tuple
    /// for the same vertex replaces an earlier one.
    pub fn from_tuples(tuples: &[SkinTuple], vertices: &[Vec3], joints: &[Joint]) -> Result<Self> {
        let mut bindings = vertices
            .iter()
            .map(|&vertex| SkinBinding::rigid(vertex, joints))
            .collect::<Vec<_>>();
        let mut bound = vec![false; vertices.len()];

        for tuple in tuples {
            let vertex = *vertices
                .get(tuple.vertex)
                .ok_or(RigError::VertexOutOfRange {
                    index: tuple.vertex,
                    count: vertices.len(),
                })?;
            if bound[tuple.vertex] {
                log::debug!("Vertex {} bound twice, keeping the later tuple", tuple.vertex);
            }
            bindings[tuple.vertex] = SkinBinding::new(tuple, vertex, joints)?;
            bound[tuple.vertex] = true;
        }

        let unbound = bound.iter().filter(|b| !**b).count();
        if unbound > 0 {
            log::debug!("{unbound} vertices have no skin tuple and follow joint 0");
        }

        Ok(Self { bindings })
    }

    /// Binding of one vertex
    pub fn get(&self, vertex: usize) -> Option<&SkinBinding> {
        self.bindings.get(vertex)
    }

    /// All bindings in vertex order
    pub fn bindings(&self) -> &[SkinBinding] {
        &self.bindings
    }

    /// Number of bound vertices
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether there are no bindings
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Skin every vertex under `pose`
    pub fn skin_vertices(&self, pose: &PoseCache) -> Vec<Vec3> {
        self.bindings
            .iter()
            .map(|binding| skin_position(binding, pose))
            .collect()
    }
}

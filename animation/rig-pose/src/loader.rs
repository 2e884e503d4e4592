//! Model loader interface
//!
//! Anything that can hand out geometry, materials, joints and skin weights
//! can feed a [`crate::Mesh`]. [`RigDescription`] is the bundled
//! implementation: a plain JSON document, mostly useful for tooling and
//! tests.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use glam::{Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::skeleton::JointRecord;
use crate::skinning::SkinTuple;

/// Vertex and face data of a model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub vertices: Vec<Vec3>,
    /// Triangles as vertex index triples
    pub faces: Vec<[u32; 3]>,
    /// Per-vertex normals, may be empty
    #[serde(default)]
    pub normals: Vec<Vec3>,
    /// Per-vertex texture coordinates, may be empty
    #[serde(default)]
    pub uvs: Vec<Vec2>,
}

/// Surface material of a run of consecutive faces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    #[serde(default)]
    pub name: String,
    pub diffuse: Vec4,
    #[serde(default)]
    pub specular: Vec3,
    #[serde(default)]
    pub ambient: Vec3,
    #[serde(default)]
    pub shininess: f32,
    /// Number of faces this material covers, following the previous material's faces
    pub face_count: usize,
    #[serde(default)]
    pub texture: Option<String>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: String::new(),
            diffuse: Vec4::ONE,
            specular: Vec3::ZERO,
            ambient: Vec3::ZERO,
            shininess: 0.0,
            face_count: 0,
            texture: None,
        }
    }
}

/// Source of everything a mesh needs at load time
pub trait ModelSource {
    /// Vertices, faces, normals and UVs
    fn geometry(&self) -> Result<Geometry>;

    /// Materials in face order
    fn materials(&self) -> Vec<Material>;

    /// Joint `id`, or `None` once past the last joint
    ///
    /// Joints are enumerated from 0 and a parent must come before its
    /// children.
    fn joint(&self, id: usize) -> Option<JointRecord>;

    /// Two-joint skin weights
    fn joint_weights(&self) -> Vec<SkinTuple>;

    /// All joints, enumerated until [`ModelSource::joint`] returns `None`
    fn joints(&self) -> Vec<JointRecord> {
        (0..).map_while(|id| self.joint(id)).collect()
    }
}

/// Self-contained JSON rig: geometry, materials, joints and skin weights
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RigDescription {
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub geometry: Geometry,
    #[serde(default)]
    pub materials: Vec<Material>,
    pub joints: Vec<JointRecord>,
    #[serde(default)]
    pub skin: Vec<SkinTuple>,
}

impl RigDescription {
    /// Parse a rig description from a JSON stream
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let rig: Self = serde_json::from_reader(reader)?;
        log::debug!(
            "Read rig '{}': {} vertices, {} faces, {} joints",
            rig.name,
            rig.geometry.vertices.len(),
            rig.geometry.faces.len(),
            rig.joints.len()
        );
        Ok(rig)
    }

    /// Parse a rig description from a JSON file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }

    /// Parse a rig description from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_reader(json.as_bytes())
    }
}

impl ModelSource for RigDescription {
    fn geometry(&self) -> Result<Geometry> {
        Ok(self.geometry.clone())
    }

    fn materials(&self) -> Vec<Material> {
        self.materials.clone()
    }

    fn joint(&self, id: usize) -> Option<JointRecord> {
        self.joints.get(id).copied()
    }

    fn joint_weights(&self) -> Vec<SkinTuple> {
        self.skin.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const RIG: &str = r#"{
        "name": "stick",
        "vertices": [[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]],
        "faces": [[0, 1, 2]],
        "materials": [{ "diffuse": [1.0, 0.5, 0.5, 1.0], "face_count": 1 }],
        "joints": [
            { "position": [0.0, 0.0, 0.0] },
            { "position": [0.0, 1.0, 0.0], "parent": 0 }
        ],
        "skin": [{ "vertex": 2, "joint0": 1, "joint1": 0, "weight0": 0.75 }]
    }"#;

    #[test]
    fn test_parse_rig() {
        let rig = RigDescription::from_json(RIG).unwrap();
        assert_eq!(rig.name, "stick");
        assert_eq!(rig.geometry.vertices.len(), 3);
        assert_eq!(rig.geometry.faces, vec![[0, 1, 2]]);
        assert!(rig.geometry.normals.is_empty());
        assert_eq!(rig.materials[0].face_count, 1);
        assert_eq!(rig.materials[0].texture, None);
        assert_eq!(rig.skin, vec![SkinTuple::new(2, 1, 0, 0.75)]);
    }

    #[test]
    fn test_joint_enumeration() {
        let rig = RigDescription::from_json(RIG).unwrap();
        assert_eq!(
            rig.joints(),
            vec![
                JointRecord::root(Vec3::ZERO),
                JointRecord::new(Vec3::Y, Some(0)),
            ]
        );
        assert!(rig.joint(2).is_none());
    }

    #[test]
    fn test_malformed_rig() {
        assert!(RigDescription::from_json("{ \"joints\": 3 }").is_err());
    }
}

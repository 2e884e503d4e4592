//! Skinned mesh: geometry, skeleton, skin bindings and keyframe timeline
//!
//! `Mesh` is the single owner of all animation state. Edits go through
//! [`Mesh::skeleton_mut`]; the renderer only reads [`Mesh::current_pose`],
//! which changes on [`Mesh::commit`], [`Mesh::update_animation`] and the
//! keyframe/animation loading calls.

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use glam::{Vec2, Vec3};

use crate::animation_file::{read_keyframes, write_keyframes};
use crate::error::{Result, RigError};
use crate::interpolation::{InterpolationMode, sample};
use crate::keyframe::{Keyframe, Timeline};
use crate::loader::{Material, ModelSource};
use crate::options::AnimationOptions;
use crate::skeleton::{PoseCache, Skeleton};
use crate::skinning::SkinBindings;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    /// Bounds of a point set; an empty set gives a zero box at the origin
    pub fn from_points(points: &[Vec3]) -> Self {
        let Some(first) = points.first() else {
            return Self::default();
        };
        points.iter().fold(
            Self {
                min: *first,
                max: *first,
            },
            |bounds, p| Self {
                min: bounds.min.min(*p),
                max: bounds.max.max(*p),
            },
        )
    }

    /// Midpoint of the box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Edge lengths of the box
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// A skinned mesh with its skeleton and keyframe timeline
///
/// Geometry is kept in the bind pose; [`Mesh::skinned_vertices`] deforms it
/// with the current pose.
#[derive(Debug, Clone)]
pub struct Mesh {
    vertices: Vec<Vec3>,
    faces: Vec<[u32; 3]>,
    vertex_normals: Vec<Vec3>,
    face_normals: Vec<Vec3>,
    uvs: Vec<Vec2>,
    materials: Vec<Material>,
    bounds: Bounds,
    skeleton: Skeleton,
    skin: SkinBindings,
    timeline: Timeline,
    current_pose: PoseCache,
    options: AnimationOptions,
}

impl Mesh {
    /// Load geometry, skeleton and skin weights from a model source
    pub fn load<S: ModelSource + ?Sized>(source: &S) -> Result<Self> {
        Self::load_with_options(source, AnimationOptions::default())
    }

    /// Load with explicit animation options
    pub fn load_with_options<S: ModelSource + ?Sized>(
        source: &S,
        options: AnimationOptions,
    ) -> Result<Self> {
        let geometry = source.geometry()?;
        let face_normals = compute_face_normals(&geometry.vertices, &geometry.faces)?;
        let bounds = Bounds::from_points(&geometry.vertices);

        let skeleton = Skeleton::from_joints(&source.joints())?;
        let skin = SkinBindings::from_tuples(
            &source.joint_weights(),
            &geometry.vertices,
            skeleton.joints(),
        )?;

        let mut mesh = Self {
            vertices: geometry.vertices,
            faces: geometry.faces,
            vertex_normals: geometry.normals,
            face_normals,
            uvs: geometry.uvs,
            materials: source.materials(),
            bounds,
            skeleton,
            skin,
            timeline: Timeline::new(),
            current_pose: PoseCache::new(),
            options,
        };
        mesh.commit();

        log::info!(
            "Loaded mesh: {} vertices, {} faces, {} joints, {} materials",
            mesh.vertices.len(),
            mesh.faces.len(),
            mesh.skeleton.joint_count(),
            mesh.materials.len()
        );
        Ok(mesh)
    }

    /// Bind-pose vertex positions
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Triangles as vertex index triples
    pub fn faces(&self) -> &[[u32; 3]] {
        &self.faces
    }

    /// Per-vertex normals from the source, empty if it had none
    pub fn vertex_normals(&self) -> &[Vec3] {
        &self.vertex_normals
    }

    /// Unit normal per face, zero for degenerate triangles
    pub fn face_normals(&self) -> &[Vec3] {
        &self.face_normals
    }

    pub fn uvs(&self) -> &[Vec2] {
        &self.uvs
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    /// Bind-pose bounding box
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Midpoint of the bounding box
    pub fn center(&self) -> Vec3 {
        self.bounds.center()
    }

    /// Average of all vertices
    pub fn centroid(&self) -> Vec3 {
        if self.vertices.is_empty() {
            return Vec3::ZERO;
        }
        self.vertices.iter().sum::<Vec3>() / self.vertices.len() as f32
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    /// Mutable skeleton for pose edits; call [`Mesh::commit`] afterwards
    pub fn skeleton_mut(&mut self) -> &mut Skeleton {
        &mut self.skeleton
    }

    /// Per-vertex joint bindings
    pub fn skin(&self) -> &SkinBindings {
        &self.skin
    }

    /// Number of bone slots (one per joint)
    pub fn bone_slots(&self) -> usize {
        self.skeleton.bone_slots()
    }

    pub fn options(&self) -> &AnimationOptions {
        &self.options
    }

    /// Replace the animation options; takes effect on the next update
    pub fn set_options(&mut self, options: AnimationOptions) {
        self.options = options;
    }

    /// Switch between linear and spline interpolation
    pub fn toggle_interpolation(&mut self) -> InterpolationMode {
        self.options.interpolation = self.options.interpolation.toggled();
        log::info!("Interpolation mode: {}", self.options.interpolation);
        self.options.interpolation
    }

    /// Pose the renderer draws, as of the last commit
    pub fn current_pose(&self) -> &PoseCache {
        &self.current_pose
    }

    /// Commit the skeleton into the current pose
    pub fn commit(&mut self) -> &PoseCache {
        self.skeleton.commit_pose_into(&mut self.current_pose);
        &self.current_pose
    }

    /// Vertex positions deformed by the current pose
    pub fn skinned_vertices(&self) -> Vec<Vec3> {
        self.skin.skin_vertices(&self.current_pose)
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Keyframes in playback order
    pub fn keyframes(&self) -> &[Keyframe] {
        self.timeline.keyframes()
    }

    /// Append the current pose to the timeline, returning its index
    ///
    /// The first capture re-bases the root edit origin, so the first
    /// keyframe always has a zero root offset.
    pub fn capture_keyframe(&mut self) -> usize {
        if self.timeline.is_empty() {
            self.skeleton.rebase_edit_origin();
        }
        self.timeline.push(self.skeleton.capture_keyframe());
        log::debug!("Captured keyframe {}", self.timeline.len() - 1);
        self.timeline.len() - 1
    }

    /// Insert the current pose before keyframe `index` (`index == len` appends)
    pub fn insert_keyframe(&mut self, index: usize) -> Result<()> {
        if index > self.timeline.len() {
            return Err(RigError::KeyframeOutOfRange {
                index,
                len: self.timeline.len(),
            });
        }
        if index == 0 {
            self.skeleton.rebase_edit_origin();
        }
        self.timeline.insert(index, self.skeleton.capture_keyframe())?;
        log::debug!("Inserted keyframe {index}");
        Ok(())
    }

    /// Replace keyframe `index` with the current pose
    pub fn overwrite_keyframe(&mut self, index: usize) -> Result<()> {
        let keyframe = self.skeleton.capture_keyframe();
        self.timeline.overwrite(index, keyframe)?;
        log::debug!("Overwrote keyframe {index}");
        Ok(())
    }

    /// Remove keyframe `index`
    pub fn delete_keyframe(&mut self, index: usize) -> Result<Keyframe> {
        let removed = self.timeline.remove(index)?;
        log::debug!("Deleted keyframe {index}");
        Ok(removed)
    }

    /// Pose the skeleton as keyframe `index` and commit
    pub fn show_keyframe(&mut self, index: usize) -> Result<()> {
        let keyframe = self.timeline.get(index)?;
        self.skeleton.apply_keyframe(keyframe)?;
        self.commit();
        Ok(())
    }

    /// Length of the timeline in seconds at the configured rate
    pub fn duration(&self) -> f32 {
        let segments = self.timeline.len().saturating_sub(1) as f32;
        segments / self.options.keyframes_per_second
    }

    /// Advance playback and commit
    ///
    /// `None` only commits pending edits. `Some(seconds)` samples the
    /// timeline first; if that time is outside the timeline the pose is
    /// left as it was. Returns whether a keyframe pose was applied.
    pub fn update_animation(&mut self, seconds: Option<f32>) -> Result<bool> {
        let applied = match seconds {
            Some(seconds) => {
                let t = self.options.keyframe_time(seconds);
                match sample(self.options.interpolation, self.timeline.keyframes(), t) {
                    Some(pose) => {
                        self.skeleton.apply_keyframe(&pose)?;
                        true
                    }
                    None => false,
                }
            }
            None => false,
        };
        self.commit();
        Ok(applied)
    }

    /// Write the timeline as JSON
    pub fn write_animation<W: Write>(&self, writer: W) -> Result<()> {
        write_keyframes(writer, self.timeline.keyframes())
    }

    /// Replace the timeline from JSON, then show its first keyframe
    ///
    /// Keyframes that do not match the skeleton are rejected and the
    /// current timeline is kept.
    pub fn read_animation<R: Read>(&mut self, reader: R) -> Result<()> {
        let keyframes = read_keyframes(reader)?;
        for keyframe in &keyframes {
            keyframe.check_size(self.bone_slots())?;
        }
        self.timeline.replace_all(keyframes);
        if let Some(first) = self.timeline.keyframes().first() {
            self.skeleton.apply_keyframe(first)?;
        }
        self.commit();
        log::info!("Loaded animation with {} keyframes", self.timeline.len());
        Ok(())
    }

    /// Write the timeline to a file, replacing it
    pub fn save_animation_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        self.write_animation(file)?;
        log::info!("Saved {} keyframes to {}", self.timeline.len(), path.as_ref().display());
        Ok(())
    }

    /// Replace the timeline from a file, see [`Mesh::read_animation`]
    pub fn load_animation_from<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let file = File::open(path.as_ref())?;
        self.read_animation(BufReader::new(file))
    }
}

fn compute_face_normals(vertices: &[Vec3], faces: &[[u32; 3]]) -> Result<Vec<Vec3>> {
    faces
        .iter()
        .map(|face| {
            let [a, b, c] = face.map(|i| {
                vertices
                    .get(i as usize)
                    .copied()
                    .ok_or(RigError::VertexOutOfRange {
                        index: i as usize,
                        count: vertices.len(),
                    })
            });
            let (a, b, c) = (a?, b?, c?);
            // Degenerate triangles get a zero normal
            Ok((b - a).cross(c - a).normalize_or_zero())
        })
        .collect()
}

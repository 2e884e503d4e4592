//! Joint/bone hierarchy and forward kinematics
//!
//! Bones live in an arena indexed by the joint they end at; the slot of a
//! root joint stays empty. Parent/child links are plain indices, and since
//! the loader numbers joints so that a parent always precedes its children,
//! increasing index order is a valid root-to-leaf traversal.
//!
//! Every bone keeps two accumulated transforms: the bind-pose one
//! (`undeformed`) and the current one (`deformed`). A joint's world position
//! is its bind position moved by `deformed * inverse(undeformed)`, which
//! isolates the change from the bind pose.

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RigError};
use crate::keyframe::Keyframe;
use crate::math::{
    FALLBACK_DIRECTION, normalize_quat, rotation_matrix, translation_of, try_direction,
};

/// Bind-pose description of one joint, as delivered by a loader
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointRecord {
    /// World position in the bind pose
    pub position: Vec3,
    /// Parent joint, `None` for the root
    #[serde(default)]
    pub parent: Option<usize>,
}

impl JointRecord {
    /// Create a joint record
    pub const fn new(position: Vec3, parent: Option<usize>) -> Self {
        Self { position, parent }
    }

    /// Create a parentless joint record
    pub const fn root(position: Vec3) -> Self {
        Self {
            position,
            parent: None,
        }
    }
}

/// A point in the skeleton tree
#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    index: usize,
    parent: Option<usize>,
    position: Vec3,
    init_position: Vec3,
    orientation: Quat,
    rel_orientation: Quat,
    children: Vec<usize>,
}

impl Joint {
    fn new(index: usize, record: JointRecord) -> Self {
        Self {
            index,
            parent: record.parent,
            position: record.position,
            init_position: record.position,
            orientation: Quat::IDENTITY,
            rel_orientation: Quat::IDENTITY,
            children: Vec::new(),
        }
    }

    /// Joint index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Parent joint index, `None` for a root
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// Whether this joint has no parent
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// World position as of the last commit
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Bind-pose world position
    pub fn init_position(&self) -> Vec3 {
        self.init_position
    }

    /// Absolute orientation as of the last commit
    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    /// Orientation relative to the parent as of the last commit
    pub fn rel_orientation(&self) -> Quat {
        self.rel_orientation
    }

    /// Child joints, in build order
    pub fn children(&self) -> &[usize] {
        &self.children
    }
}

/// Directed edge from a parent joint (start) to a child joint (end)
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    index: usize,
    start: usize,
    root: usize,
    length: f32,
    direction: Vec3,
    /// Local translation; moves when the root is translated
    translation: Mat4,
    /// Edit origin the keyframe root offset is measured from
    start_translation: Mat4,
    undeformed_transform: Mat4,
    inverse_bind_transform: Mat4,
    deformed_transform: Mat4,
    relative: Quat,
    orientation: Quat,
    parent: Option<usize>,
    children: Vec<usize>,
}

impl Bone {
    /// Bone index (equal to its end joint)
    pub fn index(&self) -> usize {
        self.index
    }

    /// Joint the bone starts at
    pub fn start_joint(&self) -> usize {
        self.start
    }

    /// Joint the bone ends at
    pub fn end_joint(&self) -> usize {
        self.index
    }

    /// Root joint of the chain this bone belongs to
    pub fn root_joint(&self) -> usize {
        self.root
    }

    /// Rest length
    pub fn length(&self) -> f32 {
        self.length
    }

    /// Normalized rest direction from start to end
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Current local translation relative to the parent bone
    pub fn local_translation(&self) -> Vec3 {
        translation_of(&self.translation)
    }

    /// Rotation relative to the parent bone
    pub fn relative_rotation(&self) -> Quat {
        self.relative
    }

    /// Absolute rotation
    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    /// Bind-pose accumulated transform
    pub fn undeformed_transform(&self) -> Mat4 {
        self.undeformed_transform
    }

    /// Current accumulated transform
    pub fn deformed_transform(&self) -> Mat4 {
        self.deformed_transform
    }

    /// Change from the bind pose, `deformed * inverse(undeformed)`
    pub fn skinning_transform(&self) -> Mat4 {
        self.deformed_transform * self.inverse_bind_transform
    }

    /// Parent bone, `None` when the start joint is a root
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// Bones starting at this bone's end joint
    pub fn children(&self) -> &[usize] {
        &self.children
    }
}

/// Flattened per-joint world translations and rotations for the renderer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoseCache {
    translations: Vec<Vec3>,
    rotations: Vec<Quat>,
}

impl PoseCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// World translations, indexed by joint
    pub fn translations(&self) -> &[Vec3] {
        &self.translations
    }

    /// World rotations, indexed by joint
    pub fn rotations(&self) -> &[Quat] {
        &self.rotations
    }

    /// Translation of one joint
    pub fn translation(&self, joint: usize) -> Option<Vec3> {
        self.translations.get(joint).copied()
    }

    /// Rotation of one joint
    pub fn rotation(&self, joint: usize) -> Option<Quat> {
        self.rotations.get(joint).copied()
    }

    /// Number of joints in the cache
    pub fn len(&self) -> usize {
        self.translations.len()
    }

    /// Whether the cache holds no joints
    pub fn is_empty(&self) -> bool {
        self.translations.is_empty()
    }

    /// Translations as a flat `[x, y, z, ...]` buffer
    pub fn translation_data(&self) -> Vec<f32> {
        self.translations.iter().flat_map(|t| t.to_array()).collect()
    }

    /// Rotations as a flat `[x, y, z, w, ...]` buffer
    pub fn rotation_data(&self) -> Vec<f32> {
        self.rotations.iter().flat_map(|r| r.to_array()).collect()
    }
}

/// Joint list plus bone arena
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    joints: Vec<Joint>,
    bones: Vec<Option<Bone>>,
    cache: PoseCache,
}

impl Skeleton {
    /// Create a skeleton from bind-pose joints without building any bones
    pub fn new(records: &[JointRecord]) -> Self {
        let joints = records
            .iter()
            .enumerate()
            .map(|(index, record)| Joint::new(index, *record))
            .collect::<Vec<_>>();
        let bones = vec![None; joints.len()];

        Self {
            joints,
            bones,
            cache: PoseCache::new(),
        }
    }

    /// Create a skeleton, build every bone in index order and commit the bind pose
    pub fn from_joints(records: &[JointRecord]) -> Result<Self> {
        let mut skeleton = Self::new(records);
        for joint in 0..skeleton.joints.len() {
            skeleton.build_bone(joint)?;
        }
        skeleton.commit_pose();

        log::debug!(
            "Built skeleton with {} joints and {} bones",
            skeleton.joints.len(),
            skeleton.bone_count()
        );
        Ok(skeleton)
    }

    /// Number of joints
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// Number of bone slots (equal to the joint count, root slots empty)
    pub fn bone_slots(&self) -> usize {
        self.bones.len()
    }

    /// Number of built bones
    pub fn bone_count(&self) -> usize {
        self.bones.iter().flatten().count()
    }

    /// All joints
    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    /// Bone arena; `None` at root slots
    pub fn bones(&self) -> &[Option<Bone>] {
        &self.bones
    }

    /// Joint at `index`
    pub fn joint(&self, index: usize) -> Result<&Joint> {
        self.joints.get(index).ok_or(RigError::JointOutOfRange {
            index,
            count: self.joints.len(),
        })
    }

    /// Bone ending at joint `index`
    pub fn bone(&self, index: usize) -> Result<&Bone> {
        match self.bones.get(index) {
            Some(Some(bone)) => Ok(bone),
            Some(None) => Err(RigError::MissingBone(index)),
            None => Err(RigError::BoneOutOfRange {
                index,
                count: self.bones.len(),
            }),
        }
    }

    fn bone_mut(&mut self, index: usize) -> Result<&mut Bone> {
        let count = self.bones.len();
        match self.bones.get_mut(index) {
            Some(Some(bone)) => Ok(bone),
            Some(None) => Err(RigError::MissingBone(index)),
            None => Err(RigError::BoneOutOfRange { index, count }),
        }
    }

    /// Pose cache as of the last [`Skeleton::commit_pose`]
    pub fn cache(&self) -> &PoseCache {
        &self.cache
    }

    /// Build the bone that ends at `joint`
    ///
    /// Root joints have no incoming bone, and a bone that already exists is
    /// left alone. An unbuilt parent bone is built first.
    pub fn build_bone(&mut self, joint: usize) -> Result<()> {
        let end = self.joint(joint)?;
        let Some(start_index) = end.parent else {
            return Ok(());
        };
        if self.bones[joint].is_some() {
            return Ok(());
        }
        if start_index >= joint {
            return Err(RigError::InvalidParent {
                joint,
                parent: start_index,
            });
        }

        let start_parent = self.joints[start_index].parent;
        if start_parent.is_some() && self.bones[start_index].is_none() {
            self.build_bone(start_index)?;
        }

        let end_position = self.joints[joint].init_position;
        let start_position = self.joints[start_index].init_position;
        let offset = end_position - start_position;
        let direction = try_direction(offset).unwrap_or_else(|| {
            log::warn!(
                "Joints {start_index} and {joint} coincide, using fallback bone direction"
            );
            FALLBACK_DIRECTION
        });

        let (parent, local) = match start_parent {
            Some(grandparent) => (
                Some(start_index),
                start_position - self.joints[grandparent].init_position,
            ),
            None => (None, start_position),
        };

        let translation = Mat4::from_translation(local);
        let (undeformed_transform, deformed_transform, orientation, root) = match parent {
            Some(parent_index) => {
                let parent_bone = self.bone(parent_index)?;
                (
                    parent_bone.undeformed_transform * translation,
                    parent_bone.deformed_transform * translation,
                    parent_bone.orientation,
                    parent_bone.root,
                )
            }
            None => (translation, translation, Quat::IDENTITY, start_index),
        };

        let bone = Bone {
            index: joint,
            start: start_index,
            root,
            length: offset.length(),
            direction,
            translation,
            start_translation: translation,
            undeformed_transform,
            inverse_bind_transform: undeformed_transform.inverse(),
            deformed_transform,
            relative: Quat::IDENTITY,
            orientation,
            parent,
            children: Vec::new(),
        };

        if let Some(parent_index) = parent {
            self.bone_mut(parent_index)?.children.push(joint);
        }
        self.joints[start_index].children.push(joint);
        self.bones[joint] = Some(bone);

        Ok(())
    }

    /// Recompute joint positions/orientations and refresh the internal cache
    pub fn commit_pose(&mut self) -> &PoseCache {
        let mut cache = std::mem::take(&mut self.cache);
        self.commit_pose_into(&mut cache);
        self.cache = cache;
        &self.cache
    }

    /// Recompute joint positions/orientations and write them into `target`
    pub fn commit_pose_into(&mut self, target: &mut PoseCache) {
        let count = self.joints.len();
        let mut updates = Vec::with_capacity(count);

        for joint in &self.joints {
            let position = match (joint.parent, self.bones[joint.index].as_ref()) {
                (Some(_), Some(bone)) => bone
                    .skinning_transform()
                    .transform_point3(joint.init_position),
                _ => joint
                    .children
                    .first()
                    .and_then(|&child| self.bones[child].as_ref())
                    .map_or(joint.init_position, Bone::local_translation),
            };

            // Outgoing bone drives the joint frame; leaves follow their incoming bone
            let frame_bone = joint
                .children
                .first()
                .copied()
                .or(joint.parent.map(|_| joint.index))
                .and_then(|index| self.bones[index].as_ref());
            let (orientation, rel_orientation) =
                frame_bone.map_or((Quat::IDENTITY, Quat::IDENTITY), |bone| {
                    (bone.orientation, bone.relative)
                });

            updates.push((position, orientation, rel_orientation));
        }

        target.translations.clear();
        target.rotations.clear();
        for (joint, (position, orientation, rel_orientation)) in
            self.joints.iter_mut().zip(updates)
        {
            joint.position = position;
            joint.orientation = orientation;
            joint.rel_orientation = rel_orientation;
            target.translations.push(position);
            target.rotations.push(orientation);
        }

        log::trace!("Committed pose for {count} joints");
    }

    /// Rotate one bone in its parent's frame; descendants follow
    ///
    /// `delta` is composed in front of the bone's relative rotation, and
    /// every descendant keeps its own relative rotation while its absolute
    /// transform is recomputed.
    pub fn rotate_bone(&mut self, bone: usize, delta: Quat) -> Result<()> {
        let target = self.bone_mut(bone)?;
        target.relative = normalize_quat(delta * target.relative);
        self.refresh_subtree(bone);
        Ok(())
    }

    /// Rotate every bone leaving `joint` (the incoming bone for a leaf)
    pub fn rotate_joint(&mut self, joint: usize, delta: Quat) -> Result<()> {
        let node = self.joint(joint)?;
        let bones = if node.children.is_empty() {
            vec![joint]
        } else {
            node.children.clone()
        };
        // Validate before touching anything
        for &bone in &bones {
            self.bone(bone)?;
        }
        for bone in bones {
            self.rotate_bone(bone, delta)?;
        }
        Ok(())
    }

    /// Move a root joint; its whole subtree follows
    pub fn translate_root(&mut self, delta: Vec3, root: usize) -> Result<()> {
        let node = self.joint(root)?;
        if !node.is_root() {
            return Err(RigError::NotARoot(root));
        }
        let bones = node.children.clone();
        for bone in bones {
            let target = self.bone_mut(bone)?;
            target.translation.w_axis += delta.extend(0.0);
            self.refresh_subtree(bone);
        }
        Ok(())
    }

    /// Set every relative rotation and the root offset from a keyframe
    pub fn apply_keyframe(&mut self, keyframe: &Keyframe) -> Result<()> {
        keyframe.check_size(self.bones.len())?;

        for (bone, rotation) in self.bones.iter_mut().zip(&keyframe.rotations) {
            let Some(bone) = bone else {
                continue;
            };
            bone.relative = normalize_quat(*rotation);
            if bone.parent.is_none() {
                let origin = translation_of(&bone.start_translation);
                bone.translation = Mat4::from_translation(origin + keyframe.root);
            }
        }

        // Parents precede children in index order
        for index in 0..self.bones.len() {
            self.refresh_bone(index);
        }
        Ok(())
    }

    /// Read the current relative rotations and root offset
    pub fn capture_keyframe(&self) -> Keyframe {
        let rotations = self
            .bones
            .iter()
            .map(|bone| bone.as_ref().map_or(Quat::IDENTITY, |b| b.relative))
            .collect();
        Keyframe::new(rotations, self.root_offset())
    }

    /// Root translation measured from the edit origin
    pub fn root_offset(&self) -> Vec3 {
        self.bones
            .iter()
            .flatten()
            .find(|bone| bone.parent.is_none())
            .map_or(Vec3::ZERO, |bone| {
                translation_of(&bone.translation) - translation_of(&bone.start_translation)
            })
    }

    /// Make the current translations the origin later root offsets are measured from
    pub fn rebase_edit_origin(&mut self) {
        for bone in self.bones.iter_mut().flatten() {
            bone.start_translation = bone.translation;
        }
    }

    /// Recompute one bone from its parent (or from itself for a root bone)
    fn refresh_bone(&mut self, index: usize) {
        let parent = self.bones[index]
            .as_ref()
            .and_then(|bone| bone.parent)
            .and_then(|parent| self.bones[parent].as_ref())
            .map(|parent| (parent.deformed_transform, parent.orientation));

        if let Some(bone) = self.bones[index].as_mut() {
            let rotation = rotation_matrix(bone.relative);
            match parent {
                Some((parent_transform, parent_orientation)) => {
                    bone.deformed_transform = parent_transform * bone.translation * rotation;
                    bone.orientation = normalize_quat(parent_orientation * bone.relative);
                }
                None => {
                    bone.deformed_transform = bone.translation * rotation;
                    bone.orientation = bone.relative;
                }
            }
        }
    }

    /// Recompute a bone and all of its descendants, top-down
    fn refresh_subtree(&mut self, index: usize) {
        let mut stack = vec![index];
        while let Some(current) = stack.pop() {
            self.refresh_bone(current);
            if let Some(bone) = self.bones[current].as_ref() {
                stack.extend(bone.children.iter().copied());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::same_rotation;
    use std::f32::consts::FRAC_PI_2;

    fn chain() -> Skeleton {
        Skeleton::from_joints(&[
            JointRecord::root(Vec3::ZERO),
            JointRecord::new(Vec3::new(0.0, 1.0, 0.0), Some(0)),
            JointRecord::new(Vec3::new(0.0, 2.0, 0.0), Some(1)),
        ])
        .unwrap()
    }

    fn forked() -> Skeleton {
        // 0 -> 1 -> {2, 3}, 2 -> 4
        Skeleton::from_joints(&[
            JointRecord::root(Vec3::new(0.0, 1.0, 0.0)),
            JointRecord::new(Vec3::new(0.0, 2.0, 0.0), Some(0)),
            JointRecord::new(Vec3::new(1.0, 2.0, 0.0), Some(1)),
            JointRecord::new(Vec3::new(-1.0, 2.0, 0.0), Some(1)),
            JointRecord::new(Vec3::new(2.0, 2.0, 0.0), Some(2)),
        ])
        .unwrap()
    }

    fn assert_vec_near(actual: Vec3, expected: Vec3) {
        assert!(
            actual.abs_diff_eq(expected, 1e-4),
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn test_build_links() {
        let skeleton = forked();
        assert_eq!(skeleton.bone_count(), 4);
        assert!(skeleton.bones()[0].is_none());
        assert_eq!(skeleton.joint(1).unwrap().children(), &[2, 3]);
        assert_eq!(skeleton.bone(2).unwrap().parent(), Some(1));
        assert_eq!(skeleton.bone(1).unwrap().parent(), None);
        assert_eq!(skeleton.bone(1).unwrap().children(), &[2, 3]);
        assert_eq!(skeleton.bone(4).unwrap().root_joint(), 0);
    }

    #[test]
    fn test_rest_geometry() {
        let skeleton = forked();
        let bone = skeleton.bone(2).unwrap();
        assert!((bone.length() - 1.0).abs() < 1e-6);
        assert_vec_near(bone.direction(), Vec3::X);
        // Children of the root use the root's absolute position as offset
        assert_vec_near(skeleton.bone(1).unwrap().local_translation(), Vec3::new(0.0, 1.0, 0.0));
        assert_vec_near(skeleton.bone(2).unwrap().local_translation(), Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_build_is_idempotent() {
        let mut skeleton = forked();
        let before = skeleton.bones().to_vec();
        skeleton.build_bone(2).unwrap();
        skeleton.build_bone(0).unwrap();
        assert_eq!(skeleton.bones(), before.as_slice());
        assert_eq!(skeleton.joint(1).unwrap().children(), &[2, 3]);
    }

    #[test]
    fn test_build_out_of_order_builds_parent_first() {
        let mut skeleton = Skeleton::new(&[
            JointRecord::root(Vec3::ZERO),
            JointRecord::new(Vec3::Y, Some(0)),
            JointRecord::new(Vec3::Y * 2.0, Some(1)),
        ]);
        skeleton.build_bone(2).unwrap();
        assert!(skeleton.bone(1).is_ok());
        assert_eq!(skeleton.bone(2).unwrap().parent(), Some(1));
    }

    #[test]
    fn test_invalid_parent_is_reported() {
        let err = Skeleton::from_joints(&[
            JointRecord::root(Vec3::ZERO),
            JointRecord::new(Vec3::Y, Some(2)),
            JointRecord::new(Vec3::X, Some(0)),
        ])
        .unwrap_err();
        assert!(matches!(err, RigError::InvalidParent { joint: 1, parent: 2 }));
    }

    #[test]
    fn test_coincident_joints_use_fallback_direction() {
        let skeleton = Skeleton::from_joints(&[
            JointRecord::root(Vec3::ONE),
            JointRecord::new(Vec3::ONE, Some(0)),
        ])
        .unwrap();
        let bone = skeleton.bone(1).unwrap();
        assert_eq!(bone.direction(), FALLBACK_DIRECTION);
        assert_eq!(bone.length(), 0.0);
        assert!(skeleton.cache().translations()[1].is_finite());
    }

    #[test]
    fn test_bind_pose_commit() {
        let skeleton = forked();
        for joint in skeleton.joints() {
            assert_vec_near(joint.position(), joint.init_position());
        }
        assert_eq!(skeleton.cache().len(), 5);
    }

    #[test]
    fn test_rotate_chain() {
        let mut skeleton = chain();
        skeleton
            .rotate_bone(1, Quat::from_rotation_z(FRAC_PI_2))
            .unwrap();
        let cache = skeleton.commit_pose();
        assert_vec_near(cache.translations()[0], Vec3::ZERO);
        assert_vec_near(cache.translations()[1], Vec3::new(-1.0, 0.0, 0.0));
        assert_vec_near(cache.translations()[2], Vec3::new(-2.0, 0.0, 0.0));
    }

    #[test]
    fn test_rotating_root_bone_keeps_descendant_relative_rotations() {
        let mut skeleton = forked();
        skeleton.rotate_bone(2, Quat::from_rotation_y(0.3)).unwrap();
        skeleton.commit_pose();

        let before_positions: Vec<Vec3> =
            skeleton.joints().iter().map(Joint::position).collect();
        let before_relative: Vec<Quat> = (2..5)
            .map(|i| skeleton.bone(i).unwrap().relative_rotation())
            .collect();

        skeleton.rotate_bone(1, Quat::from_rotation_x(0.7)).unwrap();
        skeleton.commit_pose();

        for joint in 2..5 {
            let moved = skeleton.joints()[joint].position();
            assert!(!moved.abs_diff_eq(before_positions[joint], 1e-4));
        }
        for (i, rel) in (2..5).zip(before_relative) {
            let after = skeleton.bone(i).unwrap().relative_rotation();
            assert!(same_rotation(after, rel, 1e-6));
        }
    }

    #[test]
    fn test_rotate_missing_bone() {
        let mut skeleton = chain();
        assert!(matches!(
            skeleton.rotate_bone(0, Quat::IDENTITY),
            Err(RigError::MissingBone(0))
        ));
        assert!(matches!(
            skeleton.rotate_bone(9, Quat::IDENTITY),
            Err(RigError::BoneOutOfRange { index: 9, count: 3 })
        ));
    }

    #[test]
    fn test_rotate_joint_rotates_all_outgoing_bones() {
        let mut skeleton = forked();
        let delta = Quat::from_rotation_z(0.4);
        skeleton.rotate_joint(1, delta).unwrap();
        assert!(same_rotation(skeleton.bone(2).unwrap().relative_rotation(), delta, 1e-6));
        assert!(same_rotation(skeleton.bone(3).unwrap().relative_rotation(), delta, 1e-6));
        assert!(same_rotation(
            skeleton.bone(1).unwrap().relative_rotation(),
            Quat::IDENTITY,
            1e-6
        ));
    }

    #[test]
    fn test_translate_root() {
        let mut skeleton = forked();
        let delta = Vec3::new(0.5, 0.0, -1.0);
        skeleton.translate_root(delta, 0).unwrap();
        skeleton.commit_pose();
        for joint in skeleton.joints() {
            assert_vec_near(joint.position(), joint.init_position() + delta);
        }
        assert_vec_near(skeleton.root_offset(), delta);
    }

    #[test]
    fn test_translate_non_root_fails() {
        let mut skeleton = forked();
        assert!(matches!(
            skeleton.translate_root(Vec3::X, 2),
            Err(RigError::NotARoot(2))
        ));
        assert!(matches!(
            skeleton.translate_root(Vec3::X, 7),
            Err(RigError::JointOutOfRange { index: 7, count: 5 })
        ));
    }

    #[test]
    fn test_capture_then_apply_restores_pose() {
        let mut skeleton = forked();
        skeleton.rotate_bone(1, Quat::from_rotation_x(0.5)).unwrap();
        skeleton.rotate_bone(4, Quat::from_rotation_y(-0.2)).unwrap();
        skeleton.translate_root(Vec3::new(0.0, 0.0, 2.0), 0).unwrap();
        let pose = skeleton.capture_keyframe();
        let expected = skeleton.commit_pose().clone();

        skeleton.apply_keyframe(&Keyframe::identity(5)).unwrap();
        skeleton.apply_keyframe(&pose).unwrap();
        let actual = skeleton.commit_pose();

        for (a, e) in actual.translations().iter().zip(expected.translations()) {
            assert_vec_near(*a, *e);
        }
    }

    #[test]
    fn test_apply_wrong_size_keyframe_is_rejected() {
        let mut skeleton = chain();
        skeleton.rotate_bone(2, Quat::from_rotation_x(0.3)).unwrap();
        let before = skeleton.capture_keyframe();
        let err = skeleton.apply_keyframe(&Keyframe::identity(2)).unwrap_err();
        assert!(matches!(
            err,
            RigError::KeyframeSizeMismatch {
                expected: 3,
                actual: 2
            }
        ));
        assert_eq!(skeleton.capture_keyframe(), before);
    }

    #[test]
    fn test_leaf_joint_follows_incoming_bone() {
        let mut skeleton = chain();
        let delta = Quat::from_rotation_z(0.3);
        skeleton.rotate_bone(2, delta).unwrap();
        skeleton.commit_pose();
        assert!(same_rotation(skeleton.joints()[2].orientation(), delta, 1e-6));
        assert!(same_rotation(skeleton.joints()[1].orientation(), delta, 1e-6));
        assert!(same_rotation(
            skeleton.joints()[0].orientation(),
            Quat::IDENTITY,
            1e-6
        ));
    }

    #[test]
    fn test_branching_joint_follows_first_child_bone() {
        let mut skeleton = forked();
        skeleton.rotate_bone(3, Quat::from_rotation_z(0.7)).unwrap();
        skeleton.commit_pose();
        let joint = &skeleton.joints()[1];
        assert_eq!(joint.children(), &[2, 3]);
        assert!(same_rotation(joint.orientation(), Quat::IDENTITY, 1e-6));

        skeleton.rotate_bone(2, Quat::from_rotation_x(0.4)).unwrap();
        skeleton.commit_pose();
        assert!(same_rotation(
            skeleton.joints()[1].orientation(),
            Quat::from_rotation_x(0.4),
            1e-6
        ));
    }

    #[test]
    fn test_commit_into_separate_cache() {
        let mut skeleton = chain();
        skeleton.rotate_bone(1, Quat::from_rotation_z(FRAC_PI_2)).unwrap();
        let mut target = PoseCache::new();
        skeleton.commit_pose_into(&mut target);
        assert_vec_near(target.translations()[2], Vec3::new(-2.0, 0.0, 0.0));
        assert_eq!(target.translation_data().len(), 9);
        assert_eq!(target.rotation_data().len(), 12);
    }
}

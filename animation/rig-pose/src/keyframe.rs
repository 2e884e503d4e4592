//! Keyframes and the ordered keyframe timeline

use glam::{Quat, Vec3};

use crate::error::{Result, RigError};

/// A captured pose: one relative rotation per bone slot plus a root offset
///
/// Rotations are indexed by joint index. The slot of the root joint has no
/// bone and carries identity. `root` is the root translation measured from
/// the edit origin, so a keyframe composes with any bind pose.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyframe {
    /// Rotation of each bone relative to its parent bone
    pub rotations: Vec<Quat>,
    /// Root translation offset from the edit origin
    pub root: Vec3,
}

impl Keyframe {
    /// Create a keyframe from its parts
    pub fn new(rotations: Vec<Quat>, root: Vec3) -> Self {
        Self { rotations, root }
    }

    /// Identity pose for a skeleton with `bone_slots` slots
    pub fn identity(bone_slots: usize) -> Self {
        Self {
            rotations: vec![Quat::IDENTITY; bone_slots],
            root: Vec3::ZERO,
        }
    }

    /// Number of rotation entries
    pub fn bone_slots(&self) -> usize {
        self.rotations.len()
    }

    /// Fail unless this keyframe has exactly `expected` rotations
    pub fn check_size(&self, expected: usize) -> Result<()> {
        if self.rotations.len() == expected {
            Ok(())
        } else {
            Err(RigError::KeyframeSizeMismatch {
                expected,
                actual: self.rotations.len(),
            })
        }
    }
}

/// Ordered keyframe sequence; index is the integer time unit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    keyframes: Vec<Keyframe>,
}

impl Timeline {
    /// Create an empty timeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keyframes
    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    /// Whether the timeline holds no keyframes
    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Keyframe at `index`
    pub fn get(&self, index: usize) -> Result<&Keyframe> {
        self.keyframes
            .get(index)
            .ok_or(RigError::KeyframeOutOfRange {
                index,
                len: self.keyframes.len(),
            })
    }

    /// All keyframes in playback order
    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    /// Iterate keyframes in playback order
    pub fn iter(&self) -> std::slice::Iter<'_, Keyframe> {
        self.keyframes.iter()
    }

    /// Append a keyframe at the end
    pub fn push(&mut self, keyframe: Keyframe) {
        self.keyframes.push(keyframe);
    }

    /// Insert a keyframe before `index`; `index == len` appends
    pub fn insert(&mut self, index: usize, keyframe: Keyframe) -> Result<()> {
        if index > self.keyframes.len() {
            return Err(RigError::KeyframeOutOfRange {
                index,
                len: self.keyframes.len(),
            });
        }
        self.keyframes.insert(index, keyframe);
        Ok(())
    }

    /// Replace the keyframe at `index`, returning the old one
    pub fn overwrite(&mut self, index: usize, keyframe: Keyframe) -> Result<Keyframe> {
        let len = self.keyframes.len();
        let slot = self
            .keyframes
            .get_mut(index)
            .ok_or(RigError::KeyframeOutOfRange { index, len })?;
        Ok(std::mem::replace(slot, keyframe))
    }

    /// Remove and return the keyframe at `index`
    pub fn remove(&mut self, index: usize) -> Result<Keyframe> {
        if index >= self.keyframes.len() {
            return Err(RigError::KeyframeOutOfRange {
                index,
                len: self.keyframes.len(),
            });
        }
        Ok(self.keyframes.remove(index))
    }

    /// Replace the whole sequence
    pub fn replace_all(&mut self, keyframes: Vec<Keyframe>) {
        self.keyframes = keyframes;
    }

    /// Drop every keyframe
    pub fn clear(&mut self) {
        self.keyframes.clear();
    }
}

impl<'a> IntoIterator for &'a Timeline {
    type Item = &'a Keyframe;
    type IntoIter = std::slice::Iter<'a, Keyframe>;

    fn into_iter(self) -> Self::IntoIter {
        self.keyframes.iter()
    }
}

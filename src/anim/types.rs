use crate::{anim_error::AnimError, quat::Quat, vqs::Vqs};
use ahash::{HashMap, HashMapExt};
use log::warn;
use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::sync::Arc;

/// Used when an animation does not give a usable playback rate
pub const DEFAULT_TICKS_PER_SECOND: f32 = 1.0_f32;

/// A joint of a `Skeleton`
///
/// `bind` is the rest pose of the bone in model space, so it takes points in
/// bone space to model space. `inverse_bind` goes the other way and is what
/// skinning multiplies by. Both are kept as the matrices given at load time
/// and as `Vqs` values.
#[derive(Clone, Debug)]
pub struct Bone {
    pub name: String,
    pub index: usize,
    pub parent: Option<usize>,
    pub children: SmallVec<[usize; 4]>,
    pub bind_matrix: glm::Mat4,
    pub inverse_bind_matrix: glm::Mat4,
    pub bind: Vqs,
    pub inverse_bind: Vqs,
    /// Bind pose relative to the parent bind pose. This is the local
    /// transform used for bones or channels with no animation data.
    pub local_bind: Vqs,
}

/// Bone hierarchy
///
/// Bones are stored parent first, so a parent always has a lower index than
/// its children and a single pass in index order visits parents before
/// children. The index of a bone never changes once built. Build with
/// `SkeletonBuilder`, which checks the hierarchy.
#[derive(Clone, Debug)]
pub struct Skeleton {
    pub(crate) name: String,
    pub(crate) bones: Vec<Bone>,
    pub(crate) roots: Vec<usize>,
    pub(crate) by_name: HashMap<String, usize>,
}

impl Skeleton {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    #[must_use]
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    #[must_use]
    pub fn bone(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    /// Indices of bones with no parent. There may be more than one.
    #[must_use]
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// # Errors
    /// Returns `AnimError::UnknownBone` if there is no bone with that name
    pub fn index_of(&self, name: &str) -> Result<usize, AnimError> {
        self.find(name)
            .ok_or_else(|| AnimError::UnknownBone(name.to_string()))
    }

    /// Collects a chain for inverse kinematics. Starts at `end_effector` and
    /// follows parents toward the root, stopping after `length` bones or at a
    /// root, whichever comes first.
    ///
    /// # Errors
    /// Returns `AnimError::BoneOutOfRange` for a bad `end_effector`
    pub fn chain(
        &self,
        end_effector: usize,
        length: usize,
    ) -> Result<Vec<usize>, AnimError> {
        let mut bone = self
            .bones
            .get(end_effector)
            .ok_or(AnimError::BoneOutOfRange(end_effector))?;
        let mut ret = Vec::with_capacity(length);
        while ret.len() < length {
            ret.push(bone.index);
            let Some(parent) = bone.parent else {
                break;
            };
            bone = &self.bones[parent];
        }
        Ok(ret)
    }

    /// Model space bind pose of every bone, indexed by bone index
    #[must_use]
    pub fn bind_pose(&self) -> Vec<Vqs> {
        self.bones.iter().map(|b| b.bind).collect()
    }
}

/// A keyframe value at a time in ticks
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Key<T> {
    pub time: f32,
    pub value: T,
}

pub type KeyPosition = Key<glm::Vec3>;
pub type KeyRotation = Key<Quat>;
/// Scale keys are uniform since `Vqs` can only hold uniform scale
pub type KeyScale = Key<f32>;

/// Keyframes for one bone
///
/// Each channel is independent and may have any number of keys, including
/// none. Keys are in increasing time order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    #[serde(default)]
    pub positions: Vec<KeyPosition>,
    #[serde(default)]
    pub rotations: Vec<KeyRotation>,
    #[serde(default)]
    pub scales: Vec<KeyScale>,
}

impl Track {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
            && self.rotations.is_empty()
            && self.scales.is_empty()
    }

    /// Sorts every channel by time
    pub fn sort(&mut self) {
        fn by_time<T>(a: &Key<T>, b: &Key<T>) -> std::cmp::Ordering {
            a.time
                .partial_cmp(&b.time)
                .unwrap_or(std::cmp::Ordering::Equal)
        }
        self.positions.sort_by(by_time);
        self.rotations.sort_by(by_time);
        self.scales.sort_by(by_time);
    }

    /// Time of the last key in any channel
    #[must_use]
    pub fn max_time(&self) -> f32 {
        self.positions
            .last()
            .map(|k| k.time)
            .into_iter()
            .chain(self.rotations.last().map(|k| k.time))
            .chain(self.scales.last().map(|k| k.time))
            .fold(0.0_f32, f32::max)
    }
}

/// Keyframe animation with one optional track per bone
///
/// `tracks` is indexed by bone index of the skeleton the animation was built
/// for. A missing or empty track leaves that bone in its bind pose.
/// `duration` is in ticks and `ticks_per_second` converts from seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct Animation {
    pub(crate) name: String,
    pub(crate) duration: f32,
    pub(crate) ticks_per_second: f32,
    pub(crate) tracks: Vec<Option<Track>>,
}

impl Animation {
    /// Creates an animation from bone indexed tracks. A non-positive or
    /// non-finite `ticks_per_second` is replaced with
    /// `DEFAULT_TICKS_PER_SECOND`. Keys in every track are sorted by time.
    #[must_use]
    pub fn new(
        name: &str,
        duration: f32,
        ticks_per_second: f32,
        mut tracks: Vec<Option<Track>>,
    ) -> Self {
        let ticks_per_second =
            if ticks_per_second.is_finite() && ticks_per_second > 0.0 {
                ticks_per_second
            } else {
                warn!(
                    "animation {name} has ticks_per_second={ticks_per_second}, \
                     using {DEFAULT_TICKS_PER_SECOND}"
                );
                DEFAULT_TICKS_PER_SECOND
            };
        for track in tracks.iter_mut().flatten() {
            track.sort();
        }
        Self {
            name: name.to_string(),
            duration: duration.max(0.0),
            ticks_per_second,
            tracks,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn duration(&self) -> f32 {
        self.duration
    }

    #[must_use]
    pub const fn ticks_per_second(&self) -> f32 {
        self.ticks_per_second
    }

    #[must_use]
    pub fn track(&self, bone: usize) -> Option<&Track> {
        self.tracks.get(bone).and_then(Option::as_ref)
    }

    #[must_use]
    pub fn tracks(&self) -> &[Option<Track>] {
        &self.tracks
    }
}

/// Owns loaded animations so animators can share them
#[derive(Clone, Debug, Default)]
pub struct AnimationLibrary {
    animations: Vec<Arc<Animation>>,
    by_name: HashMap<String, usize>,
}

impl AnimationLibrary {
    #[must_use]
    pub fn new() -> Self {
        Self {
            animations: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Adds an animation and returns its index. If the name is already in
    /// use, lookup by name will find the newer animation.
    pub fn add(&mut self, animation: Animation) -> usize {
        let index = self.animations.len();
        if let Some(old) =
            self.by_name.insert(animation.name.clone(), index)
        {
            warn!(
                "animation {} replaces index {old} for name lookup",
                animation.name
            );
        }
        self.animations.push(Arc::new(animation));
        index
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.animations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }

    /// # Errors
    /// Returns `AnimError::UnknownAnimationIndex` if not found
    pub fn get(&self, index: usize) -> Result<Arc<Animation>, AnimError> {
        self.animations
            .get(index)
            .cloned()
            .ok_or(AnimError::UnknownAnimationIndex(index))
    }

    /// # Errors
    /// Returns `AnimError::UnknownAnimationName` if not found
    pub fn get_by_name(&self, name: &str) -> Result<Arc<Animation>, AnimError> {
        self.by_name
            .get(name)
            .and_then(|&i| self.animations.get(i))
            .cloned()
            .ok_or_else(|| AnimError::UnknownAnimationName(name.to_string()))
    }

    #[must_use]
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.animations.iter().map(|a| a.name())
    }
}

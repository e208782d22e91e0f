use super::{
    keys,
    types::{Animation, AnimationLibrary, Bone, Skeleton, Track},
};
use crate::{
    anim_error::AnimError,
    config::AnimatorConfig,
    ik::{IkReport, IkSolver},
    interpolate,
    quat::Quat,
    vqs::Vqs,
};
use log::{debug, error, trace};
use nalgebra_glm as glm;
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::{str::FromStr, sync::Arc};

/// Step count used by incremental interpolation unless configured otherwise
pub const DEFAULT_INCREMENTAL_STEPS: u32 = 10;

/// How rotation keys are blended
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyInterpolation {
    /// Direct interpolation between the two bracketing keys
    #[default]
    Default,
    /// Stepped interpolation with `ilerp` or `islerp`
    Incremental,
}

/// Which quaternion interpolation is used for rotation keys
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuatInterpolation {
    Lerp,
    #[default]
    Slerp,
}

impl FromStr for KeyInterpolation {
    type Err = AnimError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "incremental" => Ok(Self::Incremental),
            _ => Err(AnimError::UnknownInterpolation(s.to_string())),
        }
    }
}

impl TryFrom<u32> for KeyInterpolation {
    type Error = AnimError;
    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Default),
            1 => Ok(Self::Incremental),
            _ => Err(AnimError::UnknownInterpolation(value.to_string())),
        }
    }
}

impl FromStr for QuatInterpolation {
    type Err = AnimError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lerp" => Ok(Self::Lerp),
            "slerp" => Ok(Self::Slerp),
            _ => Err(AnimError::UnknownInterpolation(s.to_string())),
        }
    }
}

impl TryFrom<u32> for QuatInterpolation {
    type Error = AnimError;
    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Lerp),
            1 => Ok(Self::Slerp),
            _ => Err(AnimError::UnknownInterpolation(value.to_string())),
        }
    }
}

/// Playback state as seen from outside the animator
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum State<'a> {
    Stopped,
    Playing { animation: &'a str, time: f32 },
}

/// Plays an `Animation` on a `Skeleton`
///
/// Each `update` advances the playback time, looping at the end of the
/// animation, and recalculates `final_transforms`: one model space `Vqs` per
/// bone, indexed by bone index. The skeleton and animations are shared and
/// only read. Use one animator per animated model instance.
#[derive(Clone, Debug)]
pub struct Animator {
    skeleton: Arc<Skeleton>,
    animation: Option<Arc<Animation>>,
    time: f32,
    speed: f32,
    key_interpolation: KeyInterpolation,
    quat_interpolation: QuatInterpolation,
    incremental_steps: u32,
    bind_pose: bool,
    local_poses: Vec<Vqs>,
    final_transforms: Vec<Vqs>,
}

/// Wraps a time into `[0, duration)`. A zero length animation stays at 0.
fn wrap(time: f32, duration: f32) -> f32 {
    if duration > 0.0 && time.is_finite() {
        // rem_euclid rounds tiny negative times up to duration
        let r = time.rem_euclid(duration);
        if r >= duration {
            0.0
        } else {
            r
        }
    } else {
        0.0
    }
}

impl Animator {
    /// Creates a stopped animator holding the bind pose
    #[must_use]
    pub fn new(skeleton: Arc<Skeleton>) -> Self {
        let local_poses = skeleton.bones().iter().map(|b| b.local_bind).collect();
        let final_transforms = skeleton.bind_pose();
        Self {
            skeleton,
            animation: None,
            time: 0.0,
            speed: 1.0,
            key_interpolation: KeyInterpolation::default(),
            quat_interpolation: QuatInterpolation::default(),
            incremental_steps: DEFAULT_INCREMENTAL_STEPS,
            bind_pose: false,
            local_poses,
            final_transforms,
        }
    }

    /// # Errors
    /// Returns `AnimError::InvalidConfig` if the configuration has bad values
    pub fn with_config(
        skeleton: Arc<Skeleton>,
        config: &AnimatorConfig,
    ) -> Result<Self, AnimError> {
        let mut ret = Self::new(skeleton);
        ret.apply_config(config)?;
        Ok(ret)
    }

    /// Applies all settings from a configuration. Nothing is changed if the
    /// configuration is invalid.
    ///
    /// # Errors
    /// Returns `AnimError::InvalidConfig` if the configuration has bad values
    pub fn apply_config(
        &mut self,
        config: &AnimatorConfig,
    ) -> Result<(), AnimError> {
        config.validate()?;
        self.key_interpolation = config.key_interpolation;
        self.quat_interpolation = config.quaternion_interpolation;
        self.bind_pose = config.bind_pose;
        self.speed = config.speed;
        self.incremental_steps = config.incremental_steps;
        Ok(())
    }

    #[must_use]
    pub const fn skeleton(&self) -> &Arc<Skeleton> {
        &self.skeleton
    }

    #[must_use]
    pub fn animation(&self) -> Option<&Animation> {
        self.animation.as_deref()
    }

    #[must_use]
    pub fn state(&self) -> State<'_> {
        self.animation.as_ref().map_or(State::Stopped, |a| State::Playing {
            animation: a.name(),
            time: self.time,
        })
    }

    /// Starts playing from time 0
    pub fn play(&mut self, animation: Arc<Animation>) {
        debug!(
            "playing animation {} on skeleton {}",
            animation.name(),
            self.skeleton.name()
        );
        if animation.tracks().len() > self.skeleton.len() {
            debug!(
                "animation {} has {} tracks for {} bones, extra ignored",
                animation.name(),
                animation.tracks().len(),
                self.skeleton.len()
            );
        }
        self.animation = Some(animation);
        self.time = 0.0;
    }

    /// # Errors
    /// Returns `AnimError::UnknownAnimationName` if not in the library
    pub fn play_by_name(
        &mut self,
        library: &AnimationLibrary,
        name: &str,
    ) -> Result<(), AnimError> {
        let animation = library.get_by_name(name).inspect_err(|e| {
            error!("{e}");
        })?;
        self.play(animation);
        Ok(())
    }

    /// # Errors
    /// Returns `AnimError::UnknownAnimationIndex` if not in the library
    pub fn play_by_index(
        &mut self,
        library: &AnimationLibrary,
        index: usize,
    ) -> Result<(), AnimError> {
        let animation = library.get(index).inspect_err(|e| {
            error!("{e}");
        })?;
        self.play(animation);
        Ok(())
    }

    /// Stops playback. The next update produces the bind pose.
    pub fn stop(&mut self) {
        self.animation = None;
        self.time = 0.0;
    }

    /// Current playback time in ticks
    #[must_use]
    pub const fn time(&self) -> f32 {
        self.time
    }

    /// Moves playback to a time in ticks, wrapped to the animation length,
    /// and evaluates the pose there
    pub fn set_time(&mut self, time: f32) {
        self.time = self
            .animation
            .as_ref()
            .map_or(0.0, |a| wrap(time, a.duration()));
        self.evaluate();
    }

    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    /// Playback speed multiplier. Negative values play backwards.
    ///
    /// # Errors
    /// Returns `AnimError::InvalidConfig` if not finite
    pub fn set_speed(&mut self, speed: f32) -> Result<(), AnimError> {
        if !speed.is_finite() {
            return Err(AnimError::InvalidConfig(format!("speed {speed}")));
        }
        self.speed = speed;
        Ok(())
    }

    #[must_use]
    pub const fn key_interpolation(&self) -> KeyInterpolation {
        self.key_interpolation
    }

    pub fn set_key_interpolation(&mut self, method: KeyInterpolation) {
        self.key_interpolation = method;
    }

    #[must_use]
    pub const fn quat_interpolation(&self) -> QuatInterpolation {
        self.quat_interpolation
    }

    pub fn set_quat_interpolation(&mut self, method: QuatInterpolation) {
        self.quat_interpolation = method;
    }

    #[must_use]
    pub const fn incremental_steps(&self) -> u32 {
        self.incremental_steps
    }

    /// # Errors
    /// Returns `AnimError::InvalidConfig` for zero steps
    pub fn set_incremental_steps(&mut self, steps: u32) -> Result<(), AnimError> {
        if steps == 0 {
            return Err(AnimError::InvalidConfig(
                "incremental_steps must be at least 1".to_string(),
            ));
        }
        self.incremental_steps = steps;
        Ok(())
    }

    #[must_use]
    pub const fn bind_pose(&self) -> bool {
        self.bind_pose
    }

    /// When set, updates output the bind pose and playback time is held
    pub fn set_bind_pose(&mut self, bind_pose: bool) {
        self.bind_pose = bind_pose;
    }

    /// Model space transform of every bone from the last update
    #[must_use]
    pub fn final_transforms(&self) -> &[Vqs] {
        &self.final_transforms
    }

    /// Bone transforms relative to their parents from the last update
    #[must_use]
    pub fn local_poses(&self) -> &[Vqs] {
        &self.local_poses
    }

    /// Advances by `dt` seconds and recalculates the pose
    pub fn update(&mut self, dt: f32) {
        if self.bind_pose {
            self.reset_to_bind();
            return;
        }
        let Some(animation) = self.animation.as_ref() else {
            self.reset_to_bind();
            return;
        };
        let advance = dt * animation.ticks_per_second() * self.speed;
        self.time = wrap(self.time + advance, animation.duration());
        trace!("update dt={dt} time={}", self.time);
        self.evaluate();
    }

    /// Recalculates the pose at the current time without advancing it
    pub fn evaluate(&mut self) {
        if self.bind_pose {
            self.reset_to_bind();
            return;
        }
        let Some(animation) = self.animation.clone() else {
            self.reset_to_bind();
            return;
        };
        let skeleton = Arc::clone(&self.skeleton);
        for bone in skeleton.bones() {
            let local = animation
                .track(bone.index)
                .map_or(bone.local_bind, |t| self.local_pose(bone, t));
            self.local_poses[bone.index] = local;
        }
        self.compose();
    }

    fn reset_to_bind(&mut self) {
        for (local, bone) in
            self.local_poses.iter_mut().zip(self.skeleton.bones())
        {
            *local = bone.local_bind;
        }
        for (out, bone) in
            self.final_transforms.iter_mut().zip(self.skeleton.bones())
        {
            *out = bone.bind;
        }
    }

    fn local_pose(&self, bone: &Bone, track: &Track) -> Vqs {
        let default = &bone.local_bind;
        let v = keys::sample(
            &track.positions,
            self.time,
            default.v,
            interpolate::lerp_vec3,
        );
        let s = keys::sample(&track.scales, self.time, default.s, |a, b, t| {
            interpolate::lerp_f32(*a, *b, t)
        });
        let q = keys::sample(&track.rotations, self.time, default.q, |a, b, t| {
            self.blend_rotation(a, b, t)
        });
        Vqs::new(v, q, s)
    }

    fn blend_rotation(&self, a: &Quat, b: &Quat, t: f32) -> Quat {
        let n = self.incremental_steps;
        match (self.key_interpolation, self.quat_interpolation) {
            (KeyInterpolation::Default, QuatInterpolation::Lerp) => {
                interpolate::lerp(a, b, t)
            }
            (KeyInterpolation::Default, QuatInterpolation::Slerp) => {
                interpolate::slerp(a, b, t)
            }
            (KeyInterpolation::Incremental, QuatInterpolation::Lerp) => {
                interpolate::ilerp(a, b, t, n)
            }
            (KeyInterpolation::Incremental, QuatInterpolation::Slerp) => {
                interpolate::islerp(a, b, t, n)
            }
        }
    }

    /// Combines local poses into model space. Parents have lower indices
    /// than their children so one pass in order is enough.
    fn compose(&mut self) {
        for bone in self.skeleton.bones() {
            let local = self.local_poses[bone.index];
            self.final_transforms[bone.index] = match bone.parent {
                Some(p) => self.final_transforms[p] * local,
                None => local,
            };
        }
    }

    /// Transforms from bind pose to the current pose, ready for skinning
    #[must_use]
    pub fn skinning_transforms(&self) -> Vec<Vqs> {
        self.final_transforms
            .iter()
            .zip(self.skeleton.bones())
            .map(|(t, bone)| *t * bone.inverse_bind)
            .collect()
    }

    /// Skinning transforms as column major 4x4 arrays for GPU upload
    #[must_use]
    pub fn skinning_matrices(&self) -> SkinningMatrices {
        SkinningMatrices(
            self.final_transforms
                .iter()
                .zip(self.skeleton.bones())
                .map(|(t, bone)| {
                    (t.to_mat4() * bone.inverse_bind_matrix).into()
                })
                .collect(),
        )
    }

    /// Runs an IK solver on a chain of bones and writes the result back
    ///
    /// The chain starts at `end_effector` and goes up to `length` bones
    /// toward the root. Bones below the chain follow their parents. This is
    /// never done by `update`, so call it after each update that needs it.
    ///
    /// # Errors
    /// Returns `AnimError::BoneOutOfRange` for a bad `end_effector`
    pub fn apply_ik(
        &mut self,
        solver: &IkSolver,
        end_effector: usize,
        length: usize,
        goal: &glm::Vec3,
    ) -> Result<IkReport, AnimError> {
        let chain = self.skeleton.chain(end_effector, length)?;
        let mut poses: Vec<Vqs> =
            chain.iter().map(|&i| self.final_transforms[i]).collect();
        let report = solver.solve_chain(&mut poses, goal);

        // Root end of the chain first so each parent is already updated
        let skeleton = Arc::clone(&self.skeleton);
        for (&index, pose) in chain.iter().zip(&poses).rev() {
            let parent = skeleton.bones()[index]
                .parent
                .map_or_else(Vqs::default, |p| self.final_transforms[p]);
            self.local_poses[index] = parent.inverse() * *pose;
            self.final_transforms[index] = *pose;
        }
        self.compose();
        Ok(report)
    }
}

/// Skinning matrices for one skeleton, indexed by bone index
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SkinningMatrices(pub Vec<[[f32; 4]; 4]>);

impl SkinningMatrices {
    /// Raw bytes for copying into a uniform or storage buffer
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.0)
    }
}

/// Updates many animators by the same time step. Runs in parallel when the
/// `rayon` feature is enabled. Skeletons and animations are shared read only
/// so this is safe as long as each model has its own animator.
pub fn update_all(animators: &mut [Animator], dt: f32) {
    #[cfg(feature = "rayon")]
    animators.par_iter_mut().for_each(|a| a.update(dt));
    #[cfg(not(feature = "rayon"))]
    animators.iter_mut().for_each(|a| a.update(dt));
}

#[cfg(test)]
mod tests {
    use super::{wrap, KeyInterpolation, QuatInterpolation};
    use crate::anim_error::AnimError;

    const EPSILON: f32 = 0.0005_f32;

    #[test]
    fn wrap_time() {
        assert!((wrap(2.4, 2.0) - 0.4).abs() < EPSILON);
        assert!((wrap(-0.5, 2.0) - 1.5).abs() < EPSILON);
        assert!((wrap(1.0, 0.0)).abs() < EPSILON);
        assert!((wrap(f32::NAN, 2.0)).abs() < EPSILON);
        assert!(wrap(-1.0e-8, 2.0) < 2.0);
        assert!((wrap(-1.0e-8, 2.0)).abs() < EPSILON);
    }

    #[test]
    fn select_by_name() {
        assert_eq!(
            "SLERP".parse::<QuatInterpolation>().unwrap(),
            QuatInterpolation::Slerp
        );
        assert_eq!(
            "incremental".parse::<KeyInterpolation>().unwrap(),
            KeyInterpolation::Incremental
        );
        assert!(matches!(
            "cubic".parse::<QuatInterpolation>(),
            Err(AnimError::UnknownInterpolation(_))
        ));
    }

    #[test]
    fn select_by_number() {
        assert_eq!(
            QuatInterpolation::try_from(0_u32).unwrap(),
            QuatInterpolation::Lerp
        );
        assert_eq!(
            KeyInterpolation::try_from(0_u32).unwrap(),
            KeyInterpolation::Default
        );
        assert!(KeyInterpolation::try_from(2_u32).is_err());
    }
}

//! Cyclic coordinate descent inverse kinematics
use crate::{anim_error::AnimError, config::IkConfig, quat::Quat, vqs::Vqs};
use log::trace;
use nalgebra_glm as glm;

/// Vectors shorter than this are not normalized. Rotation axes shorter than
/// this mean the joint, end effector and target are in line.
const DEGENERATE_EPSILON: f32 = 1.0e-6_f32;

/// Outcome of a solve. Not reaching the goal is not an error, the chain is
/// left at the best pose found.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IkReport {
    pub iterations: u32,
    pub converged: bool,
    /// Squared distance from the end effector to the target when finished
    pub distance_squared: f32,
}

/// CCD chain solver
///
/// Holds only parameters so one solver can be used for any number of chains.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IkSolver {
    weight: f32,
    error: f32,
    max_iterations: u32,
}

impl Default for IkSolver {
    fn default() -> Self {
        let config = IkConfig::default();
        Self {
            weight: config.weight,
            error: config.error,
            max_iterations: config.max_iterations,
        }
    }
}

impl IkSolver {
    /// `weight` blends the target between the current end effector position
    /// (0) and the goal (1). `error` is a squared distance.
    ///
    /// # Errors
    /// Returns `AnimError::InvalidConfig` if `weight` is outside `[0, 1]` or
    /// `error` is negative
    pub fn new(
        weight: f32,
        error: f32,
        max_iterations: u32,
    ) -> Result<Self, AnimError> {
        if !(0.0..=1.0).contains(&weight) {
            return Err(AnimError::InvalidConfig(format!(
                "IK weight {weight} is not in [0, 1]"
            )));
        }
        if !(error >= 0.0 && error.is_finite()) {
            return Err(AnimError::InvalidConfig(format!(
                "IK error {error} must be a positive number"
            )));
        }
        Ok(Self {
            weight,
            error,
            max_iterations,
        })
    }

    /// # Errors
    /// Returns `AnimError::InvalidConfig` for bad values
    pub fn from_config(config: &IkConfig) -> Result<Self, AnimError> {
        Self::new(config.weight, config.error, config.max_iterations)
    }

    #[must_use]
    pub const fn weight(&self) -> f32 {
        self.weight
    }

    #[must_use]
    pub const fn error(&self) -> f32 {
        self.error
    }

    #[must_use]
    pub const fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Adjusts a chain of model space bone transforms so the end effector
    /// moves toward `goal`
    ///
    /// `chain[0]` is the end effector and each following entry is the parent
    /// of the one before it. Each iteration visits every joint from the one
    /// nearest the end effector up to the root of the chain, and rotates it
    /// so the end effector swings toward the target. The rotation is applied
    /// to the joint and everything below it in the chain.
    pub fn solve_chain(&self, chain: &mut [Vqs], goal: &glm::Vec3) -> IkReport {
        let Some(end) = chain.first() else {
            return IkReport {
                iterations: 0,
                converged: true,
                distance_squared: 0.0,
            };
        };
        let target = end.v + (goal - end.v) * self.weight;
        let mut distance_squared = distance(chain, &target);
        if distance_squared < self.error {
            return IkReport {
                iterations: 0,
                converged: true,
                distance_squared,
            };
        }

        for iteration in 1..=self.max_iterations {
            for joint in 1..chain.len() {
                rotate_joint(chain, joint, &target);
                distance_squared = distance(chain, &target);
                if distance_squared < self.error {
                    trace!("IK converged after {iteration} iterations");
                    return IkReport {
                        iterations: iteration,
                        converged: true,
                        distance_squared,
                    };
                }
            }
        }
        trace!("IK stopped at distance_squared={distance_squared}");
        IkReport {
            iterations: self.max_iterations,
            converged: false,
            distance_squared,
        }
    }
}

fn distance(chain: &[Vqs], target: &glm::Vec3) -> f32 {
    glm::distance2(&chain[0].v, target)
}

/// Rotates `chain[joint]` and the entries before it about the joint position
/// so that the end effector points at `target`
///
/// When the end effector and the target lie on one line through the joint
/// there is no rotation axis. The joint then folds about an axis
/// perpendicular to the line, by the angle that puts the end effector at the
/// target's distance from its parent joint, and the parent aims the folded
/// chain on its turn.
fn rotate_joint(chain: &mut [Vqs], joint: usize, target: &glm::Vec3) {
    let pivot = chain[joint].v;
    let to_end = chain[0].v - pivot;
    let to_target = target - pivot;
    let (end_len, target_len) = (glm::length(&to_end), glm::length(&to_target));
    if end_len < DEGENERATE_EPSILON {
        return;
    }
    let to_end = to_end / end_len;
    let (axis, angle) = if target_len < DEGENERATE_EPSILON {
        (perpendicular(&to_end), 0.0)
    } else {
        let to_target = to_target / target_len;
        let cos = glm::dot(&to_end, &to_target).clamp(-1.0, 1.0);
        (glm::cross(&to_end, &to_target), cos.acos())
    };
    let (axis, angle) = if glm::length(&axis) >= DEGENERATE_EPSILON {
        (axis, angle)
    } else {
        let bend = chain.get(joint + 1).map_or(angle, |parent| {
            fold_angle(&parent.v, &pivot, end_len, target)
        });
        if bend < DEGENERATE_EPSILON {
            return;
        }
        (perpendicular(&to_end), bend)
    };
    let rot = Quat::from_axis_angle(&axis, angle);
    for t in &mut chain[..=joint] {
        t.v = pivot + rot.rotate(&(t.v - pivot));
        t.q = (rot * t.q).normalize();
    }
}

/// Bend at `pivot` that moves the end effector, `end_len` away, to the
/// distance of `target` from `parent`
fn fold_angle(
    parent: &glm::Vec3,
    pivot: &glm::Vec3,
    end_len: f32,
    target: &glm::Vec3,
) -> f32 {
    let a = glm::distance(parent, pivot);
    if a < DEGENERATE_EPSILON {
        return 0.0;
    }
    let c = glm::distance(parent, target);
    let cos = (a * a + end_len * end_len - c * c) / (2.0 * a * end_len);
    std::f32::consts::PI - cos.clamp(-1.0, 1.0).acos()
}

/// Any unit vector at right angles to `v`
fn perpendicular(v: &glm::Vec3) -> glm::Vec3 {
    let axis = glm::cross(v, &glm::Vec3::x());
    if glm::length(&axis) < DEGENERATE_EPSILON {
        glm::normalize(&glm::cross(v, &glm::Vec3::y()))
    } else {
        glm::normalize(&axis)
    }
}

//! Quaternion interpolation
//!
//! All functions take unit or non-unit quaternions, normalize them first, and
//! return a unit quaternion. Interpolation always follows the shorter arc:
//! `q` and `-q` are the same rotation so one input is negated when their dot
//! product is negative.
//!
//! The incremental versions split the interval into `n` equal steps and return
//! the sample at step `floor(t * n)`. This is a stepped curve that matches the
//! plain version only at step boundaries.
use crate::quat::Quat;
use nalgebra_glm as glm;

/// Above this cosine the inputs are treated as parallel and the spherical
/// formulas fall back to linear interpolation
pub const SLERP_EPSILON: f32 = 0.0001_f32;

/// Helper to calculate the parameter used for interpolation between two
/// keyframe times
#[must_use]
pub fn weight(start: f32, end: f32, current: f32) -> f32 {
    const EPSILON: f32 = 0.0005;
    ((current - start) / (end - start).max(EPSILON)).clamp(0.0f32, 1.0f32)
}

/// Linear interpolation of vectors, used for translation and scale keys
#[must_use]
pub fn lerp_vec3(a: &glm::Vec3, b: &glm::Vec3, t: f32) -> glm::Vec3 {
    a + (b - a) * t
}

#[must_use]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    (b - a).mul_add(t, a)
}

/// Normalizes both inputs and negates the second if needed to use the
/// shorter arc. Returns them with their dot product.
fn prepare(q0: &Quat, q1: &Quat) -> (Quat, Quat, f32) {
    let a = q0.normalize();
    let b = q1.normalize();
    let cos = a.dot(&b);
    if cos < 0.0 {
        (a, -b, -cos)
    } else {
        (a, b, cos)
    }
}

/// Number of whole steps reached at `t` out of `n`
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[allow(clippy::cast_precision_loss)]
fn step_count(t: f32, n: u32) -> u32 {
    let n = n.max(1);
    ((t.clamp(0.0, 1.0) * n as f32).floor() as u32).min(n)
}

/// Normalized linear interpolation
#[must_use]
pub fn lerp(q0: &Quat, q1: &Quat, t: f32) -> Quat {
    let (a, b, _) = prepare(q0, q1);
    (a * (1.0 - t) + b * t).normalize()
}

/// Incremental linear interpolation with `n` steps
///
/// Adds the per-step difference `k` times to the start quaternion rather than
/// scaling by `t`.
#[must_use]
pub fn ilerp(q0: &Quat, q1: &Quat, t: f32, n: u32) -> Quat {
    let (a, b, _) = prepare(q0, q1);
    let k = step_count(t, n);
    #[allow(clippy::cast_precision_loss)]
    let delta = (b - a) * (1.0 / n.max(1) as f32);
    let mut q = a;
    for _ in 0..k {
        q = q + delta;
    }
    q.normalize()
}

/// Spherical linear interpolation
#[must_use]
pub fn slerp(q0: &Quat, q1: &Quat, t: f32) -> Quat {
    let (a, b, cos) = prepare(q0, q1);
    if cos > 1.0 - SLERP_EPSILON {
        // sin(θ) is close to zero
        return (a * (1.0 - t) + b * t).normalize();
    }
    let theta = cos.acos();
    let sin = theta.sin();
    let wa = ((1.0 - t) * theta).sin() / sin;
    let wb = (t * theta).sin() / sin;
    (a * wa + b * wb).normalize()
}

/// Incremental spherical linear interpolation with `n` steps
///
/// Evenly spaced samples along the arc satisfy
/// `q(k+1) = 2cos(β)q(k) - q(k-1)` with `β = θ/n`, so only the first step
/// needs trigonometric functions.
#[must_use]
pub fn islerp(q0: &Quat, q1: &Quat, t: f32, n: u32) -> Quat {
    let (a, b, cos) = prepare(q0, q1);
    if cos > 1.0 - SLERP_EPSILON {
        return ilerp(&a, &b, t, n);
    }
    let n = n.max(1);
    let k = step_count(t, n);
    if k == 0 {
        return a;
    }
    let theta = cos.acos();
    #[allow(clippy::cast_precision_loss)]
    let beta = theta / n as f32;
    let sin = theta.sin();
    let first = a * ((theta - beta).sin() / sin) + b * (beta.sin() / sin);
    let two_cos = 2.0 * beta.cos();
    let mut prev = a;
    let mut q = first;
    for _ in 1..k {
        let next = q * two_cos - prev;
        prev = q;
        q = next;
    }
    q.normalize()
}

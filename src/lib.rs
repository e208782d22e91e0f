//! Skeletal animation core
//!
//! `Vqs` transforms and quaternion interpolation, a bone hierarchy with bind
//! poses, an `Animator` that evaluates keyframe animation into model space
//! bone transforms each frame, and a CCD inverse kinematics solver.
//!
//! Rendering, asset file formats and windowing are left to the host
//! application. It supplies a `Skeleton` and `Animation` values and uploads
//! the transforms an `Animator` produces.
pub mod anim;
pub mod anim_error;
pub mod config;
pub mod ik;
pub mod interpolate;
pub mod quat;
pub mod vqs;

// Re-exports
pub use {
    anim_error::AnimError,
    quat::Quat,
    vqs::Vqs,
};

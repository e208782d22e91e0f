pub mod animator;
pub mod clip;
mod keys;
pub mod skeleton;
mod types;

// Re-exports
pub use {
    animator::{
        update_all, Animator, KeyInterpolation, QuatInterpolation,
        SkinningMatrices, State, DEFAULT_INCREMENTAL_STEPS,
    },
    clip::{ImportedChannel, ImportedClip},
    keys::KeySpan,
    skeleton::{BoneDesc, SkeletonBuilder},
    types::{
        Animation, AnimationLibrary, Bone, Key, KeyPosition, KeyRotation,
        KeyScale, Skeleton, Track, DEFAULT_TICKS_PER_SECOND,
    },
};

/// Finds the keys around a time in a sorted channel
pub use keys::find as find_keys;

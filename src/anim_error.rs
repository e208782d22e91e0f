use std::{error, fmt};

/// Unified error type
///
/// Numerical degeneracies and missing animation data are not errors. They are
/// handled where they occur with a fallback value. These variants are for
/// configuration and data that a host application should report and then
/// continue running.
#[derive(Debug)]
pub enum AnimError {
    UnknownAnimationName(String),
    UnknownAnimationIndex(usize),
    UnknownInterpolation(String),
    DuplicateBone(String),
    MissingParent { bone: String, parent: String },
    HierarchyCycle(String),
    BoneOutOfRange(usize),
    UnknownBone(String),
    InvalidConfig(String),
    SerdeYamlError(Box<serde_yaml::Error>),
    StdIoError(std::io::Error),
}

impl error::Error for AnimError {}

impl fmt::Display for AnimError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::UnknownAnimationName(a) => {
                write!(f, "no animation named \"{a}\"")
            }
            Self::UnknownAnimationIndex(a) => {
                write!(f, "no animation with index {a}")
            }
            Self::UnknownInterpolation(a) => {
                write!(f, "unknown interpolation method \"{a}\"")
            }
            Self::DuplicateBone(a) => {
                write!(f, "bone \"{a}\" is defined more than once")
            }
            Self::MissingParent { bone, parent } => {
                write!(f, "bone \"{bone}\" has missing parent \"{parent}\"")
            }
            Self::HierarchyCycle(a) => {
                write!(f, "bone \"{a}\" is part of a cycle in the hierarchy")
            }
            Self::BoneOutOfRange(a) => {
                write!(f, "bone index {a} is out of range")
            }
            Self::UnknownBone(a) => write!(f, "no bone named \"{a}\""),
            Self::InvalidConfig(a) => write!(f, "invalid configuration: {a}"),
            Self::SerdeYamlError(e) => {
                write!(f, "serde_yaml::Error: {e}")
            }
            Self::StdIoError(e) => write!(f, "std::io::Error: {}", e.kind()),
        }
    }
}

impl From<serde_yaml::Error> for AnimError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::SerdeYamlError(Box::new(e))
    }
}

impl From<std::io::Error> for AnimError {
    fn from(e: std::io::Error) -> Self {
        Self::StdIoError(e)
    }
}

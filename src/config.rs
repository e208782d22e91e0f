//! Settings that a control layer or UI can change, with YAML loading
use crate::{
    anim::{KeyInterpolation, QuatInterpolation, DEFAULT_INCREMENTAL_STEPS},
    anim_error::AnimError,
};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimatorConfig {
    pub key_interpolation: KeyInterpolation,
    pub quaternion_interpolation: QuatInterpolation,
    pub bind_pose: bool,
    pub speed: f32,
    pub incremental_steps: u32,
}

impl Default for AnimatorConfig {
    fn default() -> Self {
        Self {
            key_interpolation: KeyInterpolation::Default,
            quaternion_interpolation: QuatInterpolation::Slerp,
            bind_pose: false,
            speed: 1.0f32,
            incremental_steps: DEFAULT_INCREMENTAL_STEPS,
        }
    }
}

impl AnimatorConfig {
    /// # Errors
    /// Returns `AnimError::InvalidConfig` for a non-finite speed or zero
    /// incremental steps
    pub fn validate(&self) -> Result<(), AnimError> {
        if !self.speed.is_finite() {
            return Err(AnimError::InvalidConfig(format!(
                "speed {} is not finite",
                self.speed
            )));
        }
        if self.incremental_steps == 0 {
            return Err(AnimError::InvalidConfig(
                "incremental_steps must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// # Errors
    /// May return `AnimError`
    pub fn from_yaml(text: &str) -> Result<Self, AnimError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate().inspect_err(|e| error!("{e}"))?;
        Ok(config)
    }

    /// # Errors
    /// May return `AnimError`
    pub fn load(path: &Path) -> Result<Self, AnimError> {
        info!("Loading animator config {}", path.display());
        Self::from_yaml(&std::fs::read_to_string(path)?)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IkConfig {
    pub weight: f32,
    /// Squared distance at which the solver stops
    pub error: f32,
    pub max_iterations: u32,
}

impl Default for IkConfig {
    fn default() -> Self {
        Self {
            weight: 1.0f32,
            error: 0.0001f32,
            max_iterations: 15,
        }
    }
}

impl IkConfig {
    /// # Errors
    /// May return `AnimError`
    pub fn from_yaml(text: &str) -> Result<Self, AnimError> {
        let config: Self = serde_yaml::from_str(text)?;
        // Reuse the solver's checks
        crate::ik::IkSolver::from_config(&config)
            .inspect_err(|e| error!("{e}"))?;
        Ok(config)
    }

    /// # Errors
    /// May return `AnimError`
    pub fn load(path: &Path) -> Result<Self, AnimError> {
        info!("Loading IK config {}", path.display());
        Self::from_yaml(&std::fs::read_to_string(path)?)
    }
}

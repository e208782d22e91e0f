use super::{
    skeleton::SkeletonBuilder,
    types::{Animation, Skeleton, Track, DEFAULT_TICKS_PER_SECOND},
};
use log::{debug, warn};
use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};

/// Keyframe data for one bone, identified by name
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportedChannel {
    pub bone: String,
    #[serde(flatten)]
    pub track: Track,
}

/// An animation as produced by an importer, with tracks keyed by bone name
/// rather than by index into a particular skeleton
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportedClip {
    pub name: String,
    /// Length in ticks. If zero, the time of the last key is used instead.
    #[serde(default)]
    pub duration: f32,
    #[serde(default = "default_ticks_per_second")]
    pub ticks_per_second: f32,
    pub channels: Vec<ImportedChannel>,
}

const fn default_ticks_per_second() -> f32 {
    DEFAULT_TICKS_PER_SECOND
}

impl ImportedClip {
    /// Adds a root bone at the origin for each channel whose bone the mesh
    /// import did not supply, so the channel is not dropped by `resolve`.
    /// New bones go after the existing ones. Returns how many were added.
    pub fn extend_skeleton(&self, builder: &mut SkeletonBuilder) -> usize {
        let mut added = 0;
        for channel in &self.channels {
            if !builder.contains(&channel.bone) {
                debug!(
                    "animation {} adds bone {} to skeleton",
                    self.name, channel.bone
                );
                builder.add_bone(&channel.bone, None, glm::Mat4::identity());
                added += 1;
            }
        }
        added
    }

    /// Matches channels to bones by name and creates an `Animation` with
    /// tracks indexed by bone index. Channels for bones that are not in the
    /// skeleton are dropped with a warning. If a bone appears more than once
    /// the last channel is used.
    #[must_use]
    pub fn resolve(&self, skeleton: &Skeleton) -> Animation {
        let mut tracks: Vec<Option<Track>> = vec![None; skeleton.len()];
        let mut max_time = 0.0_f32;
        for channel in &self.channels {
            let Some(index) = skeleton.find(&channel.bone) else {
                warn!(
                    "animation {} has channel for bone {} which is not in \
                     skeleton {}",
                    self.name,
                    channel.bone,
                    skeleton.name()
                );
                continue;
            };
            if tracks[index].is_some() {
                warn!(
                    "animation {} has more than one channel for bone {}",
                    self.name, channel.bone
                );
            }
            let mut track = channel.track.clone();
            track.sort();
            max_time = max_time.max(track.max_time());
            tracks[index] = Some(track);
        }

        let duration = if self.duration > 0.0 {
            self.duration
        } else {
            debug!(
                "animation {} has no duration, using last key time {}",
                self.name, max_time
            );
            max_time
        };
        Animation::new(&self.name, duration, self.ticks_per_second, tracks)
    }
}

use super::types::{Bone, Skeleton};
use crate::{anim_error::AnimError, vqs::Vqs};
use ahash::{HashMap, HashMapExt};
use log::{debug, error, warn};
use nalgebra_glm as glm;
use smallvec::SmallVec;

/// Bone data as it comes from an importer
#[derive(Clone, Debug)]
pub struct BoneDesc {
    pub name: String,
    /// Parent bone name, `None` for a root
    pub parent: Option<String>,
    /// Model space bind pose
    pub bind: glm::Mat4,
    /// Inverse bind matrix if the importer supplies one. Otherwise it is
    /// calculated by inverting `bind`.
    pub inverse_bind: Option<glm::Mat4>,
}

/// Collects bones in any order and builds a checked `Skeleton`
///
/// Bones are unified by name. `build` reorders them so every parent comes
/// before its children, keeping the insertion order wherever it is already
/// valid, and rejects duplicate names, missing parents and cycles.
#[derive(Clone, Debug, Default)]
pub struct SkeletonBuilder {
    name: String,
    descs: Vec<BoneDesc>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    None,
    Visiting,
    Done,
}

impl SkeletonBuilder {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            descs: Vec::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.descs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descs.is_empty()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.descs.iter().any(|d| d.name == name)
    }

    pub fn add(&mut self, desc: BoneDesc) -> &mut Self {
        self.descs.push(desc);
        self
    }

    pub fn add_bone(
        &mut self,
        name: &str,
        parent: Option<&str>,
        bind: glm::Mat4,
    ) -> &mut Self {
        self.add(BoneDesc {
            name: name.to_string(),
            parent: parent.map(ToString::to_string),
            bind,
            inverse_bind: None,
        })
    }

    /// Returns descriptor indices in parent first order
    fn order(&self) -> Result<Vec<usize>, AnimError> {
        let mut lookup = HashMap::<&str, usize>::with_capacity(self.descs.len());
        for (i, desc) in self.descs.iter().enumerate() {
            if lookup.insert(desc.name.as_str(), i).is_some() {
                error!("duplicate bone {}", desc.name);
                return Err(AnimError::DuplicateBone(desc.name.clone()));
            }
        }

        let mut parents = Vec::with_capacity(self.descs.len());
        for desc in &self.descs {
            let parent = match &desc.parent {
                None => None,
                Some(p) => Some(*lookup.get(p.as_str()).ok_or_else(|| {
                    error!("bone {} has missing parent {}", desc.name, p);
                    AnimError::MissingParent {
                        bone: desc.name.clone(),
                        parent: p.clone(),
                    }
                })?),
            };
            parents.push(parent);
        }

        // Walk up from each bone until reaching something already placed,
        // then place the path from the top down
        let mut marks = vec![Mark::None; self.descs.len()];
        let mut order = Vec::with_capacity(self.descs.len());
        let mut path = Vec::new();
        for start in 0..self.descs.len() {
            let mut current = Some(start);
            while let Some(i) = current {
                match marks[i] {
                    Mark::Done => break,
                    Mark::Visiting => {
                        error!("bone {} is in a cycle", self.descs[i].name);
                        return Err(AnimError::HierarchyCycle(
                            self.descs[i].name.clone(),
                        ));
                    }
                    Mark::None => {
                        marks[i] = Mark::Visiting;
                        path.push(i);
                        current = parents[i];
                    }
                }
            }
            while let Some(i) = path.pop() {
                marks[i] = Mark::Done;
                order.push(i);
            }
        }
        Ok(order)
    }

    /// # Errors
    /// May return `AnimError::DuplicateBone`, `AnimError::MissingParent` or
    /// `AnimError::HierarchyCycle`
    pub fn build(self) -> Result<Skeleton, AnimError> {
        let order = self.order()?;
        let mut descs: Vec<Option<BoneDesc>> =
            self.descs.into_iter().map(Some).collect();

        let mut bones: Vec<Bone> = Vec::with_capacity(order.len());
        let mut roots = Vec::new();
        let mut by_name = HashMap::with_capacity(order.len());
        for (index, &old_index) in order.iter().enumerate() {
            let Some(desc) = descs[old_index].take() else {
                continue;
            };
            let parent = desc
                .parent
                .as_ref()
                .and_then(|p| by_name.get(p.as_str()).copied());

            let bind = Vqs::from_mat4(&desc.bind);
            let inverse_bind_matrix = desc.inverse_bind.unwrap_or_else(|| {
                desc.bind.try_inverse().unwrap_or_else(|| {
                    warn!("bone {} has a singular bind matrix", desc.name);
                    bind.inverse().to_mat4()
                })
            });
            let inverse_bind = Vqs::from_mat4(&inverse_bind_matrix);
            let local_bind =
                parent.map_or(bind, |p: usize| bones[p].bind.inverse() * bind);

            match parent {
                Some(p) => bones[p].children.push(index),
                None => roots.push(index),
            }
            by_name.insert(desc.name.clone(), index);
            bones.push(Bone {
                name: desc.name,
                index,
                parent,
                children: SmallVec::new(),
                bind_matrix: desc.bind,
                inverse_bind_matrix,
                bind,
                inverse_bind,
                local_bind,
            });
        }
        debug!(
            "skeleton {} built with {} bones and {} roots",
            self.name,
            bones.len(),
            roots.len()
        );
        Ok(Skeleton {
            name: self.name,
            bones,
            roots,
            by_name,
        })
    }
}

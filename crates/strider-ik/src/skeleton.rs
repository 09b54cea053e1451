//! Bone hierarchy and pose storage.
//!
//! A [`Skeleton`] is the static hierarchy (names, parents, reference local
//! transforms). A [`Pose`] holds one local transform per bone; component-space
//! transforms are composed on demand from the parent chain.
//!
//! Bones are stored parent-before-child, so a single forward pass over the
//! indices composes every component transform.

use nalgebra::{Isometry3, Vector3};

use strider_core::BindError;

/// A single bone in the hierarchy.
#[derive(Debug, Clone)]
pub struct Bone {
    pub name: String,
    /// Parent index; `None` for the root.
    pub parent: Option<usize>,
    /// Reference (bind) transform relative to the parent.
    pub reference: Isometry3<f32>,
}

/// Static bone hierarchy.
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    bones: Vec<Bone>,
}

impl Skeleton {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a bone. The parent, if any, must already exist.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::UnknownBone`] when `parent` is not in the skeleton.
    pub fn add_bone(
        &mut self,
        name: impl Into<String>,
        parent: Option<&str>,
        reference: Isometry3<f32>,
    ) -> Result<usize, BindError> {
        let parent = match parent {
            Some(parent_name) => Some(
                self.find_bone(parent_name)
                    .ok_or_else(|| BindError::UnknownBone(parent_name.to_string()))?,
            ),
            None => None,
        };
        self.bones.push(Bone {
            name: name.into(),
            parent,
            reference,
        });
        Ok(self.bones.len() - 1)
    }

    pub fn find_bone(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }

    pub fn bone(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    pub fn parent(&self, index: usize) -> Option<usize> {
        self.bones.get(index).and_then(|b| b.parent)
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// Whether `descendant` lies strictly below `ancestor`.
    pub fn is_descendant(&self, descendant: usize, ancestor: usize) -> bool {
        let mut current = self.parent(descendant);
        while let Some(index) = current {
            if index == ancestor {
                return true;
            }
            current = self.parent(index);
        }
        false
    }

    /// Bone indices from `ancestor` down to `descendant`, both inclusive.
    pub fn path(&self, ancestor: usize, descendant: usize) -> Option<Vec<usize>> {
        let mut path = vec![descendant];
        let mut current = descendant;
        while current != ancestor {
            current = self.parent(current)?;
            path.push(current);
        }
        path.reverse();
        Some(path)
    }

    /// Pose holding every bone's reference transform.
    pub fn reference_pose(&self) -> Pose {
        Pose {
            locals: self.bones.iter().map(|b| b.reference).collect(),
        }
    }
}

/// A component-space transform for one bone, as produced by the solvers.
#[derive(Debug, Clone, PartialEq)]
pub struct BoneTransform {
    pub bone: usize,
    pub transform: Isometry3<f32>,
}

/// Local transforms for every bone of a [`Skeleton`].
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    locals: Vec<Isometry3<f32>>,
}

impl Pose {
    pub fn local(&self, bone: usize) -> Option<&Isometry3<f32>> {
        self.locals.get(bone)
    }

    pub fn set_local(&mut self, bone: usize, transform: Isometry3<f32>) {
        if let Some(local) = self.locals.get_mut(bone) {
            *local = transform;
        }
    }

    /// Compose every bone's component-space transform.
    pub fn component_transforms(&self, skeleton: &Skeleton) -> Vec<Isometry3<f32>> {
        let mut out: Vec<Isometry3<f32>> = Vec::with_capacity(self.locals.len());
        for (index, local) in self.locals.iter().enumerate() {
            let component = match skeleton.parent(index) {
                Some(parent) if parent < out.len() => out[parent] * local,
                _ => *local,
            };
            out.push(component);
        }
        out
    }

    /// Component-space transform of one bone.
    pub fn component(&self, skeleton: &Skeleton, bone: usize) -> Option<Isometry3<f32>> {
        let local = *self.locals.get(bone)?;
        Some(match skeleton.parent(bone) {
            Some(parent) => self.component(skeleton, parent)? * local,
            None => local,
        })
    }

    /// Component-space location of one bone.
    pub fn component_location(&self, skeleton: &Skeleton, bone: usize) -> Option<Vector3<f32>> {
        self.component(skeleton, bone).map(|t| t.translation.vector)
    }

    /// Apply component-space results. Each updated bone gets a new local
    /// transform relative to its (possibly also updated) parent; bones that
    /// are not updated keep their local transform and follow their parent.
    pub fn apply_component_transforms(&mut self, skeleton: &Skeleton, updates: &[BoneTransform]) {
        if updates.is_empty() {
            return;
        }
        let mut pending: Vec<Option<Isometry3<f32>>> = vec![None; self.locals.len()];
        for update in updates {
            if let Some(slot) = pending.get_mut(update.bone) {
                *slot = Some(update.transform);
            }
        }

        let mut component: Vec<Isometry3<f32>> = Vec::with_capacity(self.locals.len());
        for index in 0..self.locals.len() {
            let parent = skeleton
                .parent(index)
                .filter(|p| *p < component.len())
                .map(|p| component[p]);
            let world = match (pending[index], parent) {
                (Some(target), Some(parent)) => {
                    self.locals[index] = parent.inverse() * target;
                    target
                }
                (Some(target), None) => {
                    self.locals[index] = target;
                    target
                }
                (None, Some(parent)) => parent * self.locals[index],
                (None, None) => self.locals[index],
            };
            component.push(world);
        }
    }
}

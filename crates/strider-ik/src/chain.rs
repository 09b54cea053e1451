//! Solvable bone chain built from a root-to-tip bone path.
//!
//! Each [`ChainLink`] carries its component-space transform and its transform
//! relative to the previous link. Bones that sit on top of the previous link
//! (zero length) are not solved on their own: they ride along as
//! zero-length children of that link.

use nalgebra::{Isometry3, UnitQuaternion, Vector3};

use strider_core::IkError;
use strider_core::math::{KINDA_SMALL_NUMBER, is_nearly_zero};

use crate::skeleton::BoneTransform;

/// One solvable node of an [`IkChain`].
#[derive(Debug, Clone)]
pub struct ChainLink {
    /// Component-space transform.
    pub transform: Isometry3<f32>,
    /// Transform relative to the previous link.
    pub local: Isometry3<f32>,
    /// Index of the bone this link drives.
    pub bone: usize,
    /// Coincident child bones and their transforms relative to this link.
    pub zero_length_children: Vec<(usize, Isometry3<f32>)>,
    /// Rotation applied to this link so far in the current solve (radians).
    pub angle_delta: f32,
}

impl ChainLink {
    pub fn location(&self) -> Vector3<f32> {
        self.transform.translation.vector
    }
}

/// An ordered chain of links from a fixed root to the tip.
#[derive(Debug, Clone)]
pub struct IkChain {
    links: Vec<ChainLink>,
}

impl IkChain {
    /// Build a chain for `path` (root first), reading component-space
    /// transforms from `component`.
    ///
    /// # Errors
    ///
    /// Returns [`IkError::ChainTooShort`] when fewer than two distinct links
    /// remain after zero-length bones are merged.
    pub fn build(path: &[usize], component: &[Isometry3<f32>]) -> Result<Self, IkError> {
        let mut links: Vec<ChainLink> = Vec::with_capacity(path.len());

        for &bone in path {
            let Some(&transform) = component.get(bone) else {
                return Err(IkError::ChainTooShort(links.len()));
            };

            if let Some(previous) = links.last_mut() {
                let offset = transform.translation.vector - previous.location();
                if is_nearly_zero(&offset, KINDA_SMALL_NUMBER) {
                    let relative = previous.transform.inverse() * transform;
                    previous.zero_length_children.push((bone, relative));
                    continue;
                }
            }

            let local = links
                .last()
                .map_or(transform, |previous| previous.transform.inverse() * transform);
            links.push(ChainLink {
                transform,
                local,
                bone,
                zero_length_children: Vec::new(),
                angle_delta: 0.0,
            });
        }

        if links.len() < 2 {
            return Err(IkError::ChainTooShort(links.len()));
        }
        Ok(Self { links })
    }

    pub fn links(&self) -> &[ChainLink] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Component-space tip location.
    pub fn tip_location(&self) -> Vector3<f32> {
        self.links.last().map_or_else(Vector3::zeros, ChainLink::location)
    }

    /// Rotate link `index` by `delta` about its own location and carry every
    /// link below it along.
    pub(crate) fn rotate_link(&mut self, index: usize, delta: UnitQuaternion<f32>) {
        if index == 0 || index >= self.links.len() {
            return;
        }
        let parent = self.links[index - 1].transform;
        let link = &mut self.links[index];
        link.transform.rotation = delta * link.transform.rotation;
        link.local = parent.inverse() * link.transform;

        for child in index + 1..self.links.len() {
            self.links[child].transform = self.links[child - 1].transform * self.links[child].local;
        }
    }

    /// Pre-multiply the tip's component-space rotation.
    pub fn rotate_tip(&mut self, rotation: UnitQuaternion<f32>) {
        if let Some(tip) = self.links.last_mut() {
            tip.transform.rotation = rotation * tip.transform.rotation;
        }
    }

    pub(crate) fn reset_angle_deltas(&mut self) {
        for link in &mut self.links {
            link.angle_delta = 0.0;
        }
    }

    pub(crate) fn link_mut(&mut self, index: usize) -> &mut ChainLink {
        &mut self.links[index]
    }

    /// Component-space results for every link below the root, followed by
    /// each link's zero-length children.
    pub fn bone_transforms(&self) -> Vec<BoneTransform> {
        let mut out = Vec::with_capacity(self.links.len());
        for link in self.links.iter().skip(1) {
            out.push(BoneTransform {
                bone: link.bone,
                transform: link.transform,
            });
            out.extend(link.zero_length_children.iter().map(|(bone, relative)| BoneTransform {
                bone: *bone,
                transform: link.transform * relative,
            }));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Translation3;

    fn at(z: f32) -> Isometry3<f32> {
        Isometry3::from_parts(Translation3::new(0.0, 0.0, z), UnitQuaternion::identity())
    }

    #[test]
    fn build_straight_chain() {
        let component = vec![at(10.0), at(0.0), at(-30.0), at(-60.0)];
        let chain = IkChain::build(&[0, 1, 2, 3], &component).unwrap();
        assert_eq!(chain.len(), 4);
        assert_relative_eq!(chain.links()[2].local.translation.vector, Vector3::new(0.0, 0.0, -30.0));
        assert_relative_eq!(chain.tip_location(), Vector3::new(0.0, 0.0, -60.0));
    }

    #[test]
    fn zero_length_bones_collapse() {
        // Bone 2 sits exactly on bone 1.
        let component = vec![at(10.0), at(0.0), at(0.0), at(-30.0)];
        let chain = IkChain::build(&[0, 1, 2, 3], &component).unwrap();
        assert_eq!(chain.len(), 3);
        assert_eq!(chain.links()[1].zero_length_children.len(), 1);
        assert_eq!(chain.links()[1].zero_length_children[0].0, 2);
        assert_eq!(chain.links()[2].bone, 3);
    }

    #[test]
    fn single_link_is_too_short() {
        let component = vec![at(0.0), at(0.0)];
        let err = IkChain::build(&[0, 1], &component).unwrap_err();
        assert_eq!(err, IkError::ChainTooShort(1));
    }

    #[test]
    fn rotating_a_link_moves_descendants() {
        let component = vec![at(10.0), at(0.0), at(-30.0), at(-60.0)];
        let mut chain = IkChain::build(&[0, 1, 2, 3], &component).unwrap();
        let quarter = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), std::f32::consts::FRAC_PI_2);
        chain.rotate_link(1, quarter);
        assert_relative_eq!(chain.tip_location(), Vector3::new(-60.0, 0.0, 0.0), epsilon = 1e-4);
        assert_relative_eq!(chain.links()[1].location(), Vector3::zeros(), epsilon = 1e-6);
    }

    #[test]
    fn zero_length_children_follow_their_link() {
        let component = vec![at(10.0), at(0.0), at(0.0), at(-30.0)];
        let mut chain = IkChain::build(&[0, 1, 2, 3], &component).unwrap();
        let quarter = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), std::f32::consts::FRAC_PI_2);
        chain.rotate_link(1, quarter);

        let out = chain.bone_transforms();
        assert_eq!(out.iter().map(|t| t.bone).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_relative_eq!(out[1].transform.rotation.angle_to(&quarter), 0.0, epsilon = 1e-5);
        assert_relative_eq!(out[1].transform.translation.vector, Vector3::zeros(), epsilon = 1e-6);
    }
}

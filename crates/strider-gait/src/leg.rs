//! Per-leg runtime state.

use nalgebra::{Isometry3, Point3, UnitQuaternion, Vector3};

use strider_core::{GroundHit, GroundProbe, SurfaceId};

/// Rest offsets within this distance of zero count as both sides of an axis.
pub const DIRECTION_TOLERANCE: f32 = 0.001;

/// Which side(s) of the body a leg sits on, derived from its rest offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectionFlags {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

impl DirectionFlags {
    /// Classify an actor-space rest offset (x forward, y left).
    pub fn from_rest_offset(offset: &Vector3<f32>) -> Self {
        let centred_x = offset.x.abs() <= DIRECTION_TOLERANCE;
        let centred_y = offset.y.abs() <= DIRECTION_TOLERANCE;
        Self {
            forward: centred_x || offset.x > 0.0,
            backward: centred_x || offset.x < 0.0,
            left: centred_y || offset.y > 0.0,
            right: centred_y || offset.y < 0.0,
        }
    }
}

/// A surface a planted foot stands on, followed so the foot rides along when
/// the surface moves.
#[derive(Debug, Clone, PartialEq)]
pub struct SupportTracker {
    pub surface: SurfaceId,
    pub bone: Option<String>,
    /// Surface transform at the previous sample.
    pub previous: Isometry3<f32>,
    /// Foot location in the surface's frame at plant time.
    pub relative: Point3<f32>,
}

impl SupportTracker {
    /// Start tracking the surface of `hit` under `foot`. `None` when the hit
    /// has no tracked surface or the probe cannot locate it.
    pub fn attach(probe: &impl GroundProbe, hit: &GroundHit, foot: &Vector3<f32>) -> Option<Self> {
        let surface = hit.surface?;
        let transform = probe.surface_transform(surface, hit.bone.as_deref())?;
        if !is_valid_transform(&transform) {
            return None;
        }
        Some(Self {
            surface,
            bone: hit.bone.clone(),
            previous: transform,
            relative: transform.inverse_transform_point(&Point3::from(*foot)),
        })
    }

    /// World-space movement of the attachment point since the last sample.
    /// A vanished or malformed surface transform yields zero.
    pub fn sample_delta(&mut self, probe: &impl GroundProbe) -> Vector3<f32> {
        let Some(current) = probe.surface_transform(self.surface, self.bone.as_deref()) else {
            return Vector3::zeros();
        };
        if !is_valid_transform(&current) {
            return Vector3::zeros();
        }
        let delta = (current * self.relative) - (self.previous * self.relative);
        self.previous = current;
        delta
    }
}

fn is_valid_transform(transform: &Isometry3<f32>) -> bool {
    let q = transform.rotation.quaternion();
    let norm = q.norm();
    transform.translation.vector.iter().all(|v| v.is_finite())
        && norm.is_finite()
        && (norm - 1.0).abs() < 1.0e-3
}

/// Runtime state of one leg.
#[derive(Debug, Clone)]
pub struct LegState {
    /// Current foot location (world).
    pub foot_location: Vector3<f32>,
    /// Where the foot is heading (world).
    pub foot_target: Vector3<f32>,
    /// Smoothed foot rotation relative to the mesh.
    pub foot_rotation: UnitQuaternion<f32>,
    /// Latest rotation the foot rotation is smoothed toward.
    pub rotation_target: UnitQuaternion<f32>,
    /// Foot location when the leg last lifted off (world).
    pub unplant_anchor: Vector3<f32>,
    /// Rest foot location in actor space.
    pub rest_location: Vector3<f32>,
    /// Vertical extent from the parent bone to the rest foot.
    pub length: f32,
    pub direction: DirectionFlags,
    /// Whether the last ground probe hit, i.e. whether IK should run.
    pub ik_enabled: bool,
    pub last_hit: Option<GroundHit>,
    pub support: Option<SupportTracker>,
    /// Support movement sampled this tick.
    pub support_delta: Vector3<f32>,
    /// Parent bone location in component space, refreshed each evaluate.
    pub parent_component: Vector3<f32>,
    /// Tip bone location in world space, refreshed each evaluate.
    pub tip_world: Vector3<f32>,
}

impl LegState {
    pub fn new(parent_component: Vector3<f32>, rest_location: Vector3<f32>, length: f32) -> Self {
        Self {
            foot_location: Vector3::zeros(),
            foot_target: Vector3::zeros(),
            foot_rotation: UnitQuaternion::identity(),
            rotation_target: UnitQuaternion::identity(),
            unplant_anchor: Vector3::zeros(),
            rest_location,
            length,
            direction: DirectionFlags::from_rest_offset(&rest_location),
            ik_enabled: false,
            last_hit: None,
            support: None,
            support_delta: Vector3::zeros(),
            parent_component,
            tip_world: Vector3::zeros(),
        }
    }

    /// Refresh `support_delta` from the tracked surface.
    pub fn sample_support(&mut self, probe: &impl GroundProbe) {
        self.support_delta = self
            .support
            .as_mut()
            .map_or_else(Vector3::zeros, |support| support.sample_delta(probe));
    }

    /// Minimum foot-to-target drift before the leg asks to step, widened by
    /// the current support movement.
    pub fn adapted_min_distance(&self, min_distance_to_unplant: f32) -> f32 {
        min_distance_to_unplant + self.support_delta.norm()
    }
}

//! Analytic ground probes.

use std::cell::Cell;

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};

use strider_core::{GroundHit, GroundProbe, SurfaceId};

// ---------------------------------------------------------------------------
// FlatGround
// ---------------------------------------------------------------------------

/// An infinite plane, optionally tracked as a movable surface.
#[derive(Debug)]
pub struct FlatGround {
    origin: Cell<Vector3<f32>>,
    normal: Vector3<f32>,
    surface: Option<SurfaceId>,
}

impl FlatGround {
    /// Horizontal plane at height `z`.
    pub fn new(z: f32) -> Self {
        Self::tilted(Vector3::new(0.0, 0.0, z), Vector3::z())
    }

    /// Plane through `origin` facing `normal`.
    pub fn tilted(origin: Vector3<f32>, normal: Vector3<f32>) -> Self {
        Self {
            origin: Cell::new(origin),
            normal: normal.try_normalize(f32::EPSILON).unwrap_or_else(Vector3::z),
            surface: None,
        }
    }

    /// Report hits as belonging to `surface`, whose transform is the plane's
    /// translation.
    #[must_use]
    pub const fn with_surface(mut self, surface: SurfaceId) -> Self {
        self.surface = Some(surface);
        self
    }

    /// Move the plane (and its tracked surface) by `delta`.
    pub fn translate(&self, delta: Vector3<f32>) {
        self.origin.set(self.origin.get() + delta);
    }

    pub fn origin(&self) -> Vector3<f32> {
        self.origin.get()
    }

    fn intersect(&self, start: &Vector3<f32>, end: &Vector3<f32>) -> Option<Vector3<f32>> {
        let direction = end - start;
        let denom = self.normal.dot(&direction);
        if denom.abs() < f32::EPSILON {
            return None;
        }
        let t = self.normal.dot(&(self.origin.get() - start)) / denom;
        (0.0..=1.0).contains(&t).then(|| start + direction * t)
    }
}

impl GroundProbe for FlatGround {
    fn line_trace(&self, start: &Vector3<f32>, end: &Vector3<f32>) -> Option<GroundHit> {
        let location = self.intersect(start, end)?;
        Some(GroundHit {
            location,
            normal: self.normal,
            surface: self.surface,
            bone: None,
        })
    }

    fn sphere_trace_multi(&self, start: &Vector3<f32>, end: &Vector3<f32>, _radius: f32) -> Vec<GroundHit> {
        self.line_trace(start, end).into_iter().collect()
    }

    fn surface_transform(&self, surface: SurfaceId, _bone: Option<&str>) -> Option<Isometry3<f32>> {
        (self.surface == Some(surface)).then(|| {
            Isometry3::from_parts(Translation3::from(self.origin.get()), UnitQuaternion::identity())
        })
    }
}

// ---------------------------------------------------------------------------
// NoGround
// ---------------------------------------------------------------------------

/// A probe that never hits anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGround;

impl GroundProbe for NoGround {
    fn line_trace(&self, _start: &Vector3<f32>, _end: &Vector3<f32>) -> Option<GroundHit> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_hits_flat_plane() {
        let ground = FlatGround::new(5.0);
        let hit = ground
            .line_trace(&Vector3::new(1.0, 2.0, 50.0), &Vector3::new(1.0, 2.0, -50.0))
            .unwrap();
        assert!((hit.location - Vector3::new(1.0, 2.0, 5.0)).norm() < 1e-4);
        assert_eq!(hit.normal, Vector3::z());
    }

    #[test]
    fn short_segment_misses() {
        let ground = FlatGround::new(0.0);
        assert!(ground.line_trace(&Vector3::new(0.0, 0.0, 50.0), &Vector3::new(0.0, 0.0, 10.0)).is_none());
        assert!(NoGround.line_trace(&Vector3::zeros(), &Vector3::new(0.0, 0.0, -10.0)).is_none());
    }

    #[test]
    fn tracked_surface_moves() {
        let ground = FlatGround::new(0.0).with_surface(SurfaceId(4));
        ground.translate(Vector3::new(3.0, 0.0, 0.0));
        let transform = ground.surface_transform(SurfaceId(4), None).unwrap();
        assert_eq!(transform.translation.vector, Vector3::new(3.0, 0.0, 0.0));
        assert!(ground.surface_transform(SurfaceId(5), None).is_none());
    }
}

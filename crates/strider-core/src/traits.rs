use nalgebra::{Isometry3, UnitQuaternion, Vector3};

use crate::types::{GroundHit, SurfaceId};

// ---------------------------------------------------------------------------
// GroundProbe
// ---------------------------------------------------------------------------

/// Synchronous access to the host's collision queries.
///
/// Only [`line_trace`](Self::line_trace) is required. Hosts without sphere
/// sweeps simply report no fallback hits, and the box probe used for falling
/// detection degrades to a line probe down the box centre.
pub trait GroundProbe {
    /// First blocking hit along the segment `start → end`.
    fn line_trace(&self, start: &Vector3<f32>, end: &Vector3<f32>) -> Option<GroundHit>;

    /// Every blocking hit of a sphere of `radius` swept along `start → end`.
    fn sphere_trace_multi(
        &self,
        _start: &Vector3<f32>,
        _end: &Vector3<f32>,
        _radius: f32,
    ) -> Vec<GroundHit> {
        Vec::new()
    }

    /// First blocking hit of an oriented box swept along `start → end`.
    fn box_trace(
        &self,
        start: &Vector3<f32>,
        end: &Vector3<f32>,
        _half_extent: &Vector3<f32>,
        _rotation: &UnitQuaternion<f32>,
    ) -> Option<GroundHit> {
        self.line_trace(start, end)
    }

    /// Current world transform of a tracked surface (or one of its bones).
    /// `None` when the surface no longer exists or is not tracked.
    fn surface_transform(&self, _surface: SurfaceId, _bone: Option<&str>) -> Option<Isometry3<f32>> {
        None
    }
}

impl<T: GroundProbe + ?Sized> GroundProbe for &T {
    fn line_trace(&self, start: &Vector3<f32>, end: &Vector3<f32>) -> Option<GroundHit> {
        (**self).line_trace(start, end)
    }

    fn sphere_trace_multi(&self, start: &Vector3<f32>, end: &Vector3<f32>, radius: f32) -> Vec<GroundHit> {
        (**self).sphere_trace_multi(start, end, radius)
    }

    fn box_trace(
        &self,
        start: &Vector3<f32>,
        end: &Vector3<f32>,
        half_extent: &Vector3<f32>,
        rotation: &UnitQuaternion<f32>,
    ) -> Option<GroundHit> {
        (**self).box_trace(start, end, half_extent, rotation)
    }

    fn surface_transform(&self, surface: SurfaceId, bone: Option<&str>) -> Option<Isometry3<f32>> {
        (**self).surface_transform(surface, bone)
    }
}

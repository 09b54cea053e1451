//! Per-tick distances and durations after mesh scaling.

use nalgebra::Vector3;

use strider_core::{LegConfig, WalkConfig};

/// Configuration values scaled by the current mesh scale (when enabled).
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledParams {
    pub mesh_scale: Vector3<f32>,
    pub step_height: f32,
    pub step_distance_forward: f32,
    pub step_distance_right: f32,
    pub min_step_duration: f32,
    pub min_distance_to_unplant: f32,
    pub trace_length: f32,
    pub trace_z_offset: f32,
    pub body_z_offset: f32,
    /// Sphere fallback radius.
    pub radius_check: f32,
}

impl ScaledParams {
    pub fn new(config: &WalkConfig, mesh_scale: Vector3<f32>) -> Self {
        let scale = if config.scale_with_mesh {
            mesh_scale
        } else {
            Vector3::repeat(1.0)
        };
        let average = (scale.x + scale.y + scale.z) / 3.0;

        let step_distance_forward = config.step.distance_forward * scale.x;
        let step_distance_right = config.step.distance_right * scale.y;

        Self {
            mesh_scale: scale,
            step_height: config.step.height * scale.z,
            step_distance_forward,
            step_distance_right,
            min_step_duration: config.step.min_duration * average,
            min_distance_to_unplant: config.min_distance_to_unplant * average,
            trace_length: config.solver.trace_length * scale.z,
            trace_z_offset: config.solver.trace_z_offset * scale.z,
            body_z_offset: config.body.z_offset * scale.z,
            radius_check: config.solver.radius_check_multiplier
                * step_distance_forward.max(step_distance_right),
        }
    }

    /// Leg offset scaled per axis.
    pub fn leg_offset(&self, leg: &LegConfig) -> Vector3<f32> {
        leg.offset_vector().component_mul(&self.mesh_scale)
    }
}

use nalgebra::{Isometry3, Point3, Vector3};

/// Opaque handle to a surface returned by the host's collision system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

/// Result of a ground probe.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundHit {
    /// Impact point in world space.
    pub location: Vector3<f32>,
    /// Surface normal at the impact point (unit length).
    pub normal: Vector3<f32>,
    /// Surface that was hit, when the host can track it.
    pub surface: Option<SurfaceId>,
    /// Bone of the hit surface, for skeletal surfaces.
    pub bone: Option<String>,
}

impl GroundHit {
    /// A hit on untracked geometry.
    pub fn new(location: Vector3<f32>, normal: Vector3<f32>) -> Self {
        Self {
            location,
            normal,
            surface: None,
            bone: None,
        }
    }

    #[must_use]
    pub const fn with_surface(mut self, surface: SurfaceId) -> Self {
        self.surface = Some(surface);
        self
    }
}

/// Per-tick snapshot of the pawn driving the walk.
#[derive(Debug, Clone, PartialEq)]
pub struct PawnState {
    /// Actor transform in world space. Actor space is x forward, y left, z up.
    pub transform: Isometry3<f32>,
    /// World-space velocity.
    pub velocity: Vector3<f32>,
    /// Skeletal mesh component transform in world space.
    pub mesh_transform: Isometry3<f32>,
    /// Skeletal mesh component scale.
    pub mesh_scale: Vector3<f32>,
    /// `Some(has_base)` for character pawns that report a movement base,
    /// `None` for generic pawns (falling is then detected by probing).
    pub movement_base: Option<bool>,
}

impl Default for PawnState {
    fn default() -> Self {
        Self {
            transform: Isometry3::identity(),
            velocity: Vector3::zeros(),
            mesh_transform: Isometry3::identity(),
            mesh_scale: Vector3::repeat(1.0),
            movement_base: None,
        }
    }
}

impl PawnState {
    pub fn location(&self) -> Vector3<f32> {
        self.transform.translation.vector
    }

    pub fn forward(&self) -> Vector3<f32> {
        self.transform.rotation * Vector3::x()
    }

    pub fn right(&self) -> Vector3<f32> {
        self.transform.rotation * -Vector3::y()
    }

    pub fn up(&self) -> Vector3<f32> {
        self.transform.rotation * Vector3::z()
    }

    /// Average of the mesh scale components.
    pub fn average_mesh_scale(&self) -> f32 {
        (self.mesh_scale.x + self.mesh_scale.y + self.mesh_scale.z) / 3.0
    }

    /// World location to actor space.
    pub fn world_to_actor(&self, world: &Vector3<f32>) -> Vector3<f32> {
        self.transform.inverse_transform_point(&Point3::from(*world)).coords
    }

    /// Actor-space location to world.
    pub fn actor_to_world(&self, local: &Vector3<f32>) -> Vector3<f32> {
        self.transform.transform_point(&Point3::from(*local)).coords
    }

    /// World location to mesh component space (undoing the mesh scale).
    pub fn world_to_component(&self, world: &Vector3<f32>) -> Vector3<f32> {
        let local = self.mesh_transform.inverse_transform_point(&Point3::from(*world)).coords;
        local.component_div(&self.mesh_scale)
    }

    /// Mesh component-space location to world.
    pub fn component_to_world(&self, local: &Vector3<f32>) -> Vector3<f32> {
        let scaled = local.component_mul(&self.mesh_scale);
        self.mesh_transform.transform_point(&Point3::from(scaled)).coords
    }
}

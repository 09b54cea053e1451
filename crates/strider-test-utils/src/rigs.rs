//! Reference rigs.

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};

use strider_core::{BodyConfig, LegConfig, LegGroupConfig, MeshForwardAxis, PawnState, WalkConfig};
use strider_ik::Skeleton;

/// Height of the pawn origin above the mesh origin (the feet).
pub const HALF_HEIGHT: f32 = 50.0;

/// Hip positions in component space: front-left, front-right, back-left,
/// back-right. The mesh faces +X.
pub const HIPS: [[f32; 3]; 4] = [
    [30.0, 20.0, 40.0],
    [30.0, -20.0, 40.0],
    [-30.0, 20.0, 40.0],
    [-30.0, -20.0, 40.0],
];

/// A four-legged skeleton with its walk configuration.
#[derive(Debug, Clone)]
pub struct QuadrupedRig {
    pub skeleton: Skeleton,
    pub config: WalkConfig,
}

impl QuadrupedRig {
    /// Pawn standing at `location` (mesh `HALF_HEIGHT` below) moving with
    /// `velocity`, heading `yaw` radians about Z.
    pub fn pawn(location: Vector3<f32>, yaw: f32, velocity: Vector3<f32>) -> PawnState {
        let rotation = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), yaw);
        PawnState {
            transform: Isometry3::from_parts(Translation3::from(location), rotation),
            velocity,
            mesh_transform: Isometry3::from_parts(
                Translation3::from(location - Vector3::new(0.0, 0.0, HALF_HEIGHT)),
                rotation,
            ),
            ..PawnState::default()
        }
    }
}

fn offset(x: f32, y: f32, z: f32) -> Isometry3<f32> {
    Isometry3::from_parts(Translation3::new(x, y, z), UnitQuaternion::identity())
}

/// Bent-knee quadruped: `root → pelvis → hip_i → thigh_i → knee_i → foot_i`,
/// feet on the mesh origin plane, legs grouped diagonally (`[0, 3]` and
/// `[1, 2]`). Each leg hangs from its hip, so thigh and knee are the solvable
/// joints.
pub fn quadruped() -> QuadrupedRig {
    let mut skeleton = Skeleton::new();
    let mut legs = Vec::with_capacity(HIPS.len());

    // Names are unique and parents are added first, so binding cannot fail.
    let _ = skeleton.add_bone("root", None, Isometry3::identity());
    let _ = skeleton.add_bone("pelvis", Some("root"), offset(0.0, 0.0, 40.0));
    for (index, [x, y, _]) in HIPS.iter().copied().enumerate() {
        let hip = format!("hip_{index}");
        let thigh = format!("thigh_{index}");
        let knee = format!("knee_{index}");
        let foot = format!("foot_{index}");
        let _ = skeleton.add_bone(&hip, Some("pelvis"), offset(x, y, 0.0));
        let _ = skeleton.add_bone(&thigh, Some(&hip), offset(0.0, 0.0, -4.0));
        let _ = skeleton.add_bone(&knee, Some(&thigh), offset(6.0, 0.0, -18.0));
        let _ = skeleton.add_bone(&foot, Some(&knee), offset(-6.0, 0.0, -18.0));
        legs.push(LegConfig::new(hip, foot));
    }

    let config = WalkConfig {
        legs,
        groups: vec![LegGroupConfig::new([0, 3]), LegGroupConfig::new([1, 2])],
        mesh_forward_axis: MeshForwardAxis::X,
        body: BodyConfig {
            bone: Some("pelvis".into()),
            ..BodyConfig::default()
        },
        ..WalkConfig::default()
    };

    QuadrupedRig { skeleton, config }
}

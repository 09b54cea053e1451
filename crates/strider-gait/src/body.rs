//! Body bounce and tilt from foot targets and pawn acceleration.

use nalgebra::Vector3;

use strider_core::BodyConfig;
use strider_core::math::{angle_interp_to, average, map_range_clamped, vinterp_to};

use crate::leg::LegState;
use crate::motion::{PawnMotion, SlopeReduction};
use crate::placement::TickContext;

// Degrees of body tilt per unit of scaled acceleration.
const ACCELERATION_TILT: f32 = 0.2;

/// Foot targets averaged per body side, in actor space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SideAverages {
    pub forward: Vector3<f32>,
    pub backward: Vector3<f32>,
    pub left: Vector3<f32>,
    pub right: Vector3<f32>,
}

impl SideAverages {
    /// Partition leg targets by direction flag. Empty sides average to zero.
    pub fn from_legs<F>(legs: &[LegState], to_actor: F) -> Self
    where
        F: Fn(&Vector3<f32>) -> Vector3<f32>,
    {
        let mut sides: [Vec<Vector3<f32>>; 4] = Default::default();
        for leg in legs {
            let target = to_actor(&leg.foot_target);
            let flags = [
                leg.direction.forward,
                leg.direction.backward,
                leg.direction.left,
                leg.direction.right,
            ];
            for (side, flagged) in sides.iter_mut().zip(flags) {
                if flagged {
                    side.push(target);
                }
            }
        }
        let [forward, backward, left, right] = sides.map(|side| average(&side));
        Self {
            forward,
            backward,
            left,
            right,
        }
    }

    /// Nose-up terrain pitch in degrees.
    pub fn pitch(&self) -> f32 {
        let run = self.forward.x - self.backward.x;
        if run.abs() < f32::EPSILON {
            return 0.0;
        }
        ((self.forward.z - self.backward.z) / run).atan().to_degrees()
    }

    /// Right-side-down terrain roll in degrees.
    pub fn roll(&self) -> f32 {
        let run = self.left.y - self.right.y;
        if run.abs() < f32::EPSILON {
            return 0.0;
        }
        -((self.right.z - self.left.z) / run).atan().to_degrees()
    }
}

/// Smoothed body offset and tilt, relative to the actor.
#[derive(Debug, Clone, Default)]
pub struct BodySolver {
    /// Translation applied to the body bone (actor axes).
    pub offset: Vector3<f32>,
    /// Degrees, positive nose up.
    pub pitch: f32,
    /// Degrees, positive right side down.
    pub roll: f32,
    slope: SlopeReduction,
}

impl BodySolver {
    /// Step-length reduction from the last terrain tilt.
    pub const fn slope_reduction(&self) -> SlopeReduction {
        self.slope
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn update(
        &mut self,
        ctx: &TickContext<'_>,
        config: &BodyConfig,
        slope_reduction_multiplier: f32,
        legs: &[LegState],
        half_height: f32,
    ) {
        let pawn = ctx.pawn;
        let sides = SideAverages::from_legs(legs, |world| pawn.world_to_actor(world));

        let (feet_pitch, feet_roll) = if config.rotate_on_feet_locations {
            (sides.pitch(), sides.roll())
        } else {
            (0.0, 0.0)
        };

        self.slope = SlopeReduction {
            pitch: slope_factor(feet_pitch, slope_reduction_multiplier),
            roll: slope_factor(feet_roll, slope_reduction_multiplier),
        };

        let (accel_pitch, accel_roll) = if config.rotate_on_acceleration {
            accelerate_tilt(ctx.motion, config.acceleration_rotation_multiplier)
        } else {
            (0.0, 0.0)
        };

        let target_pitch = (feet_pitch + accel_pitch)
            .clamp(-config.max_pitch, config.max_pitch);
        let target_roll = (feet_roll + accel_roll)
            .clamp(-config.max_roll, config.max_roll);
        self.pitch = angle_interp_to(self.pitch, target_pitch, ctx.dt, config.rotation_interp_speed);
        self.roll = angle_interp_to(self.roll, target_roll, ctx.dt, config.rotation_interp_speed);

        let feet: Vec<Vector3<f32>> = legs.iter().map(|leg| leg.foot_location).collect();
        let feet_rel = pawn.world_to_actor(&average(&feet));
        let slope_drop = ((sides.forward.z - sides.backward.z)
            .abs()
            .max((sides.right.z - sides.left.z).abs())
            * config.slope_multiplier)
            .clamp(0.0, half_height.max(0.0));
        let height = (feet_rel.z + half_height) * config.bounce_multiplier - slope_drop
            + ctx.params.body_z_offset;

        self.offset = vinterp_to(
            self.offset,
            Vector3::new(0.0, 0.0, height),
            ctx.dt,
            config.location_interp_speed,
        );
    }
}

/// Map |cos(angle)| into [1 - multiplier, 1].
fn slope_factor(angle_degrees: f32, multiplier: f32) -> f32 {
    map_range_clamped(angle_degrees.to_radians().cos().abs(), 0.0, 1.0, 1.0 - multiplier, 1.0)
}

fn accelerate_tilt(motion: &PawnMotion, multiplier: f32) -> (f32, f32) {
    (
        -motion.forward_acceleration * multiplier * ACCELERATION_TILT,
        motion.right_acceleration * multiplier * ACCELERATION_TILT,
    )
}

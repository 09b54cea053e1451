//! Pawn motion summary recomputed every tick: speed, movement direction
//! split, turn rate, and the resulting step length and duration.

use strider_core::PawnState;
use strider_core::math::{angle_between_degrees, map_range_clamped, normalize_axis, yaw_degrees};

use crate::params::ScaledParams;

/// Speeds at or below this count as standing still.
pub const SPEED_THRESHOLD_MIN: f32 = 2.0;

/// Below this combined linear + angular speed the minimum step duration is used.
pub const MIN_COMBINED_SPEED: f32 = 5.0;

/// Step-length reduction factors from the terrain slope, in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlopeReduction {
    pub pitch: f32,
    pub roll: f32,
}

impl Default for SlopeReduction {
    fn default() -> Self {
        Self {
            pitch: 1.0,
            roll: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PawnMotion {
    pub speed: f32,
    /// 1 moving straight forward, -1 straight backward.
    pub forward_percent: f32,
    /// 1 moving straight right, -1 straight left.
    pub right_percent: f32,
    /// Heading change since the previous tick (degrees).
    pub yaw_delta: f32,
    pub step_length: f32,
    pub step_duration: f32,
    pub forward_acceleration: f32,
    pub right_acceleration: f32,
    pub(crate) previous_yaw: Option<f32>,
    pub(crate) previous_speed: f32,
    pub(crate) previous_forward_percent: f32,
    pub(crate) previous_right_percent: f32,
}

impl PawnMotion {
    pub fn update(
        &mut self,
        pawn: &PawnState,
        dt: f32,
        params: &ScaledParams,
        slope: SlopeReduction,
    ) {
        let mut velocity = pawn.velocity;
        self.speed = velocity.norm();
        if self.speed <= SPEED_THRESHOLD_MIN {
            self.speed = 0.0;
            velocity.fill(0.0);
        }

        self.forward_percent =
            map_range_clamped(angle_between_degrees(&pawn.forward(), &velocity), 0.0, 180.0, 1.0, -1.0);
        self.right_percent =
            map_range_clamped(angle_between_degrees(&pawn.right(), &velocity), 0.0, 180.0, 1.0, -1.0);

        let yaw = yaw_degrees(&pawn.transform.rotation);
        self.yaw_delta = self
            .previous_yaw
            .map_or(0.0, |previous| normalize_axis(yaw - previous));
        self.previous_yaw = Some(yaw);

        let reduction =
            self.forward_percent.abs() * slope.pitch + self.right_percent.abs() * slope.roll;
        self.step_length = ((self.forward_percent * params.step_distance_forward).abs()
            + (self.right_percent * params.step_distance_right).abs()
            + (params.step_distance_right * (self.yaw_delta / 360.0).clamp(-1.0, 1.0)).abs())
            * reduction;

        let combined = self.speed + self.yaw_delta.abs();
        self.step_duration = if combined > MIN_COMBINED_SPEED {
            self.step_length / combined
        } else {
            params.min_step_duration
        };

        if dt > 0.0 {
            self.forward_acceleration = (self.forward_percent * self.speed
                - self.previous_forward_percent * self.previous_speed)
                / dt;
            self.right_acceleration = (self.right_percent * self.speed
                - self.previous_right_percent * self.previous_speed)
                / dt;
        }
        self.previous_speed = self.speed;
        self.previous_forward_percent = self.forward_percent;
        self.previous_right_percent = self.right_percent;
    }

    /// Forget the previous heading, so a teleport does not read as a turn.
    pub fn clear_history(&mut self) {
        self.previous_yaw = None;
    }
}

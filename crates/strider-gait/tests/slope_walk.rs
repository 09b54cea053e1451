//! Foot placement and body response driven together over sloped ground.

use nalgebra::Vector3;

use strider_core::{EventQueue, PawnState, WalkConfig, WalkEvent};
use strider_gait::{BodySolver, FootPlacement, PawnMotion, ScaledParams, TickContext};
use strider_test_utils::rigs::HIPS;
use strider_test_utils::{FlatGround, QuadrupedRig, quadruped};

const DT: f32 = 1.0 / 60.0;

struct Walker {
    config: WalkConfig,
    placement: FootPlacement,
    motion: PawnMotion,
    body: BodySolver,
    events: EventQueue,
}

impl Walker {
    fn new(config: WalkConfig, pawn: &PawnState) -> Self {
        let hips: Vec<Vector3<f32>> = HIPS.iter().map(|&[x, y, z]| Vector3::new(x, y, z)).collect();
        let mut placement = FootPlacement::new(&config);
        placement.initialize(pawn, &hips);
        Self {
            config,
            placement,
            motion: PawnMotion::default(),
            body: BodySolver::default(),
            events: EventQueue::new(),
        }
    }

    fn tick(&mut self, pawn: &PawnState, ground: &FlatGround) {
        let params = ScaledParams::new(&self.config, pawn.mesh_scale);
        self.motion.update(pawn, DT, &params, self.body.slope_reduction());
        let ctx = TickContext {
            pawn,
            params: &params,
            motion: &self.motion,
            dt: DT,
        };
        self.placement.tick(&ctx, ground, false, &self.events);
        self.body.update(
            &ctx,
            &self.config.body,
            self.config.step.slope_reduction_multiplier,
            self.placement.legs(),
            self.placement.half_height(),
        );
    }
}

/// Plane through the origin rising `degrees` toward +X.
fn uphill(degrees: f32) -> FlatGround {
    let angle = degrees.to_radians();
    FlatGround::tilted(Vector3::zeros(), Vector3::new(-angle.sin(), 0.0, angle.cos()))
}

#[test]
fn standing_on_a_slope_steps_once_and_pitches_up() {
    let mut config = quadruped().config;
    config.body.rotate_on_acceleration = false;
    let pawn = QuadrupedRig::pawn(Vector3::new(0.0, 0.0, 50.0), 0.0, Vector3::zeros());
    let ground = uphill(10.0);

    let mut walker = Walker::new(config, &pawn);
    for _ in 0..600 {
        walker.tick(&pawn, &ground);
    }

    let downs = walker
        .events
        .drain()
        .into_iter()
        .filter(|event| matches!(event, WalkEvent::GroupDown { .. }))
        .count();
    assert_eq!(downs, 2);

    let rise = 30.0 * 10.0_f32.to_radians().tan();
    for leg in walker.placement.legs() {
        let expected = if leg.rest_location.x > 0.0 { rise } else { -rise };
        assert!((leg.foot_location.z - expected).abs() < 1e-2, "foot at {:?}", leg.foot_location);
    }

    // Body follows the 10 degree terrain pitch.
    assert!((walker.body.pitch - 10.0).abs() < 0.05, "pitch {}", walker.body.pitch);
    assert!(walker.body.roll.abs() < 1e-3);
    assert!(walker.body.slope_reduction().pitch < 1.0);
}

#[test]
fn walking_uphill_shortens_steps() {
    let mut config = quadruped().config;
    config.body.rotate_on_acceleration = false;
    let velocity = Vector3::new(100.0, 0.0, 0.0);

    let mut flat = Walker::new(config.clone(), &QuadrupedRig::pawn(Vector3::new(0.0, 0.0, 50.0), 0.0, velocity));
    let mut slope = Walker::new(config, &QuadrupedRig::pawn(Vector3::new(0.0, 0.0, 50.0), 0.0, velocity));
    let flat_ground = FlatGround::new(0.0);
    let slope_ground = uphill(20.0);

    for tick in 0..120 {
        let x = 100.0 * DT * tick as f32;
        let flat_pawn = QuadrupedRig::pawn(Vector3::new(x, 0.0, 50.0), 0.0, velocity);
        let slope_pawn = QuadrupedRig::pawn(Vector3::new(x, 0.0, 50.0 + x * 20.0_f32.to_radians().tan()), 0.0, velocity);
        flat.tick(&flat_pawn, &flat_ground);
        slope.tick(&slope_pawn, &slope_ground);
    }

    assert!(slope.motion.step_length < flat.motion.step_length);
    assert!(slope.motion.step_duration < flat.motion.step_duration);
}

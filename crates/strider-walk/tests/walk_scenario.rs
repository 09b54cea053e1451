//! End-to-end walk scenarios on the reference quadruped.

use nalgebra::Vector3;

use strider_core::{EventDispatcher, PawnState, WalkEvent};
use strider_test_utils::{FlatGround, NoGround, QuadrupedRig, RecordingSink, quadruped};
use strider_walk::{NodeStatus, WalkNode};

const DT: f32 = 1.0 / 60.0;
const SPEED: f32 = 100.0;

fn walking_pawn(x: f32) -> PawnState {
    let mut pawn = QuadrupedRig::pawn(Vector3::new(x, 0.0, 50.0), 0.0, Vector3::new(SPEED, 0.0, 0.0));
    pawn.movement_base = Some(true);
    pawn
}

/// Walk forward for `ticks` frames, evaluating the pose and draining events
/// into `sink` every frame.
fn walk(node: &mut WalkNode, rig: &QuadrupedRig, sink: &RecordingSink, ticks: usize) -> PawnState {
    let ground = FlatGround::new(0.0);
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(sink.clone());

    let mut last = walking_pawn(0.0);
    for tick in 0..ticks {
        let pawn = walking_pawn(SPEED * DT * tick as f32);
        node.update(DT, &pawn, &ground);
        let mut pose = rig.skeleton.reference_pose();
        node.evaluate(&mut pose, &rig.skeleton, &pawn);
        dispatcher.drain(node.events());
        last = pawn;
    }
    last
}

#[test]
fn diagonal_pairs_alternate_while_walking() {
    let mut rig = quadruped();
    rig.config.step.sequence_percent = 0.5;
    let mut node = WalkNode::new(rig.config.clone());
    node.bind(&rig.skeleton, &walking_pawn(0.0)).unwrap();
    assert_eq!(node.status(), NodeStatus::Ready);

    let sink = RecordingSink::new();
    walk(&mut node, &rig, &sink, 240);

    let ups = sink.group_ups();
    let downs = sink.group_downs();
    for group in 0..2 {
        assert!(ups.iter().filter(|&&g| g == group).count() >= 2, "group {group} lifted {ups:?}");
        assert!(downs.iter().filter(|&&g| g == group).count() >= 2, "group {group} landed {downs:?}");
    }
    assert_eq!(ups[0], 0);
    for pair in downs.windows(2) {
        assert_ne!(pair[0], pair[1], "consecutive landings of one group: {downs:?}");
    }
    assert_eq!(sink.landings(), 0);
}

#[test]
fn foot_events_precede_their_group_event() {
    let rig = quadruped();
    let mut node = WalkNode::new(rig.config.clone());
    node.bind(&rig.skeleton, &walking_pawn(0.0)).unwrap();

    let sink = RecordingSink::new();
    walk(&mut node, &rig, &sink, 120);

    let events = sink.events();
    let first_group_up = events
        .iter()
        .position(|event| matches!(event, WalkEvent::GroupUp { .. }))
        .unwrap();
    let legs: Vec<usize> = events[..first_group_up]
        .iter()
        .filter_map(|event| match event {
            WalkEvent::FootUp { leg, .. } => Some(*leg),
            _ => None,
        })
        .collect();
    assert_eq!(legs, vec![0, 3]);

    let first_group_down = events
        .iter()
        .position(|event| matches!(event, WalkEvent::GroupDown { .. }))
        .unwrap();
    let WalkEvent::GroupDown { hit, .. } = &events[first_group_down] else {
        unreachable!();
    };
    assert!(hit.is_some());
    assert!(matches!(events[first_group_down - 1], WalkEvent::FootDown { leg: 3, .. }));
}

#[test]
fn feet_stay_near_the_walking_body() {
    let rig = quadruped();
    let mut node = WalkNode::new(rig.config.clone());
    node.bind(&rig.skeleton, &walking_pawn(0.0)).unwrap();

    let sink = RecordingSink::new();
    let pawn = walk(&mut node, &rig, &sink, 300);

    for leg in node.placement().legs() {
        let local = pawn.world_to_actor(&leg.foot_location);
        assert!(local.x.abs() < 150.0, "foot left behind at {local:?}");
        assert!(local.z >= -50.5 && local.z <= -29.0, "foot height {local:?}");
    }
}

#[test]
fn walking_off_a_ledge_falls_then_lands() {
    let rig = quadruped();
    let mut node = WalkNode::new(rig.config.clone());
    let mut pawn = QuadrupedRig::pawn(Vector3::new(0.0, 0.0, 50.0), 0.0, Vector3::zeros());
    node.bind(&rig.skeleton, &pawn).unwrap();

    let sink = RecordingSink::new();
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(sink.clone());

    node.update(DT, &pawn, &FlatGround::new(0.0));
    assert!(!node.is_falling());

    // Airborne: nothing below at all.
    for _ in 0..10 {
        node.update(DT, &pawn, &NoGround);
        dispatcher.drain(node.events());
    }
    assert!(node.is_falling());
    assert_eq!(sink.landings(), 0);

    // Touch down on lower ground.
    pawn = QuadrupedRig::pawn(Vector3::new(0.0, 0.0, 45.0), 0.0, Vector3::zeros());
    let lower = FlatGround::new(-5.0);
    node.update(DT, &pawn, &lower);
    dispatcher.drain(node.events());
    assert!(!node.is_falling());
    assert_eq!(sink.landings(), 1);
    assert!(sink.group_downs().is_empty());
    for leg in node.placement().legs() {
        assert!((leg.foot_location.z + 5.0).abs() < 1e-3);
    }
}

#[test]
fn invalid_config_keeps_node_inert() {
    let mut rig = quadruped();
    rig.config.ik.precision = 0.0;
    let mut node = WalkNode::new(rig.config.clone());
    assert!(node.bind(&rig.skeleton, &walking_pawn(0.0)).is_err());
    assert!(node.is_disabled());

    let sink = RecordingSink::new();
    walk(&mut node, &rig, &sink, 60);
    assert!(sink.events().is_empty());
    assert!(node.placement().legs().is_empty());
}

//! Foot placement engine.
//!
//! Owns every leg's runtime state together with the gait scheduler and step
//! curves, and runs the per-tick foot pipeline:
//!
//! ```text
//! sample_supports ─► set_foot_targets ─► unplant_current_group ─► compute_feet ─► plant_groups
//!   (platform Δ)       (ground probes)     (lift-off + events)     (swing/stance)   (touchdown + events)
//! ```
//!
//! While the pawn is falling only `set_foot_targets` and `compute_feet` run.

use nalgebra::{UnitQuaternion, Vector3};

use strider_core::math::{average, qinterp_to, rotation_from_zx, vinterp_to};
use strider_core::{
    EventQueue, GroundHit, GroundProbe, PawnState, SolverKind, WalkConfig, WalkEvent,
};

use crate::curve::StepCurves;
use crate::gait::{GaitScheduler, GroupState};
use crate::leg::{LegState, SupportTracker};
use crate::motion::PawnMotion;
use crate::params::ScaledParams;

/// Before this swing phase the foot rotation still follows the ground normal.
pub const STEP_PERCENT_AT_BEGINNING: f32 = 0.15;

/// After this swing phase the foot rotation follows the ground normal again.
pub const STEP_PERCENT_AT_END: f32 = 0.85;

/// Everything one tick of foot placement reads about the pawn.
#[derive(Debug, Clone, Copy)]
pub struct TickContext<'a> {
    pub pawn: &'a PawnState,
    pub params: &'a ScaledParams,
    pub motion: &'a PawnMotion,
    pub dt: f32,
}

/// Placement settings copied out of the walk configuration.
#[derive(Debug, Clone)]
struct PlacementSettings {
    solver: SolverKind,
    distance_check_multiplier: f32,
    fix_targets_after_percent: f32,
    feet_rotation_interp_speed: f32,
    feet_in_air_interp_speed: f32,
    /// Unscaled per-leg offsets (actor space).
    offsets: Vec<Vector3<f32>>,
    tip_bones: Vec<String>,
}

impl PlacementSettings {
    fn tip_bone(&self, leg: usize) -> String {
        self.tip_bones.get(leg).cloned().unwrap_or_default()
    }
}

/// Per-character foot placement state.
#[derive(Debug, Clone)]
pub struct FootPlacement {
    legs: Vec<LegState>,
    scheduler: GaitScheduler,
    curves: StepCurves,
    settings: PlacementSettings,
    half_height: f32,
}

impl FootPlacement {
    pub fn new(config: &WalkConfig) -> Self {
        Self {
            legs: Vec::new(),
            scheduler: GaitScheduler::new(&config.groups, config.legs.len(), config.step.sequence_percent),
            curves: StepCurves::from_config(&config.step),
            settings: PlacementSettings {
                solver: config.solver.kind,
                distance_check_multiplier: config.solver.distance_check_multiplier,
                fix_targets_after_percent: config.fix_feet_targets_after_percent,
                feet_rotation_interp_speed: config.feet_rotation_interp_speed,
                feet_in_air_interp_speed: config.feet_in_air_interp_speed,
                offsets: config.legs.iter().map(strider_core::LegConfig::offset_vector).collect(),
                tip_bones: config.legs.iter().map(|leg| leg.tip_bone.clone()).collect(),
            },
            half_height: 0.0,
        }
    }

    /// Derive every leg's rest pose from the pawn and the reference-pose
    /// parent bone locations (component space, one per leg).
    pub fn initialize(&mut self, pawn: &PawnState, parent_components: &[Vector3<f32>]) {
        self.half_height = (pawn.location() - pawn.mesh_transform.translation.vector)
            .dot(&pawn.up())
            .abs();

        self.legs = parent_components
            .iter()
            .zip(&self.settings.offsets)
            .map(|(parent_component, offset)| {
                let parent_world = pawn.component_to_world(parent_component);
                let parent_rel = pawn.world_to_actor(&parent_world) + offset;
                let rest = Vector3::new(parent_rel.x, parent_rel.y, -self.half_height);
                let length = (parent_rel.z - rest.z) * pawn.mesh_scale.z;

                let mut leg = LegState::new(*parent_component, rest, length);
                let rest_world = pawn.actor_to_world(&rest);
                leg.foot_location = rest_world;
                leg.foot_target = rest_world;
                leg.unplant_anchor = rest_world;
                leg.tip_world = rest_world;
                leg
            })
            .collect();

        tracing::debug!(legs = self.legs.len(), half_height = self.half_height, "foot placement initialized");
    }

    pub fn legs(&self) -> &[LegState] {
        &self.legs
    }

    pub fn leg(&self, index: usize) -> Option<&LegState> {
        self.legs.get(index)
    }

    pub fn leg_mut(&mut self, index: usize) -> Option<&mut LegState> {
        self.legs.get_mut(index)
    }

    pub const fn scheduler(&self) -> &GaitScheduler {
        &self.scheduler
    }

    pub const fn curves(&self) -> &StepCurves {
        &self.curves
    }

    /// Vertical distance between the pawn origin and the mesh origin.
    pub const fn half_height(&self) -> f32 {
        self.half_height
    }

    /// Swing state of the group owning `leg`.
    pub fn leg_state(&self, leg: usize) -> GroupState {
        self.scheduler.leg_state(leg)
    }

    /// Run one grounded or airborne tick in pipeline order.
    pub fn tick(&mut self, ctx: &TickContext<'_>, probe: &impl GroundProbe, falling: bool, events: &EventQueue) {
        self.sample_supports(probe);
        self.set_foot_targets(ctx, probe);
        if falling {
            self.compute_feet(ctx, true);
        } else {
            self.unplant_current_group(ctx, events);
            self.compute_feet(ctx, false);
            self.plant_groups(probe, events);
        }
    }

    /// Sample how far each leg's support surface moved since last tick.
    pub fn sample_supports(&mut self, probe: &impl GroundProbe) {
        for leg in &mut self.legs {
            leg.sample_support(probe);
        }
    }

    /// Probe the ground ahead of every leg and update its target.
    pub fn set_foot_targets(&mut self, ctx: &TickContext<'_>, probe: &impl GroundProbe) {
        for index in 0..self.legs.len() {
            self.set_foot_target(ctx, probe, index);
        }
    }

    fn set_foot_target(&mut self, ctx: &TickContext<'_>, probe: &impl GroundProbe, index: usize) {
        let pawn = ctx.pawn;
        let params = ctx.params;
        let (forward, right, up) = (pawn.forward(), pawn.right(), pawn.up());
        let offset = self.settings.offsets[index].component_mul(&params.mesh_scale);
        let group = self.scheduler.leg_state(index);
        let leg = &mut self.legs[index];

        let parent_world = pawn.component_to_world(&leg.parent_component);
        let start_no_z = parent_world
            + forward * (params.step_distance_forward * ctx.motion.forward_percent + offset.x)
            + right * (params.step_distance_right * ctx.motion.right_percent - offset.y);
        let start = start_no_z + up * params.trace_z_offset;
        let end = start_no_z - up * params.trace_length;

        let hit = match self.settings.solver {
            SolverKind::Basic => probe.line_trace(&start, &end),
            SolverKind::Advanced => advanced_trace(
                probe,
                &start,
                &end,
                &start_no_z,
                &up,
                leg.length * self.settings.distance_check_multiplier,
                params.radius_check,
                (params.trace_length + params.trace_z_offset) * 2.0,
            ),
        };

        if let Some(hit) = &hit {
            let mesh_rotation = pawn.mesh_transform.rotation;
            if !group.unplanted
                || group.phase < STEP_PERCENT_AT_BEGINNING
                || group.phase > STEP_PERCENT_AT_END
            {
                let world = rotation_from_zx(&hit.normal, &(mesh_rotation * Vector3::x()));
                leg.rotation_target = mesh_rotation.inverse() * world;
            }

            let target = hit.location + up * offset.z;
            if group.unplanted && group.phase >= self.settings.fix_targets_after_percent {
                leg.foot_target += leg.support_delta;
            } else {
                leg.foot_target = target;
            }
        } else {
            leg.foot_target = pawn.actor_to_world(&leg.rest_location);
            leg.rotation_target = UnitQuaternion::identity();
            tracing::trace!(leg = index, "no ground under foot, using rest target");
        }

        leg.foot_rotation = qinterp_to(
            leg.foot_rotation,
            leg.rotation_target,
            ctx.dt,
            self.settings.feet_rotation_interp_speed,
        );
        leg.ik_enabled = hit.is_some();
        leg.last_hit = hit;
    }

    /// Lift the candidate group off when allowed and any of its feet lags
    /// its target. Returns the group that lifted off.
    pub fn unplant_current_group(&mut self, ctx: &TickContext<'_>, events: &EventQueue) -> Option<usize> {
        let group = self.scheduler.current_group()?;
        if !self.scheduler.may_unplant(group) {
            return None;
        }

        let min_distance = ctx.params.min_distance_to_unplant;
        let members = self.scheduler.group_legs(group).to_vec();
        let far_enough = members.iter().any(|&index| {
            let leg = &self.legs[index];
            (leg.foot_location - leg.foot_target).norm() >= leg.adapted_min_distance(min_distance)
        });
        if !far_enough {
            return None;
        }

        self.scheduler.unplant(group);
        for &index in &members {
            let leg = &mut self.legs[index];
            leg.unplant_anchor = leg.foot_location;
            events.emit(WalkEvent::FootUp {
                leg: index,
                bone: self.settings.tip_bone(index),
                location: leg.foot_location,
            });
        }
        events.emit(WalkEvent::GroupUp {
            group,
            location: self.group_foot_average(&members),
        });
        tracing::debug!(group, "group lifted off");
        Some(group)
    }

    /// Move every grouped foot: toward its target while falling, along the
    /// step curves while swinging, with its support while planted.
    pub fn compute_feet(&mut self, ctx: &TickContext<'_>, falling: bool) {
        let up = ctx.pawn.up();
        let min_distance = ctx.params.min_distance_to_unplant;

        for group in 0..self.scheduler.group_count() {
            let members = self.scheduler.group_legs(group).to_vec();

            if falling {
                for &index in &members {
                    let leg = &mut self.legs[index];
                    leg.foot_location = vinterp_to(
                        leg.foot_location,
                        leg.foot_target,
                        ctx.dt,
                        self.settings.feet_in_air_interp_speed,
                    );
                }
                continue;
            }

            if self.scheduler.state(group).unplanted {
                let phase = self.scheduler.advance(group, ctx.dt, ctx.motion.step_duration);
                let lift = up * (self.curves.height(phase) * ctx.params.step_height);
                let progress = self.curves.distance(phase);
                for &index in &members {
                    let leg = &mut self.legs[index];
                    leg.foot_location = leg.unplant_anchor.lerp(&leg.foot_target, progress) + lift;
                    leg.unplant_anchor += leg.support_delta;
                }
            } else {
                for &index in &members {
                    let leg = &mut self.legs[index];
                    let carried = leg.foot_location + leg.support_delta;
                    let limit = leg.adapted_min_distance(min_distance) * self.settings.distance_check_multiplier;
                    if (carried - leg.tip_world).norm() <= limit {
                        leg.foot_location = carried;
                    }
                }
            }
        }
    }

    /// Put down every group whose swing completed. Returns the landed groups.
    pub fn plant_groups(&mut self, probe: &impl GroundProbe, events: &EventQueue) -> Vec<usize> {
        let landing = self.scheduler.landing_groups();
        for &group in &landing {
            let members = self.scheduler.group_legs(group).to_vec();
            for &index in &members {
                let leg = &mut self.legs[index];
                leg.support = leg
                    .last_hit
                    .as_ref()
                    .and_then(|hit| SupportTracker::attach(probe, hit, &leg.foot_location));
            }

            self.scheduler.plant(group);

            for &index in &members {
                let leg = &self.legs[index];
                events.emit(WalkEvent::FootDown {
                    leg: index,
                    bone: self.settings.tip_bone(index),
                    location: leg.foot_location,
                    hit: leg.last_hit.clone(),
                });
            }
            let hit: Option<GroundHit> = members.first().and_then(|&index| self.legs[index].last_hit.clone());
            events.emit(WalkEvent::GroupDown {
                group,
                location: self.group_foot_average(&members),
                hit,
            });
            tracing::debug!(group, "group planted");
        }
        landing
    }

    /// Re-probe targets, snap every foot back to its rest projection and
    /// plant all groups.
    pub fn reset(&mut self, ctx: &TickContext<'_>, probe: &impl GroundProbe) {
        self.set_foot_targets(ctx, probe);
        for leg in &mut self.legs {
            let rest = ctx.pawn.actor_to_world(&leg.rest_location);
            leg.foot_location = rest;
            leg.unplant_anchor = rest;
        }
        self.scheduler.reset();
        tracing::debug!("feet reset to rest pose");
    }

    fn group_foot_average(&self, members: &[usize]) -> Vector3<f32> {
        let feet: Vec<Vector3<f32>> = members.iter().map(|&index| self.legs[index].foot_location).collect();
        average(&feet)
    }
}

/// Line probe with a sphere fallback when the line misses or lands farther
/// than `max_line_distance` from `start_no_z`. Among fallback hits closer
/// than the line hit, the one with the smallest vertical distance weighted by
/// wall-ness wins. Without a usable fallback the line result stands.
#[allow(clippy::too_many_arguments)]
fn advanced_trace(
    probe: &impl GroundProbe,
    start: &Vector3<f32>,
    end: &Vector3<f32>,
    start_no_z: &Vector3<f32>,
    up: &Vector3<f32>,
    max_line_distance: f32,
    radius: f32,
    initial_score: f32,
) -> Option<GroundHit> {
    let line = probe.line_trace(start, end);
    let line_distance = line
        .as_ref()
        .map_or(f32::INFINITY, |hit| (start_no_z - hit.location).norm());

    if line.is_some() && line_distance <= max_line_distance {
        return line;
    }

    let mut best_score = initial_score;
    let mut best = None;
    for hit in probe.sphere_trace_multi(start, end, radius) {
        let offset = start_no_z - hit.location;
        if offset.norm() >= line_distance {
            continue;
        }
        let score = offset.dot(up).abs() * (1.0 - hit.normal.dot(up));
        if score < best_score {
            best_score = score;
            best = Some(hit);
        }
    }

    best.or(line)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

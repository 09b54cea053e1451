//! The per-character walk node.
//!
//! A [`WalkNode`] is bound once against a [`Skeleton`], then driven by the
//! host every frame:
//!
//! ```text
//! bind(skeleton, pawn)            resolve bones, rest pose, force a reset
//!   │
//!   ├─► update(dt, pawn, probe)   motion → reset/falling → foot placement → body
//!   └─► evaluate(pose, ...)       body bone → per-leg CCDIK or direct drive
//! ```
//!
//! Errors never escape `update` or `evaluate`. A configuration or bind error
//! disables the node until it is rebound; a solver error skips the affected
//! leg for that frame.

use nalgebra::{Isometry3, Translation3, Unit, UnitQuaternion, Vector3};

use strider_core::config::DEFAULT_ROTATION_LIMIT;
use strider_core::{
    BindError, EventQueue, GroundProbe, IkError, PawnState, StriderError, WalkConfig, WalkEvent,
};
use strider_gait::{BodySolver, FootPlacement, LegState, PawnMotion, ScaledParams, TickContext};
use strider_ik::{BoneTransform, CcdikSolver, IkChain, Pose, RotationLimits, Skeleton};

/// How far below the lowest foot the falling probe reaches, as a multiple of
/// that foot's depth under the pawn.
const FALLING_PROBE_DEPTH: f32 = 1.25;

/// Planar padding added around the feet for the falling probe.
const FALLING_PROBE_PADDING: f32 = 10.0;

/// Lifecycle of a [`WalkNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    /// Not bound to a skeleton yet.
    Unbound,
    Ready,
    /// Configuration or binding failed. Update and evaluate are no-ops.
    Disabled,
}

/// How a leg's tip bone is posed.
#[derive(Debug, Clone, PartialEq)]
pub enum LegDrive {
    /// CCDIK over `path` (the parent bone down to the tip).
    IkChain {
        path: Vec<usize>,
        /// Radians per chain link, the parent bone first and always zero.
        limits: Vec<f32>,
        limit_rotation: bool,
    },
    /// Tip bone placed directly on the foot.
    DirectBone,
}

/// A leg resolved against the skeleton.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundLeg {
    pub parent: usize,
    pub tip: usize,
    pub drive: LegDrive,
}

/// Procedural walk state for one character.
#[derive(Debug, Clone)]
pub struct WalkNode {
    config: WalkConfig,
    legs: Vec<BoundLeg>,
    body_bone: Option<usize>,
    placement: FootPlacement,
    motion: PawnMotion,
    body: BodySolver,
    params: ScaledParams,
    solver: CcdikSolver,
    events: EventQueue,
    status: NodeStatus,
    falling: bool,
    reset_requested: bool,
}

impl WalkNode {
    pub fn new(config: WalkConfig) -> Self {
        Self::with_events(config, EventQueue::new())
    }

    /// Create a node that pushes onto an existing (shared) queue.
    pub fn with_events(config: WalkConfig, events: EventQueue) -> Self {
        Self {
            placement: FootPlacement::new(&config),
            params: ScaledParams::new(&config, Vector3::repeat(1.0)),
            solver: CcdikSolver::new((&config.ik).into()),
            legs: Vec::new(),
            body_bone: None,
            motion: PawnMotion::default(),
            body: BodySolver::default(),
            events,
            status: NodeStatus::Unbound,
            falling: false,
            reset_requested: false,
            config,
        }
    }

    pub const fn config(&self) -> &WalkConfig {
        &self.config
    }

    pub const fn status(&self) -> NodeStatus {
        self.status
    }

    pub fn is_disabled(&self) -> bool {
        self.status == NodeStatus::Disabled
    }

    pub const fn is_falling(&self) -> bool {
        self.falling
    }

    /// Queue the node pushes step and landing events onto.
    pub const fn events(&self) -> &EventQueue {
        &self.events
    }

    pub fn legs(&self) -> &[BoundLeg] {
        &self.legs
    }

    pub const fn body_bone(&self) -> Option<usize> {
        self.body_bone
    }

    pub const fn placement(&self) -> &FootPlacement {
        &self.placement
    }

    pub const fn body(&self) -> &BodySolver {
        &self.body
    }

    pub const fn motion(&self) -> &PawnMotion {
        &self.motion
    }

    /// Snap every foot back to its rest pose on the next update.
    pub fn request_reset(&mut self) {
        self.reset_requested = true;
    }

    /// Validate the configuration, resolve every bone and derive the rest
    /// pose from the skeleton's reference pose.
    ///
    /// A node without legs or groups binds successfully but stays disabled.
    ///
    /// # Errors
    ///
    /// Returns the configuration or bind error that disabled the node.
    pub fn bind(&mut self, skeleton: &Skeleton, pawn: &PawnState) -> Result<(), StriderError> {
        match self.try_bind(skeleton, pawn) {
            Ok(true) => {
                self.status = NodeStatus::Ready;
                self.reset_requested = true;
                tracing::debug!(legs = self.legs.len(), body_bone = ?self.body_bone, "walk node bound");
                Ok(())
            }
            Ok(false) => {
                self.status = NodeStatus::Disabled;
                tracing::warn!("no legs or no leg groups configured, walk disabled");
                Ok(())
            }
            Err(err) => {
                self.status = NodeStatus::Disabled;
                tracing::error!(%err, "walk node disabled");
                Err(err)
            }
        }
    }

    fn try_bind(&mut self, skeleton: &Skeleton, pawn: &PawnState) -> Result<bool, StriderError> {
        self.config.validate()?;
        if self.config.legs.is_empty() || self.config.groups.is_empty() {
            return Ok(false);
        }

        let find = |name: &str| {
            skeleton
                .find_bone(name)
                .ok_or_else(|| BindError::UnknownBone(name.to_string()))
        };

        let mut legs = Vec::with_capacity(self.config.legs.len());
        for (index, leg) in self.config.legs.iter().enumerate() {
            let parent = find(&leg.parent_bone)?;
            let tip = find(&leg.tip_bone)?;

            if !leg.virtual_bone && !skeleton.is_descendant(tip, parent) {
                return Err(BindError::TipNotDescendant {
                    leg: index,
                    parent: leg.parent_bone.clone(),
                    tip: leg.tip_bone.clone(),
                }
                .into());
            }

            let drive = if self.config.ik.enabled {
                if skeleton.parent(parent).is_none() {
                    return Err(BindError::ParentIsRoot(index).into());
                }
                // The parent is the chain root and never rotates.
                let path = skeleton.path(parent, tip).ok_or_else(|| BindError::TipNotDescendant {
                    leg: index,
                    parent: leg.parent_bone.clone(),
                    tip: leg.tip_bone.clone(),
                })?;
                let joints: Vec<f32> = if leg.rotation_limits.is_empty() {
                    vec![DEFAULT_ROTATION_LIMIT; path.len() - 1]
                } else {
                    leg.rotation_limits.clone()
                };
                let limits = std::iter::once(0.0)
                    .chain(joints.iter().map(|degrees| degrees.to_radians()))
                    .collect();
                LegDrive::IkChain {
                    path,
                    limits,
                    limit_rotation: leg.limit_rotation,
                }
            } else {
                LegDrive::DirectBone
            };

            legs.push(BoundLeg { parent, tip, drive });
        }

        self.body_bone = self.config.body.bone.as_deref().and_then(|name| {
            let bone = skeleton.find_bone(name);
            if bone.is_none() {
                tracing::warn!(bone = name, "body bone not found, body motion disabled");
            }
            bone
        });

        let reference = skeleton.reference_pose().component_transforms(skeleton);
        let parents: Vec<Vector3<f32>> = legs
            .iter()
            .map(|leg| {
                reference
                    .get(leg.parent)
                    .map_or_else(Vector3::zeros, |transform| transform.translation.vector)
            })
            .collect();

        self.legs = legs;
        self.placement = FootPlacement::new(&self.config);
        self.placement.initialize(pawn, &parents);
        self.params = ScaledParams::new(&self.config, pawn.mesh_scale);
        self.solver = CcdikSolver::new((&self.config.ik).into());
        self.motion = PawnMotion::default();
        self.body.reset();
        self.falling = false;
        Ok(true)
    }

    /// Advance the walk by `dt` seconds.
    pub fn update(&mut self, dt: f32, pawn: &PawnState, probe: &impl GroundProbe) {
        if self.status != NodeStatus::Ready {
            return;
        }

        self.params = ScaledParams::new(&self.config, pawn.mesh_scale);
        if self.reset_requested {
            self.motion.clear_history();
        }
        self.motion.update(pawn, dt, &self.params, self.body.slope_reduction());

        let ctx = TickContext {
            pawn,
            params: &self.params,
            motion: &self.motion,
            dt,
        };

        if self.reset_requested {
            self.placement.reset(&ctx, probe);
            self.reset_requested = false;
        }

        if self.config.detect_falling {
            let falling = detect_falling(pawn, self.placement.legs(), probe);
            if falling && !self.falling {
                tracing::debug!("pawn started falling");
                self.placement.reset(&ctx, probe);
                self.falling = true;
            } else if !falling && self.falling {
                tracing::debug!("pawn landed");
                self.falling = false;
                self.placement.reset(&ctx, probe);
                self.events.emit(WalkEvent::PawnLanded {
                    location: pawn.location(),
                });
            }
        }

        self.placement.tick(&ctx, probe, self.falling, &self.events);
        self.body.update(
            &ctx,
            &self.config.body,
            self.config.step.slope_reduction_multiplier,
            self.placement.legs(),
            self.placement.half_height(),
        );
    }

    /// Pose the body and leg bones. `pose` is updated in place; the applied
    /// component-space transforms are returned in application order.
    pub fn evaluate(&mut self, pose: &mut Pose, skeleton: &Skeleton, pawn: &PawnState) -> Vec<BoneTransform> {
        let mut applied = Vec::new();
        if self.status != NodeStatus::Ready {
            return applied;
        }

        if let (Some(bone), false) = (self.body_bone, self.falling) {
            if let Some(transform) = self.body_transform(pose, skeleton, pawn, bone) {
                pose.apply_component_transforms(skeleton, std::slice::from_ref(&transform));
                applied.push(transform);
            }
        }

        for (index, leg) in self.legs.iter().enumerate() {
            let Some(state) = self.placement.leg(index) else {
                continue;
            };

            let transforms = match &leg.drive {
                LegDrive::IkChain {
                    path,
                    limits,
                    limit_rotation,
                } => {
                    if !state.ik_enabled {
                        continue;
                    }
                    let limits = RotationLimits {
                        per_link: limits,
                        enabled: *limit_rotation,
                    };
                    match solve_leg(&self.solver, pose, skeleton, pawn, state, path, limits) {
                        Ok(transforms) => transforms,
                        Err(err) => {
                            tracing::warn!(leg = index, %err, "skipping leg");
                            continue;
                        }
                    }
                }
                LegDrive::DirectBone => {
                    let Some(current) = pose.component(skeleton, leg.tip) else {
                        continue;
                    };
                    let translation = pawn.world_to_component(&state.foot_location);
                    vec![BoneTransform {
                        bone: leg.tip,
                        transform: Isometry3::from_parts(
                            Translation3::from(translation),
                            state.foot_rotation * current.rotation,
                        ),
                    }]
                }
            };

            pose.apply_component_transforms(skeleton, &transforms);
            applied.extend(transforms);
        }

        let component = pose.component_transforms(skeleton);
        for (index, leg) in self.legs.iter().enumerate() {
            let Some(state) = self.placement.leg_mut(index) else {
                continue;
            };
            if let Some(parent) = component.get(leg.parent) {
                state.parent_component = parent.translation.vector;
            }
            if let Some(tip) = component.get(leg.tip) {
                state.tip_world = pawn.component_to_world(&tip.translation.vector);
            }
        }

        applied
    }

    fn body_transform(
        &self,
        pose: &Pose,
        skeleton: &Skeleton,
        pawn: &PawnState,
        bone: usize,
    ) -> Option<BoneTransform> {
        let current = pose.component(skeleton, bone)?;

        let offset_world = pawn.transform.rotation * self.body.offset;
        let offset = (pawn.mesh_transform.rotation.inverse() * offset_world).component_div(&pawn.mesh_scale);

        let axis = self.config.mesh_forward_axis;
        let pitch = UnitQuaternion::from_axis_angle(&Unit::new_normalize(axis.right()), self.body.pitch.to_radians());
        let roll = UnitQuaternion::from_axis_angle(&Unit::new_normalize(axis.forward()), self.body.roll.to_radians());

        Some(BoneTransform {
            bone,
            transform: Isometry3::from_parts(
                Translation3::from(current.translation.vector + offset),
                pitch * roll * current.rotation,
            ),
        })
    }
}

/// Bend one leg's chain toward its foot and turn the tip to the foot rotation.
fn solve_leg(
    solver: &CcdikSolver,
    pose: &Pose,
    skeleton: &Skeleton,
    pawn: &PawnState,
    state: &LegState,
    path: &[usize],
    limits: RotationLimits<'_>,
) -> Result<Vec<BoneTransform>, IkError> {
    let component = pose.component_transforms(skeleton);
    let target = pawn.world_to_component(&state.foot_location);

    let mut chain = IkChain::build(path, &component)?;
    let result = solver.solve(&mut chain, target, limits)?;
    tracing::trace!(
        converged = result.converged,
        error = result.position_error,
        "leg solved"
    );
    chain.rotate_tip(state.foot_rotation);
    Ok(chain.bone_transforms())
}

/// Whether the pawn has lost the ground.
///
/// Pawns reporting a movement base are falling without one. Others sweep a
/// thin box the size of the feet footprint from the pawn down past the lowest
/// foot; nothing hit means falling.
pub fn detect_falling(pawn: &PawnState, legs: &[LegState], probe: &impl GroundProbe) -> bool {
    if let Some(has_base) = pawn.movement_base {
        return !has_base;
    }
    if legs.is_empty() {
        return false;
    }

    let (min, max) = legs.iter().map(|leg| pawn.world_to_actor(&leg.foot_location)).fold(
        (Vector3::repeat(f32::MAX), Vector3::repeat(f32::MIN)),
        |(min, max), foot| (min.inf(&foot), max.sup(&foot)),
    );

    let start = pawn.location();
    let end = start + pawn.up() * (min.z * FALLING_PROBE_DEPTH);
    let half_extent = Vector3::new(
        (max.x - min.x) / 2.0 + FALLING_PROBE_PADDING,
        (max.y - min.y) / 2.0 + FALLING_PROBE_PADDING,
        1.0,
    );

    probe
        .box_trace(&start, &end, &half_extent, &pawn.transform.rotation)
        .is_none()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

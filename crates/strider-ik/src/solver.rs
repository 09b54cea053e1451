//! Cyclic Coordinate Descent IK solver.
//!
//! Each iteration visits every link between the root and the tip, rotating it
//! so the tip swings toward the target. Rotation limits are per-solve angle
//! budgets: the total rotation a link receives across all iterations of one
//! [`CcdikSolver::solve`] call never exceeds its limit.

use nalgebra::{Unit, UnitQuaternion, Vector3};

use strider_core::IkError;
use strider_core::math::{KINDA_SMALL_NUMBER, SMALL_NUMBER};

use crate::chain::IkChain;

/// Configuration for the CCDIK solver.
#[derive(Debug, Clone)]
pub struct CcdikConfig {
    /// Tip-to-target distance at which the solve stops.
    pub precision: f32,
    /// Maximum solver iterations.
    pub max_iterations: u32,
    /// Visit links tip to root instead of root to tip.
    pub start_from_tail: bool,
}

impl Default for CcdikConfig {
    fn default() -> Self {
        Self {
            precision: 1.0,
            max_iterations: 10,
            start_from_tail: false,
        }
    }
}

impl From<&strider_core::IkConfig> for CcdikConfig {
    fn from(config: &strider_core::IkConfig) -> Self {
        Self {
            precision: config.precision,
            max_iterations: config.max_iterations,
            start_from_tail: config.start_from_tail,
        }
    }
}

/// Rotation limits for one solve.
#[derive(Debug, Clone, Copy)]
pub struct RotationLimits<'a> {
    /// Per-link budget in radians, index 0 being the chain root.
    pub per_link: &'a [f32],
    /// When false the budgets are ignored and links rotate freely.
    pub enabled: bool,
}

/// Result of a CCDIK solve.
#[derive(Debug, Clone)]
pub struct CcdikResult {
    /// Whether any link was rotated.
    pub updated: bool,
    /// Whether the tip ended within `precision` of the target.
    pub converged: bool,
    /// Number of iterations used.
    pub iterations: u32,
    /// Final tip-to-target distance.
    pub position_error: f32,
}

/// Cyclic Coordinate Descent IK solver.
#[derive(Debug, Clone)]
pub struct CcdikSolver {
    config: CcdikConfig,
}

impl CcdikSolver {
    /// Create a new solver with the given configuration.
    pub const fn new(config: CcdikConfig) -> Self {
        Self { config }
    }

    /// Create a solver with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(CcdikConfig::default())
    }

    pub const fn config(&self) -> &CcdikConfig {
        &self.config
    }

    /// Bend `chain` so its tip approaches `target` (component space).
    ///
    /// # Errors
    ///
    /// Returns [`IkError::VirtualBoneInChain`] when `limits` has fewer entries
    /// than the chain has links. The chain is left untouched in that case.
    pub fn solve(
        &self,
        chain: &mut IkChain,
        target: Vector3<f32>,
        limits: RotationLimits<'_>,
    ) -> Result<CcdikResult, IkError> {
        if limits.per_link.len() < chain.len() {
            return Err(IkError::VirtualBoneInChain {
                link: limits.per_link.len(),
                limits: limits.per_link.len(),
            });
        }

        chain.reset_angle_deltas();

        let tip = chain.len() - 1;
        let order: Vec<usize> = if self.config.start_from_tail {
            (1..tip).rev().collect()
        } else {
            (1..tip).collect()
        };

        let mut distance = (chain.tip_location() - target).norm();
        let mut iterations = 0;
        let mut updated_any = false;

        while distance > self.config.precision && iterations < self.config.max_iterations {
            iterations += 1;
            let mut updated = false;

            for &index in &order {
                updated |= rotate_toward(chain, index, &target, limits);
            }

            distance = (chain.tip_location() - target).norm();
            if !updated {
                break;
            }
            updated_any = true;
        }

        tracing::trace!(iterations, distance, updated_any, "ccdik solve");

        Ok(CcdikResult {
            updated: updated_any,
            converged: distance <= self.config.precision,
            iterations,
            position_error: distance,
        })
    }
}

/// One CCD step on link `index`. Returns whether the link rotated.
fn rotate_toward(
    chain: &mut IkChain,
    index: usize,
    target: &Vector3<f32>,
    limits: RotationLimits<'_>,
) -> bool {
    let link_location = chain.links()[index].location();
    let tip_location = chain.tip_location();

    let (Some(to_end), Some(to_target)) = (
        (tip_location - link_location).try_normalize(SMALL_NUMBER),
        (target - link_location).try_normalize(SMALL_NUMBER),
    ) else {
        return false;
    };

    let budget = if limits.enabled {
        limits.per_link[index]
    } else {
        f32::INFINITY
    };
    let spent = chain.links()[index].angle_delta;

    let mut angle = to_end.dot(&to_target).clamp(-1.0, 1.0).acos().clamp(-budget, budget);
    if angle.abs() <= KINDA_SMALL_NUMBER || (limits.enabled && budget <= spent) {
        return false;
    }

    if limits.enabled {
        if spent + angle > budget {
            angle = budget - spent;
            if angle <= KINDA_SMALL_NUMBER {
                return false;
            }
        }
        chain.link_mut(index).angle_delta += angle;
    }

    let Some(axis) = Unit::try_new(to_end.cross(&to_target), SMALL_NUMBER) else {
        return false;
    };
    chain.rotate_link(index, UnitQuaternion::from_axis_angle(&axis, angle));
    true
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Isometry3, Translation3};

    fn at(x: f32, z: f32) -> Isometry3<f32> {
        Isometry3::from_parts(Translation3::new(x, 0.0, z), UnitQuaternion::identity())
    }

    /// Root, hip, knee and ankle tip with the knee slightly bent forward.
    fn leg() -> IkChain {
        let component = vec![at(0.0, 10.0), at(0.0, 0.0), at(8.0, -29.0), at(0.0, -58.0)];
        IkChain::build(&[0, 1, 2, 3], &component).unwrap()
    }

    fn limits(degrees: f32, links: usize) -> Vec<f32> {
        let mut out = vec![0.0];
        out.extend(std::iter::repeat_n(degrees.to_radians(), links - 1));
        out
    }

    #[test]
    fn converges_on_reachable_target() {
        let solver = CcdikSolver::new(CcdikConfig {
            precision: 1.0,
            max_iterations: 30,
            start_from_tail: false,
        });
        let mut chain = leg();
        let target = Vector3::new(20.0, 0.0, -45.0);
        let per_link = limits(180.0, chain.len());

        let result = solver
            .solve(&mut chain, target, RotationLimits { per_link: &per_link, enabled: true })
            .unwrap();

        assert!(result.updated);
        assert!(result.converged, "pos_err={}", result.position_error);
        assert!(result.iterations <= 30);
        assert!((chain.tip_location() - target).norm() <= 1.0);
    }

    #[test]
    fn converges_from_tail() {
        let solver = CcdikSolver::new(CcdikConfig {
            precision: 1.0,
            max_iterations: 30,
            start_from_tail: true,
        });
        let mut chain = leg();
        let target = Vector3::new(-15.0, 0.0, -40.0);
        let per_link = limits(120.0, chain.len());

        let result = solver
            .solve(&mut chain, target, RotationLimits { per_link: &per_link, enabled: true })
            .unwrap();
        assert!(result.converged, "pos_err={}", result.position_error);
    }

    #[test]
    fn segment_lengths_preserved() {
        let solver = CcdikSolver::with_defaults();
        let mut chain = leg();
        let thigh = (chain.links()[2].location() - chain.links()[1].location()).norm();
        let shin = (chain.links()[3].location() - chain.links()[2].location()).norm();
        let per_link = limits(90.0, chain.len());
        solver
            .solve(
                &mut chain,
                Vector3::new(25.0, 5.0, -40.0),
                RotationLimits { per_link: &per_link, enabled: true },
            )
            .unwrap();

        let links = chain.links();
        assert_relative_eq!((links[2].location() - links[1].location()).norm(), thigh, epsilon = 1e-3);
        assert_relative_eq!((links[3].location() - links[2].location()).norm(), shin, epsilon = 1e-3);
        assert_relative_eq!(links[1].location(), Vector3::zeros(), epsilon = 1e-5);
    }

    #[test]
    fn angle_budget_never_exceeded() {
        let budget = 20.0_f32.to_radians();
        let targets = [
            Vector3::new(40.0, 0.0, -20.0),
            Vector3::new(-40.0, 10.0, -20.0),
            Vector3::new(0.0, 55.0, 0.0),
            Vector3::new(10.0, -10.0, -30.0),
            Vector3::new(0.0, 0.0, 60.0),
            Vector3::new(100.0, 100.0, 100.0),
        ];
        for (start_from_tail, target) in [false, true].into_iter().flat_map(|t| targets.map(|v| (t, v))) {
            let solver = CcdikSolver::new(CcdikConfig {
                precision: 0.01,
                max_iterations: 50,
                start_from_tail,
            });
            let mut chain = leg();
            let per_link = limits(20.0, chain.len());
            solver
                .solve(&mut chain, target, RotationLimits { per_link: &per_link, enabled: true })
                .unwrap();
            for link in chain.links() {
                assert!(
                    link.angle_delta <= budget + 1e-5,
                    "link {} spent {} > {budget}",
                    link.bone,
                    link.angle_delta
                );
            }
        }
    }

    #[test]
    fn disabled_limits_rotate_freely() {
        let solver = CcdikSolver::new(CcdikConfig {
            precision: 1.0,
            max_iterations: 30,
            start_from_tail: false,
        });
        let mut chain = leg();
        let target = Vector3::new(45.0, 0.0, -10.0);
        let per_link = vec![0.0; chain.len()];

        let result = solver
            .solve(&mut chain, target, RotationLimits { per_link: &per_link, enabled: false })
            .unwrap();
        assert!(result.converged, "pos_err={}", result.position_error);
    }

    #[test]
    fn zero_budget_blocks_rotation() {
        let solver = CcdikSolver::with_defaults();
        let mut chain = leg();
        let per_link = vec![0.0; chain.len()];
        let result = solver
            .solve(
                &mut chain,
                Vector3::new(30.0, 0.0, -30.0),
                RotationLimits { per_link: &per_link, enabled: true },
            )
            .unwrap();
        assert!(!result.updated);
        assert_eq!(result.iterations, 1);
        assert_relative_eq!(chain.tip_location(), Vector3::new(0.0, 0.0, -58.0));
    }

    #[test]
    fn target_within_precision_is_noop() {
        let solver = CcdikSolver::with_defaults();
        let mut chain = leg();
        let per_link = limits(30.0, chain.len());
        let result = solver
            .solve(
                &mut chain,
                Vector3::new(0.5, 0.0, -58.0),
                RotationLimits { per_link: &per_link, enabled: true },
            )
            .unwrap();
        assert!(!result.updated);
        assert!(result.converged);
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn missing_limits_reported() {
        let solver = CcdikSolver::with_defaults();
        let mut chain = leg();
        let before = chain.tip_location();
        let per_link = vec![0.0, 0.5];
        let err = solver
            .solve(
                &mut chain,
                Vector3::new(20.0, 0.0, -40.0),
                RotationLimits { per_link: &per_link, enabled: true },
            )
            .unwrap_err();
        assert_eq!(err, IkError::VirtualBoneInChain { link: 2, limits: 2 });
        assert_eq!(chain.tip_location(), before);
    }

    #[test]
    fn config_from_ik_config() {
        let ik = strider_core::IkConfig {
            precision: 0.25,
            max_iterations: 4,
            start_from_tail: true,
            enabled: true,
        };
        let config = CcdikConfig::from(&ik);
        assert_relative_eq!(config.precision, 0.25);
        assert_eq!(config.max_iterations, 4);
        assert!(config.start_from_tail);
    }
}

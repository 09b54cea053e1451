use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_true() -> bool {
    true
}
const fn default_min_distance_to_unplant() -> f32 {
    5.0
}
const fn default_fix_feet_targets_after_percent() -> f32 {
    0.5
}
const fn default_feet_rotation_interp_speed() -> f32 {
    15.0
}
const fn default_feet_in_air_interp_speed() -> f32 {
    15.0
}
const fn default_step_height() -> f32 {
    20.0
}
const fn default_step_distance_forward() -> f32 {
    50.0
}
const fn default_step_distance_right() -> f32 {
    30.0
}
const fn default_step_sequence_percent() -> f32 {
    1.0
}
const fn default_slope_reduction_multiplier() -> f32 {
    0.75
}
const fn default_min_step_duration() -> f32 {
    0.15
}
const fn default_half() -> f32 {
    0.5
}
const fn default_body_location_interp_speed() -> f32 {
    10.0
}
const fn default_body_rotation_interp_speed() -> f32 {
    2.5
}
const fn default_acceleration_rotation_multiplier() -> f32 {
    0.1
}
const fn default_max_body_angle() -> f32 {
    45.0
}
const fn default_radius_check_multiplier() -> f32 {
    1.5
}
const fn default_distance_check_multiplier() -> f32 {
    1.2
}
const fn default_trace_length() -> f32 {
    350.0
}
const fn default_trace_z_offset() -> f32 {
    50.0
}
const fn default_precision() -> f32 {
    1.0
}
const fn default_max_iterations() -> u32 {
    10
}

/// Rotation limit (degrees) assigned to each chain joint when a leg lists none.
pub const DEFAULT_ROTATION_LIMIT: f32 = 30.0;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which builtin step curves drive the swing, or a user-supplied pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepCurveKind {
    /// Symmetric lift peaking at mid-swing.
    #[default]
    Robot,
    /// Fast lift peaking early, long descent.
    Organic,
    /// `custom_height_curve` and `custom_distance_curve` from [`StepConfig`].
    Custom,
}

/// Ground probing strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverKind {
    /// A single line probe per leg.
    Basic,
    /// Line probe with a sphere-probe fallback for missed or distant footholds.
    #[default]
    Advanced,
}

/// The mesh axis pointing forward in component space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeshForwardAxis {
    X,
    NegX,
    #[default]
    Y,
    NegY,
}

impl MeshForwardAxis {
    /// Forward unit vector in component space.
    #[must_use]
    pub fn forward(self) -> Vector3<f32> {
        match self {
            Self::X => Vector3::x(),
            Self::NegX => -Vector3::x(),
            Self::Y => Vector3::y(),
            Self::NegY => -Vector3::y(),
        }
    }

    /// Right unit vector in component space (`forward × up`).
    #[must_use]
    pub fn right(self) -> Vector3<f32> {
        self.forward().cross(&Vector3::z())
    }
}

// ---------------------------------------------------------------------------
// CurveKey
// ---------------------------------------------------------------------------

/// A cubic curve key. With `auto_tangent` set, both tangents are derived from
/// the neighbouring keys and the stored tangents are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveKey {
    pub time: f32,
    pub value: f32,
    #[serde(default)]
    pub arrive_tangent: f32,
    #[serde(default)]
    pub leave_tangent: f32,
    #[serde(default)]
    pub auto_tangent: bool,
}

impl CurveKey {
    /// Key with the same arrive and leave tangent.
    #[must_use]
    pub const fn new(time: f32, value: f32, tangent: f32) -> Self {
        Self {
            time,
            value,
            arrive_tangent: tangent,
            leave_tangent: tangent,
            auto_tangent: false,
        }
    }

    /// Key whose tangents are computed from its neighbours.
    #[must_use]
    pub const fn auto(time: f32, value: f32) -> Self {
        Self {
            time,
            value,
            arrive_tangent: 0.0,
            leave_tangent: 0.0,
            auto_tangent: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Legs and groups
// ---------------------------------------------------------------------------

/// One limb: the chain from `parent_bone` down to `tip_bone`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegConfig {
    pub parent_bone: String,
    pub tip_bone: String,

    /// Offset added to the rest foot position, in actor space
    /// (x forward, y left, z up).
    #[serde(default)]
    pub offset: [f32; 3],

    /// Clamp per-joint rotation during each IK solve.
    #[serde(default = "default_true")]
    pub limit_rotation: bool,

    /// Per-joint rotation budget in degrees. Index 0 is the parent bone,
    /// the last entry the bone above the tip. Filled with
    /// [`DEFAULT_ROTATION_LIMIT`] per joint at bind time when empty.
    #[serde(default)]
    pub rotation_limits: Vec<f32>,

    /// The tip is a virtual bone driven directly, bypassing the chain.
    #[serde(default)]
    pub virtual_bone: bool,
}

impl LegConfig {
    pub fn new(parent_bone: impl Into<String>, tip_bone: impl Into<String>) -> Self {
        Self {
            parent_bone: parent_bone.into(),
            tip_bone: tip_bone.into(),
            offset: [0.0; 3],
            limit_rotation: true,
            rotation_limits: Vec::new(),
            virtual_bone: false,
        }
    }

    pub fn offset_vector(&self) -> Vector3<f32> {
        Vector3::from(self.offset)
    }
}

/// Legs that unplant and plant together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegGroupConfig {
    pub legs: Vec<usize>,
}

impl LegGroupConfig {
    pub fn new(legs: impl Into<Vec<usize>>) -> Self {
        Self { legs: legs.into() }
    }
}

// ---------------------------------------------------------------------------
// StepConfig
// ---------------------------------------------------------------------------

/// Step timing, size and curve selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepConfig {
    #[serde(default = "default_step_height")]
    pub height: f32,

    #[serde(default = "default_step_distance_forward")]
    pub distance_forward: f32,

    #[serde(default = "default_step_distance_right")]
    pub distance_right: f32,

    /// Phase the previous group must reach before the next one may unplant.
    /// 1.0 means strictly one group in the air at a time.
    #[serde(default = "default_step_sequence_percent")]
    pub sequence_percent: f32,

    #[serde(default)]
    pub curve: StepCurveKind,

    #[serde(default)]
    pub custom_height_curve: Option<Vec<CurveKey>>,

    #[serde(default)]
    pub custom_distance_curve: Option<Vec<CurveKey>>,

    /// How much step length shrinks on slopes, in [0, 1].
    #[serde(default = "default_slope_reduction_multiplier")]
    pub slope_reduction_multiplier: f32,

    /// Step duration used when the pawn barely moves (seconds).
    #[serde(default = "default_min_step_duration")]
    pub min_duration: f32,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            height: default_step_height(),
            distance_forward: default_step_distance_forward(),
            distance_right: default_step_distance_right(),
            sequence_percent: default_step_sequence_percent(),
            curve: StepCurveKind::default(),
            custom_height_curve: None,
            custom_distance_curve: None,
            slope_reduction_multiplier: default_slope_reduction_multiplier(),
            min_duration: default_min_step_duration(),
        }
    }
}

// ---------------------------------------------------------------------------
// BodyConfig
// ---------------------------------------------------------------------------

/// Body bounce and tilt response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyConfig {
    /// Bone receiving the body offset. No body motion when unset.
    #[serde(default)]
    pub bone: Option<String>,

    #[serde(default = "default_half")]
    pub bounce_multiplier: f32,

    #[serde(default = "default_half")]
    pub slope_multiplier: f32,

    #[serde(default = "default_body_location_interp_speed")]
    pub location_interp_speed: f32,

    #[serde(default)]
    pub z_offset: f32,

    #[serde(default = "default_true")]
    pub rotate_on_acceleration: bool,

    #[serde(default = "default_true")]
    pub rotate_on_feet_locations: bool,

    #[serde(default = "default_body_rotation_interp_speed")]
    pub rotation_interp_speed: f32,

    #[serde(default = "default_acceleration_rotation_multiplier")]
    pub acceleration_rotation_multiplier: f32,

    /// Degrees.
    #[serde(default = "default_max_body_angle")]
    pub max_pitch: f32,

    /// Degrees.
    #[serde(default = "default_max_body_angle")]
    pub max_roll: f32,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            bone: None,
            bounce_multiplier: default_half(),
            slope_multiplier: default_half(),
            location_interp_speed: default_body_location_interp_speed(),
            z_offset: 0.0,
            rotate_on_acceleration: true,
            rotate_on_feet_locations: true,
            rotation_interp_speed: default_body_rotation_interp_speed(),
            acceleration_rotation_multiplier: default_acceleration_rotation_multiplier(),
            max_pitch: default_max_body_angle(),
            max_roll: default_max_body_angle(),
        }
    }
}

// ---------------------------------------------------------------------------
// SolverConfig / IkConfig
// ---------------------------------------------------------------------------

/// Ground probe parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    #[serde(default)]
    pub kind: SolverKind,

    /// Sphere probe radius as a multiple of the larger step distance.
    #[serde(default = "default_radius_check_multiplier")]
    pub radius_check_multiplier: f32,

    /// Line hits farther than `leg length × this` trigger the sphere fallback.
    #[serde(default = "default_distance_check_multiplier")]
    pub distance_check_multiplier: f32,

    #[serde(default = "default_trace_length")]
    pub trace_length: f32,

    #[serde(default = "default_trace_z_offset")]
    pub trace_z_offset: f32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            kind: SolverKind::default(),
            radius_check_multiplier: default_radius_check_multiplier(),
            distance_check_multiplier: default_distance_check_multiplier(),
            trace_length: default_trace_length(),
            trace_z_offset: default_trace_z_offset(),
        }
    }
}

/// CCDIK parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IkConfig {
    /// When false every tip bone is placed directly at its foot location.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Visit links tip to root instead of root to tip.
    #[serde(default)]
    pub start_from_tail: bool,

    /// Tip-to-target distance at which the solve stops.
    #[serde(default = "default_precision")]
    pub precision: f32,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
}

impl Default for IkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            start_from_tail: false,
            precision: default_precision(),
            max_iterations: default_max_iterations(),
        }
    }
}

// ---------------------------------------------------------------------------
// WalkConfig
// ---------------------------------------------------------------------------

/// Complete per-character walk configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkConfig {
    #[serde(default = "default_min_distance_to_unplant")]
    pub min_distance_to_unplant: f32,

    /// Swing phase after which a foot target stops following new probe hits.
    #[serde(default = "default_fix_feet_targets_after_percent")]
    pub fix_feet_targets_after_percent: f32,

    #[serde(default = "default_feet_rotation_interp_speed")]
    pub feet_rotation_interp_speed: f32,

    #[serde(default = "default_feet_in_air_interp_speed")]
    pub feet_in_air_interp_speed: f32,

    #[serde(default)]
    pub mesh_forward_axis: MeshForwardAxis,

    /// Scale distances and durations by the average mesh scale.
    #[serde(default = "default_true")]
    pub scale_with_mesh: bool,

    #[serde(default = "default_true")]
    pub detect_falling: bool,

    #[serde(default)]
    pub legs: Vec<LegConfig>,

    #[serde(default)]
    pub groups: Vec<LegGroupConfig>,

    #[serde(default)]
    pub step: StepConfig,

    #[serde(default)]
    pub body: BodyConfig,

    #[serde(default)]
    pub solver: SolverConfig,

    #[serde(default)]
    pub ik: IkConfig,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            legs: Vec::new(),
            groups: Vec::new(),
            min_distance_to_unplant: default_min_distance_to_unplant(),
            fix_feet_targets_after_percent: default_fix_feet_targets_after_percent(),
            feet_rotation_interp_speed: default_feet_rotation_interp_speed(),
            feet_in_air_interp_speed: default_feet_in_air_interp_speed(),
            step: StepConfig::default(),
            body: BodyConfig::default(),
            solver: SolverConfig::default(),
            ik: IkConfig::default(),
            mesh_forward_axis: MeshForwardAxis::default(),
            scale_with_mesh: true,
            detect_falling: true,
        }
    }
}

/// Non-fatal configuration problems. Logged, never disable the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigWarning {
    #[error("No legs configured")]
    NoLegs,

    #[error("No leg groups configured")]
    NoGroups,

    #[error("Leg {0} does not belong to any group")]
    UnassignedLeg(usize),
}

fn non_negative(field: &str, value: f32) -> Result<(), ConfigError> {
    if value < 0.0 || !value.is_finite() {
        return Err(ConfigError::InvalidValue {
            field: field.into(),
            message: format!("{value} (must be a finite value >= 0)"),
        });
    }
    Ok(())
}

impl WalkConfig {
    /// Validate configuration. Returns Err on invalid values, otherwise the
    /// list of warnings (each also logged).
    pub fn validate(&self) -> Result<Vec<ConfigWarning>, ConfigError> {
        let mut warnings = Vec::new();

        if self.legs.is_empty() {
            warnings.push(ConfigWarning::NoLegs);
        }
        if self.groups.is_empty() {
            warnings.push(ConfigWarning::NoGroups);
        }

        for (group_index, group) in self.groups.iter().enumerate() {
            if group.legs.is_empty() {
                return Err(ConfigError::EmptyGroup(group_index));
            }
            if let Some(&leg) = group.legs.iter().find(|&&leg| leg >= self.legs.len()) {
                return Err(ConfigError::InvalidLegIndex {
                    group: group_index,
                    leg,
                });
            }
        }

        for leg_index in 0..self.legs.len() {
            if !self.groups.iter().any(|g| g.legs.contains(&leg_index)) {
                warnings.push(ConfigWarning::UnassignedLeg(leg_index));
            }
        }

        for (leg_index, leg) in self.legs.iter().enumerate() {
            if leg.virtual_bone && self.ik.enabled {
                return Err(ConfigError::VirtualBoneWithIk(leg_index));
            }
            if let Some(limit) = leg.rotation_limits.iter().find(|l| **l < 0.0) {
                return Err(ConfigError::InvalidValue {
                    field: format!("legs[{leg_index}].rotation_limits"),
                    message: format!("{limit} (must be >= 0)"),
                });
            }
        }

        if self.step.curve == StepCurveKind::Custom {
            if self.step.custom_height_curve.is_none() {
                return Err(ConfigError::CustomCurveUnset("height"));
            }
            if self.step.custom_distance_curve.is_none() {
                return Err(ConfigError::CustomCurveUnset("distance"));
            }
        }

        if self.ik.precision <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "ik.precision".into(),
                message: format!("{} (must be > 0)", self.ik.precision),
            });
        }
        if self.ik.max_iterations == 0 {
            return Err(ConfigError::InvalidValue {
                field: "ik.max_iterations".into(),
                message: "0 (must be >= 1)".into(),
            });
        }

        non_negative("min_distance_to_unplant", self.min_distance_to_unplant)?;
        non_negative("step.height", self.step.height)?;
        non_negative("step.distance_forward", self.step.distance_forward)?;
        non_negative("step.distance_right", self.step.distance_right)?;
        non_negative("step.min_duration", self.step.min_duration)?;
        non_negative("solver.trace_length", self.solver.trace_length)?;
        non_negative("solver.trace_z_offset", self.solver.trace_z_offset)?;

        for warning in &warnings {
            tracing::warn!("{warning}");
        }

        Ok(warnings)
    }

    /// Parse from a TOML string and validate.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quadruped() -> WalkConfig {
        WalkConfig {
            legs: vec![
                LegConfig::new("thigh_fl", "foot_fl"),
                LegConfig::new("thigh_fr", "foot_fr"),
                LegConfig::new("thigh_bl", "foot_bl"),
                LegConfig::new("thigh_br", "foot_br"),
            ],
            groups: vec![LegGroupConfig::new([0, 3]), LegGroupConfig::new([1, 2])],
            ..WalkConfig::default()
        }
    }

    #[test]
    fn default_values() {
        let config = WalkConfig::default();
        assert_relative_eq!(config.min_distance_to_unplant, 5.0);
        assert_relative_eq!(config.fix_feet_targets_after_percent, 0.5);
        assert_relative_eq!(config.step.height, 20.0);
        assert_relative_eq!(config.step.distance_forward, 50.0);
        assert_relative_eq!(config.step.distance_right, 30.0);
        assert_relative_eq!(config.step.sequence_percent, 1.0);
        assert_relative_eq!(config.step.min_duration, 0.15);
        assert_relative_eq!(config.body.rotation_interp_speed, 2.5);
        assert_relative_eq!(config.solver.trace_length, 350.0);
        assert_eq!(config.solver.kind, SolverKind::Advanced);
        assert_eq!(config.ik.max_iterations, 10);
        assert_eq!(config.mesh_forward_axis, MeshForwardAxis::Y);
        assert!(config.detect_falling);
    }

    #[test]
    fn empty_toml_matches_default() {
        let config: WalkConfig = toml::from_str("").unwrap();
        assert_eq!(config, WalkConfig::default());
    }

    #[test]
    fn toml_roundtrip() {
        let config = quadruped();
        let text = toml::to_string(&config).unwrap();
        let parsed = WalkConfig::from_toml_str(&text).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn json_roundtrip() {
        let config = quadruped();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: WalkConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn partial_toml() {
        let text = r#"
            min_distance_to_unplant = 8.0

            [[legs]]
            parent_bone = "hip"
            tip_bone = "foot"
            rotation_limits = [45.0, 60.0]

            [[groups]]
            legs = [0]

            [step]
            curve = "organic"
            sequence_percent = 0.5

            [ik]
            start_from_tail = true
        "#;
        let config = WalkConfig::from_toml_str(text).unwrap();
        assert_relative_eq!(config.min_distance_to_unplant, 8.0);
        assert_eq!(config.legs[0].rotation_limits, vec![45.0, 60.0]);
        assert!(config.legs[0].limit_rotation);
        assert_eq!(config.step.curve, StepCurveKind::Organic);
        assert_relative_eq!(config.step.sequence_percent, 0.5);
        assert_relative_eq!(config.step.height, 20.0);
        assert!(config.ik.start_from_tail);
        assert_eq!(config.ik.max_iterations, 10);
    }

    #[test]
    fn valid_config_has_no_warnings() {
        assert!(quadruped().validate().unwrap().is_empty());
    }

    #[test]
    fn empty_config_warns() {
        let warnings = WalkConfig::default().validate().unwrap();
        assert_eq!(warnings, vec![ConfigWarning::NoLegs, ConfigWarning::NoGroups]);
    }

    #[test]
    fn unassigned_leg_warns() {
        let mut config = quadruped();
        config.groups[1].legs = vec![1];
        let warnings = config.validate().unwrap();
        assert_eq!(warnings, vec![ConfigWarning::UnassignedLeg(2)]);
    }

    #[test]
    fn empty_group_rejected() {
        let mut config = quadruped();
        config.groups.push(LegGroupConfig::default());
        assert!(matches!(config.validate(), Err(ConfigError::EmptyGroup(2))));
    }

    #[test]
    fn out_of_range_leg_rejected() {
        let mut config = quadruped();
        config.groups[0].legs.push(9);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidLegIndex { group: 0, leg: 9 })
        ));
    }

    #[test]
    fn custom_curve_requires_keys() {
        let mut config = quadruped();
        config.step.curve = StepCurveKind::Custom;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::CustomCurveUnset("height"))
        ));

        config.step.custom_height_curve = Some(vec![CurveKey::new(0.0, 0.0, 0.0)]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::CustomCurveUnset("distance"))
        ));

        config.step.custom_distance_curve = Some(vec![CurveKey::new(1.0, 1.0, 0.0)]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn virtual_bone_requires_ik_disabled() {
        let mut config = quadruped();
        config.legs[1].virtual_bone = true;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::VirtualBoneWithIk(1))
        ));

        config.ik.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn non_positive_precision_rejected() {
        let mut config = quadruped();
        config.ik.precision = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn negative_step_height_rejected() {
        let mut config = quadruped();
        config.step.height = -1.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("step.height"));
    }

    #[test]
    fn mesh_axes_are_orthogonal() {
        for axis in [
            MeshForwardAxis::X,
            MeshForwardAxis::NegX,
            MeshForwardAxis::Y,
            MeshForwardAxis::NegY,
        ] {
            assert_relative_eq!(axis.forward().dot(&axis.right()), 0.0);
            assert_relative_eq!(axis.right().norm(), 1.0);
        }
        assert_relative_eq!(MeshForwardAxis::X.right(), -Vector3::y());
        assert_relative_eq!(MeshForwardAxis::Y.right(), Vector3::x());
    }

    #[test]
    fn from_file_missing_path() {
        let result = WalkConfig::from_file("/nonexistent/strider.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}

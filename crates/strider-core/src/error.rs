use thiserror::Error;

/// Top-level error type for strider.
#[derive(Debug, Error)]
pub enum StriderError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Bind error: {0}")]
    Bind(#[from] BindError),

    #[error("IK error: {0}")]
    Ik(#[from] IkError),
}

/// Configuration errors, detected when a [`WalkConfig`](crate::WalkConfig) is validated.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Leg group {0} has no legs")]
    EmptyGroup(usize),

    #[error("Leg group {group} references leg {leg}, which does not exist")]
    InvalidLegIndex { group: usize, leg: usize },

    #[error("Custom step curve selected but no {0} curve was provided")]
    CustomCurveUnset(&'static str),

    #[error("Leg {0} uses a virtual tip bone while the IK solver is enabled")]
    VirtualBoneWithIk(usize),
}

/// Errors raised while resolving configured bone names against a skeleton.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("Unknown bone: {0}")]
    UnknownBone(String),

    #[error("Leg {0}: parent bone cannot be the skeleton root")]
    ParentIsRoot(usize),

    #[error("Leg {leg}: tip bone {tip} is not a descendant of {parent}")]
    TipNotDescendant {
        leg: usize,
        parent: String,
        tip: String,
    },
}

/// Runtime solver inconsistencies. The affected leg is skipped for the frame.
///
/// Copy + static messages for cheap propagation in the per-frame path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IkError {
    #[error("Virtual bone in chain: link {link} has no rotation limit ({limits} limits configured)")]
    VirtualBoneInChain { link: usize, limits: usize },

    #[error("Chain too short to solve: {0} links")]
    ChainTooShort(usize),
}

//! Skeleton pose model and CCDIK chain solver for Strider.
//!
//! Provides a minimal bone hierarchy ([`Skeleton`], [`Pose`]), the
//! [`IkChain`] link model with zero-length bone collapsing, and a Cyclic
//! Coordinate Descent solver with per-joint angle budgets.
//!
//! # Architecture
//!
//! ```text
//! Skeleton + Pose ──► bone path ──► IkChain ──► CcdikSolver ──► BoneTransforms ──► Pose
//! ```
//!
//! A chain is built fresh for every solve from the current component-space
//! pose and discarded afterwards; the solver keeps no state between calls.

pub mod chain;
pub mod skeleton;
pub mod solver;

pub use chain::{ChainLink, IkChain};
pub use skeleton::{Bone, BoneTransform, Pose, Skeleton};
pub use solver::{CcdikConfig, CcdikResult, CcdikSolver, RotationLimits};

//! Per-character procedural walk for Strider.
//!
//! [`WalkNode`] ties the pieces together: it binds a [`strider_core::WalkConfig`]
//! to a [`strider_ik::Skeleton`], advances foot placement and body motion from
//! a [`strider_core::PawnState`] each frame, and writes the resulting body and
//! leg bone transforms into a [`strider_ik::Pose`].
//!
//! Enable the `bevy` feature for [`plugin::StriderWalkPlugin`], which drains
//! walk events into bevy's event system.

pub mod node;
#[cfg(feature = "bevy")]
pub mod plugin;

pub use node::{BoundLeg, LegDrive, NodeStatus, WalkNode, detect_falling};
#[cfg(feature = "bevy")]
pub use plugin::{StriderWalkPlugin, WalkEventMessage, WalkEventQueue};

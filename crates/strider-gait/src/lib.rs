//! Step curves, gait scheduling, foot placement and body response for Strider.
//!
//! # Architecture
//!
//! ```text
//! PawnState ──► PawnMotion ──► FootPlacement ─────────────► BodySolver
//!               (speed, step    ├─ GaitScheduler (groups)    (bounce, tilt,
//!                length/time)   ├─ StepCurves (swing shape)   slope reduction)
//!                               └─ LegState × N                    │
//!                                                                  ▼
//!                         SlopeReduction fed back into the next PawnMotion
//! ```
//!
//! Everything here is host-agnostic: ground queries go through
//! [`strider_core::GroundProbe`] and step notifications are pushed onto a
//! [`strider_core::EventQueue`].

pub mod body;
pub mod curve;
pub mod gait;
pub mod leg;
pub mod motion;
pub mod params;
pub mod placement;

pub use body::{BodySolver, SideAverages};
pub use curve::{StepCurve, StepCurves};
pub use gait::{GaitScheduler, GroupState};
pub use leg::{DirectionFlags, LegState, SupportTracker};
pub use motion::{PawnMotion, SlopeReduction};
pub use params::ScaledParams;
pub use placement::{FootPlacement, TickContext};

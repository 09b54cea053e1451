//! Shared test fixtures for Strider crates.
//!
//! Provides analytic ground probes, a bent-knee quadruped rig, and an event
//! sink that records everything it receives.

pub mod probes;
pub mod rigs;
pub mod sinks;

// ---------------------------------------------------------------------------
// Re-exports for convenience
// ---------------------------------------------------------------------------

pub use probes::{FlatGround, NoGround};
pub use rigs::{QuadrupedRig, quadruped};
pub use sinks::RecordingSink;

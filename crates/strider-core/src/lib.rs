// strider-core: Config, errors, interpolation math, probe types and step events for Strider.

pub mod config;
pub mod error;
pub mod events;
pub mod math;
pub mod traits;
pub mod types;

pub use config::{
    BodyConfig, ConfigWarning, CurveKey, IkConfig, LegConfig, LegGroupConfig, MeshForwardAxis,
    SolverConfig, SolverKind, StepConfig, StepCurveKind, WalkConfig,
};
pub use error::{BindError, ConfigError, IkError, StriderError};
pub use events::{EventDispatcher, EventQueue, EventSink, WalkEvent};
pub use traits::GroundProbe;
pub use types::{GroundHit, PawnState, SurfaceId};

//! Hybrid-time simulation engine behind a model-exchange / co-simulation
//! interface.
//!
//! Provides:
//! - Model description (declared variables, sample times, solver settings)
//! - Variable store addressed by packed value references
//! - Phase state machine and the caller-facing `Instance` surface
//! - Sample-time scheduler and zero-crossing event detector
//! - Fixed-step Forward Euler / RK4 integrators for co-simulation
//! - Host logging sink with `tracing` mirroring

pub mod backend;
pub mod description;
pub mod error;
pub mod event;
pub mod instance;
pub mod integrator;
pub mod logging;
pub mod phase;
pub mod schedule;
pub mod store;
pub mod zero_crossing;

// Further `Instance` operations
mod access;
mod cosim;
mod cycle;
mod exchange;

// Re-exports for public API
pub use backend::{Capabilities, EvalContext, ModelBackend, StepKind};
pub use description::{ModelDescription, NamedVariable, SampleTime, SolverKind, VariableDecl};
pub use error::{BackendError, BackendResult, EngineError, EngineResult};
pub use event::{EventInfo, StepCompletion};
pub use instance::{Callbacks, Instance, InterfaceKind};
pub use integrator::{ContinuousSystem, ForwardEuler, Integrator, Rk4};
pub use logging::{HostLogger, LogSink, NullSink};
pub use phase::{Phase, Transition, TransitionOutcome};
pub use schedule::{HitScan, SampleSchedule};
pub use store::{FmiValue, ScalarValue, VariableStore};
pub use zero_crossing::{Crossing, Direction, EventDetector};
